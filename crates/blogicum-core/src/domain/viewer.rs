use super::UserId;

/// Who is asking: an anonymous visitor or an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Viewer {
    #[default]
    Anonymous,
    User(UserId),
}

impl Viewer {
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Viewer::Anonymous => None,
            Viewer::User(id) => Some(*id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Viewer::User(_))
    }

    /// True when the viewer is the given user.
    pub fn is(&self, user_id: UserId) -> bool {
        self.user_id() == Some(user_id)
    }
}

impl From<Option<UserId>> for Viewer {
    fn from(id: Option<UserId>) -> Self {
        id.map_or(Viewer::Anonymous, Viewer::User)
    }
}
