use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, Validator};

pub type UserId = Uuid;

const USERNAME_MAX_CHARS: usize = 150;
const NAME_MAX_CHARS: usize = 150;

/// User entity - the holder of an identity handle and its profile fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with generated ID and timestamps.
    pub fn new(new: NewUser) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            first_name: String::new(),
            last_name: String::new(),
            password_hash: new.password_hash,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, update: ProfileUpdate) {
        self.username = update.username;
        self.email = update.email;
        self.first_name = update.first_name;
        self.last_name = update.last_name;
        self.updated_at = Utc::now();
    }

    pub fn profile(&self) -> PublicProfile {
        PublicProfile {
            id: self.id,
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            date_joined: self.created_at,
        }
    }
}

/// Registration input; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// What other viewers may see about a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicProfile {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub date_joined: DateTime<Utc>,
}

/// Fields a user may change on their own profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl ProfileUpdate {
    pub fn validate(&self) -> Result<(), DomainError> {
        Validator::new()
            .check(
                is_valid_username(&self.username),
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            )
            .check(
                self.email.is_empty() || is_plausible_email(&self.email),
                "email",
                "Enter a valid email address.",
            )
            .check(
                self.first_name.chars().count() <= NAME_MAX_CHARS,
                "first_name",
                "Ensure this value has at most 150 characters.",
            )
            .check(
                self.last_name.chars().count() <= NAME_MAX_CHARS,
                "last_name",
                "Ensure this value has at most 150 characters.",
            )
            .finish()
    }
}

pub fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username.chars().count() <= USERNAME_MAX_CHARS
        && username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

pub fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}
