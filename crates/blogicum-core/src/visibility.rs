//! Visibility rules - which posts a viewer may see.
//!
//! Filters are plain query objects built from an explicit viewer context and
//! evaluated by the entity store, never implicit defaults on the entity type.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::domain::{Category, Comment, Post, UserId, Viewer};

/// Publication scope of a post query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope {
    /// Only posts that are publicly visible at `now`.
    Public { now: DateTime<Utc> },
    /// Every post, drafts and scheduled ones included.
    Any,
}

/// Post query object understood by every `PostRepository`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostFilter {
    pub scope: PostScope,
    pub author_id: Option<UserId>,
    pub category_slug: Option<String>,
}

impl PostFilter {
    pub fn public(now: DateTime<Utc>) -> Self {
        Self {
            scope: PostScope::Public { now },
            author_id: None,
            category_slug: None,
        }
    }

    pub fn any() -> Self {
        Self {
            scope: PostScope::Any,
            author_id: None,
            category_slug: None,
        }
    }

    pub fn by_author(mut self, author_id: UserId) -> Self {
        self.author_id = Some(author_id);
        self
    }

    pub fn in_category(mut self, slug: impl Into<String>) -> Self {
        self.category_slug = Some(slug.into());
        self
    }

    /// Evaluate the filter against a post and its resolved category.
    pub fn matches(&self, post: &Post, category: Option<&Category>) -> bool {
        if let PostScope::Public { now } = self.scope {
            if !is_publicly_visible(post, category, now) {
                return false;
            }
        }
        if let Some(author_id) = self.author_id {
            if post.author_id != author_id {
                return false;
            }
        }
        match &self.category_slug {
            Some(slug) => category.is_some_and(|c| &c.slug == slug),
            None => true,
        }
    }
}

/// Published, not scheduled for later, and not inside a hidden category.
///
/// A post whose category reference is null is treated as uncategorized.
pub fn is_publicly_visible(post: &Post, category: Option<&Category>, now: DateTime<Utc>) -> bool {
    post.is_published && post.pub_date <= now && category.is_none_or(|c| c.is_published)
}

/// Filter behind the home feed.
pub fn home_feed(now: DateTime<Utc>) -> PostFilter {
    PostFilter::public(now)
}

/// Filter behind a category feed. The category itself must be checked for
/// publication separately.
pub fn category_feed(slug: &str, now: DateTime<Utc>) -> PostFilter {
    PostFilter::public(now).in_category(slug)
}

/// Filter behind a profile feed.
///
/// The owner sees every post including drafts and scheduled ones. Other
/// viewers get the same unrestricted author filter: that is how the profile
/// feed has always behaved, and it is kept until someone decides whether
/// foreign profiles should be limited to public posts.
pub fn profile_feed(author_id: UserId, viewer: &Viewer) -> PostFilter {
    if !viewer.is(author_id) {
        tracing::trace!(%author_id, "profile feed requested by non-owner, scope unrestricted");
    }
    PostFilter::any().by_author(author_id)
}

/// Detail view rule: authors always see their own posts, everyone else only
/// publicly visible ones.
pub fn can_view_post(
    viewer: &Viewer,
    post: &Post,
    category: Option<&Category>,
    now: DateTime<Utc>,
) -> bool {
    viewer.is(post.author_id) || is_publicly_visible(post, category, now)
}

/// Feed order: newest `pub_date` first, ties by id ascending.
pub fn feed_order(a: &Post, b: &Post) -> Ordering {
    b.pub_date.cmp(&a.pub_date).then(a.id.cmp(&b.id))
}

/// Comment order: oldest first, ties by id ascending.
pub fn comment_order(a: &Comment, b: &Comment) -> Ordering {
    a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id))
}
