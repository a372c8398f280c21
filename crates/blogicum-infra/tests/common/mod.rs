#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};

use blogicum_core::domain::{
    Category, Comment, Location, NewCategory, NewComment, NewLocation, NewUser, Post, PostDraft,
    User,
};
use blogicum_core::ports::{Clock, Repositories};
use blogicum_core::services::{CommentService, FeedService, PostService};
use blogicum_infra::{InMemoryStore, ManualClock};

pub fn now() -> DateTime<Utc> {
    "2024-06-01T12:00:00Z".parse().unwrap()
}

pub fn yesterday() -> DateTime<Utc> {
    now() - TimeDelta::days(1)
}

pub fn tomorrow() -> DateTime<Utc> {
    now() + TimeDelta::days(1)
}

/// Services wired over a fresh in-memory store and a clock frozen at `now()`.
pub struct Harness {
    pub repos: Repositories,
    pub clock: Arc<ManualClock>,
    pub feeds: FeedService,
    pub posts: PostService,
    pub comments: CommentService,
}

impl Harness {
    pub fn new() -> Self {
        let repos = Repositories::from_store(Arc::new(InMemoryStore::new()));
        let clock = Arc::new(ManualClock::new(now()));

        Self {
            feeds: FeedService::new(repos.clone(), clock.clone()),
            posts: PostService::new(repos.clone(), clock.clone()),
            comments: CommentService::new(repos.clone(), clock.clone()),
            repos,
            clock,
        }
    }

    pub async fn user(&self, username: &str) -> User {
        self.repos
            .users
            .create(User::new(NewUser {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password_hash: "unused".to_string(),
            }))
            .await
            .unwrap()
    }

    pub async fn category(&self, slug: &str, is_published: bool) -> Category {
        let mut new = NewCategory::new(slug.to_uppercase(), slug);
        new.is_published = is_published;
        self.repos.categories.create(new).await.unwrap()
    }

    pub async fn location(&self, name: &str) -> Location {
        self.repos
            .locations
            .create(NewLocation::new(name))
            .await
            .unwrap()
    }

    pub async fn post(&self, author: &User, draft: PostDraft) -> Post {
        self.repos
            .posts
            .create(draft.into_new(author.id, self.clock.now()))
            .await
            .unwrap()
    }

    pub async fn public_post(&self, author: &User, title: &str) -> Post {
        self.post(author, PostDraft::new(title, "text", yesterday()))
            .await
    }

    pub async fn comment(&self, author: &User, post: &Post, text: &str) -> Comment {
        self.repos
            .comments
            .create(NewComment {
                post_id: post.id,
                author_id: author.id,
                text: text.to_string(),
                created_at: self.clock.now(),
            })
            .await
            .unwrap()
    }
}
