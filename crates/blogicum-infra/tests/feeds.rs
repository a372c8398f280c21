mod common;

use chrono::TimeDelta;

use blogicum_core::DomainError;
use blogicum_core::domain::{CommentDraft, PageRequest, PostDraft, Viewer};
use blogicum_core::navigation::Mutation;
use common::{Harness, now, tomorrow, yesterday};

fn titles(page: &blogicum_core::domain::Page<blogicum_core::domain::FeedEntry>) -> Vec<String> {
    page.items.iter().map(|e| e.post.title.clone()).collect()
}

#[tokio::test]
async fn test_home_feed_shows_only_publicly_visible_posts() {
    let h = Harness::new();
    let anna = h.user("anna").await;
    let open = h.category("travel", true).await;
    let closed = h.category("drafts", false).await;

    h.post(&anna, PostDraft::new("plain", "t", yesterday())).await;
    h.post(&anna, PostDraft::new("in open", "t", yesterday()).in_category(open.id))
        .await;
    h.post(&anna, PostDraft::new("in closed", "t", yesterday()).in_category(closed.id))
        .await;
    h.post(&anna, PostDraft::new("hidden", "t", yesterday()).hidden())
        .await;
    h.post(&anna, PostDraft::new("scheduled", "t", tomorrow()))
        .await;
    h.post(&anna, PostDraft::new("exactly now", "t", now())).await;

    let page = h.feeds.home(PageRequest::first()).await.unwrap();

    let mut shown = titles(&page);
    shown.sort();
    assert_eq!(shown, vec!["exactly now", "in open", "plain"]);
    assert_eq!(page.total_items, 3);
}

#[tokio::test]
async fn test_scheduled_post_appears_once_its_date_arrives() {
    let h = Harness::new();
    let anna = h.user("anna").await;

    let created = h
        .posts
        .create(
            &Viewer::User(anna.id),
            PostDraft::new("tomorrow's news", "t", tomorrow()),
        )
        .await
        .unwrap();
    assert!(created.is_applied());

    let today = h.feeds.home(PageRequest::first()).await.unwrap();
    assert!(today.items.is_empty());

    h.clock.advance(TimeDelta::days(1));

    let next_day = h.feeds.home(PageRequest::first()).await.unwrap();
    assert_eq!(titles(&next_day), vec!["tomorrow's news"]);
}

#[tokio::test]
async fn test_home_feed_is_newest_first_with_stable_ties() {
    let h = Harness::new();
    let anna = h.user("anna").await;

    let older = h
        .post(&anna, PostDraft::new("older", "t", yesterday() - TimeDelta::days(1)))
        .await;
    let first_tie = h.post(&anna, PostDraft::new("tie 1", "t", yesterday())).await;
    let second_tie = h.post(&anna, PostDraft::new("tie 2", "t", yesterday())).await;

    let page = h.feeds.home(PageRequest::first()).await.unwrap();
    let ids: Vec<_> = page.items.iter().map(|e| e.post.id).collect();

    assert_eq!(ids, vec![first_tie.id, second_tie.id, older.id]);
}

#[tokio::test]
async fn test_feed_pages_hold_ten_posts() {
    let h = Harness::new();
    let anna = h.user("anna").await;
    for i in 0..11 {
        h.public_post(&anna, &format!("post {i}")).await;
    }

    let first = h.feeds.home(PageRequest::first()).await.unwrap();
    assert_eq!(first.items.len(), 10);
    assert_eq!(first.total_pages, 2);
    assert!(first.has_next);

    let second = h.feeds.home(PageRequest::new(Some(2))).await.unwrap();
    assert_eq!(second.items.len(), 1);
    assert!(!second.has_next);
    assert!(second.has_previous);

    // Same ids never show up on both pages.
    let last_id = second.items[0].post.id;
    assert!(first.items.iter().all(|e| e.post.id != last_id));

    let clamped = h.feeds.home(PageRequest::new(Some(99))).await.unwrap();
    assert_eq!(clamped.number, 2);
}

#[tokio::test]
async fn test_unpublished_category_is_not_found() {
    let h = Harness::new();
    let anna = h.user("anna").await;
    let closed = h.category("secret", false).await;
    h.post(&anna, PostDraft::new("p", "t", yesterday()).in_category(closed.id))
        .await;

    let result = h.feeds.category("secret", PageRequest::first()).await;
    assert!(matches!(result, Err(DomainError::NotFound { .. })));

    let result = h.feeds.category("missing", PageRequest::first()).await;
    assert!(matches!(result, Err(DomainError::NotFound { .. })));
}

#[tokio::test]
async fn test_category_feed_lists_its_public_posts() {
    let h = Harness::new();
    let anna = h.user("anna").await;
    let travel = h.category("travel", true).await;
    let food = h.category("food", true).await;

    h.post(&anna, PostDraft::new("alps", "t", yesterday()).in_category(travel.id))
        .await;
    h.post(&anna, PostDraft::new("soup", "t", yesterday()).in_category(food.id))
        .await;
    h.post(
        &anna,
        PostDraft::new("draft trip", "t", yesterday())
            .in_category(travel.id)
            .hidden(),
    )
    .await;

    let feed = h.feeds.category("travel", PageRequest::first()).await.unwrap();

    assert_eq!(feed.category.slug, "travel");
    assert_eq!(titles(&feed.posts), vec!["alps"]);
}

#[tokio::test]
async fn test_own_profile_shows_drafts_and_scheduled_posts() {
    let h = Harness::new();
    let anna = h.user("anna").await;
    let boris = h.user("boris").await;

    h.public_post(&anna, "public").await;
    h.post(&anna, PostDraft::new("draft", "t", yesterday()).hidden())
        .await;
    h.post(&anna, PostDraft::new("later", "t", tomorrow())).await;
    h.public_post(&boris, "not anna's").await;

    let own = h
        .feeds
        .profile(&Viewer::User(anna.id), "anna", PageRequest::first())
        .await
        .unwrap();
    assert!(own.is_owner);
    assert_eq!(own.profile.username, "anna");
    assert_eq!(titles(&own.posts), vec!["later", "public", "draft"]);

    // Foreign profiles keep the unrestricted author filter.
    let foreign = h
        .feeds
        .profile(&Viewer::User(boris.id), "anna", PageRequest::first())
        .await
        .unwrap();
    assert!(!foreign.is_owner);
    assert_eq!(foreign.posts.total_items, 3);

    let anonymous = h
        .feeds
        .profile(&Viewer::Anonymous, "anna", PageRequest::first())
        .await
        .unwrap();
    assert!(!anonymous.is_owner);
}

#[tokio::test]
async fn test_unknown_profile_is_not_found() {
    let h = Harness::new();
    let result = h
        .feeds
        .profile(&Viewer::Anonymous, "nobody", PageRequest::first())
        .await;
    assert!(matches!(result, Err(DomainError::NotFound { .. })));
}

#[tokio::test]
async fn test_new_comment_increments_feed_count_by_one() {
    let h = Harness::new();
    let anna = h.user("anna").await;
    let boris = h.user("boris").await;
    let post = h.public_post(&anna, "hello").await;

    let before = h.feeds.home(PageRequest::first()).await.unwrap();
    assert_eq!(before.items[0].comment_count, 0);

    let outcome = h
        .comments
        .create(&Viewer::User(boris.id), post.id, CommentDraft::new("hi!"))
        .await
        .unwrap();
    assert!(matches!(outcome, Mutation::Applied { .. }));

    let after = h.feeds.home(PageRequest::first()).await.unwrap();
    assert_eq!(after.items[0].comment_count, 1);
}

#[tokio::test]
async fn test_post_detail_lists_comments_oldest_first() {
    let h = Harness::new();
    let anna = h.user("anna").await;
    let boris = h.user("boris").await;
    let post = h.public_post(&anna, "hello").await;

    h.comment(&boris, &post, "first").await;
    h.clock.advance(TimeDelta::minutes(1));
    h.comment(&anna, &post, "second").await;
    h.clock.advance(TimeDelta::minutes(1));
    h.comment(&boris, &post, "third").await;

    let detail = h
        .feeds
        .post_detail(&Viewer::Anonymous, post.id)
        .await
        .unwrap();

    let texts: Vec<_> = detail.comments.iter().map(|c| c.comment.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "second", "third"]);
    assert!(
        detail
            .comments
            .windows(2)
            .all(|w| w[0].comment.created_at < w[1].comment.created_at)
    );
    assert_eq!(detail.comments[1].author, "anna");
    assert_eq!(detail.comment_count, 3);
    assert!(!detail.can_comment);
    assert!(!detail.is_author);
}

#[tokio::test]
async fn test_post_detail_of_hidden_post_is_for_author_only() {
    let h = Harness::new();
    let anna = h.user("anna").await;
    let boris = h.user("boris").await;
    let draft = h
        .post(&anna, PostDraft::new("draft", "t", yesterday()).hidden())
        .await;

    let own = h
        .feeds
        .post_detail(&Viewer::User(anna.id), draft.id)
        .await
        .unwrap();
    assert!(own.is_author);
    assert!(own.can_comment);

    let other = h.feeds.post_detail(&Viewer::User(boris.id), draft.id).await;
    assert!(matches!(other, Err(DomainError::NotFound { .. })));

    let missing = h.feeds.post_detail(&Viewer::Anonymous, 999).await;
    assert!(matches!(missing, Err(DomainError::NotFound { .. })));
}

#[tokio::test]
async fn test_post_detail_resolves_published_location() {
    let h = Harness::new();
    let anna = h.user("anna").await;
    let location = h.location("Riverside").await;
    let post = h
        .post(&anna, PostDraft::new("walk", "t", yesterday()).at_location(location.id))
        .await;

    let detail = h
        .feeds
        .post_detail(&Viewer::Anonymous, post.id)
        .await
        .unwrap();
    assert_eq!(detail.location.map(|l| l.name), Some("Riverside".to_string()));
}
