//! PostgreSQL repository implementations.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DbConn, EntityTrait, FromQueryResult, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set,
};

use blogicum_core::domain::{
    Category, Comment, FeedEntry, Location, NewCategory, NewComment, NewLocation, NewPost, Post,
    PostId, User,
};
use blogicum_core::error::RepoError;
use blogicum_core::ports::{
    CategoryRepository, CommentRepository, LocationRepository, PostRepository, Repositories,
    UserRepository,
};
use blogicum_core::visibility::{PostFilter, PostScope};

use super::entity::category::{self, Entity as CategoryEntity};
use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::location::{self, Entity as LocationEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL location repository.
pub type PostgresLocationRepository = PostgresBaseRepository<LocationEntity>;

/// PostgreSQL category repository.
pub type PostgresCategoryRepository = PostgresBaseRepository<CategoryEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

/// Build the full entity store over one connection pool.
pub fn postgres_repositories(db: DbConn) -> Repositories {
    Repositories {
        users: Arc::new(PostgresUserRepository::new(db.clone())),
        locations: Arc::new(PostgresLocationRepository::new(db.clone())),
        categories: Arc::new(PostgresCategoryRepository::new(db.clone())),
        posts: Arc::new(PostgresPostRepository::new(db.clone())),
        comments: Arc::new(PostgresCommentRepository::new(db)),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(username, "Finding user by username");

        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn create(&self, user: User) -> Result<User, RepoError> {
        let active: user::ActiveModel = user.into();
        let model = active.insert(&self.db).await.map_err(map_db_err)?;
        Ok(model.into())
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let active: user::ActiveModel = user.into();
        let model = active.update(&self.db).await.map_err(|e| match e {
            sea_orm::DbErr::RecordNotUpdated => RepoError::NotFound,
            other => map_db_err(other),
        })?;
        Ok(model.into())
    }
}

#[async_trait]
impl LocationRepository for PostgresLocationRepository {
    async fn create(&self, new: NewLocation) -> Result<Location, RepoError> {
        let active = location::ActiveModel {
            id: NotSet,
            name: Set(new.name),
            is_published: Set(new.is_published),
            created_at: Set(Utc::now().into()),
        };
        let model = active.insert(&self.db).await.map_err(map_db_err)?;
        Ok(model.into())
    }

    async fn list_published(&self) -> Result<Vec<Location>, RepoError> {
        let result = LocationEntity::find()
            .filter(location::Column::IsPublished.eq(true))
            .order_by_asc(location::Column::Name)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn create(&self, new: NewCategory) -> Result<Category, RepoError> {
        let active = category::ActiveModel {
            id: NotSet,
            title: Set(new.title),
            description: Set(new.description),
            slug: Set(new.slug),
            is_published: Set(new.is_published),
            created_at: Set(Utc::now().into()),
        };
        let model = active.insert(&self.db).await.map_err(map_db_err)?;
        Ok(model.into())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let result = CategoryEntity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn list_published(&self) -> Result<Vec<Category>, RepoError> {
        let result = CategoryEntity::find()
            .filter(category::Column::IsPublished.eq(true))
            .order_by_asc(category::Column::Title)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

/// Translate a post filter into a query joined with its category.
pub(super) fn filtered_posts(filter: &PostFilter) -> Select<PostEntity> {
    let mut query = PostEntity::find().join(JoinType::LeftJoin, post::Relation::Category.def());

    if let PostScope::Public { now } = filter.scope {
        query = query
            .filter(post::Column::IsPublished.eq(true))
            .filter(post::Column::PubDate.lte(now))
            .filter(
                Condition::any()
                    .add(post::Column::CategoryId.is_null())
                    .add(category::Column::IsPublished.eq(true)),
            );
    }
    if let Some(author_id) = filter.author_id {
        query = query.filter(post::Column::AuthorId.eq(author_id));
    }
    if let Some(slug) = &filter.category_slug {
        query = query.filter(category::Column::Slug.eq(slug.as_str()));
    }

    query
}

/// One page of a feed: newest `pub_date` first, ties by ascending id.
pub(super) fn feed_page(filter: &PostFilter, offset: u64, limit: u64) -> Select<PostEntity> {
    filtered_posts(filter)
        .order_by_desc(post::Column::PubDate)
        .order_by_asc(post::Column::Id)
        .offset(offset)
        .limit(limit)
}

#[derive(Debug, FromQueryResult)]
struct CommentCount {
    post_id: i64,
    comment_count: i64,
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, new: NewPost) -> Result<Post, RepoError> {
        let draft = new.draft;
        let active = post::ActiveModel {
            id: NotSet,
            title: Set(draft.title),
            text: Set(draft.text),
            pub_date: Set(draft.pub_date.into()),
            author_id: Set(new.author_id),
            location_id: Set(draft.location_id),
            category_id: Set(draft.category_id),
            image: Set(draft.image),
            is_published: Set(draft.is_published),
            created_at: Set(new.created_at.into()),
        };
        let model = active.insert(&self.db).await.map_err(map_db_err)?;
        Ok(model.into())
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let active: post::ActiveModel = post.into();
        let model = active.update(&self.db).await.map_err(|e| match e {
            sea_orm::DbErr::RecordNotUpdated => RepoError::NotFound,
            other => map_db_err(other),
        })?;
        Ok(model.into())
    }

    async fn count(&self, filter: &PostFilter) -> Result<u64, RepoError> {
        filtered_posts(filter)
            .count(&self.db)
            .await
            .map_err(map_db_err)
    }

    async fn list(
        &self,
        filter: &PostFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<FeedEntry>, RepoError> {
        let posts = feed_page(filter, offset, limit)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<PostId> = posts.iter().map(|p| p.id).collect();
        let counts: HashMap<PostId, u64> = CommentEntity::find()
            .select_only()
            .column(comment::Column::PostId)
            .column_as(Expr::col(comment::Column::Id).count(), "comment_count")
            .filter(comment::Column::PostId.is_in(ids))
            .group_by(comment::Column::PostId)
            .into_model::<CommentCount>()
            .all(&self.db)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(|c| (c.post_id, c.comment_count.max(0) as u64))
            .collect();

        Ok(posts
            .into_iter()
            .map(|model| FeedEntry {
                comment_count: counts.get(&model.id).copied().unwrap_or(0),
                post: model.into(),
            })
            .collect())
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn create(&self, new: NewComment) -> Result<Comment, RepoError> {
        let active = comment::ActiveModel {
            id: NotSet,
            text: Set(new.text),
            post_id: Set(new.post_id),
            author_id: Set(new.author_id),
            created_at: Set(new.created_at.into()),
        };
        let model = active.insert(&self.db).await.map_err(|e| {
            // The only foreign key a client can miss is the post.
            if e.to_string().contains("foreign key") {
                RepoError::NotFound
            } else {
                map_db_err(e)
            }
        })?;
        Ok(model.into())
    }

    async fn update(&self, comment: Comment) -> Result<Comment, RepoError> {
        let active = comment::ActiveModel {
            id: Set(comment.id),
            text: Set(comment.text),
            ..Default::default()
        };
        let model = active.update(&self.db).await.map_err(|e| match e {
            sea_orm::DbErr::RecordNotUpdated => RepoError::NotFound,
            other => map_db_err(other),
        })?;
        Ok(model.into())
    }

    async fn list_for_post(&self, post_id: PostId) -> Result<Vec<Comment>, RepoError> {
        let result = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}
