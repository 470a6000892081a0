use std::sync::Arc;

use crate::data::post_repository::PostRepository;
use crate::domain::{error::DomainError, post::Post};
use crate::presentation::dto::UpdatePostRequest;
use tracing::instrument;
use uuid::Uuid;

/// Longest accepted title, counted in characters to match the column width.
const TITLE_MAX_CHARS: usize = 255;

#[derive(Clone)]
pub struct PostService<R: PostRepository + 'static> {
    repo: Arc<R>,
}

impl<R> PostService<R>
where
    R: PostRepository + 'static,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn get_post(&self, id: Uuid) -> Result<Post, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(DomainError::PostNotFound(id))
    }

    pub async fn list_posts(&self) -> Result<Vec<Post>, DomainError> {
        self.repo.list_all().await
    }

    #[instrument(skip(self, title, body))]
    pub async fn create_post(
        &self,
        owner_id: Uuid,
        title: String,
        body: String,
    ) -> Result<Post, DomainError> {
        validate_new_post(&title, &body)?;
        self.repo.create(owner_id, title, body).await
    }

    /// Fields left out of the request keep their stored values. The post
    /// must exist and belong to the caller, checked in that order.
    #[instrument(skip(self, update))]
    pub async fn update_post(
        &self,
        caller_id: Uuid,
        post_id: Uuid,
        update: UpdatePostRequest,
    ) -> Result<Post, DomainError> {
        let post = self.get_post(post_id).await?;
        ensure_owner(&post, caller_id)?;
        // The post can disappear between the check and the write; report
        // that the same way as a stale id.
        self.repo
            .update(post_id, update.title, update.body)
            .await?
            .ok_or(DomainError::PostNotFound(post_id))
    }

    #[instrument(skip(self))]
    pub async fn delete_post(&self, caller_id: Uuid, post_id: Uuid) -> Result<(), DomainError> {
        let post = self.get_post(post_id).await?;
        ensure_owner(&post, caller_id)?;
        if self.repo.delete(post_id).await? {
            Ok(())
        } else {
            Err(DomainError::PostNotFound(post_id))
        }
    }
}

fn ensure_owner(post: &Post, caller_id: Uuid) -> Result<(), DomainError> {
    if post.owner_id == caller_id {
        Ok(())
    } else {
        Err(DomainError::Forbidden)
    }
}

fn validate_new_post(title: &str, body: &str) -> Result<(), DomainError> {
    if title.trim().is_empty() {
        return Err(DomainError::Validation("title must not be empty".into()));
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(DomainError::Validation(format!(
            "title must be at most {TITLE_MAX_CHARS} characters"
        )));
    }
    if body.trim().is_empty() {
        return Err(DomainError::Validation("body must not be empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct InMemoryPostRepository {
        posts: Mutex<HashMap<Uuid, Post>>,
    }

    #[async_trait]
    impl PostRepository for InMemoryPostRepository {
        async fn create(
            &self,
            owner_id: Uuid,
            title: String,
            body: String,
        ) -> Result<Post, DomainError> {
            let post = Post::new(owner_id, title, body);
            self.posts
                .lock()
                .unwrap()
                .insert(post.id, post.clone());
            Ok(post)
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, DomainError> {
            Ok(self.posts.lock().unwrap().get(&id).cloned())
        }

        async fn update(
            &self,
            id: Uuid,
            title: Option<String>,
            body: Option<String>,
        ) -> Result<Option<Post>, DomainError> {
            let mut posts = self.posts.lock().unwrap();
            let Some(post) = posts.get_mut(&id) else {
                return Ok(None);
            };
            if let Some(title) = title {
                post.title = title;
            }
            if let Some(body) = body {
                post.body = body;
            }
            post.updated_at = Utc::now();
            Ok(Some(post.clone()))
        }

        async fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
            Ok(self.posts.lock().unwrap().remove(&id).is_some())
        }

        async fn list_all(&self) -> Result<Vec<Post>, DomainError> {
            Ok(self.posts.lock().unwrap().values().cloned().collect())
        }
    }

    fn new_service() -> PostService<InMemoryPostRepository> {
        PostService::new(Arc::new(InMemoryPostRepository::default()))
    }

    async fn seed_post(service: &PostService<InMemoryPostRepository>, owner_id: Uuid) -> Post {
        service
            .create_post(owner_id, "First post".into(), "Hello from the tests".into())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_assigns_id_and_owner() {
        let service = new_service();
        let owner_id = Uuid::new_v4();

        let post = service
            .create_post(owner_id, "A title".into(), "A body".into())
            .await
            .unwrap();

        assert_eq!(post.owner_id, owner_id);
        assert_eq!(post.title, "A title");
        assert_eq!(post.body, "A body");

        let stored = service.get_post(post.id).await.unwrap();
        assert_eq!(stored.id, post.id);
    }

    #[tokio::test]
    async fn create_rejects_empty_title_without_storing_anything() {
        let service = new_service();
        let err = service
            .create_post(Uuid::new_v4(), "".into(), "content".into())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(service.list_posts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_rejects_whitespace_only_title() {
        let service = new_service();
        let err = service
            .create_post(Uuid::new_v4(), "   ".into(), "content".into())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn create_rejects_empty_body() {
        let service = new_service();
        let err = service
            .create_post(Uuid::new_v4(), "title".into(), "".into())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn create_accepts_title_at_the_length_limit() {
        let service = new_service();
        let title = "x".repeat(255);
        let post = service
            .create_post(Uuid::new_v4(), title.clone(), "content".into())
            .await
            .unwrap();
        assert_eq!(post.title, title);
    }

    #[tokio::test]
    async fn create_rejects_title_over_the_length_limit() {
        let service = new_service();
        let err = service
            .create_post(Uuid::new_v4(), "x".repeat(256), "content".into())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn get_unknown_post_is_not_found() {
        let service = new_service();
        let id = Uuid::new_v4();
        let err = service.get_post(id).await.unwrap_err();
        assert!(matches!(err, DomainError::PostNotFound(missing) if missing == id));
    }

    #[tokio::test]
    async fn list_returns_every_post() {
        let service = new_service();
        let owner_id = Uuid::new_v4();
        let a = seed_post(&service, owner_id).await;
        let b = service
            .create_post(Uuid::new_v4(), "Second".into(), "More".into())
            .await
            .unwrap();

        let posts = service.list_posts().await.unwrap();
        assert_eq!(posts.len(), 2);
        assert!(posts.iter().any(|p| p.id == a.id));
        assert!(posts.iter().any(|p| p.id == b.id));
    }

    #[tokio::test]
    async fn owner_updates_both_fields() {
        let service = new_service();
        let owner_id = Uuid::new_v4();
        let post = seed_post(&service, owner_id).await;

        let updated = service
            .update_post(
                owner_id,
                post.id,
                UpdatePostRequest {
                    title: Some("Renamed".into()),
                    body: Some("Rewritten".into()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.body, "Rewritten");
        assert_eq!(updated.id, post.id);
        assert_eq!(updated.owner_id, owner_id);
    }

    #[tokio::test]
    async fn partial_update_keeps_missing_fields() {
        let service = new_service();
        let owner_id = Uuid::new_v4();
        let post = seed_post(&service, owner_id).await;

        let updated = service
            .update_post(
                owner_id,
                post.id,
                UpdatePostRequest {
                    title: Some("Renamed".into()),
                    body: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.body, post.body);
    }

    #[tokio::test]
    async fn update_with_no_fields_changes_nothing() {
        let service = new_service();
        let owner_id = Uuid::new_v4();
        let post = seed_post(&service, owner_id).await;

        let updated = service
            .update_post(
                owner_id,
                post.id,
                UpdatePostRequest {
                    title: None,
                    body: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, post.title);
        assert_eq!(updated.body, post.body);
    }

    #[tokio::test]
    async fn update_by_non_owner_is_forbidden_and_leaves_the_post_alone() {
        let service = new_service();
        let owner_id = Uuid::new_v4();
        let post = seed_post(&service, owner_id).await;

        let err = service
            .update_post(
                Uuid::new_v4(),
                post.id,
                UpdatePostRequest {
                    title: Some("Hijacked".into()),
                    body: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden));

        let stored = service.get_post(post.id).await.unwrap();
        assert_eq!(stored.title, post.title);
        assert_eq!(stored.body, post.body);
    }

    #[tokio::test]
    async fn update_of_unknown_post_is_not_found_even_for_strangers() {
        let service = new_service();
        let id = Uuid::new_v4();

        // Existence is checked before ownership, so a caller who owns
        // nothing still learns the id is stale, not that it is off limits.
        let err = service
            .update_post(
                Uuid::new_v4(),
                id,
                UpdatePostRequest {
                    title: Some("ghost".into()),
                    body: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PostNotFound(missing) if missing == id));
    }

    #[tokio::test]
    async fn owner_deletes_their_post() {
        let service = new_service();
        let owner_id = Uuid::new_v4();
        let post = seed_post(&service, owner_id).await;

        service.delete_post(owner_id, post.id).await.unwrap();

        let err = service.get_post(post.id).await.unwrap_err();
        assert!(matches!(err, DomainError::PostNotFound(_)));
    }

    #[tokio::test]
    async fn delete_by_non_owner_is_forbidden_and_keeps_the_post() {
        let service = new_service();
        let owner_id = Uuid::new_v4();
        let post = seed_post(&service, owner_id).await;

        let err = service
            .delete_post(Uuid::new_v4(), post.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden));

        assert!(service.get_post(post.id).await.is_ok());
    }

    #[tokio::test]
    async fn delete_of_unknown_post_is_not_found() {
        let service = new_service();
        let id = Uuid::new_v4();
        let err = service.delete_post(Uuid::new_v4(), id).await.unwrap_err();
        assert!(matches!(err, DomainError::PostNotFound(missing) if missing == id));
    }

    #[tokio::test]
    async fn delete_is_not_repeatable() {
        let service = new_service();
        let owner_id = Uuid::new_v4();
        let post = seed_post(&service, owner_id).await;

        service.delete_post(owner_id, post.id).await.unwrap();
        let err = service.delete_post(owner_id, post.id).await.unwrap_err();
        assert!(matches!(err, DomainError::PostNotFound(_)));
    }

    #[tokio::test]
    async fn post_lifecycle_end_to_end() {
        let service = new_service();
        let author = Uuid::new_v4();
        let reader = Uuid::new_v4();

        let post = service
            .create_post(author, "Launch".into(), "We are live".into())
            .await
            .unwrap();

        let listed = service.list_posts().await.unwrap();
        assert!(listed.iter().any(|p| p.id == post.id));

        let err = service
            .update_post(
                reader,
                post.id,
                UpdatePostRequest {
                    title: Some("Defaced".into()),
                    body: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden));

        let updated = service
            .update_post(
                author,
                post.id,
                UpdatePostRequest {
                    title: Some("Launched".into()),
                    body: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Launched");
        assert_eq!(updated.body, "We are live");

        service.delete_post(author, post.id).await.unwrap();
        let err = service.get_post(post.id).await.unwrap_err();
        assert!(matches!(err, DomainError::PostNotFound(_)));
        assert!(service.list_posts().await.unwrap().is_empty());
    }
}
