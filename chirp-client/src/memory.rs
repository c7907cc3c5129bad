//! In-process posts service backing the preview binary and tests.

use crate::api::{ApiError, PostsApi, Result};
use async_trait::async_trait;
use chirp_common::model::{
    Id,
    author::{Author, AuthorMarker},
    post::{CreatePost, Post, PostWithAuthor},
    validation::{CONTENT_FIELD, ValidationFailure},
};
use parking_lot::Mutex;
use std::collections::HashMap;
use time::OffsetDateTime;
use tracing::{debug, warn};

pub const POST_CONTENT_MIN_LEN: usize = 1;
pub const POST_CONTENT_MAX_LEN: usize = 280;

#[derive(Debug, Default)]
struct Store {
    authors: HashMap<Id<AuthorMarker>, Author>,
    posts: Vec<Post>,
    next_post: u64,
    viewer: Option<Id<AuthorMarker>>,
    unavailable: bool,
}

#[derive(Debug, Default)]
pub struct InMemoryPosts {
    store: Mutex<Store>,
}

fn validate_content(content: &str) -> Result<(), ValidationFailure> {
    let len = content.chars().count();
    let mut failure = ValidationFailure::new();
    if len < POST_CONTENT_MIN_LEN {
        failure.push(
            CONTENT_FIELD,
            format!("String must contain at least {POST_CONTENT_MIN_LEN} character(s)"),
        );
    }
    if len > POST_CONTENT_MAX_LEN {
        failure.push(
            CONTENT_FIELD,
            format!("String must contain at most {POST_CONTENT_MAX_LEN} character(s)"),
        );
    }

    if failure.is_empty() {
        Ok(())
    } else {
        Err(failure)
    }
}

impl InMemoryPosts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the service with an existing feed.
    #[must_use]
    pub fn with_feed(feed: impl IntoIterator<Item = PostWithAuthor>) -> Self {
        let posts = Self::new();
        for joined in feed {
            let (post, author) = joined.into_parts();
            posts.add_author(author);
            posts.store.lock().posts.push(post);
        }
        posts
    }

    pub fn add_author(&self, author: Author) {
        self.store.lock().authors.insert(author.id.clone(), author);
    }

    /// Set the author that `create` calls are attributed to.
    pub fn act_as(&self, author: Option<Id<AuthorMarker>>) {
        self.store.lock().viewer = author;
    }

    /// While unavailable every request fails with a transport error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.store.lock().unavailable = unavailable;
    }

    #[must_use]
    pub fn post_count(&self) -> usize {
        self.store.lock().posts.len()
    }
}

#[async_trait]
impl PostsApi for InMemoryPosts {
    async fn get_all(&self) -> Result<Vec<PostWithAuthor>> {
        let store = self.store.lock();
        if store.unavailable {
            return Err(ApiError::Transport("service unavailable".to_owned()));
        }

        let mut posts: Vec<&Post> = store.posts.iter().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let feed = posts
            .into_iter()
            .filter_map(|post| {
                let Some(author) = store.authors.get(&post.author_id) else {
                    warn!(post = %post.id, author = %post.author_id, "Dropping post without author");
                    return None;
                };
                PostWithAuthor::new(post.clone(), author.clone()).ok()
            })
            .collect();

        Ok(feed)
    }

    async fn create(&self, post: &CreatePost) -> Result<Post> {
        let mut store = self.store.lock();
        if store.unavailable {
            return Err(ApiError::Transport("service unavailable".to_owned()));
        }

        let author_id = store
            .viewer
            .clone()
            .filter(|viewer| store.authors.contains_key(viewer))
            .ok_or(ApiError::Unauthorized)?;

        validate_content(&post.content)?;

        store.next_post += 1;
        let created = Post {
            id: Id::new(format!("post_{}", store.next_post)),
            content: post.content.clone(),
            created_at: OffsetDateTime::now_utc(),
            author_id,
        };
        debug!(post = %created.id, author = %created.author_id, "Created post");
        store.posts.push(created.clone());

        Ok(created)
    }
}
