use async_trait::async_trait;
use chirp_common::model::{
    post::{CreatePost, Post, PostWithAuthor},
    validation::{CONTENT_FIELD, ValidationFailure},
};
use thiserror::Error;

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum ApiError {
    #[error("Request was rejected by validation: {0}")]
    Validation(ValidationFailure),
    #[error("Request requires a signed in user")]
    Unauthorized,
    #[error("Request could not be completed: {0}")]
    Transport(String),
}

impl ApiError {
    /// The most specific message the service gave for the post content, if any.
    #[must_use]
    pub fn content_message(&self) -> Option<&str> {
        match self {
            ApiError::Validation(failure) => failure.first_message(CONTENT_FIELD),
            ApiError::Unauthorized | ApiError::Transport(_) => None,
        }
    }
}

impl From<ValidationFailure> for ApiError {
    fn from(value: ValidationFailure) -> Self {
        ApiError::Validation(value)
    }
}

/// The `posts` procedures of the remote service.
#[async_trait]
pub trait PostsApi: Send + Sync {
    /// All posts with their authors, newest first.
    async fn get_all(&self) -> Result<Vec<PostWithAuthor>>;

    async fn create(&self, post: &CreatePost) -> Result<Post>;
}
