use crate::model::{
    Id, ModelValidationError,
    author::{Author, AuthorMarker},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Id<PostMarker>,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub author_id: Id<AuthorMarker>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct CreatePost {
    pub content: String,
}

/// A post joined with the public profile of whoever wrote it.
///
/// The author always matches `post.author_id`; this is checked on
/// construction and on deserialization.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
#[serde(try_from = "UncheckedPostWithAuthor")]
pub struct PostWithAuthor {
    post: Post,
    author: Author,
}

#[derive(Deserialize)]
struct UncheckedPostWithAuthor {
    post: Post,
    author: Author,
}

impl PostWithAuthor {
    pub fn new(post: Post, author: Author) -> Result<Self, ModelValidationError> {
        if post.author_id != author.id {
            return Err(ModelValidationError::MismatchedAuthor {
                post: post.id,
                author: author.id,
                expected: post.author_id,
            });
        }

        Ok(Self { post, author })
    }

    #[must_use]
    pub fn post(&self) -> &Post {
        &self.post
    }

    #[must_use]
    pub fn author(&self) -> &Author {
        &self.author
    }

    #[must_use]
    pub fn into_parts(self) -> (Post, Author) {
        (self.post, self.author)
    }
}

impl TryFrom<UncheckedPostWithAuthor> for PostWithAuthor {
    type Error = ModelValidationError;

    fn try_from(value: UncheckedPostWithAuthor) -> Result<Self, Self::Error> {
        Self::new(value.post, value.author)
    }
}
