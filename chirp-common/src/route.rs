//! Logical routes linked to from the feed. Resolving them is up to the host.

use crate::model::{
    Id,
    author::{InvalidUsernameError, Username},
    post::PostMarker,
};
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};
use thiserror::Error;

const PROFILE_PREFIX: &str = "/@";
const PERMALINK_PREFIX: &str = "/post/";

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub enum Route {
    AuthorProfile(Username),
    PostPermalink(Id<PostMarker>),
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum RouteParseError {
    #[error("Path does not name a known route: {0}")]
    Unknown(String),
    #[error(transparent)]
    Username(#[from] InvalidUsernameError),
    #[error("Post permalink is missing an id")]
    MissingPostId,
}

impl Display for Route {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Route::AuthorProfile(username) => write!(f, "{PROFILE_PREFIX}{username}"),
            Route::PostPermalink(id) => write!(f, "{PERMALINK_PREFIX}{id}"),
        }
    }
}

impl FromStr for Route {
    type Err = RouteParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(username) = s.strip_prefix(PROFILE_PREFIX) {
            return Ok(Route::AuthorProfile(Username::try_from(username)?));
        }

        if let Some(id) = s.strip_prefix(PERMALINK_PREFIX) {
            if id.is_empty() || id.contains('/') {
                return Err(RouteParseError::MissingPostId);
            }
            return Ok(Route::PostPermalink(Id::new(id)));
        }

        Err(RouteParseError::Unknown(s.to_owned()))
    }
}
