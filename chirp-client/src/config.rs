use crate::session::{Session, SessionUser};
use chirp_common::model::{
    author::{InvalidUsernameError, Username},
    post::PostWithAuthor,
};
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

pub const ENV_PREFIX: &str = "CHIRP_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
    #[error("Configured user is invalid: {0}")]
    Username(#[from] InvalidUsernameError),
    #[error("Error reading feed fixture {path}: {source}")]
    ReadFeed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Error parsing feed fixture: {0}")]
    ParseFeed(#[from] serde_json::Error),
}

/// Settings for the preview binary, read from `CHIRP_*` variables.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
pub struct PreviewConfig {
    /// JSON array of posts with authors to seed the feed with.
    pub feed_path: Option<PathBuf>,
    #[serde(default = "default_session_loaded")]
    pub session_loaded: bool,
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub profile_image_url: Option<String>,
    /// Posted through the composer before rendering.
    pub draft: Option<String>,
}

fn default_session_loaded() -> bool {
    true
}

pub fn parse_feed(json: &str) -> Result<Vec<PostWithAuthor>, ConfigError> {
    Ok(serde_json::from_str(json)?)
}

impl PreviewConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(envy::prefixed(ENV_PREFIX).from_env()?)
    }

    pub fn from_pairs<I>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::prefixed(ENV_PREFIX).from_iter(pairs)?)
    }

    /// The configured account; only present when id, username and image are all set.
    pub fn session_user(&self) -> Result<Option<SessionUser>, ConfigError> {
        let (Some(id), Some(username), Some(profile_image_url)) =
            (&self.user_id, &self.username, &self.profile_image_url)
        else {
            return Ok(None);
        };

        Ok(Some(SessionUser {
            id: id.as_str().into(),
            username: Username::try_from(username.as_str())?,
            profile_image_url: profile_image_url.clone(),
        }))
    }

    pub fn session(&self) -> Result<Session, ConfigError> {
        Ok(Session {
            loaded: self.session_loaded,
            user: self.session_user()?,
        })
    }

    pub fn load_feed(&self) -> Result<Vec<PostWithAuthor>, ConfigError> {
        let Some(path) = &self.feed_path else {
            return Ok(Vec::new());
        };

        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFeed {
            path: path.clone(),
            source,
        })?;
        parse_feed(&json)
    }
}
