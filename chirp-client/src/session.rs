use chirp_common::model::{
    Id,
    author::{Author, AuthorMarker, Username},
};
use parking_lot::Mutex;
use tracing::debug;

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct SessionUser {
    pub id: Id<AuthorMarker>,
    pub username: Username,
    pub profile_image_url: String,
}

impl SessionUser {
    /// The public profile the posts service knows this user by.
    #[must_use]
    pub fn to_author(&self) -> Author {
        Author {
            id: self.id.clone(),
            username: self.username.clone(),
            profile_image_url: self.profile_image_url.clone(),
        }
    }
}

/// What the identity provider currently reports.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct Session {
    pub loaded: bool,
    pub user: Option<SessionUser>,
}

impl Session {
    #[must_use]
    pub fn unloaded() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn signed_out() -> Self {
        Self {
            loaded: true,
            user: None,
        }
    }

    #[must_use]
    pub fn signed_in(user: SessionUser) -> Self {
        Self {
            loaded: true,
            user: Some(user),
        }
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.loaded && self.user.is_some()
    }
}

/// The identity provider as seen by the client. Sign-in and sign-out are
/// opaque triggers; their effect is only observed through `session`.
pub trait SessionProvider: Send + Sync {
    fn session(&self) -> Session;

    fn sign_in(&self);

    fn sign_out(&self);
}

/// Which chrome the page shows.
///
/// Derived from the provider's `loaded` flag first, so a signed-in user never
/// sees a signed-out frame while the provider is still starting up.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub enum PageState {
    Unloaded,
    SignedOut,
    SignedIn(SessionUser),
}

impl From<&Session> for PageState {
    fn from(session: &Session) -> Self {
        match session {
            Session { loaded: false, .. } => PageState::Unloaded,
            Session {
                loaded: true,
                user: None,
            } => PageState::SignedOut,
            Session {
                loaded: true,
                user: Some(user),
            } => PageState::SignedIn(user.clone()),
        }
    }
}

/// In-process identity provider: signs in as a fixed account.
#[derive(Debug)]
pub struct MemorySession {
    account: Option<SessionUser>,
    session: Mutex<Session>,
}

impl MemorySession {
    #[must_use]
    pub fn new(session: Session, account: Option<SessionUser>) -> Self {
        let account = account.or_else(|| session.user.clone());
        Self {
            account,
            session: Mutex::new(session),
        }
    }

    pub fn set_loaded(&self, loaded: bool) {
        self.session.lock().loaded = loaded;
    }
}

impl SessionProvider for MemorySession {
    fn session(&self) -> Session {
        self.session.lock().clone()
    }

    fn sign_in(&self) {
        let mut session = self.session.lock();
        if let Some(account) = &self.account {
            debug!(username = %account.username, "Signing in");
            session.user = Some(account.clone());
        } else {
            debug!("No account to sign in with");
        }
    }

    fn sign_out(&self) {
        debug!("Signing out");
        self.session.lock().user = None;
    }
}
