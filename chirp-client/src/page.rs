//! The home page: session gate, header affordances, composer and feed.

use crate::{
    api::PostsApi,
    composer::{Composer, ComposerView},
    feed::{Feed, FeedView, PostsCache},
    notify::Notifier,
    session::{PageState, SessionProvider},
};
use parking_lot::Mutex;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::debug;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum HeaderView {
    SignIn,
    SignOut,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum PageView {
    /// Empty frame shown until the session provider has loaded.
    Placeholder,
    Loaded {
        header: HeaderView,
        composer: Option<ComposerView>,
        feed: FeedView,
    },
}

pub struct Home {
    session: Arc<dyn SessionProvider>,
    api: Arc<dyn PostsApi>,
    notifier: Arc<dyn Notifier>,
    posts: Arc<PostsCache>,
    feed: Feed,
    composer: Mutex<Option<Arc<Composer>>>,
}

impl Home {
    pub fn new(
        session: Arc<dyn SessionProvider>,
        api: Arc<dyn PostsApi>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let posts = Arc::new(PostsCache::new());
        let feed = Feed::new(Arc::clone(&api), Arc::clone(&posts));

        Self {
            session,
            api,
            notifier,
            posts,
            feed,
            composer: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn state(&self) -> PageState {
        PageState::from(&self.session.session())
    }

    #[must_use]
    pub fn feed(&self) -> &Feed {
        &self.feed
    }

    /// Issue the page's requests. Does nothing until the session has loaded.
    pub async fn mount(&self) {
        if self.state() == PageState::Unloaded {
            debug!("Session not loaded yet, deferring page requests");
            return;
        }
        self.feed.mount().await;
    }

    /// The composer for the signed-in user, if any.
    ///
    /// The same composer, and with it the draft, is handed out for as long as
    /// the same user stays signed in.
    #[must_use]
    pub fn composer(&self) -> Option<Arc<Composer>> {
        self.composer_for(&self.state())
    }

    /// The same composer, and with it the draft, is handed out for as long as
    /// the same user stays signed in.
    fn composer_for(&self, state: &PageState) -> Option<Arc<Composer>> {
        let mut slot = self.composer.lock();

        let PageState::SignedIn(user) = state else {
            *slot = None;
            return None;
        };

        if let Some(composer) = slot.as_ref()
            && composer.user() == Some(user)
        {
            return Some(Arc::clone(composer));
        }

        debug!(username = %user.username, "Creating composer");
        let composer = Arc::new(Composer::new(
            Some(user.clone()),
            Arc::clone(&self.api),
            Arc::clone(&self.posts),
            Arc::clone(&self.notifier),
        ));
        *slot = Some(Arc::clone(&composer));
        Some(composer)
    }

    pub fn sign_in(&self) {
        self.session.sign_in();
    }

    pub fn sign_out(&self) {
        self.session.sign_out();
    }

    #[must_use]
    pub fn view(&self, now: OffsetDateTime) -> PageView {
        let state = self.state();
        let header = match state {
            PageState::Unloaded => return PageView::Placeholder,
            PageState::SignedOut => HeaderView::SignIn,
            PageState::SignedIn(_) => HeaderView::SignOut,
        };

        PageView::Loaded {
            header,
            composer: self
                .composer_for(&state)
                .and_then(|composer| composer.view()),
            feed: self.feed.view(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        composer::SubmitOutcome,
        feed::FeedView,
        memory::{
            InMemoryPosts,
            tests::{EPOCH, TestPosts, author, joined},
        },
        notify::tests::RecordingNotifier,
        page::{HeaderView, Home, PageView},
        query::QueryEvent,
        session::{MemorySession, PageState, Session, SessionProvider, tests::user},
    };
    use parking_lot::Mutex;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    /// Reports signed out on the first read and signed in on every later one.
    #[derive(Default)]
    struct SigningInSession {
        reads: AtomicUsize,
    }

    impl SessionProvider for SigningInSession {
        fn session(&self) -> Session {
            if self.reads.fetch_add(1, Ordering::SeqCst) == 0 {
                Session::signed_out()
            } else {
                Session::signed_in(user("user_1", "theo"))
            }
        }

        fn sign_in(&self) {}

        fn sign_out(&self) {}
    }

    fn home(session: Session) -> (Home, Arc<TestPosts>, Arc<MemorySession>) {
        let theo = author("user_1", "theo");
        let inner = InMemoryPosts::with_feed([joined("p1", "gm", 0, &theo)]);
        inner.act_as(Some(theo.id.clone()));

        let api = Arc::new(TestPosts::new(inner));
        let session = Arc::new(MemorySession::new(session, Some(user("user_1", "theo"))));
        let home = Home::new(
            session.clone(),
            api.clone(),
            Arc::new(RecordingNotifier::default()),
        );
        (home, api, session)
    }

    #[tokio::test]
    async fn unloaded_session_renders_placeholder_without_requests() {
        let (home, api, _) = home(Session::unloaded());

        home.mount().await;

        assert_eq!(home.view(EPOCH), PageView::Placeholder);
        assert!(home.composer().is_none());
        assert_eq!(api.get_all_calls.load(Ordering::SeqCst), 0);
        assert_eq!(api.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn signed_out_shows_sign_in_and_feed() {
        let (home, api, _) = home(Session::signed_out());

        home.mount().await;

        let PageView::Loaded {
            header,
            composer,
            feed,
        } = home.view(EPOCH)
        else {
            panic!("expected a loaded page");
        };
        assert_eq!(header, HeaderView::SignIn);
        assert_eq!(composer, None);
        assert!(matches!(feed, FeedView::Posts(rows) if rows.len() == 1));
        assert_eq!(api.get_all_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn signed_in_shows_sign_out_composer_and_feed() {
        let (home, _, _) = home(Session::signed_in(user("user_1", "theo")));

        home.mount().await;

        let PageView::Loaded {
            header,
            composer,
            feed,
        } = home.view(EPOCH)
        else {
            panic!("expected a loaded page");
        };
        assert_eq!(header, HeaderView::SignOut);
        assert!(composer.is_some());
        assert!(matches!(feed, FeedView::Posts(_)));
    }

    #[tokio::test]
    async fn late_loading_session_never_flashes_signed_out() {
        let (home, api, session) = home(Session {
            loaded: false,
            user: Some(user("user_1", "theo")),
        });

        home.mount().await;
        assert_eq!(home.view(EPOCH), PageView::Placeholder);

        session.set_loaded(true);
        home.mount().await;

        assert_eq!(home.state(), PageState::SignedIn(user("user_1", "theo")));
        assert!(matches!(
            home.view(EPOCH),
            PageView::Loaded {
                header: HeaderView::SignOut,
                composer: Some(_),
                ..
            }
        ));
        assert_eq!(api.get_all_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn composer_survives_rerenders_and_resets_on_sign_out() {
        let (home, _, _) = home(Session::signed_in(user("user_1", "theo")));

        let composer = home.composer().unwrap();
        composer.on_change("gm");
        assert_eq!(home.composer().unwrap().draft(), "gm");

        home.sign_out();
        assert!(home.composer().is_none());
        assert!(matches!(
            home.view(EPOCH),
            PageView::Loaded {
                header: HeaderView::SignIn,
                composer: None,
                ..
            }
        ));

        home.sign_in();
        assert_eq!(home.composer().unwrap().draft(), "");
    }

    #[tokio::test]
    async fn posting_refreshes_the_feed() {
        let (home, _, _) = home(Session::signed_in(user("user_1", "theo")));
        home.mount().await;

        let composer = home.composer().unwrap();
        composer.on_change("🦀");
        let SubmitOutcome::Posted(post) = composer.submit().await else {
            panic!("expected the post to go through");
        };

        let PageView::Loaded {
            feed: FeedView::Posts(rows),
            ..
        } = home.view(post.created_at)
        else {
            panic!("expected feed rows");
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key, post.id);
        assert_eq!(rows[0].time_ago, "a few seconds ago");
    }

    #[tokio::test]
    async fn one_frame_reads_the_session_once() {
        let session = Arc::new(SigningInSession::default());
        let home = Home::new(
            session.clone(),
            Arc::new(TestPosts::new(InMemoryPosts::new())),
            Arc::new(RecordingNotifier::default()),
        );

        let view = home.view(EPOCH);

        assert_eq!(session.reads.load(Ordering::SeqCst), 1);
        assert!(matches!(
            view,
            PageView::Loaded {
                header: HeaderView::SignIn,
                composer: None,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn feed_subscribers_see_post_invalidation() {
        let (home, _, _) = home(Session::signed_in(user("user_1", "theo")));
        home.mount().await;

        let events = Arc::new(Mutex::new(Vec::new()));
        let events_c = Arc::clone(&events);
        let id = home
            .feed()
            .subscribe(move |event| events_c.lock().push(event));

        let composer = home.composer().unwrap();
        composer.on_change("gm");
        composer.submit().await;

        assert_eq!(
            *events.lock(),
            [
                QueryEvent::Invalidated,
                QueryEvent::Fetching,
                QueryEvent::Settled
            ]
        );

        assert!(home.feed().unsubscribe(id));
        composer.on_change("gn");
        composer.submit().await;
        assert_eq!(events.lock().len(), 3);
    }
}
