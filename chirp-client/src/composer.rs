use crate::{
    api::PostsApi,
    feed::{POSTS_GET_ALL, PostsCache},
    loading::LoadingIndicator,
    notify::Notifier,
    session::SessionUser,
};
use chirp_common::model::post::{CreatePost, Post};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shown when a post fails without a more specific reason from the service.
pub const GENERIC_POST_FAILURE: &str = "Failed to post! Please try again later.";

pub const COMPOSER_PLACEHOLDER: &str = "Type some emojis!";

pub const SUBMIT_KEY: &str = "Enter";

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum SkipReason {
    EmptyDraft,
    Pending,
    SignedOut,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub enum SubmitOutcome {
    /// Nothing was sent.
    Skipped(SkipReason),
    Posted(Post),
    /// The post was rejected; carries the message shown to the user.
    Failed(String),
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum SubmitAffordance {
    Button,
    Pending(LoadingIndicator),
    Hidden,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct ComposerView {
    pub avatar_url: String,
    pub placeholder: &'static str,
    pub draft: String,
    pub input_disabled: bool,
    pub submit: SubmitAffordance,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
struct ComposerState {
    draft: String,
    pending: bool,
}

/// Draft input and submission for the signed-in user.
pub struct Composer {
    user: Option<SessionUser>,
    api: Arc<dyn PostsApi>,
    posts: Arc<PostsCache>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<ComposerState>,
}

impl Composer {
    pub fn new(
        user: Option<SessionUser>,
        api: Arc<dyn PostsApi>,
        posts: Arc<PostsCache>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            user,
            api,
            posts,
            notifier,
            state: Mutex::new(ComposerState::default()),
        }
    }

    #[must_use]
    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn draft(&self) -> String {
        self.state.lock().draft.clone()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state.lock().pending
    }

    /// Replace the draft. Ignored while a submission is pending, since the
    /// input is disabled then. Returns whether the text was taken.
    pub fn on_change(&self, text: impl Into<String>) -> bool {
        let mut state = self.state.lock();
        if state.pending {
            return false;
        }
        state.draft = text.into();
        true
    }

    pub async fn on_key_down(&self, key: &str) -> Option<SubmitOutcome> {
        if key == SUBMIT_KEY {
            Some(self.submit().await)
        } else {
            None
        }
    }

    /// Send the draft as a new post.
    ///
    /// On success the draft is cleared before the feed is invalidated. On
    /// failure the draft is kept and the user is notified.
    pub async fn submit(&self) -> SubmitOutcome {
        let Some(user) = &self.user else {
            return SubmitOutcome::Skipped(SkipReason::SignedOut);
        };

        let content = {
            let mut state = self.state.lock();
            if state.pending {
                return SubmitOutcome::Skipped(SkipReason::Pending);
            }
            if state.draft.is_empty() {
                return SubmitOutcome::Skipped(SkipReason::EmptyDraft);
            }
            state.pending = true;
            state.draft.clone()
        };

        debug!(author = %user.username, "Submitting post");
        let result = self.api.create(&CreatePost { content }).await;

        {
            let mut state = self.state.lock();
            state.pending = false;
            if result.is_ok() {
                state.draft.clear();
            }
        }

        match result {
            Ok(post) => {
                info!(post = %post.id, author = %user.username, "Posted");
                if let Err(err) = self.posts.invalidate(POSTS_GET_ALL).await {
                    warn!(error = %err, "Refreshing feed after posting failed");
                }
                SubmitOutcome::Posted(post)
            }
            Err(err) => {
                warn!(error = %err, "Posting failed");
                let message = err.content_message().unwrap_or(GENERIC_POST_FAILURE);
                self.notifier.notify(message);
                SubmitOutcome::Failed(message.to_owned())
            }
        }
    }

    /// `None` when there is no user to compose as.
    #[must_use]
    pub fn view(&self) -> Option<ComposerView> {
        let user = self.user.as_ref()?;
        let state = self.state.lock();

        let submit = if state.pending {
            SubmitAffordance::Pending(LoadingIndicator::Inline)
        } else if state.draft.is_empty() {
            SubmitAffordance::Hidden
        } else {
            SubmitAffordance::Button
        };

        Some(ComposerView {
            avatar_url: user.profile_image_url.clone(),
            placeholder: COMPOSER_PLACEHOLDER,
            draft: state.draft.clone(),
            input_disabled: state.pending,
            submit,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        api::ApiError,
        composer::{
            Composer, GENERIC_POST_FAILURE, SkipReason, SubmitAffordance, SubmitOutcome,
        },
        feed::{Feed, FeedState, POSTS_GET_ALL, PostsCache},
        loading::LoadingIndicator,
        memory::{
            InMemoryPosts,
            tests::{TestPosts, author, wait_for},
        },
        notify::tests::RecordingNotifier,
        query::QueryEvent,
        session::tests::user,
    };
    use chirp_common::model::validation::{CONTENT_FIELD, ValidationFailure};
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };
    use tokio::sync::Notify;

    struct Harness {
        api: Arc<TestPosts>,
        posts: Arc<PostsCache>,
        feed: Feed,
        notifier: Arc<RecordingNotifier>,
        composer: Arc<Composer>,
    }

    fn harness(api: TestPosts) -> Harness {
        api.inner.add_author(author("user_1", "theo"));
        api.inner.act_as(Some("user_1".into()));

        let api = Arc::new(api);
        let posts = Arc::new(PostsCache::new());
        let feed = Feed::new(api.clone(), Arc::clone(&posts));
        let notifier = Arc::new(RecordingNotifier::default());
        let composer = Arc::new(Composer::new(
            Some(user("user_1", "theo")),
            api.clone(),
            Arc::clone(&posts),
            notifier.clone(),
        ));

        Harness {
            api,
            posts,
            feed,
            notifier,
            composer,
        }
    }

    fn count_invalidations(posts: &PostsCache) -> Arc<AtomicUsize> {
        let invalidations = Arc::new(AtomicUsize::new(0));
        let invalidations_c = Arc::clone(&invalidations);
        posts.subscribe(POSTS_GET_ALL, move |event| {
            if event == QueryEvent::Invalidated {
                invalidations_c.fetch_add(1, Ordering::SeqCst);
            }
        });
        invalidations
    }

    #[tokio::test]
    async fn empty_draft_is_not_sent() {
        let h = harness(TestPosts::new(InMemoryPosts::new()));

        assert_eq!(
            h.composer.submit().await,
            SubmitOutcome::Skipped(SkipReason::EmptyDraft)
        );
        assert_eq!(h.api.create_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.composer.draft(), "");
        assert!(!h.composer.is_pending());
    }

    #[tokio::test]
    async fn success_clears_draft_and_invalidates_feed_once() {
        let h = harness(TestPosts::new(InMemoryPosts::new()));
        h.feed.mount().await;
        let invalidations = count_invalidations(&h.posts);

        assert!(h.composer.on_change("🦀🦀"));
        let outcome = h.composer.submit().await;

        let SubmitOutcome::Posted(post) = outcome else {
            panic!("expected the post to go through");
        };
        assert_eq!(post.content, "🦀🦀");
        assert_eq!(h.composer.draft(), "");
        assert_eq!(invalidations.load(Ordering::SeqCst), 1);
        assert!(h.notifier.messages().is_empty());

        let FeedState::Ready(rows) = h.feed.state() else {
            panic!("expected the feed to be loaded");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].post().id, post.id);
    }

    #[tokio::test]
    async fn structured_failure_shows_specific_message_and_keeps_draft() {
        let h = harness(TestPosts::new(InMemoryPosts::new()));
        h.api.fail_creates_with(ApiError::from(
            ValidationFailure::new().with_message(CONTENT_FIELD, "too long"),
        ));
        let invalidations = count_invalidations(&h.posts);

        h.composer.on_change("🦀".repeat(300));
        assert_eq!(
            h.composer.submit().await,
            SubmitOutcome::Failed("too long".to_owned())
        );

        assert_eq!(h.notifier.messages(), ["too long"]);
        assert_eq!(h.composer.draft(), "🦀".repeat(300));
        assert!(!h.composer.is_pending());
        assert_eq!(invalidations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unstructured_failure_shows_generic_message() {
        let h = harness(TestPosts::new(InMemoryPosts::new()));
        h.api
            .fail_creates_with(ApiError::Transport("connection reset".to_owned()));

        h.composer.on_change("gm");
        assert_eq!(
            h.composer.submit().await,
            SubmitOutcome::Failed(GENERIC_POST_FAILURE.to_owned())
        );

        assert_eq!(h.notifier.messages(), [GENERIC_POST_FAILURE]);
        assert_eq!(h.composer.draft(), "gm");
    }

    #[tokio::test]
    async fn service_validation_message_reaches_user() {
        let h = harness(TestPosts::new(InMemoryPosts::new()));

        h.composer.on_change("x".repeat(281));
        h.composer.submit().await;

        assert_eq!(
            h.notifier.messages(),
            ["String must contain at most 280 character(s)"]
        );
    }

    #[tokio::test]
    async fn double_submit_while_pending_is_ignored() {
        let gate = Arc::new(Notify::new());
        let h = harness(TestPosts::new(InMemoryPosts::new()).with_create_gate(Arc::clone(&gate)));

        h.composer.on_change("gm");
        let first = tokio::spawn({
            let composer = Arc::clone(&h.composer);
            async move { composer.submit().await }
        });
        wait_for(&h.api.create_calls, 1).await;

        assert!(h.composer.is_pending());
        assert_eq!(
            h.composer.submit().await,
            SubmitOutcome::Skipped(SkipReason::Pending)
        );
        assert!(!h.composer.on_change("gn"));

        let view = h.composer.view().unwrap();
        assert!(view.input_disabled);
        assert_eq!(
            view.submit,
            SubmitAffordance::Pending(LoadingIndicator::Inline)
        );

        gate.notify_one();
        assert!(matches!(first.await.unwrap(), SubmitOutcome::Posted(_)));
        assert_eq!(h.api.create_calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.api.inner.post_count(), 1);
        assert!(!h.composer.is_pending());
    }

    #[tokio::test]
    async fn enter_key_submits() {
        let h = harness(TestPosts::new(InMemoryPosts::new()));
        h.composer.on_change("gm");

        assert_eq!(h.composer.on_key_down("a").await, None);
        assert_eq!(h.api.create_calls.load(Ordering::SeqCst), 0);

        assert!(matches!(
            h.composer.on_key_down("Enter").await,
            Some(SubmitOutcome::Posted(_))
        ));
    }

    #[tokio::test]
    async fn submit_affordance_follows_draft() {
        let h = harness(TestPosts::new(InMemoryPosts::new()));

        let view = h.composer.view().unwrap();
        assert_eq!(view.submit, SubmitAffordance::Hidden);
        assert_eq!(view.avatar_url, "https://img.example/theo.png");
        assert!(!view.input_disabled);

        h.composer.on_change("gm");
        assert_eq!(h.composer.view().unwrap().submit, SubmitAffordance::Button);
    }

    #[tokio::test]
    async fn without_user_renders_nothing_and_sends_nothing() {
        let api = Arc::new(TestPosts::new(InMemoryPosts::new()));
        let composer = Composer::new(
            None,
            api.clone(),
            Arc::new(PostsCache::new()),
            Arc::new(RecordingNotifier::default()),
        );

        composer.on_change("gm");
        assert_eq!(composer.view(), None);
        assert_eq!(
            composer.submit().await,
            SubmitOutcome::Skipped(SkipReason::SignedOut)
        );
        assert_eq!(api.create_calls.load(Ordering::SeqCst), 0);
    }
}
