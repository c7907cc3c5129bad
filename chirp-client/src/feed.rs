use crate::{
    api::PostsApi,
    loading::LoadingIndicator,
    query::{QueryCache, QueryEvent, QueryKey, SubscriptionId},
};
use chirp_common::{
    model::{
        Id,
        author::Username,
        post::{PostMarker, PostWithAuthor},
    },
    route::Route,
    util::TimeAgo,
};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{debug, warn};

pub const POSTS_GET_ALL: QueryKey = QueryKey::new("posts.getAll");

pub const FEED_FAILURE: &str = "Something went wrong";

pub type PostsCache = QueryCache<Vec<PostWithAuthor>>;

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum FeedState {
    Loading,
    Failed,
    Ready(Arc<Vec<PostWithAuthor>>),
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum FeedView {
    Loading(LoadingIndicator),
    Failed(&'static str),
    Posts(Vec<PostView>),
}

/// One row of the feed.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct PostView {
    /// Stable identity of the row across refetches.
    pub key: Id<PostMarker>,
    pub avatar_url: String,
    pub username: Username,
    pub profile: Route,
    pub permalink: Route,
    pub time_ago: String,
    /// Shown verbatim; never interpreted as markup.
    pub content: String,
}

impl PostView {
    #[must_use]
    pub fn new(joined: &PostWithAuthor, now: OffsetDateTime) -> Self {
        let post = joined.post();
        let author = joined.author();

        Self {
            key: post.id.clone(),
            avatar_url: author.profile_image_url.clone(),
            username: author.username.clone(),
            profile: Route::AuthorProfile(author.username.clone()),
            permalink: Route::PostPermalink(post.id.clone()),
            time_ago: TimeAgo::new(post.created_at, now).to_string(),
            content: post.content.clone(),
        }
    }
}

/// The list of all posts, backed by the `posts.getAll` cache entry.
pub struct Feed {
    posts: Arc<PostsCache>,
}

impl Feed {
    /// Registers the `posts.getAll` fetcher on `posts`.
    pub fn new(api: Arc<dyn PostsApi>, posts: Arc<PostsCache>) -> Self {
        posts.register(POSTS_GET_ALL, move || {
            let api = Arc::clone(&api);
            async move { api.get_all().await }
        });

        Self { posts }
    }

    /// Load the feed unless a fresh result is already cached.
    pub async fn mount(&self) {
        debug!("Mounting feed");
        if let Err(err) = self.posts.ensure(POSTS_GET_ALL).await {
            warn!(error = %err, "Loading feed failed");
        }
    }

    #[must_use]
    pub fn state(&self) -> FeedState {
        let snapshot = self.posts.snapshot(POSTS_GET_ALL);
        match snapshot.data {
            Some(posts) => FeedState::Ready(posts),
            None if snapshot.fetching || !snapshot.fetched => FeedState::Loading,
            None => FeedState::Failed,
        }
    }

    #[must_use]
    pub fn view(&self, now: OffsetDateTime) -> FeedView {
        match self.state() {
            FeedState::Loading => FeedView::Loading(LoadingIndicator::FullPage),
            FeedState::Failed => FeedView::Failed(FEED_FAILURE),
            FeedState::Ready(posts) => FeedView::Posts(
                posts
                    .iter()
                    .map(|joined| PostView::new(joined, now))
                    .collect(),
            ),
        }
    }

    /// Observe changes to the feed's cache entry, e.g. to schedule a re-render.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(QueryEvent) + Send + Sync + 'static,
    {
        self.posts.subscribe(POSTS_GET_ALL, handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.posts.unsubscribe(POSTS_GET_ALL, id)
    }
}
