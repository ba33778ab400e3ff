use std::sync::Arc;

use huddle_core::config::BatchSettings;
use huddle_core::domain::Post;
use huddle_core::store::UserStore;
use tracing::debug;

use crate::batcher::{BatchKind, IdBatcher};
use crate::client::BulkFetcher;
use crate::observe::FlushObserver;

/// Inspects incoming posts and queues author ids on the per-kind batchers.
///
/// Profiles are queued only when missing from the store. Statuses are queued
/// for every non-self author whenever status batching is enabled: the server
/// pushes no presence updates for other users, so a cached status says
/// nothing about the current one.
pub struct PostBatchOrchestrator {
    store: Arc<UserStore>,
    profiles: Arc<IdBatcher>,
    statuses: Arc<IdBatcher>,
    status_batching_enabled: bool,
}

impl PostBatchOrchestrator {
    pub fn new(
        settings: &BatchSettings,
        store: Arc<UserStore>,
        fetcher: Arc<dyn BulkFetcher>,
        observer: Arc<dyn FlushObserver>,
    ) -> Self {
        let profiles = IdBatcher::new(
            BatchKind::Profiles,
            settings.max_batch,
            settings.profiles_flush_interval,
            Arc::clone(&fetcher),
            Arc::clone(&store),
            Arc::clone(&observer),
        );
        let statuses = IdBatcher::new(
            BatchKind::Statuses,
            settings.max_batch,
            settings.statuses_flush_interval,
            fetcher,
            Arc::clone(&store),
            observer,
        );

        Self { store, profiles, statuses, status_batching_enabled: settings.enable_status_batching }
    }

    /// Queues author ids for every post not written by the current user.
    /// Returns whether anything was queued; callers only use this for
    /// instrumentation.
    pub fn on_incoming_posts(&self, posts: &[Post]) -> bool {
        if posts.is_empty() {
            return false;
        }

        let current_user = self.store.current_user_id();
        let mut queued = false;
        for post in posts {
            if current_user.as_ref() == Some(&post.user_id) {
                continue;
            }

            if !self.store.has_profile(&post.user_id) {
                self.profiles.add(post.user_id.clone());
                queued = true;
            }

            if self.status_batching_enabled {
                self.statuses.add(post.user_id.clone());
                queued = true;
            }
        }

        debug!(
            event_name = "fetch.orchestrator.posts_inspected",
            posts = posts.len(),
            queued,
            pending_profiles = self.profiles.pending_len(),
            pending_statuses = self.statuses.pending_len(),
            "inspected incoming posts for missing user data"
        );
        queued
    }

    pub fn profiles(&self) -> &Arc<IdBatcher> {
        &self.profiles
    }

    pub fn statuses(&self) -> &Arc<IdBatcher> {
        &self.statuses
    }

    /// Teardown hook for logout/unload: stops the profiles flush timer.
    pub fn cleanup_profiles_interval(&self) {
        self.profiles.cleanup();
    }

    /// Teardown hook for logout/unload: stops the statuses flush timer.
    pub fn cleanup_statuses_interval(&self) {
        self.statuses.cleanup();
    }

    pub fn cleanup(&self) {
        self.cleanup_profiles_interval();
        self.cleanup_statuses_interval();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use huddle_core::config::BatchSettings;
    use huddle_core::domain::{Post, UserId, UserProfile};
    use huddle_core::store::UserStore;

    use super::PostBatchOrchestrator;
    use crate::batcher::tests::{CountingObserver, RecordingFetcher};

    fn post(id: &str, author: &str) -> Post {
        Post::new(id, "ch-general", author, "hello there")
    }

    fn orchestrator_with(
        settings: BatchSettings,
        store: Arc<UserStore>,
        fetcher: Arc<RecordingFetcher>,
    ) -> PostBatchOrchestrator {
        PostBatchOrchestrator::new(
            &settings,
            store,
            fetcher,
            Arc::new(CountingObserver::default()),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn empty_input_short_circuits() {
        let fetcher = Arc::new(RecordingFetcher::default());
        let orchestrator = orchestrator_with(
            BatchSettings::default(),
            Arc::new(UserStore::new()),
            Arc::clone(&fetcher),
        );

        assert!(!orchestrator.on_incoming_posts(&[]));
        assert_eq!(orchestrator.profiles().pending_len(), 0);
        assert_eq!(orchestrator.statuses().pending_len(), 0);
        assert!(!orchestrator.profiles().timer_active());
        assert!(!orchestrator.statuses().timer_active());
    }

    #[tokio::test(start_paused = true)]
    async fn self_authored_posts_queue_nothing() {
        let fetcher = Arc::new(RecordingFetcher::default());
        let store = Arc::new(UserStore::with_current_user(UserId::from("u-me")));
        let orchestrator =
            orchestrator_with(BatchSettings::default(), store, Arc::clone(&fetcher));

        let posts =
            vec![post("p-1", "u-me"), post("p-2", "u-me"), post("p-3", "u-me")];
        assert!(!orchestrator.on_incoming_posts(&posts));
        assert_eq!(orchestrator.profiles().pending_len(), 0);
        assert_eq!(orchestrator.statuses().pending_len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_authors_are_queued_for_profiles_and_statuses() {
        let fetcher = Arc::new(RecordingFetcher::default());
        let store = Arc::new(UserStore::with_current_user(UserId::from("u-me")));
        let orchestrator = orchestrator_with(
            BatchSettings::default(),
            Arc::clone(&store),
            Arc::clone(&fetcher),
        );

        let posts = vec![post("p-1", "u-ayla"), post("p-2", "u-bram")];
        assert!(orchestrator.on_incoming_posts(&posts));
        assert_eq!(orchestrator.profiles().pending_len(), 2);
        assert_eq!(orchestrator.statuses().pending_len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cached_profiles_still_get_status_refreshes() {
        let fetcher = Arc::new(RecordingFetcher::default());
        let store = Arc::new(UserStore::with_current_user(UserId::from("u-me")));
        store.receive_profiles(vec![UserProfile {
            id: UserId::from("u-known"),
            username: "known".to_owned(),
            nickname: String::new(),
            first_name: String::new(),
            last_name: String::new(),
        }]);
        let orchestrator = orchestrator_with(
            BatchSettings::default(),
            Arc::clone(&store),
            Arc::clone(&fetcher),
        );

        assert!(orchestrator.on_incoming_posts(&[post("p-1", "u-known")]));
        assert_eq!(orchestrator.profiles().pending_len(), 0, "profile is already cached");
        assert_eq!(orchestrator.statuses().pending_len(), 1, "statuses have no push channel");
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_status_batching_queues_profiles_only() {
        let fetcher = Arc::new(RecordingFetcher::default());
        let store = Arc::new(UserStore::with_current_user(UserId::from("u-me")));
        let settings =
            BatchSettings { enable_status_batching: false, ..BatchSettings::default() };
        let orchestrator = orchestrator_with(settings, store, Arc::clone(&fetcher));

        assert!(orchestrator.on_incoming_posts(&[post("p-1", "u-ayla")]));
        assert_eq!(orchestrator.profiles().pending_len(), 1);
        assert_eq!(orchestrator.statuses().pending_len(), 0);
        assert!(!orchestrator.statuses().timer_active());
    }

    #[tokio::test(start_paused = true)]
    async fn repeat_authors_collapse_in_both_pending_sets() {
        let fetcher = Arc::new(RecordingFetcher::default());
        let store = Arc::new(UserStore::with_current_user(UserId::from("u-me")));
        let orchestrator =
            orchestrator_with(BatchSettings::default(), store, Arc::clone(&fetcher));

        let posts = vec![post("p-1", "u-ayla"), post("p-2", "u-ayla"), post("p-3", "u-ayla")];
        assert!(orchestrator.on_incoming_posts(&posts));
        assert_eq!(orchestrator.profiles().pending_len(), 1);
        assert_eq!(orchestrator.statuses().pending_len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cleanup_hooks_stop_both_timers() {
        let fetcher = Arc::new(RecordingFetcher::default());
        let store = Arc::new(UserStore::with_current_user(UserId::from("u-me")));
        let orchestrator =
            orchestrator_with(BatchSettings::default(), store, Arc::clone(&fetcher));

        orchestrator.on_incoming_posts(&[post("p-1", "u-ayla")]);
        assert!(orchestrator.profiles().timer_active());
        assert!(orchestrator.statuses().timer_active());

        orchestrator.cleanup();
        assert!(!orchestrator.profiles().timer_active());
        assert!(!orchestrator.statuses().timer_active());

        orchestrator.cleanup();
    }
}
