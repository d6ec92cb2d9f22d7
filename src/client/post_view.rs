//! Per-post reconciliation of likes and comments.
//!
//! A [`PostState`] only ever takes whole collections from the server, either
//! from a mutation response or from a push event. Both carry the full
//! current collection, so applying them in any order, any number of times,
//! ends on the same state. Nothing is changed before the server answered.

use std::{
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use time::OffsetDateTime;
use tokio::{
    sync::{
        broadcast,
        mpsc::{unbounded_channel, UnboundedReceiver},
    },
    task::JoinHandle,
};
use tracing::{debug, warn};

use crate::structs::{
    event::{LiveEvent, LiveEventKind},
    post::{Comment, LikeSet, Post, PostAuthor, PostId, UserId},
};

use super::{event_registry::Subscription, live_channel::LiveChannel, post_service::PostService};

/// Longer descriptions are collapsed until the viewer asks for more
pub const BODY_PREVIEW_CHARS: usize = 120;

/// Reconciled states kept for slow [`PostView::changes`] receivers
const CHANGES_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentPanel {
    #[default]
    Hidden,
    Visible,
}

impl CommentPanel {
    pub fn toggled(self) -> Self {
        match self {
            CommentPanel::Hidden => CommentPanel::Visible,
            CommentPanel::Visible => CommentPanel::Hidden,
        }
    }
}

/// What became of a like or comment request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The server answered and its collection replaced the local one
    Applied,
    /// Blank comment, no request was sent
    Rejected,
    /// The request failed, the view kept its previous state
    Failed,
    /// The view was unmounted before the answer came back
    Discarded,
}

/// The client's copy of one post
#[derive(Debug, Clone, PartialEq)]
pub struct PostState {
    post_id: PostId,
    viewer: UserId,
    author: PostAuthor,
    description: String,
    image: Option<String>,
    created_at: OffsetDateTime,
    likes: LikeSet,
    comments: Vec<Comment>,
    comment_input: String,
    expanded: bool,
    comment_panel: CommentPanel,
}

impl PostState {
    pub fn new(post: Post, viewer: UserId) -> Self {
        Self {
            post_id: post.id,
            viewer,
            author: post.author,
            description: post.description,
            image: post.image,
            created_at: post.created_at,
            likes: post.like.into(),
            comments: post.comment,
            comment_input: String::new(),
            expanded: false,
            comment_panel: CommentPanel::Hidden,
        }
    }

    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    pub fn viewer(&self) -> UserId {
        self.viewer
    }

    pub fn author(&self) -> &PostAuthor {
        &self.author
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub fn likes(&self) -> &LikeSet {
        &self.likes
    }

    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    /// Whether the viewer is in the like set. There is no separate flag.
    pub fn is_liked(&self) -> bool {
        self.likes.contains(self.viewer)
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    // ***
    // Server state
    // ***

    /// Replaces the likes with the ones returned by a like request.
    /// Returns whether anything changed.
    pub fn apply_like_result(&mut self, likes: Vec<UserId>) -> bool {
        let likes = LikeSet::from(likes);
        if self.likes == likes {
            return false;
        }
        self.likes = likes;
        true
    }

    /// Replaces the comments with the ones returned by a comment request
    /// and empties the comment input.
    pub fn apply_comment_result(&mut self, comments: Vec<Comment>) -> bool {
        self.comment_input.clear();
        self.replace_comments(comments)
    }

    pub fn on_like_updated_event(&mut self, post_id: PostId, likes: Vec<UserId>) -> bool {
        if post_id != self.post_id {
            return false;
        }
        self.apply_like_result(likes)
    }

    pub fn on_comment_added_event(&mut self, post_id: PostId, comments: Vec<Comment>) -> bool {
        if post_id != self.post_id {
            return false;
        }
        self.replace_comments(comments)
    }

    pub fn apply_event(&mut self, event: &LiveEvent) -> bool {
        match event {
            LiveEvent::LikeUpdated(event) => {
                self.on_like_updated_event(event.post_id, event.likes.clone())
            }
            LiveEvent::CommentAdded(event) => {
                self.on_comment_added_event(event.post_id, event.comments.clone())
            }
        }
    }

    fn replace_comments(&mut self, comments: Vec<Comment>) -> bool {
        if self.comments == comments {
            return false;
        }
        self.comments = comments;
        true
    }

    // ***
    // Local UI state
    // ***

    pub fn comment_input(&self) -> &str {
        &self.comment_input
    }

    pub fn set_comment_input(&mut self, text: impl Into<String>) {
        self.comment_input = text.into();
    }

    /// The trimmed comment input, `None` if there is nothing to send
    pub fn pending_comment(&self) -> Option<String> {
        let content = self.comment_input.trim();
        (!content.is_empty()).then(|| content.to_string())
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_truncatable(&self) -> bool {
        self.description.chars().count() > BODY_PREVIEW_CHARS
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn toggle_more(&mut self) {
        self.expanded = !self.expanded;
    }

    /// The part of the description to show right now
    pub fn visible_body(&self) -> &str {
        if self.expanded {
            return &self.description;
        }
        match self.description.char_indices().nth(BODY_PREVIEW_CHARS) {
            Some((end, _)) => &self.description[..end],
            None => &self.description,
        }
    }

    /// Label of the show more/less toggle, if the description needs one
    pub fn more_label(&self) -> Option<&'static str> {
        if !self.is_truncatable() {
            return None;
        }
        Some(if self.expanded {
            "Read less..."
        } else {
            "Read more..."
        })
    }

    pub fn comment_panel(&self) -> CommentPanel {
        self.comment_panel
    }

    pub fn toggle_comment_panel(&mut self) {
        self.comment_panel = self.comment_panel.toggled();
    }
}

fn lock(state: &Mutex<PostState>) -> MutexGuard<'_, PostState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Applies a server update and publishes the new state when it changed
fn reconcile(
    state: &Mutex<PostState>,
    changes: &broadcast::Sender<PostState>,
    apply: impl FnOnce(&mut PostState) -> bool,
) -> bool {
    let mut state = lock(state);
    if !apply(&mut state) {
        return false;
    }
    // Nobody listening is fine
    let _ = changes.send(state.clone());
    true
}

/// A mounted post: its state, live subscriptions, and the task applying
/// pushed events.
///
/// Dropping the view unsubscribes it. Requests still in flight then find
/// no view and their answer is discarded.
pub struct PostView {
    post_id: PostId,
    state: Arc<Mutex<PostState>>,
    service: Arc<dyn PostService>,
    changes: broadcast::Sender<PostState>,
    _subscriptions: [Subscription; 2],
    pump: JoinHandle<()>,
}

impl PostView {
    /// Subscribes the post to the channel. Must run inside a tokio runtime.
    ///
    /// The viewer is the service's user, so the like request and the
    /// "liked" test always use the same id.
    pub fn mount(post: Post, channel: &LiveChannel, service: Arc<dyn PostService>) -> Self {
        let post_id = post.id;
        let state = Arc::new(Mutex::new(PostState::new(post, service.viewer())));

        let (handler, events) = unbounded_channel();
        let subscriptions = [
            channel.subscribe(LiveEventKind::LikeUpdated, handler.clone()),
            channel.subscribe(LiveEventKind::CommentAdded, handler),
        ];
        let (changes, _) = broadcast::channel(CHANGES_CAPACITY);
        let pump = tokio::spawn(pump_events(
            Arc::downgrade(&state),
            changes.clone(),
            events,
        ));
        debug!("Post {post_id} mounted");

        Self {
            post_id,
            state,
            service,
            changes,
            _subscriptions: subscriptions,
            pump,
        }
    }

    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    /// Every state reached through a server response or a push event, in
    /// order. Local UI changes are not published.
    pub fn changes(&self) -> broadcast::Receiver<PostState> {
        self.changes.subscribe()
    }

    pub fn snapshot(&self) -> PostState {
        lock(&self.state).clone()
    }

    pub fn with_state<T>(&self, f: impl FnOnce(&PostState) -> T) -> T {
        f(&lock(&self.state))
    }

    /// For local UI state: comment input, show more, comment panel
    pub fn update<T>(&self, f: impl FnOnce(&mut PostState) -> T) -> T {
        f(&mut lock(&self.state))
    }

    /// Sends a like toggle. The returned future doesn't borrow the view
    /// and may outlive it.
    pub fn toggle_like(&self) -> impl Future<Output = MutationOutcome> + Send + 'static {
        let state = Arc::downgrade(&self.state);
        let service = self.service.clone();
        let changes = self.changes.clone();
        let post_id = self.post_id;

        async move {
            let result = service.toggle_like(post_id).await;

            let Some(state) = state.upgrade() else {
                debug!("Post {post_id} unmounted, dropping like response");
                return MutationOutcome::Discarded;
            };
            match result {
                Ok(likes) => {
                    reconcile(&state, &changes, |state| state.apply_like_result(likes));
                    MutationOutcome::Applied
                }
                Err(e) => {
                    warn!("Like error on post {post_id} : {e}");
                    MutationOutcome::Failed
                }
            }
        }
    }

    /// Sends the current comment input, trimmed. A blank input is
    /// rejected here without any request.
    pub fn submit_comment(&self) -> impl Future<Output = MutationOutcome> + Send + 'static {
        let content = lock(&self.state).pending_comment();
        let state = Arc::downgrade(&self.state);
        let service = self.service.clone();
        let changes = self.changes.clone();
        let post_id = self.post_id;

        async move {
            let Some(content) = content else {
                return MutationOutcome::Rejected;
            };
            let result = service.add_comment(post_id, &content).await;

            let Some(state) = state.upgrade() else {
                debug!("Post {post_id} unmounted, dropping comment response");
                return MutationOutcome::Discarded;
            };
            match result {
                Ok(comments) => {
                    reconcile(&state, &changes, |state| {
                        state.apply_comment_result(comments)
                    });
                    MutationOutcome::Applied
                }
                Err(e) => {
                    warn!("Comment error on post {post_id} : {e}");
                    MutationOutcome::Failed
                }
            }
        }
    }
}

impl Drop for PostView {
    fn drop(&mut self) {
        self.pump.abort();
        debug!("Post {} unmounted", self.post_id);
    }
}

async fn pump_events(
    state: Weak<Mutex<PostState>>,
    changes: broadcast::Sender<PostState>,
    mut events: UnboundedReceiver<LiveEvent>,
) {
    while let Some(event) = events.recv().await {
        let Some(state) = state.upgrade() else {
            return;
        };
        if reconcile(&state, &changes, |state| state.apply_event(&event)) {
            debug!("Post {} updated by {}", event.post_id(), event.kind().name());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use async_trait::async_trait;
    use tokio::sync::oneshot;

    use super::*;
    use crate::{
        client::error::{ClientError, ClientResult},
        structs::{
            event::{CommentAdded, LikeUpdated},
            post::{CommentAuthor, CommentId},
        },
    };

    /// Toggles and appends like the real service, without the network
    struct FakePostService {
        viewer: UserId,
        likes: Mutex<Vec<UserId>>,
        comments: Mutex<Vec<Comment>>,
        calls: AtomicUsize,
        fail: bool,
        gate: Mutex<Option<oneshot::Receiver<()>>>,
    }

    impl FakePostService {
        fn new(viewer: i64, likes: &[i64]) -> Self {
            Self {
                viewer: UserId(viewer),
                likes: Mutex::new(likes.iter().copied().map(UserId).collect()),
                comments: Mutex::new(vec![]),
                calls: AtomicUsize::new(0),
                fail: false,
                gate: Mutex::new(None),
            }
        }

        fn failing(viewer: i64) -> Self {
            Self {
                fail: true,
                ..Self::new(viewer, &[])
            }
        }

        /// Holds every answer until the returned sender fires
        fn gated(viewer: i64) -> (Self, oneshot::Sender<()>) {
            let (release, gate) = oneshot::channel();
            let service = Self::new(viewer, &[]);
            *service.gate.lock().unwrap() = Some(gate);
            (service, release)
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        async fn answer(&self) -> ClientResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let gate = self.gate.lock().unwrap().take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            if self.fail {
                return Err(ClientError::HandshakeClosed);
            }
            Ok(())
        }
    }

    #[async_trait]
    impl PostService for FakePostService {
        fn viewer(&self) -> UserId {
            self.viewer
        }

        async fn toggle_like(&self, _post_id: PostId) -> ClientResult<Vec<UserId>> {
            self.answer().await?;
            let mut likes = self.likes.lock().unwrap();
            if likes.contains(&self.viewer) {
                likes.retain(|id| *id != self.viewer);
            } else {
                likes.push(self.viewer);
            }
            Ok(likes.clone())
        }

        async fn add_comment(&self, _post_id: PostId, content: &str) -> ClientResult<Vec<Comment>> {
            self.answer().await?;
            let mut comments = self.comments.lock().unwrap();
            let id = CommentId(comments.len() as i64 + 1);
            comments.push(comment(id.0, self.viewer.0, content));
            Ok(comments.clone())
        }
    }

    fn author(id: i64) -> PostAuthor {
        PostAuthor {
            id: UserId(id),
            first_name: format!("First{id}"),
            last_name: format!("Last{id}"),
            headline: String::new(),
            profile_image: None,
        }
    }

    fn comment(id: i64, user: i64, content: &str) -> Comment {
        Comment {
            id: CommentId(id),
            user: CommentAuthor {
                id: UserId(user),
                first_name: format!("First{user}"),
                last_name: format!("Last{user}"),
                profile_image: None,
            },
            content: content.to_string(),
        }
    }

    fn post(id: i64, likes: &[i64]) -> Post {
        Post {
            id: PostId(id),
            author: author(1),
            description: "A short post".to_string(),
            image: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
            like: likes.iter().copied().map(UserId).collect(),
            comment: vec![],
        }
    }

    fn users(ids: &[i64]) -> Vec<UserId> {
        ids.iter().copied().map(UserId).collect()
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    #[test]
    fn replacement_is_idempotent() {
        let mut state = PostState::new(post(1, &[1]), UserId(2));

        assert!(state.apply_like_result(users(&[1, 2])));
        let after_first = state.clone();
        assert!(!state.on_like_updated_event(PostId(1), users(&[1, 2])));
        assert_eq!(state, after_first);

        let comments = vec![comment(1, 2, "hi")];
        assert!(state.on_comment_added_event(PostId(1), comments.clone()));
        assert!(!state.apply_comment_result(comments.clone()));
        assert_eq!(state.comments(), comments.as_slice());
    }

    #[test]
    fn events_of_other_posts_are_ignored() {
        let mut a = PostState::new(post(1, &[1]), UserId(2));
        let before = a.clone();

        assert!(!a.on_like_updated_event(PostId(2), users(&[3, 4, 5])));
        assert!(!a.on_comment_added_event(PostId(2), vec![comment(1, 3, "not yours")]));
        assert_eq!(a, before);
    }

    #[test]
    fn response_and_event_converge_in_any_order() {
        let final_likes = users(&[1, 2]);
        let final_comments = vec![comment(1, 1, "first"), comment(2, 2, "second")];

        let mut response_first = PostState::new(post(1, &[1]), UserId(2));
        response_first.apply_like_result(final_likes.clone());
        response_first.on_like_updated_event(PostId(1), final_likes.clone());
        response_first.apply_comment_result(final_comments.clone());
        response_first.on_comment_added_event(PostId(1), final_comments.clone());

        let mut event_first = PostState::new(post(1, &[1]), UserId(2));
        event_first.on_like_updated_event(PostId(1), final_likes.clone());
        event_first.apply_like_result(final_likes.clone());
        event_first.on_comment_added_event(PostId(1), final_comments.clone());
        event_first.apply_comment_result(final_comments.clone());

        let mut only_one = PostState::new(post(1, &[1]), UserId(2));
        only_one.apply_like_result(final_likes);
        only_one.apply_comment_result(final_comments);

        assert_eq!(response_first, event_first);
        assert_eq!(response_first, only_one);
    }

    #[test]
    fn liked_follows_membership_only() {
        let mut state = PostState::new(post(1, &[1]), UserId(2));
        assert!(!state.is_liked());

        state.apply_like_result(users(&[1, 2, 2]));
        assert!(state.is_liked());
        assert_eq!(state.like_count(), 2);

        state.on_like_updated_event(PostId(1), users(&[1]));
        assert!(!state.is_liked());
    }

    #[test]
    fn long_descriptions_are_collapsed() {
        let mut long = post(1, &[]);
        long.description = "é".repeat(BODY_PREVIEW_CHARS + 10);
        let mut state = PostState::new(long, UserId(1));

        assert!(state.is_truncatable());
        assert!(!state.is_expanded());
        assert_eq!(state.visible_body().chars().count(), BODY_PREVIEW_CHARS);
        assert_eq!(state.more_label(), Some("Read more..."));

        state.toggle_more();
        assert_eq!(state.visible_body(), state.description());
        assert_eq!(state.more_label(), Some("Read less..."));

        let short = PostState::new(post(2, &[]), UserId(1));
        assert!(!short.is_truncatable());
        assert_eq!(short.visible_body(), "A short post");
        assert_eq!(short.more_label(), None);
    }

    #[test]
    fn exactly_the_threshold_is_not_collapsed() {
        let mut edge = post(1, &[]);
        edge.description = "a".repeat(BODY_PREVIEW_CHARS);
        let state = PostState::new(edge, UserId(1));
        assert!(!state.is_truncatable());
        assert_eq!(state.visible_body().len(), BODY_PREVIEW_CHARS);
    }

    #[test]
    fn comment_panel_only_moves_on_toggle() {
        let mut state = PostState::new(post(1, &[]), UserId(1));
        assert_eq!(state.comment_panel(), CommentPanel::Hidden);

        state.toggle_comment_panel();
        assert_eq!(state.comment_panel(), CommentPanel::Visible);

        state.on_comment_added_event(PostId(1), vec![comment(1, 2, "hey")]);
        assert_eq!(state.comment_panel(), CommentPanel::Visible);

        state.toggle_comment_panel();
        assert_eq!(state.comment_panel(), CommentPanel::Hidden);
    }

    #[tokio::test]
    async fn toggle_like_flips_the_indicator() {
        let channel = LiveChannel::offline();
        let service = Arc::new(FakePostService::new(2, &[1]));
        let view = PostView::mount(post(1, &[1]), &channel, service.clone());

        assert_eq!(view.toggle_like().await, MutationOutcome::Applied);
        assert!(view.with_state(PostState::is_liked));
        assert_eq!(view.with_state(PostState::like_count), 2);

        assert_eq!(view.toggle_like().await, MutationOutcome::Applied);
        assert!(!view.with_state(PostState::is_liked));
        assert_eq!(view.with_state(PostState::like_count), 1);
        assert_eq!(service.calls(), 2);
    }

    #[tokio::test]
    async fn matching_push_after_response_changes_nothing() {
        let channel = LiveChannel::offline();
        let service = Arc::new(FakePostService::new(2, &[1]));
        let view = PostView::mount(post(1, &[1]), &channel, service);

        assert_eq!(view.toggle_like().await, MutationOutcome::Applied);
        let after_response = view.snapshot();
        assert_eq!(after_response.like_count(), 2);
        assert!(after_response.is_liked());

        channel.dispatch(LiveEvent::LikeUpdated(LikeUpdated {
            post_id: PostId(1),
            likes: users(&[1, 2]),
        }));
        // Same-channel FIFO: once this lands, the event above was applied
        channel.dispatch(LiveEvent::CommentAdded(CommentAdded {
            post_id: PostId(1),
            comments: vec![comment(9, 1, "marker")],
        }));
        wait_until(|| view.with_state(PostState::comment_count) == 1).await;

        assert_eq!(view.with_state(|state| state.likes().clone()), *after_response.likes());
        assert_eq!(view.with_state(PostState::like_count), 2);
    }

    #[tokio::test]
    async fn pushed_events_only_reach_their_post() {
        let channel = LiveChannel::offline();
        let service = Arc::new(FakePostService::new(3, &[]));
        let a = PostView::mount(post(1, &[1]), &channel, service.clone());
        let b = PostView::mount(post(2, &[]), &channel, service);

        channel.dispatch(LiveEvent::CommentAdded(CommentAdded {
            post_id: PostId(2),
            comments: vec![comment(1, 3, "for b")],
        }));
        channel.dispatch(LiveEvent::LikeUpdated(LikeUpdated {
            post_id: PostId(1),
            likes: users(&[1, 3]),
        }));

        wait_until(|| b.with_state(PostState::comment_count) == 1).await;
        wait_until(|| a.with_state(PostState::like_count) == 2).await;

        assert_eq!(a.with_state(PostState::comment_count), 0);
        assert_eq!(b.with_state(PostState::like_count), 0);
        assert!(a.with_state(PostState::is_liked));
    }

    #[tokio::test]
    async fn blank_comment_sends_nothing() {
        let channel = LiveChannel::offline();
        let service = Arc::new(FakePostService::new(1, &[]));
        let view = PostView::mount(post(1, &[]), &channel, service.clone());

        view.update(|state| state.set_comment_input("   \n "));
        assert_eq!(view.submit_comment().await, MutationOutcome::Rejected);

        assert_eq!(service.calls(), 0);
        assert_eq!(view.with_state(PostState::comment_count), 0);
        assert_eq!(view.with_state(|state| state.comment_input().to_string()), "   \n ");
    }

    #[tokio::test]
    async fn comment_is_trimmed_and_input_cleared() {
        let channel = LiveChannel::offline();
        let service = Arc::new(FakePostService::new(1, &[]));
        let view = PostView::mount(post(1, &[]), &channel, service.clone());

        view.update(|state| state.set_comment_input("  nice post  "));
        assert_eq!(view.submit_comment().await, MutationOutcome::Applied);

        let state = view.snapshot();
        assert_eq!(state.comment_input(), "");
        assert_eq!(state.comments(), &[comment(1, 1, "nice post")]);
    }

    #[tokio::test]
    async fn failed_requests_keep_the_last_state() {
        let channel = LiveChannel::offline();
        let service = Arc::new(FakePostService::failing(2));
        let view = PostView::mount(post(1, &[1]), &channel, service);
        let before = view.snapshot();

        assert_eq!(view.toggle_like().await, MutationOutcome::Failed);

        view.update(|state| state.set_comment_input("hello"));
        assert_eq!(view.submit_comment().await, MutationOutcome::Failed);

        let after = view.snapshot();
        assert_eq!(after.likes(), before.likes());
        assert_eq!(after.comments(), before.comments());
        assert_eq!(after.comment_input(), "hello");
    }

    #[tokio::test]
    async fn late_response_after_unmount_is_discarded() {
        let channel = LiveChannel::offline();
        let (service, release) = FakePostService::gated(2);
        let service = Arc::new(service);
        let view = PostView::mount(post(1, &[1]), &channel, service.clone());

        let pending = tokio::spawn(view.toggle_like());
        wait_until(|| service.calls() == 1).await;

        drop(view);
        assert_eq!(channel.handler_count(LiveEventKind::LikeUpdated), 0);
        assert_eq!(channel.handler_count(LiveEventKind::CommentAdded), 0);

        release.send(()).unwrap();
        assert_eq!(pending.await.unwrap(), MutationOutcome::Discarded);
    }

    #[tokio::test]
    async fn worked_example() {
        // P has {U1}; U2 likes; the server answers {U1, U2} and pushes it too
        let channel = LiveChannel::offline();
        let service = Arc::new(FakePostService::new(2, &[1]));
        let view = PostView::mount(post(1, &[1]), &channel, service);

        assert!(!view.with_state(PostState::is_liked));
        assert_eq!(view.toggle_like().await, MutationOutcome::Applied);
        assert_eq!(view.with_state(PostState::like_count), 2);
        assert!(view.with_state(PostState::is_liked));

        channel.dispatch(LiveEvent::LikeUpdated(LikeUpdated {
            post_id: PostId(1),
            likes: users(&[1, 2]),
        }));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(view.with_state(PostState::like_count), 2);
        assert!(view.with_state(PostState::is_liked));
    }

    async fn next_change(changes: &mut broadcast::Receiver<PostState>) -> PostState {
        tokio::time::timeout(Duration::from_secs(5), changes.recv())
            .await
            .expect("no change published")
            .expect("change stream closed")
    }

    #[tokio::test]
    async fn every_reconciled_change_is_published() {
        let channel = LiveChannel::offline();
        let service = Arc::new(FakePostService::new(2, &[1, 3]));
        let view = PostView::mount(post(1, &[]), &channel, service);
        let mut changes = view.changes();

        // Back to back, before the view gets a chance to run
        channel.dispatch(LiveEvent::LikeUpdated(LikeUpdated {
            post_id: PostId(1),
            likes: users(&[1]),
        }));
        channel.dispatch(LiveEvent::LikeUpdated(LikeUpdated {
            post_id: PostId(1),
            likes: users(&[1, 3]),
        }));

        assert_eq!(next_change(&mut changes).await.like_count(), 1);
        assert_eq!(next_change(&mut changes).await.like_count(), 2);

        assert_eq!(view.toggle_like().await, MutationOutcome::Applied);
        let state = next_change(&mut changes).await;
        assert!(state.is_liked());
        assert_eq!(state.like_count(), 3);
    }

    #[tokio::test]
    async fn unchanged_states_are_not_published() {
        let channel = LiveChannel::offline();
        let service = Arc::new(FakePostService::new(2, &[]));
        let view = PostView::mount(post(1, &[1]), &channel, service);
        let mut changes = view.changes();

        // Same likes as the post already has, then a real change
        channel.dispatch(LiveEvent::LikeUpdated(LikeUpdated {
            post_id: PostId(1),
            likes: users(&[1]),
        }));
        channel.dispatch(LiveEvent::CommentAdded(CommentAdded {
            post_id: PostId(1),
            comments: vec![comment(1, 1, "first")],
        }));
        view.update(|state| state.toggle_comment_panel());

        let state = next_change(&mut changes).await;
        assert_eq!(state.comment_count(), 1);
        assert!(changes.try_recv().is_err());
    }
}
