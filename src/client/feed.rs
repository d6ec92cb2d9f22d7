use std::{collections::BTreeMap, sync::Arc};

use tracing::info;

use crate::structs::post::{Post, PostId};

use super::{live_channel::LiveChannel, post_service::PostService, post_view::PostView};

/// The posts currently rendered, one mounted [`PostView`] each
pub struct Feed {
    channel: Arc<LiveChannel>,
    service: Arc<dyn PostService>,
    views: BTreeMap<PostId, PostView>,
}

impl Feed {
    pub fn new(channel: Arc<LiveChannel>, service: Arc<dyn PostService>) -> Self {
        Self {
            channel,
            service,
            views: BTreeMap::new(),
        }
    }

    /// Mounts the posts that just appeared and unmounts the ones that left.
    /// Posts already displayed keep their local state.
    pub fn render(&mut self, posts: Vec<Post>) {
        let mut rendered = BTreeMap::new();
        for post in posts {
            let view = match self.views.remove(&post.id) {
                Some(view) => view,
                None => PostView::mount(post, &self.channel, self.service.clone()),
            };
            rendered.insert(view.post_id(), view);
        }

        let removed = self.views.len();
        // Views still here left the rendered set; dropping them unsubscribes
        self.views = rendered;
        if removed > 0 {
            info!("Unmounted {removed} post(s)");
        }
    }

    pub fn view(&self, post_id: PostId) -> Option<&PostView> {
        self.views.get(&post_id)
    }

    pub fn views(&self) -> impl Iterator<Item = &PostView> {
        self.views.values()
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
