use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::structs::post::{Comment, CommentAuthor, CommentId, Post, PostAuthor, PostId, UserId};

/// Initial content of the store, usually read from the `LIVEFEED_SEED` file
#[derive(Serialize, Deserialize, Default, Debug)]
pub struct Seed {
    #[serde(default)]
    pub users: Vec<PostAuthor>,
    #[serde(default)]
    pub posts: Vec<Post>,
}

impl Seed {
    /// Two users and two posts, used when no seed file is configured
    pub fn demo() -> Self {
        let ada = PostAuthor {
            id: UserId(1),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            headline: "Analyst".to_string(),
            profile_image: None,
        };
        let alan = PostAuthor {
            id: UserId(2),
            first_name: "Alan".to_string(),
            last_name: "Turing".to_string(),
            headline: "Mathematician".to_string(),
            profile_image: None,
        };
        let now = OffsetDateTime::now_utc();
        let posts = vec![
            Post {
                id: PostId(1),
                author: ada.clone(),
                description: "The Analytical Engine weaves algebraic patterns just as the Jacquard loom weaves flowers and leaves, and it might act upon other things besides number.".to_string(),
                image: None,
                created_at: now,
                like: vec![],
                comment: vec![],
            },
            Post {
                id: PostId(2),
                author: alan.clone(),
                description: "Can machines think?".to_string(),
                image: None,
                created_at: now,
                like: vec![ada.id],
                comment: vec![],
            },
        ];
        Self {
            users: vec![ada, alan],
            posts,
        }
    }
}

#[derive(Default)]
struct StoreData {
    posts: BTreeMap<PostId, Post>,
    users: HashMap<UserId, PostAuthor>,
}

/// In-memory posts and user profiles shared by every route
#[derive(Clone, Default)]
pub struct PostStore {
    data: Arc<RwLock<StoreData>>,
    next_comment_id: Arc<AtomicI64>,
}

impl PostStore {
    pub fn from_seed(seed: Seed) -> Self {
        let mut data = StoreData::default();
        let mut last_comment_id = 0;

        for user in seed.users {
            data.users.insert(user.id, user);
        }
        for post in seed.posts {
            // Post authors are users too, even when the seed forgot them
            data.users
                .entry(post.author.id)
                .or_insert_with(|| post.author.clone());
            for comment in &post.comment {
                last_comment_id = last_comment_id.max(comment.id.0);
            }
            data.posts.insert(post.id, post);
        }

        Self {
            data: Arc::new(RwLock::new(data)),
            next_comment_id: Arc::new(AtomicI64::new(last_comment_id + 1)),
        }
    }

    pub async fn posts(&self) -> Vec<Post> {
        self.data.read().await.posts.values().cloned().collect()
    }

    pub async fn post(&self, post_id: PostId) -> Option<Post> {
        self.data.read().await.posts.get(&post_id).cloned()
    }

    pub async fn user(&self, user_id: UserId) -> Option<PostAuthor> {
        self.data.read().await.users.get(&user_id).cloned()
    }

    /// Adds `user_id` to the likes of the post, or removes it if already there.
    /// Returns the new like sequence, `None` if the post doesn't exist.
    pub async fn toggle_like(&self, post_id: PostId, user_id: UserId) -> Option<Vec<UserId>> {
        let mut data = self.data.write().await;
        let post = data.posts.get_mut(&post_id)?;

        if post.like.contains(&user_id) {
            post.like.retain(|id| *id != user_id);
        } else {
            post.like.push(user_id);
        }

        Some(post.like.clone())
    }

    /// Appends a comment and returns the whole comment sequence of the post.
    pub async fn add_comment(
        &self,
        post_id: PostId,
        author: CommentAuthor,
        content: String,
    ) -> Option<Vec<Comment>> {
        let mut data = self.data.write().await;
        let post = data.posts.get_mut(&post_id)?;

        let id = CommentId(self.next_comment_id.fetch_add(1, Ordering::Relaxed));
        post.comment.push(Comment {
            id,
            user: author,
            content,
        });

        Some(post.comment.clone())
    }
}
