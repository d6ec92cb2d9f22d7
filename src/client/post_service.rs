use async_trait::async_trait;
use reqwest::header::COOKIE;
use tracing::debug;

use crate::{
    extractors::auth_extractor::SESSION_COOKIE,
    structs::post::{Comment, CommentResponse, LikeResponse, NewComment, Post, PostId, UserId},
};

use super::{config::ClientConfig, error::ClientResult};

/// Mutations of the post service. Both return the full, authoritative
/// collection after the change.
#[async_trait]
pub trait PostService: Send + Sync {
    /// The user every request is made as. Views test like membership
    /// against this same id.
    fn viewer(&self) -> UserId;

    /// Adds the viewer to the likes of the post, or removes them
    async fn toggle_like(&self, post_id: PostId) -> ClientResult<Vec<UserId>>;

    async fn add_comment(&self, post_id: PostId, content: &str) -> ClientResult<Vec<Comment>>;
}

/// [`PostService`] over the HTTP routes, authenticated by the session cookie
pub struct HttpPostService {
    client: reqwest::Client,
    config: ClientConfig,
    viewer: UserId,
}

impl HttpPostService {
    pub fn new(config: &ClientConfig, viewer: UserId) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
            viewer,
        })
    }

    fn session_cookie(&self) -> String {
        format!("{SESSION_COOKIE}={}", self.viewer)
    }

    pub async fn posts(&self) -> ClientResult<Vec<Post>> {
        let posts = self
            .client
            .get(self.config.api_url("/api/post"))
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Post>>()
            .await?;
        Ok(posts)
    }

    pub async fn post(&self, post_id: PostId) -> ClientResult<Post> {
        let post = self
            .client
            .get(self.config.api_url(&format!("/api/post/{post_id}")))
            .send()
            .await?
            .error_for_status()?
            .json::<Post>()
            .await?;
        Ok(post)
    }
}

#[async_trait]
impl PostService for HttpPostService {
    fn viewer(&self) -> UserId {
        self.viewer
    }

    async fn toggle_like(&self, post_id: PostId) -> ClientResult<Vec<UserId>> {
        debug!("User {} toggles like on post {post_id}", self.viewer);
        let response = self
            .client
            .get(self.config.api_url(&format!("/api/post/like/{post_id}")))
            .header(COOKIE, self.session_cookie())
            .send()
            .await?
            .error_for_status()?
            .json::<LikeResponse>()
            .await?;
        Ok(response.like)
    }

    async fn add_comment(&self, post_id: PostId, content: &str) -> ClientResult<Vec<Comment>> {
        debug!("User {} comments post {post_id}", self.viewer);
        let response = self
            .client
            .post(self.config.api_url(&format!("/api/post/comment/{post_id}")))
            .header(COOKIE, self.session_cookie())
            .json(&NewComment {
                content: content.to_string(),
            })
            .send()
            .await?
            .error_for_status()?
            .json::<CommentResponse>()
            .await?;
        Ok(response.comment)
    }
}
