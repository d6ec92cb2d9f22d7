use std::collections::BTreeSet;
use std::fmt::Display;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct PostId(pub i64);

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct UserId(pub i64);

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct CommentId(pub i64);

impl Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Public profile of the user who published a post
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PostAuthor {
    #[serde(alias = "_id")]
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub profile_image: Option<String>,
}

impl PostAuthor {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// The reduced profile embedded in every comment
    pub fn comment_author(&self) -> CommentAuthor {
        CommentAuthor {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            profile_image: self.profile_image.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommentAuthor {
    #[serde(alias = "_id")]
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub profile_image: Option<String>,
}

/// A comment never changes once the server created it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    #[serde(alias = "_id")]
    pub id: CommentId,
    pub user: CommentAuthor,
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(alias = "_id")]
    pub id: PostId,
    pub author: PostAuthor,
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default)]
    pub like: Vec<UserId>,
    #[serde(default)]
    pub comment: Vec<Comment>,
}

/// Users who liked a post, as held by a client.
///
/// The server sends likes as a sequence, only membership matters here,
/// so duplicates collapse and the order is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LikeSet(BTreeSet<UserId>);

impl LikeSet {
    pub fn contains(&self, user: UserId) -> bool {
        self.0.contains(&user)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<UserId> for LikeSet {
    fn from_iter<I: IntoIterator<Item = UserId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<UserId>> for LikeSet {
    fn from(likes: Vec<UserId>) -> Self {
        likes.into_iter().collect()
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LikeResponse {
    pub like: Vec<UserId>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CommentResponse {
    pub comment: Vec<Comment>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct NewComment {
    pub content: String,
}
