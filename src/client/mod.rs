//! Client side of the live feed: one shared push connection per session
//! and a reconciler per displayed post.
pub mod config;
pub mod error;
pub mod event_registry;
pub mod feed;
pub mod live_channel;
pub mod post_service;
pub mod post_view;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use live_channel::{ensure_connected, LiveChannel};
pub use post_service::{HttpPostService, PostService};
pub use post_view::{MutationOutcome, PostState, PostView};
