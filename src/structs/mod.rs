pub mod event;
pub mod post;
