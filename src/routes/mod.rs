pub mod comment_post_route;
pub mod get_posts;
pub mod like_post_route;
pub mod ws_route;
