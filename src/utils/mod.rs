pub mod app_error;
pub mod config;
pub mod post;
pub mod real_time_event_management;
pub mod store;
