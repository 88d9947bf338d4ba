pub mod api;
pub mod auth;
pub mod extract;
pub mod poller;
pub mod router;
pub mod submit;
