pub mod error;
pub mod post;
pub mod session;
pub mod user;
