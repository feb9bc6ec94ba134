pub mod auth;
pub mod data;
pub mod server;
pub mod users;
