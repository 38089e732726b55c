pub mod config;
pub mod conversation;
pub mod formatter;
pub mod providers;
pub mod relay;
pub mod session;
pub mod store;
