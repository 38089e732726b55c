//! chatrelay relays chat messages between two hosted language models.
//!
//! The crate is organized in a few layers:
//! - [`core`] owns configuration, the provider clients, the relay loop,
//!   Markdown stripping, conversation storage and the chat session that ties
//!   them together.
//! - [`ui`] holds the two front ends: a line-oriented REPL and a full-screen
//!   two-pane window.
//! - [`api`] defines the request/response payloads of the provider APIs.
//!
//! The binary (`src/main.rs`) routes through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
