pub mod bot;
pub mod command;
pub mod config;
pub mod conversation;
pub mod error;
pub mod handlers;
pub mod ingest;
pub mod io;
pub mod naming;
pub mod platform;
pub mod reconcile;
pub mod registry;
pub mod store;
pub mod tagging;
pub mod types;

#[cfg(test)]
mod testing;

pub use error::{ClassbotError, Result};
