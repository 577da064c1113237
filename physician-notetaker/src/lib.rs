pub mod completion;
pub mod config;
pub mod error;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod prompts;
pub mod service;
pub mod tasks;
pub mod telemetry;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use completion::{CompletionClient, CompletionError, CompletionOptions, RigCompletionClient};
pub use config::Config;
pub use error::{NotetakerError, Result};
pub use models::*;
pub use pipeline::NoteTaker;
pub use service::{AppState, build_router};
