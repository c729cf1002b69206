pub mod agent;
pub mod analysis;
pub mod config;
pub mod conversation;
pub mod error;
pub mod llm_client;
pub mod prompts;
pub mod search;
pub mod server;
pub mod sse;
pub mod tool_registry;
pub mod types;
pub mod utils;

#[cfg(test)]
mod mocks;
#[cfg(test)]
mod tests;
