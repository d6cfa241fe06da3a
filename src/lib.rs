//! Eugene chat - a terminal chat front-end that steers LLM web search
//! toward local government data sources.
//!
//! This library exposes the core modules for testing and reuse.

pub mod app;
pub mod config;
pub mod conversation;
pub mod input;
pub mod instructions;
pub mod llm;
pub mod logging;
pub mod markdown;
pub mod message;
pub mod source;
pub mod transcript;
pub mod ui;
