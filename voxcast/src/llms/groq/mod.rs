//! Groq API client implementation.
//!
//! Groq serves Llama models behind an OpenAI-compatible chat completions
//! endpoint. Only non-streaming, single-message completions are used here.

mod chat;
mod client;
mod config;
mod types;

pub use client::Groq;
pub use config::GroqConfig;
