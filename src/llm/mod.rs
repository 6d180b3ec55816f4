//! Completion model integration
//!
//! - **client**: HTTP client for OpenAI-compatible completion endpoints
//! - **prompts**: Prompt templates for chat, code generation and analysis
//!
//! Request handlers talk to the model through the [`CodeAssistant`] trait,
//! so tests can swap in a scripted implementation.

pub mod client;
pub mod prompts;

use async_trait::async_trait;

pub use client::{CompletionMessage, LlmClient, LlmError, MessageRole};

use crate::sandbox::{SimulationKind, SimulationParameters};

/// Operations the assistant needs from a language model
#[async_trait]
pub trait CodeAssistant: Send + Sync {
    /// Answer a chat message given prior history
    async fn chat(&self, message: &str, history: &[CompletionMessage]) -> Result<String, LlmError>;

    /// Generate Move source for the given parameters
    async fn generate_code(&self, params: &SimulationParameters) -> Result<String, LlmError>;

    /// Review code for issues and improvements
    async fn analyze_code(&self, code: &str, kind: SimulationKind) -> Result<String, LlmError>;

    async fn explain_concept(&self, concept: &str) -> Result<String, LlmError>;

    async fn recommend(&self, context: &str) -> Result<String, LlmError>;
}
