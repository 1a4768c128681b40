//! LLM provider integration

pub mod azure;
pub mod retry;
pub mod traits;

pub use azure::AzureProvider;
pub use retry::RetryConfig;
pub use traits::{
    ChatMessage, CompletionRequest, CompletionResponse, LlmProvider, Role, TokenUsage,
};
