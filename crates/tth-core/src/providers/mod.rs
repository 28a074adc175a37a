//! Model server clients.

pub mod ollama;
pub mod shared;

pub use ollama::{OllamaClient, OllamaConfig};
pub use shared::{
    ProviderError, ProviderErrorKind, ProviderResult, ProviderStream, StreamEvent,
    resolve_base_url,
};
