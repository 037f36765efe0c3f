// Adapters layer: concrete implementations of the domain ports (LLM, web search, filesystem).

pub mod openai;
pub mod search;
pub mod storage;

pub use openai::OpenAiChat;
pub use search::{DuckDuckGoSearch, TopicalSearch};
pub use storage::LocalStorage;
