use crate::domain::model::{ChatMessage, SearchHit};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn output_path(&self) -> &str;
    fn model_name(&self) -> &str;
    fn market(&self) -> &str;
    fn max_queries_per_expert(&self) -> usize;
    fn search_max_results(&self) -> usize;
    fn critique_rounds(&self) -> u32;
    fn max_concurrent_requests(&self) -> usize;
}

/// 對話模型 (OpenAI chat-completions 相容)
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;
}
