use crate::core::prompts;
use crate::core::queries::extract_queries;
use crate::core::report::ReportWriter;
use crate::domain::experts::Expert;
use crate::domain::model::{ExpertSearch, SearchHit, StateUpdate};
use crate::domain::ports::{ChatModel, SearchProvider, Storage};
use crate::utils::error::Result;
use std::sync::Arc;

/// 各代理共用的執行資源
pub struct AgentContext<S: Storage> {
    pub model: Arc<dyn ChatModel>,
    pub search: Arc<dyn SearchProvider>,
    pub reports: ReportWriter<S>,
    pub market: String,
    pub max_queries: usize,
    pub max_results: usize,
}

pub struct ExpertAgent {
    expert: &'static Expert,
}

impl ExpertAgent {
    pub fn new(expert: &'static Expert) -> Self {
        Self { expert }
    }

    pub fn id(&self) -> &'static str {
        self.expert.id
    }

    /// 產生查詢、搜尋、彙整、分析並保存；任何失敗都轉為錯誤文字而不中斷流程
    pub async fn run<S: Storage>(&self, ctx: &AgentContext<S>, question: &str) -> StateUpdate {
        tracing::debug!("🧑‍💼 Running {} for question: {}", self.expert.id, question);

        match self.analyze(ctx, question).await {
            Ok((analysis, search)) => {
                StateUpdate::analysis(self.expert.group, self.expert.id, analysis)
                    .with_search(self.expert.id, search)
            }
            Err(e) => {
                tracing::error!("❌ Error in {}: {}", self.expert.id, e);
                let search = ExpertSearch {
                    error: Some(e.to_string()),
                    ..ExpertSearch::default()
                };
                StateUpdate::analysis(
                    self.expert.group,
                    self.expert.id,
                    format!("Error in analysis: {}", e),
                )
                .with_search(self.expert.id, search)
            }
        }
    }

    async fn analyze<S: Storage>(
        &self,
        ctx: &AgentContext<S>,
        question: &str,
    ) -> Result<(String, ExpertSearch)> {
        let queries = self.generate_search_queries(ctx, question).await?;
        let results = self.perform_searches(ctx, &queries).await;
        let compiled = prompts::compile_search_results(&results);

        let messages = prompts::expert_analysis(
            self.expert.system_prompt,
            question,
            &compiled,
            self.expert.id,
            &ctx.market,
        );
        let analysis = ctx.model.complete(&messages).await?;

        ctx.reports
            .save_expert_analysis(self.expert.id, question, &analysis)
            .await?;

        Ok((
            analysis,
            ExpertSearch {
                queries,
                results,
                error: None,
            },
        ))
    }

    async fn generate_search_queries<S: Storage>(
        &self,
        ctx: &AgentContext<S>,
        question: &str,
    ) -> Result<Vec<String>> {
        let messages = prompts::query_generation(
            self.expert.system_prompt,
            question,
            self.expert.id,
            &ctx.market,
        );
        let response = ctx.model.complete(&messages).await?;
        Ok(extract_queries(&response, ctx.max_queries))
    }

    /// 單一查詢失敗只記錄，不影響其他查詢
    async fn perform_searches<S: Storage>(
        &self,
        ctx: &AgentContext<S>,
        queries: &[String],
    ) -> Vec<SearchHit> {
        let mut all_results = Vec::new();

        for (i, query) in queries.iter().enumerate() {
            tracing::info!(
                "🔎 [{}] Searching ({}/{}): {}",
                self.expert.id,
                i + 1,
                queries.len(),
                query
            );
            match ctx.search.search(query, ctx.max_results).await {
                Ok(results) => {
                    tracing::debug!("  Found {} results", results.len());
                    all_results.extend(results);
                }
                Err(e) => tracing::warn!("  Search error: {}", e),
            }
        }

        all_results
    }
}
