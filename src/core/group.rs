use crate::core::expert::{AgentContext, ExpertAgent};
use crate::core::prompts;
use crate::domain::experts::{experts_in, ExpertGroup};
use crate::domain::model::{search_key, AnalysisState, StateUpdate};
use crate::domain::ports::Storage;
use crate::utils::error::Result;

/// 依序執行小組專家，最後由小組協調者彙整
pub struct ExpertGroupRunner {
    group: ExpertGroup,
    experts: Vec<ExpertAgent>,
}

impl ExpertGroupRunner {
    pub fn new(group: ExpertGroup) -> Self {
        Self {
            group,
            experts: experts_in(group).map(ExpertAgent::new).collect(),
        }
    }

    pub fn group(&self) -> ExpertGroup {
        self.group
    }

    pub fn expert_ids(&self) -> Vec<&'static str> {
        self.experts.iter().map(ExpertAgent::id).collect()
    }

    /// 回傳本組所有專家分析、搜尋紀錄與小組總結
    pub async fn run<S: Storage>(&self, ctx: &AgentContext<S>, question: &str) -> StateUpdate {
        tracing::info!(
            "👥 Starting group {} ({} experts)",
            self.group.display_name(),
            self.experts.len()
        );

        let mut state = AnalysisState::new(question);
        let mut update = StateUpdate::default();

        for expert in &self.experts {
            let expert_update = expert.run(ctx, question).await;
            state.apply(expert_update.clone());
            update.merge(expert_update);
        }

        update.merge(self.summarize(ctx, &state).await);
        tracing::info!("✅ Group {} completed", self.group.display_name());
        update
    }

    pub async fn summarize<S: Storage>(
        &self,
        ctx: &AgentContext<S>,
        state: &AnalysisState,
    ) -> StateUpdate {
        let group_name = self.group.display_name();
        let question = state.question_or_default();
        tracing::debug!("Running summarizer for {} for question: {}", group_name, question);

        let summary = match self.request_summary(ctx, state, question).await {
            Ok(summary) => {
                if let Err(e) = ctx
                    .reports
                    .save_group_summary(group_name, question, &summary)
                    .await
                {
                    tracing::warn!("⚠️ Failed to save summary for {}: {}", group_name, e);
                }
                summary
            }
            Err(e) => {
                tracing::error!("❌ Error in summarizer for {}: {}", group_name, e);
                format!("Error in summary: {}", e)
            }
        };

        StateUpdate::summary(group_name, summary)
    }

    async fn request_summary<S: Storage>(
        &self,
        ctx: &AgentContext<S>,
        state: &AnalysisState,
        question: &str,
    ) -> Result<String> {
        let messages = prompts::group_summary(
            self.group.display_name(),
            question,
            &self.expert_analyses(state),
            &self.search_info(state),
        );
        ctx.model.complete(&messages).await
    }

    fn expert_analyses(&self, state: &AnalysisState) -> String {
        let mut text = String::new();
        for id in self.expert_ids() {
            if let Some(analysis) = state.analysis_of(self.group, id) {
                text.push_str(&format!("### Analysis from {}:\n{}\n\n", id, analysis));
            }
        }
        text
    }

    fn search_info(&self, state: &AnalysisState) -> String {
        let mut text = String::new();
        for id in self.expert_ids() {
            let Some(search) = state.search_results.get(&search_key(id)) else {
                continue;
            };
            if search.queries.is_empty() {
                continue;
            }
            text.push_str(&format!("\n### Search queries from {}:\n", id));
            for query in &search.queries {
                text.push_str(&format!("- {}\n", query));
            }
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::expert::tests::{context, ScriptedModel};
    use crate::core::report::tests::MockStorage;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_group_runs_all_experts_then_summary() {
        let storage = MockStorage::default();
        let model = Arc::new(ScriptedModel::new());
        let ctx = context(model.clone(), false, storage.clone());
        let runner = ExpertGroupRunner::new(ExpertGroup::MarketAnalysis);

        let mut state = AnalysisState::new("VN-Index 2025?");
        state.apply(runner.run(&ctx, "VN-Index 2025?").await);

        assert_eq!(state.groups[&ExpertGroup::MarketAnalysis].len(), 5);
        assert_eq!(
            state.group_summaries["Phân tích Thị trường (Market Analysis)"],
            "group summary"
        );
        // 5 位專家各 2 次呼叫，加上 1 次彙整
        assert_eq!(model.call_count(), 11);

        let calls = model.calls.lock().unwrap();
        let summary_prompt = &calls.last().unwrap()[1].content;
        assert!(summary_prompt.contains("### Analysis from market_analyst:\nexpert analysis"));
        assert!(summary_prompt.contains("### Search queries from technical_analyst:\n- vn-index outlook\n"));
        drop(calls);

        assert!(storage
            .get_text("group_responses/Phân tích Thị trường.txt")
            .await
            .unwrap()
            .contains("group summary"));
    }

    #[tokio::test]
    async fn test_summary_failure_and_empty_question() {
        let model = Arc::new(ScriptedModel::failing_on("group coordinator"));
        let ctx = context(model.clone(), false, MockStorage::default());
        let runner = ExpertGroupRunner::new(ExpertGroup::Strategy);

        let update = runner.summarize(&ctx, &AnalysisState::new("   ")).await;
        let summary = &update.group_summaries["Lập chiến lược (Strategy)"];
        assert!(summary.starts_with("Error in summary: "));

        let calls = model.calls.lock().unwrap();
        assert!(calls[0][1].content.contains("USER QUESTION:\nNo question provided"));
    }
}
