use crate::core::expert::AgentContext;
use crate::core::prompts;
use crate::domain::model::{AnalysisState, StateUpdate};
use crate::domain::ports::Storage;

pub(crate) fn format_group_summaries(state: &AnalysisState, heading: &str) -> String {
    state
        .group_summaries
        .iter()
        .map(|(group, summary)| format!("### {} {}:\n{}\n\n", heading, group, summary))
        .collect()
}

/// 根據各組總結撰寫最終投資策略並保存
pub async fn final_synthesis<S: Storage>(ctx: &AgentContext<S>, state: &AnalysisState) -> StateUpdate {
    let question = state.question_or_default();
    tracing::info!("🧭 Running final synthesizer for question: {}", question);

    let messages = prompts::final_synthesis(
        question,
        &format_group_summaries(state, "Summary from"),
        &ctx.market,
    );

    let report = match ctx.model.complete(&messages).await {
        Ok(report) => {
            if let Err(e) = ctx.reports.save_final_report(question, &report).await {
                tracing::warn!("⚠️ Failed to save final report: {}", e);
            }
            report
        }
        Err(e) => {
            tracing::error!("❌ Error in final synthesizer: {}", e);
            format!("Error in final synthesis: {}", e)
        }
    };

    StateUpdate::report(report)
}
