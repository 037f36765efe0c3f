use crate::core::expert::AgentContext;
use crate::core::prompts;
use crate::core::synthesis::format_group_summaries;
use crate::domain::experts::{find_expert, ExpertGroup};
use crate::domain::model::{AnalysisState, StateUpdate};
use crate::domain::ports::Storage;

pub const DEFAULT_MAX_ITERATIONS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationDecision {
    Continue,
    Stop,
}

/// 達到上限即停止；否則進入下一輪並遞增 `iteration`
pub fn should_continue_iteration(state: &mut AnalysisState) -> IterationDecision {
    let max_iterations = state.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS);
    if state.iteration >= max_iterations {
        return IterationDecision::Stop;
    }
    state.iteration += 1;
    IterationDecision::Continue
}

fn group_analyses(state: &AnalysisState, group: ExpertGroup) -> String {
    state
        .groups
        .get(&group)
        .map(|experts| {
            experts
                .iter()
                .map(|(expert, analysis)| format!("### Phân tích từ {}:\n{}\n\n", expert, analysis))
                .collect()
        })
        .unwrap_or_default()
}

pub async fn group_critique<S: Storage>(
    ctx: &AgentContext<S>,
    state: &AnalysisState,
    group: ExpertGroup,
) -> StateUpdate {
    let group_name = group.display_name();
    let summary = state
        .group_summaries
        .get(group_name)
        .map(String::as_str)
        .unwrap_or_default();

    let messages = prompts::group_critique(
        group_name,
        &group_analyses(state, group),
        summary,
        state.file_name_or_default(),
    );

    let critique = match ctx.model.complete(&messages).await {
        Ok(critique) => critique,
        Err(e) => {
            tracing::error!("❌ Critic failed for {}: {}", group_name, e);
            format!("Error generating critique for {}: {}", group_name, e)
        }
    };
    StateUpdate::critique(group_name, critique)
}

pub async fn meta_critique<S: Storage>(ctx: &AgentContext<S>, state: &AnalysisState) -> StateUpdate {
    let messages = prompts::meta_critique(
        &format_group_summaries(state, "Tổng kết từ nhóm"),
        &state.final_report,
        state.file_name_or_default(),
    );

    let meta = match ctx.model.complete(&messages).await {
        Ok(meta) => meta,
        Err(e) => {
            tracing::error!("❌ Meta-critic failed: {}", e);
            format!("Error generating meta-critique: {}", e)
        }
    };
    StateUpdate {
        meta_critique: Some(meta),
        ..StateUpdate::default()
    }
}

/// 沒有相關批評時保留原分析；失敗時亦保留
pub async fn refine_expert<S: Storage>(
    ctx: &AgentContext<S>,
    state: &AnalysisState,
    expert_id: &str,
) -> StateUpdate {
    let Some(expert) = find_expert(expert_id) else {
        tracing::warn!("⚠️ Unknown expert {}, skipping refinement", expert_id);
        return StateUpdate::default();
    };
    let current = state
        .analysis_of(expert.group, expert.id)
        .unwrap_or_default()
        .to_string();

    let mut critiques = String::new();
    let group_name = expert.group.display_name();
    if let Some(critique) = state.critiques.get(group_name).filter(|c| !c.trim().is_empty()) {
        critiques.push_str(&format!("### Phê bình từ nhóm {}:\n{}\n\n", group_name, critique));
    }
    if let Some(meta) = state.meta_critique.as_ref().filter(|m| !m.trim().is_empty()) {
        critiques.push_str(&format!("### Phê bình tổng thể:\n{}\n\n", meta));
    }

    if critiques.is_empty() {
        return StateUpdate::analysis(expert.group, expert.id, current);
    }

    tracing::debug!(
        "Refining analysis for {} on file: {}",
        expert.id,
        state.file_name_or_default()
    );
    let messages = prompts::refine_expert(
        expert.system_prompt,
        state.input_data.as_deref().unwrap_or_default(),
        state.file_name_or_default(),
        &current,
        &critiques,
    );

    let refined = match ctx.model.complete(&messages).await {
        Ok(refined) => refined,
        Err(e) => {
            tracing::error!("❌ Error in refinement for {}: {}", expert.id, e);
            current
        }
    };
    StateUpdate::analysis(expert.group, expert.id, refined)
}

pub async fn refine_group_summary<S: Storage>(
    ctx: &AgentContext<S>,
    state: &AnalysisState,
    group: ExpertGroup,
) -> StateUpdate {
    let group_name = group.display_name();
    let current = state
        .group_summaries
        .get(group_name)
        .cloned()
        .unwrap_or_default();

    let Some(critique) = state
        .critiques
        .get(group_name)
        .filter(|c| !c.trim().is_empty())
    else {
        return StateUpdate::summary(group_name, current);
    };

    let messages = prompts::refine_group_summary(
        group_name,
        &group_analyses(state, group),
        &current,
        critique,
        state.file_name_or_default(),
    );

    let refined = match ctx.model.complete(&messages).await {
        Ok(refined) => {
            if let Err(e) = ctx
                .reports
                .save_group_summary(group_name, state.question_or_default(), &refined)
                .await
            {
                tracing::warn!("⚠️ Failed to save refined summary for {}: {}", group_name, e);
            }
            refined
        }
        Err(e) => {
            tracing::error!("❌ Error in summary refinement for {}: {}", group_name, e);
            current
        }
    };
    StateUpdate::summary(group_name, refined)
}

pub async fn refine_final_report<S: Storage>(
    ctx: &AgentContext<S>,
    state: &AnalysisState,
) -> StateUpdate {
    let Some(meta) = state
        .meta_critique
        .as_ref()
        .filter(|m| !m.trim().is_empty())
    else {
        return StateUpdate::report(state.final_report.clone());
    };

    let messages = prompts::refine_final_report(
        &format_group_summaries(state, "Tổng kết từ nhóm"),
        &state.final_report,
        meta,
        state.file_name_or_default(),
    );

    let refined = match ctx.model.complete(&messages).await {
        Ok(refined) => {
            if let Err(e) = ctx
                .reports
                .save_final_report(state.question_or_default(), &refined)
                .await
            {
                tracing::warn!("⚠️ Failed to save refined report: {}", e);
            }
            refined
        }
        Err(e) => {
            tracing::error!("❌ Error in final report refinement: {}", e);
            state.final_report.clone()
        }
    };
    StateUpdate::report(refined)
}

/// 一輪批評與修正：小組批評 → 總體批評 → 專家 → 小組總結 → 最終報告
pub async fn critique_round<S: Storage>(ctx: &AgentContext<S>, state: &mut AnalysisState) {
    tracing::info!("🔁 Critique round {}", state.iteration);
    let groups: Vec<ExpertGroup> = state.groups.keys().copied().collect();

    for &group in &groups {
        let update = group_critique(ctx, state, group).await;
        state.apply(update);
    }
    let update = meta_critique(ctx, state).await;
    state.apply(update);

    let experts: Vec<String> = state
        .groups
        .values()
        .flat_map(|experts| experts.keys().cloned())
        .collect();
    let mut refined = StateUpdate::default();
    for expert in &experts {
        refined.merge(refine_expert(ctx, state, expert).await);
    }
    state.apply(refined);

    for &group in &groups {
        let update = refine_group_summary(ctx, state, group).await;
        state.apply(update);
    }
    let update = refine_final_report(ctx, state).await;
    state.apply(update);
}
