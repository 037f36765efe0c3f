use crate::config::AppConfig;
use crate::core::critic::{critique_round, should_continue_iteration, IterationDecision};
use crate::core::dataset::load_dataset;
use crate::core::expert::AgentContext;
use crate::core::group::ExpertGroupRunner;
use crate::core::report::ReportWriter;
use crate::core::synthesis::final_synthesis;
use crate::domain::experts::{experts_in, ExpertGroup};
use crate::domain::model::AnalysisState;
use crate::domain::ports::{ChatModel, ConfigProvider, SearchProvider, Storage};
use crate::utils::error::{FinError, Result};
use crate::utils::monitor::{StageClock, StageTiming, SystemMonitor};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

/// 執行結果
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub state: AnalysisState,
    pub output_dir: String,
    pub timings: Vec<StageTiming>,
    pub archive: Option<String>,
    pub total_duration: Duration,
}

/// `--dry-run` 時輸出的執行計畫
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionPlan {
    pub model: String,
    pub market: String,
    pub concurrent_groups: Vec<PlannedGroup>,
    pub strategy_group: PlannedGroup,
    pub critique_rounds: u32,
    pub max_concurrent_requests: usize,
    pub output_dir: String,
    pub archive: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannedGroup {
    pub name: String,
    pub experts: Vec<String>,
}

impl PlannedGroup {
    fn of(group: ExpertGroup) -> Self {
        Self {
            name: group.display_name().to_string(),
            experts: experts_in(group).map(|e| e.id.to_string()).collect(),
        }
    }
}

impl ExecutionPlan {
    pub fn expert_count(&self) -> usize {
        self.concurrent_groups
            .iter()
            .chain(std::iter::once(&self.strategy_group))
            .map(|g| g.experts.len())
            .sum()
    }
}

/// 多專家分析流程：並行分析組 → 策略組 → 最終綜合 → 批評循環 → 保存
pub struct Orchestrator<S: Storage + 'static> {
    ctx: Arc<AgentContext<S>>,
    groups: Vec<ExpertGroup>,
    model_name: String,
    critique_rounds: u32,
    max_concurrent_requests: usize,
    data_file: Option<String>,
    max_data_rows: usize,
    state_file: String,
    archive: bool,
    output_dir: String,
    monitor: SystemMonitor,
}

impl<S: Storage + 'static> Orchestrator<S> {
    pub fn new(
        config: &AppConfig,
        model: Arc<dyn ChatModel>,
        search: Arc<dyn SearchProvider>,
        storage: S,
    ) -> Result<Self> {
        let ctx = AgentContext {
            model,
            search,
            reports: ReportWriter::new(storage, config.output.save_expert_responses),
            market: config.market().to_string(),
            max_queries: config.max_queries_per_expert(),
            max_results: config.search_max_results(),
        };

        Ok(Self {
            ctx: Arc::new(ctx),
            groups: config.analysis_groups()?,
            model_name: config.model_name().to_string(),
            critique_rounds: config.critique_rounds(),
            max_concurrent_requests: config.max_concurrent_requests(),
            data_file: config.analysis.data_file.clone(),
            max_data_rows: config.analysis.max_data_rows,
            state_file: config.output.state_file.clone(),
            archive: config.output.archive,
            output_dir: config.output_path().to_string(),
            monitor: SystemMonitor::default(),
        })
    }

    pub fn with_monitoring(mut self, enabled: bool) -> Self {
        self.monitor = SystemMonitor::new(enabled);
        self
    }

    pub fn plan(&self) -> ExecutionPlan {
        ExecutionPlan {
            model: self.model_name.clone(),
            market: self.ctx.market.clone(),
            concurrent_groups: self.groups.iter().copied().map(PlannedGroup::of).collect(),
            strategy_group: PlannedGroup::of(ExpertGroup::Strategy),
            critique_rounds: self.critique_rounds,
            max_concurrent_requests: self.max_concurrent_requests,
            output_dir: self.output_dir.clone(),
            archive: self.archive,
        }
    }

    /// 只列出計畫，不呼叫模型
    pub fn dry_run(&self) -> ExecutionPlan {
        let plan = self.plan();
        tracing::info!("🧪 Dry run with model {}", plan.model);
        for group in plan
            .concurrent_groups
            .iter()
            .chain(std::iter::once(&plan.strategy_group))
        {
            tracing::info!("  {} -> {}", group.name, group.experts.join(", "));
        }
        plan
    }

    pub async fn run(&self, question: &str) -> Result<AnalysisOutcome> {
        let started = Instant::now();
        let mut clock = StageClock::new();
        self.monitor.log_stats("Analysis started");

        let stage = Instant::now();
        let mut state = self.initialize(question).await?;
        clock.record("initialize", stage);

        let stage = Instant::now();
        self.run_analysis_groups(&mut state).await?;
        clock.record("analysis_groups", stage);
        self.monitor.log_stats("Analysis groups completed");

        let stage = Instant::now();
        let update = ExpertGroupRunner::new(ExpertGroup::Strategy)
            .run(&self.ctx, &state.question)
            .await;
        state.apply(update);
        clock.record("strategy_group", stage);

        let stage = Instant::now();
        let update = final_synthesis(&self.ctx, &state).await;
        state.apply(update);
        clock.record("final_synthesis", stage);
        self.monitor.log_stats("Final synthesis completed");

        let stage = Instant::now();
        while should_continue_iteration(&mut state) == IterationDecision::Continue {
            critique_round(&self.ctx, &mut state).await;
        }
        clock.record("critique", stage);

        let stage = Instant::now();
        self.ctx
            .reports
            .save_state(&self.state_file, &state)
            .await?;
        let archive = if self.archive {
            Some(self.ctx.reports.archive().await?)
        } else {
            None
        };
        clock.record("persist", stage);

        self.monitor.log_final_stats();
        let total_duration = started.elapsed();
        tracing::info!(
            "🎉 Analysis completed in {:?} ({} expert analyses)",
            total_duration,
            state.expert_count()
        );

        Ok(AnalysisOutcome {
            state,
            output_dir: self.output_dir.clone(),
            timings: clock.into_timings(),
            archive,
            total_duration,
        })
    }

    async fn initialize(&self, question: &str) -> Result<AnalysisState> {
        let mut state = AnalysisState::new(question);
        state.max_iterations = Some(self.critique_rounds);

        if let Some(path) = &self.data_file {
            let dataset = load_dataset(path, self.max_data_rows).await?;
            state.input_data = Some(dataset.description);
            state.file_name = Some(dataset.file_name);
        }
        Ok(state)
    }

    async fn run_analysis_groups(&self, state: &mut AnalysisState) -> Result<()> {
        let mut tasks = JoinSet::new();
        for &group in &self.groups {
            let ctx = Arc::clone(&self.ctx);
            let question = state.question.clone();
            tasks.spawn(async move {
                ExpertGroupRunner::new(group).run(&ctx, &question).await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let update = joined.map_err(|e| FinError::agent("orchestrator", e.to_string()))?;
            state.apply(update);
        }
        Ok(())
    }
}

/// 執行摘要
pub fn execution_summary(outcome: &AnalysisOutcome) -> HashMap<String, serde_json::Value> {
    let mut summary = HashMap::new();

    summary.insert(
        "total_experts".to_string(),
        serde_json::Value::Number(outcome.state.expert_count().into()),
    );
    summary.insert(
        "total_groups".to_string(),
        serde_json::Value::Number(outcome.state.group_summaries.len().into()),
    );
    summary.insert(
        "total_stages".to_string(),
        serde_json::Value::Number(outcome.timings.len().into()),
    );
    summary.insert(
        "critique_iterations".to_string(),
        serde_json::Value::Number(outcome.state.iteration.into()),
    );
    summary.insert(
        "total_duration_ms".to_string(),
        serde_json::Value::Number((outcome.total_duration.as_millis() as u64).into()),
    );

    let stages: Vec<serde_json::Value> = outcome
        .timings
        .iter()
        .map(|t| serde_json::Value::String(t.stage.clone()))
        .collect();
    summary.insert("executed_stages".to_string(), serde_json::Value::Array(stages));

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::expert::tests::{ScriptedModel, StaticSearch};
    use crate::core::report::tests::MockStorage;
    use crate::core::report::{ARCHIVE_NAME, FINAL_REPORT_FILE};

    fn orchestrator(
        config: &AppConfig,
        model: Arc<ScriptedModel>,
        storage: MockStorage,
    ) -> Orchestrator<MockStorage> {
        Orchestrator::new(config, model, Arc::new(StaticSearch { fail: false }), storage).unwrap()
    }

    #[tokio::test]
    async fn test_full_run_without_critique() {
        let storage = MockStorage::default();
        let model = Arc::new(ScriptedModel::new());
        let orchestrator = orchestrator(&AppConfig::default(), model.clone(), storage.clone());

        let outcome = orchestrator.run("Nên đầu tư gì năm 2025?").await.unwrap();

        assert_eq!(outcome.state.expert_count(), 25);
        assert_eq!(outcome.state.group_summaries.len(), 5);
        assert_eq!(outcome.state.final_report, "final strategy");
        assert_eq!(outcome.state.iteration, 0);
        assert!(outcome.archive.is_none());
        // 25 位專家各 2 次、5 次小組彙整、1 次最終綜合
        assert_eq!(model.call_count(), 56);

        let saved = storage.get_text("analysis_state.json").await.unwrap();
        let restored: AnalysisState = serde_json::from_str(&saved).unwrap();
        assert_eq!(restored.final_report, "final strategy");
        assert!(storage.get_text(FINAL_REPORT_FILE).await.is_some());

        let stages: Vec<&str> = outcome.timings.iter().map(|t| t.stage.as_str()).collect();
        assert_eq!(
            stages,
            vec![
                "initialize",
                "analysis_groups",
                "strategy_group",
                "final_synthesis",
                "critique",
                "persist"
            ]
        );

        let summary = execution_summary(&outcome);
        assert_eq!(summary["total_experts"], serde_json::json!(25));
        assert_eq!(summary["total_stages"], serde_json::json!(6));
    }

    #[tokio::test]
    async fn test_selected_groups_with_critique_and_archive() {
        let mut config = AppConfig::default();
        config.analysis.groups = Some(vec!["financial_analysis".to_string()]);
        config.analysis.critique_rounds = 1;
        config.output.archive = true;

        let storage = MockStorage::default();
        let model = Arc::new(ScriptedModel::new());
        let outcome = orchestrator(&config, model, storage.clone())
            .run("VCB?")
            .await
            .unwrap();

        assert_eq!(outcome.state.groups.len(), 2);
        assert_eq!(outcome.state.iteration, 1);
        assert_eq!(outcome.state.final_report, "refined");
        assert_eq!(outcome.state.critiques.len(), 2);
        assert_eq!(outcome.archive.as_deref(), Some(ARCHIVE_NAME));
        assert!(storage.files.lock().await.contains_key(ARCHIVE_NAME));
    }

    #[test]
    fn test_dry_run_plan() {
        let model = Arc::new(ScriptedModel::new());
        let orchestrator = orchestrator(&AppConfig::default(), model.clone(), MockStorage::default());

        let plan = orchestrator.dry_run();
        assert_eq!(plan.model, "gpt-4o-mini");
        assert_eq!(plan.concurrent_groups.len(), 4);
        assert_eq!(plan.expert_count(), 25);
        assert_eq!(plan.max_concurrent_requests, 4);
        assert_eq!(plan.strategy_group.experts[0], "game_theory_strategist");
        assert_eq!(model.call_count(), 0);
    }
}
