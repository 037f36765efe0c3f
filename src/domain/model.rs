use crate::domain::experts::ExpertGroup;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

/// 專家搜尋紀錄
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpertSearch {
    pub queries: Vec<String>,
    pub results: Vec<SearchHit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 主題式搜尋結果 (財報、市場趨勢、總經指標、產業表現)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicSearch {
    pub subject: String,
    pub market: String,
    pub search_time: String,
    pub results: Vec<SearchHit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 整個分析流程的狀態
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisState {
    pub question: String,
    pub groups: BTreeMap<ExpertGroup, BTreeMap<String, String>>,
    pub group_summaries: BTreeMap<String, String>,
    pub search_results: BTreeMap<String, ExpertSearch>,
    pub final_report: String,
    pub critiques: BTreeMap<String, String>,
    pub meta_critique: Option<String>,
    pub iteration: u32,
    pub max_iterations: Option<u32>,
    pub input_data: Option<String>,
    pub file_name: Option<String>,
}

/// 節點回傳的部分狀態；map 欄位逐鍵合併，純量欄位有值才覆寫
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    pub analyses: Vec<(ExpertGroup, String, String)>,
    pub group_summaries: BTreeMap<String, String>,
    pub search_results: BTreeMap<String, ExpertSearch>,
    pub final_report: Option<String>,
    pub critiques: BTreeMap<String, String>,
    pub meta_critique: Option<String>,
}

impl StateUpdate {
    pub fn analysis(group: ExpertGroup, expert: &str, text: impl Into<String>) -> Self {
        Self {
            analyses: vec![(group, expert.to_string(), text.into())],
            ..Self::default()
        }
    }

    pub fn summary(group_name: &str, text: impl Into<String>) -> Self {
        let mut update = Self::default();
        update
            .group_summaries
            .insert(group_name.to_string(), text.into());
        update
    }

    pub fn report(text: impl Into<String>) -> Self {
        Self {
            final_report: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn critique(group_name: &str, text: impl Into<String>) -> Self {
        let mut update = Self::default();
        update.critiques.insert(group_name.to_string(), text.into());
        update
    }

    pub fn with_search(mut self, expert: &str, search: ExpertSearch) -> Self {
        self.search_results.insert(search_key(expert), search);
        self
    }

    pub fn merge(&mut self, other: StateUpdate) {
        self.analyses.extend(other.analyses);
        self.group_summaries.extend(other.group_summaries);
        self.search_results.extend(other.search_results);
        self.critiques.extend(other.critiques);
        if other.final_report.is_some() {
            self.final_report = other.final_report;
        }
        if other.meta_critique.is_some() {
            self.meta_critique = other.meta_critique;
        }
    }
}

pub fn search_key(expert: &str) -> String {
    format!("{}_search", expert)
}

impl AnalysisState {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Self::default()
        }
    }

    pub fn apply(&mut self, update: StateUpdate) {
        for (group, expert, text) in update.analyses {
            self.groups.entry(group).or_default().insert(expert, text);
        }
        self.group_summaries.extend(update.group_summaries);
        self.search_results.extend(update.search_results);
        self.critiques.extend(update.critiques);
        if let Some(report) = update.final_report {
            self.final_report = report;
        }
        if let Some(meta) = update.meta_critique {
            self.meta_critique = Some(meta);
        }
    }

    pub fn analysis_of(&self, group: ExpertGroup, expert: &str) -> Option<&str> {
        self.groups
            .get(&group)
            .and_then(|experts| experts.get(expert))
            .map(String::as_str)
    }

    /// 空白問題時使用預設字串
    pub fn question_or_default(&self) -> &str {
        if self.question.trim().is_empty() {
            "No question provided"
        } else {
            &self.question
        }
    }

    pub fn file_name_or_default(&self) -> &str {
        self.file_name.as_deref().unwrap_or("Unknown file")
    }

    pub fn expert_count(&self) -> usize {
        self.groups.values().map(|experts| experts.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_merges_maps_per_key() {
        let mut state = AnalysisState::new("Nên đầu tư ngành ngân hàng?");
        state.apply(StateUpdate::analysis(
            ExpertGroup::MarketAnalysis,
            "market_analyst",
            "first",
        ));
        state.apply(StateUpdate::analysis(
            ExpertGroup::MarketAnalysis,
            "technical_analyst",
            "second",
        ));
        state.apply(StateUpdate::analysis(
            ExpertGroup::MarketAnalysis,
            "market_analyst",
            "rewritten",
        ));

        assert_eq!(
            state.analysis_of(ExpertGroup::MarketAnalysis, "market_analyst"),
            Some("rewritten")
        );
        assert_eq!(
            state.analysis_of(ExpertGroup::MarketAnalysis, "technical_analyst"),
            Some("second")
        );
        assert_eq!(state.expert_count(), 2);
    }

    #[test]
    fn test_scalar_fields_only_overwrite_when_present() {
        let mut state = AnalysisState::new("q");
        state.apply(StateUpdate::report("draft"));
        state.apply(StateUpdate::summary("Lập chiến lược (Strategy)", "s"));
        assert_eq!(state.final_report, "draft");
        assert!(state.meta_critique.is_none());
    }

    #[test]
    fn test_question_default() {
        let state = AnalysisState::new("   ");
        assert_eq!(state.question_or_default(), "No question provided");
        assert_eq!(state.file_name_or_default(), "Unknown file");
    }

    #[test]
    fn test_update_merge_keeps_latest_report() {
        let mut update = StateUpdate::report("a");
        update.merge(StateUpdate::critique("g", "c"));
        update.merge(StateUpdate::report("b"));
        assert_eq!(update.final_report.as_deref(), Some("b"));
        assert_eq!(update.critiques.get("g").map(String::as_str), Some("c"));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::system("hi")).unwrap();
        assert_eq!(json, r#"{"role":"system","content":"hi"}"#);
    }
}
