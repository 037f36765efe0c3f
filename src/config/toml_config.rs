use crate::domain::experts::ExpertGroup;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{FinError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub output: OutputConfig,
    pub monitoring: Option<MonitoringConfig>,
    pub environment: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
    pub retry_attempts: u32,
    pub retry_delay_seconds: u64,
    pub max_concurrent_requests: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
            timeout_seconds: 120,
            retry_attempts: 3,
            retry_delay_seconds: 2,
            max_concurrent_requests: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub endpoint: String,
    pub max_results: usize,
    pub region: Option<String>,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://html.duckduckgo.com/html/".to_string(),
            max_results: 5,
            region: None,
            timeout_seconds: 30,
            user_agent: concat!("multifinx/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub market: String,
    pub max_queries_per_expert: usize,
    pub critique_rounds: u32,
    /// 啟用的分析小組 (slug)；未設定則全部啟用
    pub groups: Option<Vec<String>>,
    pub data_file: Option<String>,
    pub max_data_rows: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            market: "Vietnam".to_string(),
            max_queries_per_expert: 5,
            critique_rounds: 0,
            groups: None,
            data_file: None,
            max_data_rows: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub output_path: String,
    pub save_expert_responses: bool,
    pub archive: bool,
    pub state_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_path: "./investment_strategies".to_string(),
            save_expert_responses: true,
            archive: false,
            state_file: "analysis_state.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_format: Option<String>,
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed)?)
    }

    /// 替換環境變數 (例如 ${OPENAI_API_KEY})；未設定者保留原字串
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| FinError::config(format!("invalid env pattern: {}", e)))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 取得 API key：配置值優先，其次 OPENAI_API_KEY
    pub fn resolve_api_key(&self) -> Result<String> {
        let configured = self
            .llm
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && !key.starts_with("${"));

        match configured {
            Some(key) => Ok(key.to_string()),
            None => std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| FinError::config("No API key found for OpenAI")),
        }
    }

    /// 已啟用的分析小組 (不含策略組)
    pub fn analysis_groups(&self) -> Result<Vec<ExpertGroup>> {
        let Some(slugs) = &self.analysis.groups else {
            return Ok(ExpertGroup::ANALYSIS.to_vec());
        };

        let mut groups = Vec::new();
        for slug in slugs {
            match ExpertGroup::from_slug(slug) {
                Some(ExpertGroup::Strategy) => {
                    return Err(FinError::InvalidConfigValueError {
                        field: "analysis.groups".to_string(),
                        value: slug.clone(),
                        reason: "the strategy group always runs after the analysis groups"
                            .to_string(),
                    })
                }
                Some(group) if !groups.contains(&group) => groups.push(group),
                Some(_) => {}
                None => {
                    return Err(FinError::InvalidConfigValueError {
                        field: "analysis.groups".to_string(),
                        value: slug.clone(),
                        reason: "unknown group".to_string(),
                    })
                }
            }
        }
        Ok(groups)
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn log_format(&self) -> &str {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_format.as_deref())
            .unwrap_or("compact")
    }

    /// 將 [environment] 區段寫入行程環境
    pub fn apply_environment(&self) {
        if let Some(vars) = &self.environment {
            for (key, value) in vars {
                if std::env::var_os(key).is_none() {
                    std::env::set_var(key, value);
                }
            }
        }
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("llm.base_url", &self.llm.base_url)?;
        validation::validate_non_empty_string("llm.model", &self.llm.model)?;
        validation::validate_range("llm.temperature", self.llm.temperature, 0.0, 2.0)?;
        validation::validate_positive_number(
            "llm.max_concurrent_requests",
            self.llm.max_concurrent_requests,
            1,
        )?;
        validation::validate_positive_number(
            "llm.timeout_seconds",
            self.llm.timeout_seconds as usize,
            1,
        )?;

        validation::validate_url("search.endpoint", &self.search.endpoint)?;
        validation::validate_range("search.max_results", self.search.max_results, 1, 25)?;

        validation::validate_non_empty_string("analysis.market", &self.analysis.market)?;
        validation::validate_range(
            "analysis.max_queries_per_expert",
            self.analysis.max_queries_per_expert,
            1,
            10,
        )?;
        validation::validate_range("analysis.critique_rounds", self.analysis.critique_rounds, 0, 10)?;
        if let Some(data_file) = &self.analysis.data_file {
            validation::validate_file_extension("analysis.data_file", data_file, &["csv"])?;
        }
        self.analysis_groups()?;

        validation::validate_path("output.output_path", &self.output.output_path)?;
        validation::validate_path("output.state_file", &self.output.state_file)?;

        if let Some(format) = self.monitoring.as_ref().and_then(|m| m.log_format.as_deref()) {
            if !["compact", "json"].contains(&format) {
                return Err(FinError::InvalidConfigValueError {
                    field: "monitoring.log_format".to_string(),
                    value: format.to_string(),
                    reason: "Valid formats: compact, json".to_string(),
                });
            }
        }

        Ok(())
    }
}

impl ConfigProvider for AppConfig {
    fn output_path(&self) -> &str {
        &self.output.output_path
    }

    fn model_name(&self) -> &str {
        &self.llm.model
    }

    fn market(&self) -> &str {
        &self.analysis.market
    }

    fn max_queries_per_expert(&self) -> usize {
        self.analysis.max_queries_per_expert
    }

    fn search_max_results(&self) -> usize {
        self.search.max_results
    }

    fn critique_rounds(&self) -> u32 {
        self.analysis.critique_rounds
    }

    fn max_concurrent_requests(&self) -> usize {
        self.llm.max_concurrent_requests
    }
}
