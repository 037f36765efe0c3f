use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for '{field}': '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("API returned status {status}: {body}")]
    ApiStatusError { status: u16, body: String },

    #[error("Unexpected model response: {message}")]
    ResponseFormatError { message: String },

    #[error("Search failed for '{query}': {message}")]
    SearchError { query: String, message: String },

    #[error("Agent '{agent}' failed: {details}")]
    AgentError { agent: String, details: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Model,
    Search,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// 對應 CLI 結束碼
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl FinError {
    pub fn config(message: impl Into<String>) -> Self {
        FinError::ConfigError {
            message: message.into(),
        }
    }

    pub fn agent(agent: impl Into<String>, details: impl Into<String>) -> Self {
        FinError::AgentError {
            agent: agent.into(),
            details: details.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            FinError::HttpError(_) => ErrorCategory::Network,
            FinError::ConfigError { .. }
            | FinError::MissingConfigError { .. }
            | FinError::InvalidConfigValueError { .. }
            | FinError::TomlError(_) => ErrorCategory::Configuration,
            FinError::ApiStatusError { .. }
            | FinError::ResponseFormatError { .. }
            | FinError::AgentError { .. } => ErrorCategory::Model,
            FinError::SearchError { .. } => ErrorCategory::Search,
            FinError::CsvError(_)
            | FinError::SerializationError(_)
            | FinError::ValidationError { .. } => ErrorCategory::Data,
            FinError::IoError(_) | FinError::ZipError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            FinError::SearchError { .. } => ErrorSeverity::Low,
            FinError::HttpError(_) => ErrorSeverity::Medium,
            FinError::ApiStatusError { status, .. } if *status == 429 || *status >= 500 => {
                ErrorSeverity::Medium
            }
            FinError::IoError(_) | FinError::ZipError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    /// 暫時性錯誤可重試 (逾時、連線失敗、429、5xx)
    pub fn is_retryable(&self) -> bool {
        match self {
            FinError::HttpError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            FinError::ApiStatusError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            FinError::HttpError(_) => {
                "Check network connectivity and the configured base_url / endpoint".to_string()
            }
            FinError::ApiStatusError { status: 401, .. } => {
                "Check that OPENAI_API_KEY (or [llm].api_key) is valid".to_string()
            }
            FinError::ApiStatusError { status: 429, .. } => {
                "Rate limited: lower [llm].max_concurrent_requests or raise retry_delay_seconds"
                    .to_string()
            }
            FinError::ApiStatusError { .. } => {
                "The model endpoint rejected the request; check the model name".to_string()
            }
            FinError::ResponseFormatError { .. } => {
                "Verify the endpoint is OpenAI chat-completions compatible".to_string()
            }
            FinError::ConfigError { .. }
            | FinError::MissingConfigError { .. }
            | FinError::InvalidConfigValueError { .. }
            | FinError::TomlError(_) => "Fix the configuration file and try again".to_string(),
            FinError::SearchError { .. } => {
                "Search is best-effort; retry later or change [search].endpoint".to_string()
            }
            FinError::CsvError(_) => "Check that the attached data file is valid CSV".to_string(),
            FinError::IoError(_) | FinError::ZipError(_) => {
                "Check that the output directory is writable".to_string()
            }
            FinError::SerializationError(_) | FinError::ValidationError { .. } => {
                "Inspect the input data".to_string()
            }
            FinError::AgentError { agent, .. } => {
                format!("Re-run with --verbose to inspect agent '{}'", agent)
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Network problem: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Model => format!("Language model problem: {}", self),
            ErrorCategory::Search => format!("Search problem: {}", self),
            ErrorCategory::Data => format!("Data problem: {}", self),
            ErrorCategory::System => format!("System problem: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, FinError>;
