use crate::config::toml_config::AppConfig;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "multifinx")]
#[command(about = "Multi-agent investment analysis for the Vietnamese market")]
pub struct CliArgs {
    /// 投資問題
    #[arg(short, long)]
    pub question: Option<String>,

    /// Path to TOML configuration file (defaults apply when absent)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Attach a CSV dataset for the critics and refiners
    #[arg(long)]
    pub data: Option<String>,

    #[arg(long)]
    pub output_path: Option<String>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub critique_rounds: Option<u32>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable system monitoring
    #[arg(long)]
    pub monitor: bool,

    /// Bundle all reports into a ZIP archive
    #[arg(long)]
    pub archive: bool,

    /// Show the analysis plan without calling any model
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// 載入配置並套用命令列覆蓋
    pub fn load_config(&self) -> crate::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(data) = &self.data {
            config.analysis.data_file = Some(data.clone());
        }
        if let Some(output_path) = &self.output_path {
            config.output.output_path = output_path.clone();
        }
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if let Some(rounds) = self.critique_rounds {
            config.analysis.critique_rounds = rounds;
        }
        if self.archive {
            config.output.archive = true;
        }
        if self.monitor {
            config.monitoring.get_or_insert_with(Default::default).enabled = true;
        }
    }
}
