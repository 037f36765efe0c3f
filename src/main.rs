use clap::Parser;
use multifinx::core::execution_summary;
use multifinx::utils::{logger, validation::Validate};
use multifinx::{
    AppConfig, CliArgs, DuckDuckGoSearch, FinError, LocalStorage, OpenAiChat, Orchestrator,
};
use std::sync::Arc;

fn exit_with(e: &FinError) -> ! {
    tracing::error!(
        "❌ Analysis failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    std::process::exit(e.severity().exit_code().max(1));
}

fn read_question(args: &CliArgs) -> String {
    if let Some(question) = &args.question {
        return question.clone();
    }
    println!("Nhập câu hỏi đầu tư của bạn:");
    let mut line = String::new();
    if let Err(e) = std::io::stdin().read_line(&mut line) {
        tracing::warn!("⚠️ Failed to read question from stdin: {}", e);
    }
    line.trim().to_string()
}

async fn run(args: &CliArgs, config: AppConfig) -> multifinx::Result<()> {
    let api_key = config.resolve_api_key();
    let model = match (&api_key, args.dry_run) {
        (Ok(key), _) => OpenAiChat::new(&config.llm, key.clone()),
        // dry run 不需要 API key
        (Err(_), true) => OpenAiChat::new(&config.llm, String::new()),
        (Err(e), false) => return Err(FinError::config(e.to_string())),
    };
    let search = DuckDuckGoSearch::new(&config.search)?;
    let storage = LocalStorage::new(config.output.output_path.clone());

    let orchestrator = Orchestrator::new(&config, Arc::new(model), Arc::new(search), storage)?
        .with_monitoring(config.monitoring_enabled());

    if args.dry_run {
        let plan = orchestrator.dry_run();
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    let question = read_question(args);
    tracing::info!("❓ Question: {}", question);

    let outcome = orchestrator.run(&question).await?;
    let summary = execution_summary(&outcome);
    tracing::info!("📊 Execution summary: {:?}", summary);

    println!("✅ Analysis completed successfully!");
    println!("📁 Reports saved to: {}", outcome.output_dir);
    if let Some(archive) = &outcome.archive {
        println!("🗜️ Archive: {}/{}", outcome.output_dir, archive);
    }
    println!("\n{}", outcome.state.final_report);
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            logger::init_cli_logger(args.verbose);
            exit_with(&e);
        }
    };

    logger::init_logger(config.log_format(), args.verbose);
    config.apply_environment();

    tracing::info!("Starting multifinx CLI");
    if args.verbose {
        tracing::debug!("CLI args: {:?}", args);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        exit_with(&e);
    }

    if config.monitoring_enabled() {
        tracing::info!("🔍 System monitoring enabled");
    }

    if let Err(e) = run(&args, config).await {
        exit_with(&e);
    }
}
