use anyhow::Context;
use clap::Parser;
use multifinx::domain::model::ChatMessage;
use multifinx::utils::{logger, validation::Validate};
use multifinx::{AppConfig, Assistant, DuckDuckGoSearch, OpenAiChat};
use std::io::{BufRead, Write};
use std::sync::Arc;

/// 互動式投資助理
#[derive(Debug, Parser)]
#[command(name = "ask_agent")]
#[command(about = "Conversational assistant that answers, clarifies or researches")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Ask a single question and exit
    #[arg(short, long)]
    question: Option<String>,

    /// Let the research step search the web
    #[arg(long)]
    web: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn last_reply(messages: &[ChatMessage]) -> &str {
    messages.last().map(|m| m.content.as_str()).unwrap_or_default()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let config = match &args.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path))?,
        None => AppConfig::default(),
    };
    config.validate().context("invalid configuration")?;
    config.apply_environment();

    let api_key = config.resolve_api_key()?;
    let mut assistant = Assistant::new(Arc::new(OpenAiChat::new(&config.llm, api_key)));
    if args.web {
        let search = DuckDuckGoSearch::new(&config.search)?;
        assistant = assistant.with_search(Arc::new(search), config.search.max_results);
    }

    if let Some(question) = &args.question {
        let messages = assistant.ask(question, Vec::new()).await?;
        println!("{}", last_reply(&messages));
        return Ok(());
    }

    println!("💬 Nhập câu hỏi (gõ 'exit' để thoát)");
    let stdin = std::io::stdin();
    let mut history = Vec::new();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question, "exit" | "quit") {
            break;
        }

        match assistant.ask(question, history.clone()).await {
            Ok(messages) => {
                println!("{}\n", last_reply(&messages));
                history = messages;
            }
            Err(e) => {
                eprintln!("❌ {}", e.user_friendly_message());
                eprintln!("💡 建議: {}", e.recovery_suggestion());
            }
        }
    }

    Ok(())
}
