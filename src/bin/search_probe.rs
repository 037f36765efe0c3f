use clap::{Parser, ValueEnum};
use multifinx::domain::model::TopicSearch;
use multifinx::utils::logger;
use multifinx::{AppConfig, DuckDuckGoSearch, TopicalSearch};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Topic {
    /// 一般查詢
    General,
    Financial,
    Trends,
    Economy,
    Sector,
}

/// 測試搜尋工具
#[derive(Debug, Parser)]
#[command(name = "search_probe")]
#[command(about = "Run one web search the way the experts do and print the hits")]
struct Args {
    #[arg(value_enum)]
    topic: Topic,

    /// Query, company, country or sector depending on the topic
    subject: String,

    #[arg(short, long)]
    config: Option<String>,

    #[arg(short, long)]
    market: Option<String>,

    #[arg(short, long)]
    verbose: bool,
}

fn print_topic(result: &TopicSearch) {
    println!(
        "🔎 {} ({}) at {}",
        result.subject, result.market, result.search_time
    );
    if let Some(error) = &result.error {
        println!("❌ {}", error);
    }
}

#[tokio::main]
async fn main() -> multifinx::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    let market = args
        .market
        .clone()
        .unwrap_or_else(|| config.analysis.market.clone());

    let provider = Arc::new(DuckDuckGoSearch::new(&config.search)?);
    let tools = TopicalSearch::new(provider, &market, config.search.max_results);

    let result = match args.topic {
        Topic::General => {
            let hits = tools.general_search(&args.subject).await?;
            TopicSearch {
                subject: args.subject.clone(),
                market: market.clone(),
                search_time: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
                results: hits,
                error: None,
            }
        }
        Topic::Financial => tools.search_financial_data(&args.subject).await,
        Topic::Trends => tools.search_market_trends(&args.subject).await,
        Topic::Economy => tools.search_economic_indicators(&args.subject).await,
        Topic::Sector => tools.search_sector_performance(&args.subject, &market).await,
    };

    print_topic(&result);
    println!("{}", serde_json::to_string_pretty(&result.results)?);
    Ok(())
}
