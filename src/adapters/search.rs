use crate::config::toml_config::SearchConfig;
use crate::domain::model::{SearchHit, TopicSearch};
use crate::domain::ports::SearchProvider;
use crate::utils::error::{FinError, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// DuckDuckGo HTML 端點搜尋
pub struct DuckDuckGoSearch {
    client: Client,
    endpoint: String,
    region: Option<String>,
    user_agent: String,
    timeout: Duration,
    title_re: Regex,
    snippet_re: Regex,
    tag_re: Regex,
}

impl DuckDuckGoSearch {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| FinError::config(format!("invalid pattern: {}", e)))
        };

        Ok(Self {
            client: Client::new(),
            endpoint: config.endpoint.clone(),
            region: config.region.clone(),
            user_agent: config.user_agent.clone(),
            timeout: Duration::from_secs(config.timeout_seconds),
            title_re: compile(r#"(?s)<a[^>]*class="result__a"[^>]*href="([^"]*)"[^>]*>(.*?)</a>"#)?,
            snippet_re: compile(r#"(?s)<(?:a|div)[^>]*class="result__snippet"[^>]*>(.*?)</(?:a|div)>"#)?,
            tag_re: compile(r"<[^>]+>")?,
        })
    }

    /// 解析結果頁；摘要只在該結果自己的區塊內尋找
    pub fn parse_results(&self, html: &str, max_results: usize) -> Vec<SearchHit> {
        let anchors: Vec<regex::Captures> = self.title_re.captures_iter(html).collect();

        anchors
            .iter()
            .enumerate()
            .map(|(index, caps)| {
                let block_start = caps.get(0).map_or(0, |m| m.end());
                let block_end = anchors
                    .get(index + 1)
                    .and_then(|next| next.get(0))
                    .map_or(html.len(), |m| m.start());
                let snippet = self
                    .snippet_re
                    .captures(&html[block_start..block_end])
                    .map(|s| self.clean_text(&s[1]))
                    .unwrap_or_default();

                SearchHit {
                    title: self.clean_text(&caps[2]),
                    link: resolve_link(&decode_entities(&caps[1])),
                    snippet,
                }
            })
            .filter(|hit| !hit.link.is_empty())
            .take(max_results)
            .collect()
    }

    fn clean_text(&self, raw: &str) -> String {
        let stripped = self.tag_re.replace_all(raw, "");
        decode_entities(&stripped)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let mut request = self
            .client
            .get(&self.endpoint)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .timeout(self.timeout)
            .query(&[("q", query)]);

        if let Some(region) = &self.region {
            request = request.query(&[("kl", region)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FinError::SearchError {
                query: query.to_string(),
                message: format!("status {}", status),
            });
        }

        let html = response.text().await?;
        let hits = self.parse_results(&html, max_results);
        tracing::debug!("🔎 '{}' returned {} hits", query, hits.len());
        Ok(hits)
    }
}

/// 把 `//duckduckgo.com/l/?uddg=...` 轉址連結還原為目標網址
fn resolve_link(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };

    match Url::parse(&absolute) {
        Ok(url) if url.path().starts_with("/l/") => url
            .query_pairs()
            .find(|(key, _)| key == "uddg")
            .map(|(_, value)| value.into_owned())
            .unwrap_or(absolute),
        Ok(_) => absolute,
        Err(_) => String::new(),
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// 主題式搜尋工具
pub struct TopicalSearch {
    provider: Arc<dyn SearchProvider>,
    market: String,
    max_results: usize,
}

impl TopicalSearch {
    pub fn new(provider: Arc<dyn SearchProvider>, market: &str, max_results: usize) -> Self {
        Self {
            provider,
            market: market.to_string(),
            max_results,
        }
    }

    pub async fn general_search(&self, query: &str) -> Result<Vec<SearchHit>> {
        self.provider.search(query, self.max_results).await
    }

    pub async fn search_financial_data(&self, company_or_ticker: &str) -> TopicSearch {
        let query = format!(
            "{} financial data {} stock market",
            company_or_ticker, self.market
        );
        self.run(company_or_ticker, &self.market, &query).await
    }

    pub async fn search_market_trends(&self, market: &str) -> TopicSearch {
        let query = format!("{} stock market trends current analysis", market);
        self.run(market, market, &query).await
    }

    pub async fn search_economic_indicators(&self, country: &str) -> TopicSearch {
        let query = format!(
            "{} economic indicators GDP inflation interest rate current",
            country
        );
        self.run(country, country, &query).await
    }

    pub async fn search_sector_performance(&self, sector: &str, market: &str) -> TopicSearch {
        let query = format!("{} sector performance {} stock market current", sector, market);
        self.run(sector, market, &query).await
    }

    async fn run(&self, subject: &str, market: &str, query: &str) -> TopicSearch {
        let search_time = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        match self.provider.search(query, self.max_results).await {
            Ok(results) => TopicSearch {
                subject: subject.to_string(),
                market: market.to_string(),
                search_time,
                results,
                error: None,
            },
            Err(e) => {
                tracing::error!("❌ Topical search '{}' failed: {}", query, e);
                TopicSearch {
                    subject: subject.to_string(),
                    market: market.to_string(),
                    search_time,
                    results: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::sync::Mutex;

    const SAMPLE_HTML: &str = r#"
<div class="result results_links">
  <h2 class="result__title">
    <a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fcafef.vn%2Fvnindex.chn&amp;rut=abc">VN-Index <b>hôm nay</b></a>
  </h2>
  <a class="result__snippet" href="//duckduckgo.com/l/?uddg=x">Thị trường tăng &amp; thanh khoản cải thiện</a>
</div>
<div class="result results_links">
  <h2 class="result__title">
    <a rel="nofollow" class="result__a" href="https://vneconomy.vn/lai-suat.htm">Lãi suất</a>
  </h2>
  <a class="result__snippet" href="https://vneconomy.vn/lai-suat.htm">Ngân hàng Nhà nước giữ nguyên lãi suất</a>
</div>
"#;

    fn search_config(endpoint: String) -> SearchConfig {
        SearchConfig {
            endpoint,
            region: Some("vn-vi".to_string()),
            ..SearchConfig::default()
        }
    }

    #[test]
    fn test_parse_results_unwraps_redirects() {
        let search = DuckDuckGoSearch::new(&SearchConfig::default()).unwrap();
        let hits = search.parse_results(SAMPLE_HTML, 5);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "VN-Index hôm nay");
        assert_eq!(hits[0].link, "https://cafef.vn/vnindex.chn");
        assert_eq!(hits[0].snippet, "Thị trường tăng & thanh khoản cải thiện");
        assert_eq!(hits[1].link, "https://vneconomy.vn/lai-suat.htm");
    }

    #[test]
    fn test_snippet_stays_with_its_result() {
        let html = r#"
<a class="result__a" href="https://a.vn/1">First</a>
<a class="result__a" href="https://b.vn/2">Second</a>
<a class="result__snippet" href="https://b.vn/2">Snippet of second</a>
"#;
        let search = DuckDuckGoSearch::new(&SearchConfig::default()).unwrap();
        let hits = search.parse_results(html, 5);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].link, "https://a.vn/1");
        assert_eq!(hits[0].snippet, "");
        assert_eq!(hits[1].snippet, "Snippet of second");
    }

    #[test]
    fn test_parse_results_respects_limit() {
        let search = DuckDuckGoSearch::new(&SearchConfig::default()).unwrap();
        assert_eq!(search.parse_results(SAMPLE_HTML, 1).len(), 1);
        assert!(search.parse_results("<html></html>", 5).is_empty());
    }

    #[tokio::test]
    async fn test_search_sends_query_and_region() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/html/")
                .query_param("q", "VNM financial data Vietnam stock market")
                .query_param("kl", "vn-vi");
            then.status(200).body(SAMPLE_HTML);
        });

        let search = DuckDuckGoSearch::new(&search_config(server.url("/html/"))).unwrap();
        let topical = TopicalSearch::new(Arc::new(search), "Vietnam", 5);
        let result = topical.search_financial_data("VNM").await;

        mock.assert();
        assert_eq!(result.subject, "VNM");
        assert_eq!(result.results.len(), 2);
        assert!(result.error.is_none());
        assert_eq!(result.search_time.len(), "2025-01-01 00:00:00".len());
    }

    #[tokio::test]
    async fn test_topical_search_captures_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/html/");
            then.status(503);
        });

        let search = DuckDuckGoSearch::new(&search_config(server.url("/html/"))).unwrap();
        let topical = TopicalSearch::new(Arc::new(search), "Vietnam", 5);
        let result = topical.search_sector_performance("banking", "Vietnam").await;

        assert!(result.results.is_empty());
        assert!(result.error.unwrap().contains("503"));
        assert_eq!(result.market, "Vietnam");
    }

    struct RecordingProvider {
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SearchProvider for RecordingProvider {
        async fn search(&self, query: &str, _max_results: usize) -> Result<Vec<SearchHit>> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_topical_query_templates() {
        let provider = Arc::new(RecordingProvider {
            queries: Mutex::new(Vec::new()),
        });
        let topical = TopicalSearch::new(provider.clone(), "Vietnam", 5);

        topical.search_market_trends("Vietnam").await;
        topical.search_economic_indicators("Vietnam").await;
        topical.search_sector_performance("real estate", "Vietnam").await;

        let queries = provider.queries.lock().unwrap().clone();
        assert_eq!(
            queries,
            vec![
                "Vietnam stock market trends current analysis",
                "Vietnam economic indicators GDP inflation interest rate current",
                "real estate sector performance Vietnam stock market current",
            ]
        );
    }
}
