use serde::Deserialize;

const FALLBACK_LIMIT: usize = 5;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QueryPayload {
    Object {
        #[serde(default)]
        queries: Vec<String>,
    },
    List(Vec<String>),
}

/// 從模型回覆擷取 JSON 區塊：優先 ```json，其次任意 ``` 區塊，否則整段文字
fn json_block(content: &str) -> &str {
    if let Some((_, rest)) = content.split_once("```json") {
        return rest.split("```").next().unwrap_or(rest).trim();
    }
    if let Some((_, rest)) = content.split_once("```") {
        return rest.split("```").next().unwrap_or(rest).trim();
    }
    content.trim()
}

/// 解析搜尋查詢；JSON 失敗時退回逐行擷取引號開頭的行
pub fn extract_queries(content: &str, limit: usize) -> Vec<String> {
    let queries = match serde_json::from_str::<QueryPayload>(json_block(content)) {
        Ok(QueryPayload::Object { queries }) | Ok(QueryPayload::List(queries)) => queries,
        Err(e) => {
            tracing::warn!("⚠️ Error extracting queries: {}", e);
            fallback_queries(content)
        }
    };

    queries
        .into_iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .take(limit)
        .collect()
}

fn fallback_queries(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('"') || line.starts_with('\''))
        .map(|line| {
            line.trim_matches(|c| c == '"' || c == '\'')
                .trim_end_matches(',')
                .trim_matches(|c| c == '"' || c == '\'')
                .to_string()
        })
        .take(FALLBACK_LIMIT)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_json_block() {
        let content = "Here you go:\n```json\n{\"queries\": [\"VN-Index outlook 2025\", \"Vietnam bank NPL ratio\"]}\n```\nDone.";
        assert_eq!(
            extract_queries(content, 5),
            vec!["VN-Index outlook 2025", "Vietnam bank NPL ratio"]
        );
    }

    #[test]
    fn test_plain_fence_and_bare_list() {
        let content = "```\n[\"a\", \" \", \"b\"]\n```";
        assert_eq!(extract_queries(content, 5), vec!["a", "b"]);
    }

    #[test]
    fn test_raw_json_truncated_to_limit() {
        let content = r#"{"queries": ["q1", "q2", "q3", "q4"]}"#;
        assert_eq!(extract_queries(content, 3), vec!["q1", "q2", "q3"]);
    }

    #[test]
    fn test_missing_key_gives_empty() {
        assert!(extract_queries(r#"{"items": ["x"]}"#, 5).is_empty());
    }

    #[test]
    fn test_fallback_line_extraction() {
        let content = "queries:\n  \"Vietnam GDP growth 2025\",\n  'lãi suất ngân hàng',\n  not quoted\n  \"FDI Vietnam\"";
        assert_eq!(
            extract_queries(content, 5),
            vec!["Vietnam GDP growth 2025", "lãi suất ngân hàng", "FDI Vietnam"]
        );
    }

    #[test]
    fn test_fallback_capped_at_five() {
        let content = (1..=8)
            .map(|i| format!("\"query {}\",", i))
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(extract_queries(&content, 10).len(), 5);
    }
}
