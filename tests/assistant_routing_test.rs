use httpmock::prelude::*;
use multifinx::config::toml_config::{LlmConfig, SearchConfig};
use multifinx::domain::model::{ChatMessage, Role};
use multifinx::{Assistant, DuckDuckGoSearch, OpenAiChat};
use std::sync::Arc;

fn completion(text: &str) -> serde_json::Value {
    serde_json::json!({"choices": [{"message": {"role": "assistant", "content": text}}]})
}

fn llm_config(server: &MockServer) -> LlmConfig {
    LlmConfig {
        base_url: server.url("/v1"),
        retry_attempts: 0,
        ..LlmConfig::default()
    }
}

#[tokio::test]
async fn test_research_route_uses_web_search() {
    let server = MockServer::start();
    let classify_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .body_contains("quyết định bước tiếp theo");
        then.status(200).json_body(completion(" Research \n"));
    });
    let research_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .body_contains("đang tìm kiếm thông tin")
            .body_contains("Title: Giá vàng hôm nay");
        then.status(200).json_body(completion("Theo thông tin tôi đã tìm kiếm thêm..."));
    });
    let search_mock = server.mock(|when, then| {
        when.method(GET).path("/html/").query_param("q", "Giá vàng?");
        then.status(200).body(
            r#"<a class="result__a" href="https://sjc.com.vn">Giá vàng hôm nay</a>
<a class="result__snippet" href="https://sjc.com.vn">SJC niêm yết</a>"#,
        );
    });

    let search_config = SearchConfig {
        endpoint: server.url("/html/"),
        ..SearchConfig::default()
    };
    let assistant = Assistant::new(Arc::new(OpenAiChat::new(&llm_config(&server), "k".into())))
        .with_search(Arc::new(DuckDuckGoSearch::new(&search_config).unwrap()), 3);

    let messages = assistant.ask("Giá vàng?", Vec::new()).await.unwrap();

    classify_mock.assert();
    search_mock.assert();
    research_mock.assert();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].role, Role::Assistant);
    assert!(messages[1].content.starts_with("Theo thông tin"));
}

#[tokio::test]
async fn test_unrecognised_step_defaults_to_answer() {
    let server = MockServer::start();
    let classify_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .body_contains("quyết định bước tiếp theo");
        then.status(200).json_body(completion("không chắc"));
    });
    let answer_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .body_contains("hữu ích và thân thiện");
        then.status(200).json_body(completion("P/E là tỷ số giá trên thu nhập."));
    });

    let assistant = Assistant::new(Arc::new(OpenAiChat::new(&llm_config(&server), "k".into())));
    let history = vec![
        ChatMessage::user("Xin chào"),
        ChatMessage::assistant("Chào bạn, tôi có thể giúp gì?"),
    ];
    let messages = assistant.ask("P/E là gì?", history).await.unwrap();

    classify_mock.assert();
    answer_mock.assert();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[3].content, "P/E là tỷ số giá trên thu nhập.");
}
