use crate::core::prompts;
use crate::domain::model::{ChatMessage, Role};
use crate::domain::ports::{ChatModel, SearchProvider};
use crate::utils::error::Result;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    Answer,
    Clarify,
    Research,
}

impl fmt::Display for NextStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NextStep::Answer => "answer",
            NextStep::Clarify => "clarify",
            NextStep::Research => "research",
        };
        f.write_str(name)
    }
}

/// 只看第一個步驟；無法判斷時直接回答
pub fn decide_next_step(next_steps: &[String]) -> NextStep {
    let Some(step) = next_steps.first().map(|s| s.to_lowercase()) else {
        return NextStep::Answer;
    };

    if step.contains("answer") {
        NextStep::Answer
    } else if step.contains("clarify") {
        NextStep::Clarify
    } else if step.contains("research") {
        NextStep::Research
    } else {
        NextStep::Answer
    }
}

/// 對話路由：分類 → 回答 / 釐清 / 搜尋後回答
pub struct Assistant {
    model: Arc<dyn ChatModel>,
    search: Option<Arc<dyn SearchProvider>>,
    max_results: usize,
}

impl Assistant {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            model,
            search: None,
            max_results: 5,
        }
    }

    pub fn with_search(mut self, search: Arc<dyn SearchProvider>, max_results: usize) -> Self {
        self.search = Some(search);
        self.max_results = max_results;
        self
    }

    pub async fn process(&self, messages: &[ChatMessage]) -> Result<Vec<String>> {
        let result = self
            .model
            .complete(&prompts::classify_request(messages))
            .await?;
        Ok(vec![result.trim().to_string()])
    }

    pub async fn respond(&self, step: NextStep, messages: &[ChatMessage]) -> Result<ChatMessage> {
        let conversation = match step {
            NextStep::Answer => prompts::answer_directly(messages),
            NextStep::Clarify => prompts::ask_for_clarification(messages),
            NextStep::Research => {
                let findings = self.research_findings(messages).await;
                prompts::research(messages, &findings)
            }
        };
        let reply = self.model.complete(&conversation).await?;
        Ok(ChatMessage::assistant(reply))
    }

    /// 以最後一則使用者訊息搜尋；搜尋失敗不影響回答
    async fn research_findings(&self, messages: &[ChatMessage]) -> String {
        let Some(search) = &self.search else {
            return String::new();
        };
        let Some(query) = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
        else {
            return String::new();
        };

        match search.search(query, self.max_results).await {
            Ok(hits) => prompts::compile_search_results(&hits),
            Err(e) => {
                tracing::warn!("⚠️ Research search failed: {}", e);
                String::new()
            }
        }
    }

    /// 附上新問題並回傳更新後的完整對話
    pub async fn ask(&self, question: &str, history: Vec<ChatMessage>) -> Result<Vec<ChatMessage>> {
        let mut messages = history;
        messages.push(ChatMessage::user(question));

        let next_steps = self.process(&messages).await?;
        let step = decide_next_step(&next_steps);
        tracing::debug!("Routing to {} (model said {:?})", step, next_steps);

        let reply = self.respond(step, &messages).await?;
        messages.push(reply);
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::SearchHit;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RouterModel {
        decision: &'static str,
        prompts: Mutex<Vec<Vec<ChatMessage>>>,
    }

    #[async_trait]
    impl ChatModel for RouterModel {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
            self.prompts.lock().unwrap().push(messages.to_vec());
            if messages[0].content.contains("quyết định bước tiếp theo") {
                return Ok(self.decision.to_string());
            }
            Ok(format!("reply from {}", messages[0].content.lines().next().unwrap_or("")))
        }
    }

    struct OneHit;

    #[async_trait]
    impl SearchProvider for OneHit {
        async fn search(&self, query: &str, _max_results: usize) -> Result<Vec<SearchHit>> {
            Ok(vec![SearchHit {
                title: format!("Kết quả cho {}", query),
                link: "https://vneconomy.vn".to_string(),
                snippet: String::new(),
            }])
        }
    }

    fn model(decision: &'static str) -> Arc<RouterModel> {
        Arc::new(RouterModel {
            decision,
            prompts: Mutex::new(Vec::new()),
        })
    }

    #[test]
    fn test_decide_next_step() {
        let step = |s: &str| decide_next_step(&[s.to_string()]);
        assert_eq!(step("answer"), NextStep::Answer);
        assert_eq!(step("CLARIFY"), NextStep::Clarify);
        assert_eq!(step("Next step: research"), NextStep::Research);
        assert_eq!(step("research or answer"), NextStep::Answer);
        assert_eq!(step("không rõ"), NextStep::Answer);
        assert_eq!(decide_next_step(&[]), NextStep::Answer);
    }

    #[tokio::test]
    async fn test_ask_appends_question_and_reply() {
        let model = model("clarify");
        let assistant = Assistant::new(model.clone());

        let history = vec![ChatMessage::user("Xin chào"), ChatMessage::assistant("Chào bạn")];
        let messages = assistant.ask("Mua gì?", history).await.unwrap();

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[2], ChatMessage::user("Mua gì?"));
        assert_eq!(messages[3].role, Role::Assistant);
        assert!(messages[3].content.contains("làm rõ"));
        assert_eq!(model.prompts.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_research_includes_search_findings() {
        let model = model("research");
        let assistant = Assistant::new(model.clone()).with_search(Arc::new(OneHit), 3);

        let messages = assistant.ask("Lãi suất 2025?", Vec::new()).await.unwrap();
        assert_eq!(messages.len(), 2);

        let prompts = model.prompts.lock().unwrap();
        let research_system = &prompts[1][0].content;
        assert!(research_system.contains("Title: Kết quả cho Lãi suất 2025?"));
        assert!(research_system.contains("Snippet: No snippet"));
    }
}
