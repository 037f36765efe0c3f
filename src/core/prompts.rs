// 各代理的對話組裝；純函式，不做網路呼叫

use crate::domain::model::{ChatMessage, SearchHit};

pub fn query_generation(
    system_prompt: &str,
    question: &str,
    expert_name: &str,
    market: &str,
) -> Vec<ChatMessage> {
    let prompt = format!(
        r#"{system_prompt}

Your task is to generate 3-5 specific search queries that will help gather information to answer the following question from your expert perspective:

QUESTION: {question}

INSTRUCTIONS:
1. Consider what information you need as a {expert_name} to properly answer this question
2. Create search queries that will find relevant, current information about the {market} market
3. Make your queries specific and focused
4. Format your response as a JSON object containing only the queries

Format example:
{{
    "queries": [
        "query 1",
        "query 2",
        "query 3"
    ]
}}"#
    );

    vec![
        ChatMessage::system("You are a helpful assistant that generates search queries."),
        ChatMessage::user(prompt),
    ]
}

pub fn compile_search_results(results: &[SearchHit]) -> String {
    let mut compiled = String::from("SEARCH RESULTS:\n\n");

    for (i, result) in results.iter().enumerate() {
        compiled.push_str(&format!("Result {}:\n", i + 1));
        compiled.push_str(&format!("Title: {}\n", or_default(&result.title, "No title")));
        compiled.push_str(&format!("Link: {}\n", or_default(&result.link, "No link")));
        compiled.push_str(&format!(
            "Snippet: {}\n\n",
            or_default(&result.snippet, "No snippet")
        ));
    }

    compiled
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

pub fn expert_analysis(
    system_prompt: &str,
    question: &str,
    compiled_results: &str,
    expert_name: &str,
    market: &str,
) -> Vec<ChatMessage> {
    let prompt = format!(
        r#"{system_prompt}

USER QUESTION:
{question}

{compiled_results}

INSTRUCTIONS:
As a {expert_name}, provide a detailed analysis to answer the question based on:
1. Your expert knowledge of the {market} market
2. The information from the search results

Your analysis should:
- Be thorough and insightful
- Include specific recommendations where appropriate
- Cite sources from the search results where possible
- End with a "References" section listing your sources

Format your response as a professional analysis report."#
    );

    vec![
        ChatMessage::system(format!(
            "You are a financial expert specialized in the {} market.",
            market
        )),
        ChatMessage::user(prompt),
    ]
}

pub fn group_summary(
    group_name: &str,
    question: &str,
    expert_analyses: &str,
    search_info: &str,
) -> Vec<ChatMessage> {
    let prompt = format!(
        r#"You are a group coordinator for the {group_name} expert team.

Your task is to create a comprehensive summary of the following expert analyses to answer this user question:

USER QUESTION:
{question}

EXPERT ANALYSES:
{expert_analyses}

SEARCH INFORMATION:
{search_info}

Create a thorough summary that:
1. Highlights the key insights from all experts
2. Identifies areas of consensus and important differences
3. Directly answers the user's question
4. Provides actionable investment recommendations
5. Includes citations to sources where appropriate

Format your response as a professional group analysis report."#
    );

    vec![
        ChatMessage::system("You are a financial analysis coordinator."),
        ChatMessage::user(prompt),
    ]
}

pub fn final_synthesis(question: &str, group_summaries: &str, market: &str) -> Vec<ChatMessage> {
    let prompt = format!(
        r#"You are a chief investment strategist specialized in the {market} market.

Your task is to create a comprehensive investment strategy based on the following group summaries:

USER QUESTION:
{question}

GROUP SUMMARIES:
{group_summaries}

Create a detailed investment strategy that:
1. Directly answers the user's question
2. Provides a market analysis and current trends
3. Includes a strategic asset allocation recommendation
4. Recommends specific sectors and stocks
5. Advises on market entry timing
6. Includes a risk management plan
7. Provides specific actionable steps for investors

Format your response as a professional investment strategy report with clear sections."#
    );

    vec![
        ChatMessage::system(format!(
            "You are a chief investment strategist for the {} market.",
            market
        )),
        ChatMessage::user(prompt),
    ]
}

fn group_critic_system(group_name: &str) -> String {
    format!(
        r#"<role>
Bạn là Tác tử Phê bình (Critic Agent) cho nhóm chuyên gia {group_name}.
</role>

<task>
Nhiệm vụ của bạn là:
1. Đánh giá phân tích của các chuyên gia và tổng hợp của nhóm một cách khách quan
2. Chỉ ra các điểm yếu, thiếu sót, mâu thuẫn trong phân tích
3. Nhận diện các khía cạnh quan trọng của dữ liệu đã bị bỏ qua
4. Đề xuất hướng cải thiện cụ thể cho từng chuyên gia

Khi đánh giá, hãy phân loại các vấn đề thành:
- Mức độ nghiêm trọng cao: Cần phải sửa chữa ngay lập tức
- Mức độ trung bình: Đòi hỏi sự cải thiện đáng kể
- Mức độ thấp: Có thể cải thiện thêm nếu có thời gian
</task>"#
    )
}

const META_CRITIC_SYSTEM: &str = r#"<role>
Bạn là Tác tử Phê bình Tổng hợp (Meta-Critic Agent).
</role>

<task>
Nhiệm vụ của bạn là:
1. Đánh giá báo cáo tổng hợp cuối cùng từ tất cả các nhóm chuyên gia
2. Xác định mâu thuẫn, chồng chéo hoặc thiếu sót giữa các nhóm
3. Nhận diện các góc nhìn quan trọng đã bị bỏ qua trong phân tích tổng thể
4. Đánh giá tính hiệu quả của việc tích hợp các quan điểm khác nhau
5. Chỉ ra các cải tiến cần thiết cho báo cáo cuối cùng
</task>"#;

pub fn group_critique(
    group_name: &str,
    expert_analyses: &str,
    group_summary: &str,
    file_name: &str,
) -> Vec<ChatMessage> {
    let prompt = format!(
        r#"Hãy đánh giá các phân tích sau đây từ các chuyên gia của nhóm {group_name}:

{expert_analyses}

Tổng hợp của nhóm:
{group_summary}

Tài liệu đang phân tích có tên: {file_name}

Hãy đưa ra phê bình chi tiết về phân tích của nhóm, chỉ ra các điểm yếu và đề xuất cải tiến cụ thể."#
    );

    vec![
        ChatMessage::system(group_critic_system(group_name)),
        ChatMessage::user(prompt),
    ]
}

pub fn meta_critique(group_summaries: &str, final_report: &str, file_name: &str) -> Vec<ChatMessage> {
    let prompt = format!(
        r#"Hãy đánh giá báo cáo tổng hợp cuối cùng và các tổng kết từ các nhóm:

## Tổng kết từ các nhóm:
{group_summaries}

## Báo cáo cuối cùng:
{final_report}

Tài liệu đang phân tích có tên: {file_name}

Hãy đưa ra đánh giá toàn diện về báo cáo cuối cùng, chỉ ra các mâu thuẫn, thiếu sót và hướng cải thiện."#
    );

    vec![
        ChatMessage::system(META_CRITIC_SYSTEM),
        ChatMessage::user(prompt),
    ]
}

pub fn refine_expert(
    expert_system_prompt: &str,
    input_data: &str,
    file_name: &str,
    current_analysis: &str,
    critiques: &str,
) -> Vec<ChatMessage> {
    let system = format!(
        "{expert_system_prompt}\n\nBạn cần tinh chỉnh phân tích trước đó dựa trên phê bình nhận được.\nHãy giải quyết các vấn đề được nêu ra trong phê bình và cải thiện chất lượng phân tích."
    );
    let prompt = format!(
        r#"Dữ liệu cần phân tích:

{input_data}

Tài liệu có tên: {file_name}

Phân tích hiện tại của bạn:
{current_analysis}

Phê bình nhận được:
{critiques}

Hãy tinh chỉnh phân tích của bạn dựa trên phê bình trên. Đảm bảo giải quyết các điểm yếu và bổ sung các góc nhìn còn thiếu."#
    );

    vec![ChatMessage::system(system), ChatMessage::user(prompt)]
}

pub fn refine_group_summary(
    group_name: &str,
    expert_analyses: &str,
    current_summary: &str,
    critique: &str,
    file_name: &str,
) -> Vec<ChatMessage> {
    let system = format!(
        "Bạn là người tổng hợp ý kiến cho nhóm chuyên gia {group_name}.\nNhiệm vụ của bạn là tinh chỉnh tổng hợp trước đó dựa trên phê bình nhận được."
    );
    let prompt = format!(
        r#"Các phân tích từ các chuyên gia trong nhóm:

{expert_analyses}

Tổng hợp hiện tại của nhóm:
{current_summary}

Phê bình nhận được:
{critique}

Tài liệu đang phân tích có tên: {file_name}

Hãy tinh chỉnh tổng hợp của nhóm dựa trên phê bình trên. Đảm bảo giải quyết các điểm yếu và bổ sung các góc nhìn còn thiếu."#
    );

    vec![ChatMessage::system(system), ChatMessage::user(prompt)]
}

pub fn refine_final_report(
    group_summaries: &str,
    current_report: &str,
    meta_critique: &str,
    file_name: &str,
) -> Vec<ChatMessage> {
    let prompt = format!(
        r#"Tổng hợp từ các nhóm chuyên gia:

{group_summaries}

Báo cáo hiện tại:
{current_report}

Phê bình tổng thể:
{meta_critique}

Tài liệu đang phân tích có tên: {file_name}

Hãy tinh chỉnh báo cáo cuối cùng dựa trên phê bình tổng thể. Đảm bảo giải quyết các điểm yếu, mâu thuẫn và bổ sung các góc nhìn còn thiếu."#
    );

    vec![
        ChatMessage::system(
            "Bạn là chuyên gia tổng hợp báo cáo cuối cùng.\nNhiệm vụ của bạn là tinh chỉnh báo cáo trước đó dựa trên phê bình tổng thể nhận được.",
        ),
        ChatMessage::user(prompt),
    ]
}

// Conversational assistant

pub fn classify_request(history: &[ChatMessage]) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(
        "Bạn là một trợ lý AI thông minh.\nPhân tích yêu cầu của người dùng và quyết định bước tiếp theo.\nTrả về MỘT trong các lựa chọn sau:\n- answer: nếu câu hỏi có thể trả lời trực tiếp\n- research: nếu cần thêm thông tin\n- clarify: nếu yêu cầu không rõ ràng",
    )];
    messages.extend_from_slice(history);
    messages.push(ChatMessage::user(
        "Phân tích yêu cầu và trả về bước tiếp theo.",
    ));
    messages
}

pub fn answer_directly(history: &[ChatMessage]) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(
        "Bạn là một trợ lý AI hữu ích và thân thiện. Trả lời câu hỏi một cách đầy đủ và chính xác.",
    )];
    messages.extend_from_slice(history);
    messages
}

pub fn ask_for_clarification(history: &[ChatMessage]) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(
        "Bạn là một trợ lý AI. Yêu cầu người dùng làm rõ thông tin một cách lịch sự.",
    )];
    messages.extend_from_slice(history);
    messages.push(ChatMessage::user(
        "Tạo một câu hỏi để làm rõ yêu cầu của người dùng.",
    ));
    messages
}

pub fn research(history: &[ChatMessage], findings: &str) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(format!(
        "Bạn là một trợ lý AI đang tìm kiếm thông tin.\nDựa trên kết quả tìm kiếm dưới đây, hãy cung cấp thông tin chi tiết hơn và nói rõ rằng đây là thông tin bạn đã tìm kiếm thêm.\n\n{}",
        findings
    ))];
    messages.extend_from_slice(history);
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Role;

    #[test]
    fn test_compile_search_results_format() {
        let hits = vec![
            SearchHit {
                title: "VN-Index".to_string(),
                link: "https://cafef.vn".to_string(),
                snippet: "tăng điểm".to_string(),
            },
            SearchHit::default(),
        ];

        let compiled = compile_search_results(&hits);
        assert!(compiled.starts_with("SEARCH RESULTS:\n\nResult 1:\nTitle: VN-Index\n"));
        assert!(compiled.contains("Result 2:\nTitle: No title\nLink: No link\nSnippet: No snippet\n\n"));
    }

    #[test]
    fn test_compile_empty_results() {
        assert_eq!(compile_search_results(&[]), "SEARCH RESULTS:\n\n");
    }

    #[test]
    fn test_query_generation_embeds_expert_and_question() {
        let messages = query_generation("<role>X</role>", "Mua VCB?", "valuation_expert", "Vietnam");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[1].content.contains("QUESTION: Mua VCB?"));
        assert!(messages[1].content.contains("as a valuation_expert"));
        assert!(messages[1].content.contains("\"queries\": ["));
    }

    #[test]
    fn test_classify_wraps_history() {
        let history = vec![ChatMessage::user("GPT là gì?")];
        let messages = classify_request(&history);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].content, "GPT là gì?");
        assert_eq!(messages[2].role, Role::User);
    }
}
