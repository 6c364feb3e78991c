use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::engine::context::ResearchContext;

const SYSTEM_PROMPT: &str = "你是研究顾问。用户提出了一个研究问题，\
请提出若干澄清性问题，帮助明确研究的范围、侧重点与期望的产出形式。\
只在真正有歧义的地方提问。";

/// 澄清问题的结构化输出
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
struct ClarifyingQuestions {
    /// 向用户提出的澄清性问题
    questions: Vec<String>,
}

/// 研究开始前向用户澄清研究方向
///
/// 返回不超过`count`个澄清性问题；模型认为问题已足够清晰时可以返回空列表。
pub async fn generate_questions(
    context: &ResearchContext,
    query: &str,
    count: usize,
) -> Result<Vec<String>> {
    let user_prompt = format!(
        "针对以下研究问题，提出最多{}个澄清性问题：\n\n<研究问题>\n{}\n</研究问题>",
        count, query
    );

    let clarifying: ClarifyingQuestions = context
        .llm_client
        .extract(SYSTEM_PROMPT, &user_prompt)
        .await?;

    let mut questions = clarifying.questions;
    questions.truncate(count);
    Ok(questions)
}

/// 把原始问题与用户的澄清回答合成为增强后的研究主题
pub fn combine_with_answers(query: &str, pairs: &[(String, String)]) -> String {
    if pairs.is_empty() {
        return query.to_string();
    }

    let mut combined = format!("初始研究问题: {}\n用户的补充澄清:\n", query);
    for (question, answer) in pairs {
        combined.push_str(&format!("问: {}\n答: {}\n", question, answer));
    }
    combined
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_without_answers_is_identity() {
        assert_eq!(combine_with_answers("原始问题", &[]), "原始问题");
    }

    #[test]
    fn test_combine_embeds_question_answer_pairs() {
        let pairs = vec![(
            "关注哪个地区？".to_string(),
            "主要是东南亚市场".to_string(),
        )];
        let combined = combine_with_answers("电动车市场趋势", &pairs);
        assert!(combined.contains("电动车市场趋势"));
        assert!(combined.contains("问: 关注哪个地区？"));
        assert!(combined.contains("答: 主要是东南亚市场"));
    }
}
