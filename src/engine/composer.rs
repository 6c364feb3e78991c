use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::engine::context::ResearchContext;
use crate::engine::types::{Report, ResearchAccumulator};
use crate::utils::text_trimmer::TextTrimmer;

/// 全部learnings拼接后允许占用的token预算
const LEARNINGS_TOKEN_BUDGET: usize = 150_000;

const REPORT_SYSTEM_PROMPT: &str = "你是专业的研究报告撰写者。基于用户的原始研究问题\
与研究过程中积累的全部learnings，撰写一份详尽的长篇markdown研究报告：\
结构清晰、论据具体，把每条相关的learning都组织进报告，不要遗漏数字与实体细节。";

const ANSWER_SYSTEM_PROMPT: &str = "你是严谨的研究助手。基于研究过程中积累的learnings，\
对用户的原始研究问题给出一个简明、直接的最终答案，不要展开论述过程。";

/// 报告合成器的结构化输出
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
struct ComposedReport {
    /// 报告正文，markdown格式
    report_markdown: String,
}

/// 最终答案模式的结构化输出
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
struct ComposedAnswer {
    /// 简明的最终答案
    answer: String,
}

/// 报告合成器 - 把积累的研究发现折叠为终态产物
#[derive(Clone)]
pub struct ReportComposer {
    trimmer: TextTrimmer,
}

impl Default for ReportComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportComposer {
    pub fn new() -> Self {
        Self {
            trimmer: TextTrimmer::new(),
        }
    }

    /// 合成长篇研究报告，末尾附确定性格式的来源列表
    ///
    /// 这是顶层操作，失败直接向调用方传播，不做分支隔离。
    pub async fn write_report(
        &self,
        context: &ResearchContext,
        query: &str,
        accumulator: &ResearchAccumulator,
    ) -> Result<Report> {
        let learnings_block = self.tagged_learnings(&accumulator.learnings)?;
        let user_prompt = format!(
            "<原始研究问题>\n{}\n</原始研究问题>\n\n以下是研究积累的全部learnings：\n\n{}",
            query, learnings_block
        );

        let composed: ComposedReport = context
            .llm_client
            .extract(REPORT_SYSTEM_PROMPT, &user_prompt)
            .await?;

        Ok(Report {
            body_markdown: composed.report_markdown,
            sources: accumulator.visited_urls.clone(),
        })
    }

    /// 合成简明的最终答案（answer模式）
    pub async fn write_answer(
        &self,
        context: &ResearchContext,
        query: &str,
        accumulator: &ResearchAccumulator,
    ) -> Result<String> {
        let learnings_block = self.tagged_learnings(&accumulator.learnings)?;
        let user_prompt = format!(
            "<原始研究问题>\n{}\n</原始研究问题>\n\n以下是研究积累的全部learnings：\n\n{}",
            query, learnings_block
        );

        let composed: ComposedAnswer = context
            .llm_client
            .extract(ANSWER_SYSTEM_PROMPT, &user_prompt)
            .await?;

        Ok(composed.answer)
    }

    /// 把learnings打上标签拼接，并整体裁剪到token预算内
    fn tagged_learnings(&self, learnings: &[String]) -> Result<String> {
        let joined: String = learnings
            .iter()
            .map(|learning| format!("<learning>\n{}\n</learning>\n", learning))
            .collect();
        self.trimmer.trim(&joined, LEARNINGS_TOKEN_BUDGET)
    }
}
