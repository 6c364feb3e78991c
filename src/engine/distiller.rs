use anyhow::Result;

use crate::engine::context::ResearchContext;
use crate::engine::types::DistillationResult;
use crate::search::SearchResultItem;
use crate::utils::text_trimmer::TextTrimmer;

/// 单篇搜索结果正文允许占用的token预算，防止个别超长页面撑爆上下文窗口
const CONTENT_TOKEN_BUDGET: usize = 25_000;

const SYSTEM_PROMPT: &str = "你是严谨的研究分析师，负责从搜索结果中蒸馏研究发现。\
每条learning必须是自包含、信息具体的原子化事实陈述，尽可能包含确切的实体名称、\
数字、日期；互相之间不得重复。后续问题应指向能深化研究的方向。";

/// 结果蒸馏器 - 把一批原始搜索结果浓缩为learnings与后续研究问题
#[derive(Clone)]
pub struct ResultDistiller {
    trimmer: TextTrimmer,
}

impl Default for ResultDistiller {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultDistiller {
    pub fn new() -> Self {
        Self {
            trimmer: TextTrimmer::new(),
        }
    }

    /// 蒸馏一个子查询的搜索结果
    ///
    /// 空正文的结果直接跳过；非空正文逐篇裁剪到token预算内再进入prompt。
    pub async fn distill(
        &self,
        context: &ResearchContext,
        query: &str,
        results: &[SearchResultItem],
        learnings_limit: usize,
        follow_up_limit: usize,
    ) -> Result<DistillationResult> {
        let contents = self.collect_contents(results)?;
        let user_prompt =
            self.build_user_prompt(query, &contents, learnings_limit, follow_up_limit);

        let mut distilled: DistillationResult = context
            .llm_client
            .extract(SYSTEM_PROMPT, &user_prompt)
            .await?;

        distilled.learnings.truncate(learnings_limit);
        distilled.follow_up_questions.truncate(follow_up_limit);
        Ok(distilled)
    }

    /// 提取非空正文并逐篇裁剪
    fn collect_contents(&self, results: &[SearchResultItem]) -> Result<Vec<String>> {
        results
            .iter()
            .filter_map(|item| item.contents())
            .map(|content| self.trimmer.trim(content, CONTENT_TOKEN_BUDGET))
            .collect()
    }

    fn build_user_prompt(
        &self,
        query: &str,
        contents: &[String],
        learnings_limit: usize,
        follow_up_limit: usize,
    ) -> String {
        let mut prompt = format!(
            "以下是针对查询「{}」抓取到的{}篇搜索结果正文。\
请蒸馏出最多{}条learning和最多{}个后续研究问题。\n\n",
            query,
            contents.len(),
            learnings_limit,
            follow_up_limit
        );

        for content in contents {
            prompt.push_str(&format!("<正文>\n{}\n</正文>\n", content));
        }

        prompt
    }
}
