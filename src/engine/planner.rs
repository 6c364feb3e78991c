use anyhow::Result;

use crate::engine::context::ResearchContext;
use crate::engine::types::{QueryPlan, ResearchQuery};

const SYSTEM_PROMPT: &str = "你是资深研究员，负责把研究主题拆解为一组高质量的搜索查询。\
每个查询必须互不重复、覆盖主题的不同侧面，并配一段具体的研究目标说明：\
除了陈述该查询想查明什么，还要给出拿到结果后进一步推进研究的方向。";

/// 查询规划器 - 把研究主题展开为带研究目标的候选子查询
#[derive(Default, Clone)]
pub struct QueryPlanner;

impl QueryPlanner {
    /// 生成不超过`count`条子查询
    ///
    /// 已有learnings会注入prompt，引导模型避开已覆盖的方向。
    /// 模型可能超产，结果截断到前`count`条；产出少于`count`条也是合法的。
    pub async fn plan(
        &self,
        context: &ResearchContext,
        topic: &str,
        prior_learnings: &[String],
        count: usize,
    ) -> Result<Vec<ResearchQuery>> {
        let user_prompt = self.build_user_prompt(topic, prior_learnings, count);

        let plan: QueryPlan = context.llm_client.extract(SYSTEM_PROMPT, &user_prompt).await?;

        let mut queries = plan.queries;
        queries.truncate(count);
        Ok(queries)
    }

    fn build_user_prompt(&self, topic: &str, prior_learnings: &[String], count: usize) -> String {
        let mut prompt = format!(
            "针对以下研究主题，生成最多{}条搜索查询：\n\n<主题>\n{}\n</主题>\n",
            count, topic
        );

        if !prior_learnings.is_empty() {
            prompt.push_str("\n以下是此前研究已获得的发现，新查询应深化或补足，避免重复覆盖：\n");
            for learning in prior_learnings {
                prompt.push_str(&format!("- {}\n", learning));
            }
        }

        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_prompt_includes_topic_and_count() {
        let planner = QueryPlanner;
        let prompt = planner.build_user_prompt("可再生能源趋势", &[], 4);
        assert!(prompt.contains("可再生能源趋势"));
        assert!(prompt.contains("最多4条"));
        assert!(!prompt.contains("此前研究已获得的发现"));
    }

    #[test]
    fn test_user_prompt_embeds_prior_learnings() {
        let planner = QueryPlanner;
        let learnings = vec!["2024年全球光伏新增装机约450GW".to_string()];
        let prompt = planner.build_user_prompt("可再生能源趋势", &learnings, 2);
        assert!(prompt.contains("2024年全球光伏新增装机约450GW"));
        assert!(prompt.contains("避免重复覆盖"));
    }
}
