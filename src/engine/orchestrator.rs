use anyhow::Result;
use futures::FutureExt;
use futures::future::{BoxFuture, join_all};

use crate::engine::context::ResearchContext;
use crate::engine::distiller::ResultDistiller;
use crate::engine::planner::QueryPlanner;
use crate::engine::types::{ResearchAccumulator, ResearchBudget, ResearchQuery};
use crate::error::ResearchError;

/// 递归研究编排器
///
/// 每次调用是递归树上的一个节点：规划子查询、逐分支执行搜索与蒸馏、
/// 对后续问题降档递归，最后合并全部分支贡献。所有协作方调用
/// （规划、搜索、蒸馏）都在全局并发闸门内进行，许可按调用阶段取放。
/// 分支内的任何失败都在分支边界被吸收，绝不波及兄弟分支或父节点；
/// 只有顶层的规划失败会向调用方传播。
#[derive(Default)]
pub struct ResearchOrchestrator {
    planner: QueryPlanner,
    distiller: ResultDistiller,
}

impl ResearchOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 执行一层研究展开，返回合并后的研究积累
    ///
    /// 返回BoxFuture以支持异步递归。`accumulator`按值传入：
    /// 每个分支拿到父节点积累的独立副本，合并只发生在所有分支完成之后。
    pub fn research<'a>(
        &'a self,
        context: &'a ResearchContext,
        query: String,
        budget: ResearchBudget,
        accumulator: ResearchAccumulator,
    ) -> BoxFuture<'a, Result<ResearchAccumulator>> {
        async move {
            if budget.is_exhausted() || budget.breadth == 0 {
                return Ok(accumulator);
            }

            println!(
                "🚀 展开研究 (广度{} 深度{}): {}",
                budget.breadth,
                budget.depth,
                preview(&query)
            );

            // 规划调用同样计入全局闸门：递归下层的规划与上层分支的
            // 搜索蒸馏竞争同一批许可，任意深度下协作方等待数都不超上限。
            // 顶层规划失败不做分支隔离，直接向调用方传播
            let sub_queries = {
                let _permit = context.gate.acquire().await?;
                self.planner
                    .plan(
                        context,
                        &query,
                        &accumulator.learnings,
                        budget.breadth as usize,
                    )
                    .await?
            };

            println!("📋 规划出{}条子查询", sub_queries.len());

            let branch_futures: Vec<_> = sub_queries
                .into_iter()
                .map(|sub| {
                    let seed = accumulator.clone();
                    async move {
                        match self.run_branch(context, &sub, budget, seed).await {
                            Ok(contribution) => contribution,
                            Err(e) => {
                                // 分支边界：失败降级为空贡献，兄弟分支不受影响
                                println!("⚠️ 子查询「{}」分支失败，跳过: {}", sub.query, e);
                                ResearchAccumulator::default()
                            }
                        }
                    }
                })
                .collect();

            let branch_results = join_all(branch_futures).await;

            let mut merged = accumulator;
            for contribution in branch_results {
                merged.absorb(contribution);
            }
            Ok(merged)
        }
        .boxed()
    }

    /// 执行单个分支：搜索 → 蒸馏 → 视深度决定是否递归
    async fn run_branch(
        &self,
        context: &ResearchContext,
        sub: &ResearchQuery,
        budget: ResearchBudget,
        seed: ResearchAccumulator,
    ) -> Result<ResearchAccumulator> {
        if sub.query.trim().is_empty() {
            return Err(ResearchError::InvalidSubQuery.into());
        }

        let follow_up_limit = budget.breadth.div_ceil(2) as usize;

        // 闸门覆盖本分支的协作方调用阶段（搜索+蒸馏），递归前释放；
        // 许可从不跨越递归持有（否则全局上限为2时深度≥3必然死锁），
        // 递归下层的每次协作方调用会各自重新取许可
        let (learnings, follow_ups, urls) = {
            let _permit = context.gate.acquire().await?;

            println!("🔍 搜索: {}", sub.query);
            let results = context.search_client.search(&sub.query).await?;

            let urls: Vec<String> = results.iter().filter_map(|item| item.url.clone()).collect();

            let distilled = self
                .distiller
                .distill(
                    context,
                    &sub.query,
                    &results,
                    context.config.research.learnings_limit,
                    follow_up_limit,
                )
                .await?;

            (distilled.learnings, distilled.follow_up_questions, urls)
        };

        println!(
            "💡 「{}」蒸馏出{}条learning，{}个后续问题",
            sub.query,
            learnings.len(),
            follow_ups.len()
        );

        let mut branch_acc = seed;
        branch_acc.add_learnings(learnings);
        branch_acc.add_urls(urls);

        let child = budget.child();
        if child.is_exhausted() {
            // 深度耗尽是正常终止，分支贡献就是自身的发现
            return Ok(branch_acc);
        }

        let next_query = compose_next_query(&sub.research_goal, &follow_ups);
        self.research(context, next_query, child, branch_acc).await
    }
}

/// 由父分支的研究目标与后续问题合成下一层的复合查询
fn compose_next_query(research_goal: &str, follow_ups: &[String]) -> String {
    let mut next = format!("上一层研究目标: {}\n需要跟进的研究方向:\n", research_goal);
    for question in follow_ups {
        next.push_str(&format!("- {}\n", question));
    }
    next
}

/// 日志里只展示查询的开头，复合查询可能很长
fn preview(query: &str) -> String {
    const LIMIT: usize = 80;
    if query.chars().count() <= LIMIT {
        query.to_string()
    } else {
        let head: String = query.chars().take(LIMIT).collect();
        format!("{}…", head)
    }
}
