use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 一条候选子查询：搜索文本与它要达成的研究目标
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResearchQuery {
    /// 提交给搜索引擎的查询文本
    pub query: String,
    /// 该查询要达成的研究目标，以及拿到结果后进一步推进研究的方向
    pub research_goal: String,
}

/// 规划器的结构化输出
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QueryPlan {
    /// 互不重复的候选子查询列表
    pub queries: Vec<ResearchQuery>,
}

/// 蒸馏器的结构化输出：learnings与后续研究问题
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DistillationResult {
    /// 原子化、自包含、信息具体的研究发现
    pub learnings: Vec<String>,
    /// 可用于深化研究方向的后续问题
    pub follow_up_questions: Vec<String>,
}

/// 研究预算：广度与深度，每递归一层严格收缩
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResearchBudget {
    /// 当前层展开的子查询数量
    pub breadth: u8,
    /// 剩余递归层数，0表示终止
    pub depth: u8,
}

impl ResearchBudget {
    pub fn new(breadth: u8, depth: u8) -> Self {
        Self { breadth, depth }
    }

    /// 下一层预算：广度减半（向上取整），深度减一
    pub fn child(&self) -> Self {
        Self {
            breadth: self.breadth.div_ceil(2),
            depth: self.depth.saturating_sub(1),
        }
    }

    /// 深度耗尽是正常的终止状态，不是错误
    pub fn is_exhausted(&self) -> bool {
        self.depth == 0
    }
}

/// 贯穿整棵递归树的研究积累：learnings与已访问URL
///
/// 按值在递归间传递，分支之间不共享可变状态；
/// 去重在合并时完成，保持首次出现的顺序。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchAccumulator {
    pub learnings: Vec<String>,
    pub visited_urls: Vec<String>,
}

impl ResearchAccumulator {
    /// 追加learnings，跳过已存在的重复项
    pub fn add_learnings<I>(&mut self, learnings: I)
    where
        I: IntoIterator<Item = String>,
    {
        dedup_extend(&mut self.learnings, learnings);
    }

    /// 追加已访问URL，跳过已存在的重复项
    pub fn add_urls<I>(&mut self, urls: I)
    where
        I: IntoIterator<Item = String>,
    {
        dedup_extend(&mut self.visited_urls, urls);
    }

    /// 吸收另一个积累器的全部内容（集合并集语义）
    pub fn absorb(&mut self, other: ResearchAccumulator) {
        self.add_learnings(other.learnings);
        self.add_urls(other.visited_urls);
    }
}

/// 保序去重地扩展目标列表
fn dedup_extend<I>(target: &mut Vec<String>, incoming: I)
where
    I: IntoIterator<Item = String>,
{
    use std::collections::HashSet;

    let mut seen: HashSet<String> = target.iter().cloned().collect();
    for item in incoming {
        if seen.insert(item.clone()) {
            target.push(item);
        }
    }
}

/// 终态产物：报告正文与来源列表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub body_markdown: String,
    pub sources: Vec<String>,
}

impl Report {
    /// 渲染为最终markdown：正文加确定性格式的来源章节
    pub fn render(&self) -> String {
        if self.sources.is_empty() {
            return self.body_markdown.clone();
        }

        let listed: String = self
            .sources
            .iter()
            .map(|url| format!("- {}\n", url))
            .collect();
        format!("{}\n\n## 来源\n\n{}", self.body_markdown.trim_end(), listed)
    }
}
