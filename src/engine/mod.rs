use std::io::{BufRead, Write};

use anyhow::Result;

use crate::config::{Config, ResearchMode};

pub mod composer;
pub mod context;
pub mod distiller;
pub mod feedback;
pub mod orchestrator;
pub mod outlet;
pub mod planner;
pub mod types;

use composer::ReportComposer;
use context::ResearchContext;
use orchestrator::ResearchOrchestrator;
use types::{ResearchAccumulator, ResearchBudget};

/// 研究开始前最多向用户提出的澄清问题数
const CLARIFY_QUESTION_LIMIT: usize = 3;

/// 启动研究工作流
pub async fn launch(config: &Config, query: &str) -> Result<()> {
    let context = ResearchContext::new(config.clone())?;

    // 启动时检查模型连接
    context.llm_client.check_connection().await?;

    let topic = if config.research.clarify {
        clarify_topic(&context, query).await?
    } else {
        query.to_string()
    };

    let orchestrator = ResearchOrchestrator::new();
    let budget = ResearchBudget::new(config.research.breadth, config.research.depth);

    let accumulator = orchestrator
        .research(&context, topic.clone(), budget, ResearchAccumulator::default())
        .await?;

    println!(
        "✅ 研究完成：{}条learning，{}个来源",
        accumulator.learnings.len(),
        accumulator.visited_urls.len()
    );

    let composer = ReportComposer::new();
    match config.research.mode {
        ResearchMode::Report => {
            let report = composer.write_report(&context, &topic, &accumulator).await?;
            let path = outlet::save_report(config, &report).await?;
            println!("📄 研究报告已保存至 {}", path.display());
        }
        ResearchMode::Answer => {
            let answer = composer.write_answer(&context, &topic, &accumulator).await?;
            let path = outlet::save_answer(config, &answer).await?;
            println!("📄 最终答案已保存至 {}", path.display());
        }
    }

    Ok(())
}

/// 生成澄清问题并逐一收集用户回答，合成增强后的研究主题
async fn clarify_topic(context: &ResearchContext, query: &str) -> Result<String> {
    let questions = feedback::generate_questions(context, query, CLARIFY_QUESTION_LIMIT).await?;
    if questions.is_empty() {
        return Ok(query.to_string());
    }

    println!("❓ 回答以下问题以明确研究方向（直接回车跳过）：");
    let stdin = std::io::stdin();
    let mut pairs = Vec::new();
    for question in questions {
        print!("{} > ", question);
        std::io::stdout().flush()?;
        let mut answer = String::new();
        stdin.lock().read_line(&mut answer)?;
        let answer = answer.trim().to_string();
        if !answer.is_empty() {
            pairs.push((question, answer));
        }
    }

    Ok(feedback::combine_with_answers(query, &pairs))
}

// Include tests
#[cfg(test)]
mod tests;
