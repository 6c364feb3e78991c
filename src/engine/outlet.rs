use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::engine::types::Report;

/// 保存研究报告到输出目录，返回写入的文件路径
pub async fn save_report(config: &Config, report: &Report) -> Result<PathBuf> {
    let path = config.output_path.join("report.md");
    write_markdown(config, &path, &report.render()).await?;
    Ok(path)
}

/// 保存最终答案到输出目录，返回写入的文件路径
pub async fn save_answer(config: &Config, answer: &str) -> Result<PathBuf> {
    let path = config.output_path.join("answer.md");
    write_markdown(config, &path, answer).await?;
    Ok(path)
}

async fn write_markdown(config: &Config, path: &PathBuf, content: &str) -> Result<()> {
    tokio::fs::create_dir_all(&config.output_path)
        .await
        .context(format!(
            "Failed to create output directory: {:?}",
            config.output_path
        ))?;
    tokio::fs::write(path, content)
        .await
        .context(format!("Failed to write output file: {:?}", path))?;
    Ok(())
}
