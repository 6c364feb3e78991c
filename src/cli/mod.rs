use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use crate::config::{Config, LLMProvider, ResearchMode, SearchProvider};

/// DeepResearch-RS - 由Rust与AI驱动的递归式深度研究引擎
#[derive(Parser, Debug)]
#[command(name = "deepresearch-rs")]
#[command(
    about = "AI-based recursive research engine. It plans search queries from a research topic, distills the results into learnings, recursively follows up on open questions, and composes a final report with sources."
)]
#[command(version)]
pub struct Args {
    /// 研究主题或研究问题
    pub query: String,

    /// 输出路径
    #[arg(short, long)]
    pub output_path: Option<PathBuf>,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 初始广度：第一层展开的子查询数量
    #[arg(short, long)]
    pub breadth: Option<u8>,

    /// 初始深度：递归层数
    #[arg(short, long)]
    pub depth: Option<u8>,

    /// 产出模式 (report, answer)
    #[arg(long)]
    pub mode: Option<String>,

    /// 研究开始前先向用户澄清研究方向
    #[arg(long)]
    pub clarify: bool,

    /// 全局并发上限
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// LLM Provider (openai, moonshot, deepseek, openrouter, anthropic, ollama)
    #[arg(long)]
    pub llm_provider: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// LLM API KEY
    #[arg(long)]
    pub llm_api_key: Option<String>,

    /// 推理模型
    #[arg(long)]
    pub model: Option<String>,

    /// 最大tokens数
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// 温度参数
    #[arg(long)]
    pub temperature: Option<f64>,

    /// 搜索Provider (firecrawl, tavily)
    #[arg(long)]
    pub search_provider: Option<String>,

    /// 搜索API KEY
    #[arg(long)]
    pub search_api_key: Option<String>,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// 将CLI参数转换为配置
    ///
    /// 优先级：命令行参数 > 配置文件 > 默认值。
    /// 未显式指定配置文件时尝试加载工作目录下的deepresearch.toml。
    pub fn into_config(self) -> Result<Config> {
        let mut config = if let Some(config_path) = &self.config {
            // 显式指定的配置文件必须可读，失败直接报错
            Config::from_file(config_path)?
        } else {
            let default_config_path = std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join("deepresearch.toml");

            if default_config_path.exists() {
                Config::from_file(&default_config_path)?
            } else {
                Config::default()
            }
        };

        if let Some(output_path) = self.output_path {
            config.output_path = output_path;
        }

        // 覆盖研究预算配置
        if let Some(breadth) = self.breadth {
            config.research.breadth = breadth;
        }
        if let Some(depth) = self.depth {
            config.research.depth = depth;
        }
        if let Some(concurrency) = self.concurrency {
            config.research.concurrency = concurrency;
        }
        if let Some(mode_str) = self.mode {
            if let Ok(mode) = mode_str.parse::<ResearchMode>() {
                config.research.mode = mode;
            } else {
                eprintln!("⚠️ 警告: 未知的产出模式: {}，使用report模式", mode_str);
            }
        }
        if self.clarify {
            config.research.clarify = true;
        }

        // 覆盖LLM配置
        if let Some(provider_str) = self.llm_provider {
            if let Ok(provider) = provider_str.parse::<LLMProvider>() {
                config.llm.provider = provider;
            } else {
                eprintln!(
                    "⚠️ 警告: 未知的provider: {}，使用默认provider",
                    provider_str
                );
            }
        }
        if let Some(llm_api_base_url) = self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url;
        }
        if let Some(llm_api_key) = self.llm_api_key {
            config.llm.api_key = llm_api_key;
        }
        if let Some(model) = self.model {
            config.llm.model = model;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.llm.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            config.llm.temperature = temperature;
        }

        // 覆盖搜索配置
        if let Some(provider_str) = self.search_provider {
            if let Ok(provider) = provider_str.parse::<SearchProvider>() {
                config.search.provider = provider;
            } else {
                eprintln!(
                    "⚠️ 警告: 未知的搜索provider: {}，使用默认provider",
                    provider_str
                );
            }
        }
        if let Some(search_api_key) = self.search_api_key {
            config.search.api_key = search_api_key;
        }

        if self.verbose {
            config.verbose = true;
        }

        Ok(config)
    }
}
