use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

/// LLM Provider类型
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum LLMProvider {
    #[serde(rename = "openai")]
    #[default]
    OpenAI,
    #[serde(rename = "moonshot")]
    Moonshot,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "openrouter")]
    OpenRouter,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "ollama")]
    Ollama,
}

impl LLMProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            LLMProvider::OpenAI => "openai",
            LLMProvider::Moonshot => "moonshot",
            LLMProvider::DeepSeek => "deepseek",
            LLMProvider::OpenRouter => "openrouter",
            LLMProvider::Anthropic => "anthropic",
            LLMProvider::Ollama => "ollama",
        }
    }
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(LLMProvider::OpenAI),
            "moonshot" => Ok(LLMProvider::Moonshot),
            "deepseek" => Ok(LLMProvider::DeepSeek),
            "openrouter" => Ok(LLMProvider::OpenRouter),
            "anthropic" => Ok(LLMProvider::Anthropic),
            "ollama" => Ok(LLMProvider::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// 搜索服务Provider类型
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum SearchProvider {
    #[serde(rename = "firecrawl")]
    #[default]
    Firecrawl,
    #[serde(rename = "tavily")]
    Tavily,
}

impl SearchProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchProvider::Firecrawl => "firecrawl",
            SearchProvider::Tavily => "tavily",
        }
    }
}

impl std::fmt::Display for SearchProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SearchProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "firecrawl" => Ok(SearchProvider::Firecrawl),
            "tavily" => Ok(SearchProvider::Tavily),
            _ => Err(format!("Unknown search provider: {}", s)),
        }
    }
}

/// 研究产出模式
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum ResearchMode {
    /// 长篇研究报告，附来源列表
    #[serde(rename = "report")]
    #[default]
    Report,
    /// 简明直接的最终答案
    #[serde(rename = "answer")]
    Answer,
}

impl std::fmt::Display for ResearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResearchMode::Report => write!(f, "report"),
            ResearchMode::Answer => write!(f, "answer"),
        }
    }
}

impl std::str::FromStr for ResearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "report" => Ok(ResearchMode::Report),
            "answer" => Ok(ResearchMode::Answer),
            _ => Err(format!("Unknown research mode: {}", s)),
        }
    }
}

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// 输出路径
    pub output_path: PathBuf,

    /// LLM模型配置
    pub llm: LLMConfig,

    /// 搜索服务配置
    pub search: SearchConfig,

    /// 研究预算与编排配置
    pub research: ResearchConfig,

    /// 是否启用详细日志
    pub verbose: bool,
}

/// LLM模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LLMConfig {
    /// LLM Provider类型
    pub provider: LLMProvider,

    /// LLM API KEY
    pub api_key: String,

    /// LLM API基地址
    pub api_base_url: String,

    /// 推理模型
    pub model: String,

    /// 最大tokens
    pub max_tokens: u32,

    /// 温度
    pub temperature: f64,

    /// 重试次数
    pub retry_attempts: u32,

    /// 重试间隔（毫秒）
    pub retry_delay_ms: u64,

    /// 单次调用超时时间（秒）
    pub timeout_seconds: u64,

    /// 相邻两次模型调用的最小间隔（毫秒），0表示不限流
    pub min_call_interval_ms: u64,
}

/// 搜索服务配置
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SearchConfig {
    /// 搜索Provider类型
    pub provider: SearchProvider,

    /// 搜索API KEY
    pub api_key: String,

    /// 搜索API基地址
    pub api_base_url: String,

    /// 单次搜索超时时间（毫秒）
    pub timeout_ms: u64,

    /// 单次搜索的结果数量上限
    pub max_results: usize,

    /// 相邻两次搜索调用的最小间隔（毫秒），0表示不限流
    pub min_call_interval_ms: u64,
}

/// 研究预算与编排配置
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ResearchConfig {
    /// 初始广度：第一层展开的子查询数量
    pub breadth: u8,

    /// 初始深度：递归层数
    pub depth: u8,

    /// 全局并发上限：同时处于协作方调用阶段的分支数
    pub concurrency: usize,

    /// 每个子查询蒸馏出的learning数量上限
    pub learnings_limit: usize,

    /// 研究开始前是否先向用户澄清研究方向
    pub clarify: bool,

    /// 产出模式
    pub mode: ResearchMode,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("./research.out"),
            llm: LLMConfig::default(),
            search: SearchConfig::default(),
            research: ResearchConfig::default(),
            verbose: false,
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::default(),
            api_key: std::env::var("DEEPRESEARCH_LLM_API_KEY").unwrap_or_default(),
            api_base_url: String::from("https://api-inference.modelscope.cn/v1"),
            model: String::from("Qwen/Qwen3-Next-80B-A3B-Instruct"),
            max_tokens: 131072,
            temperature: 0.1,
            retry_attempts: 3,
            retry_delay_ms: 5000,
            timeout_seconds: 60,
            min_call_interval_ms: 0,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: SearchProvider::default(),
            api_key: std::env::var("DEEPRESEARCH_SEARCH_API_KEY")
                .or_else(|_| std::env::var("FIRECRAWL_API_KEY"))
                .unwrap_or_default(),
            api_base_url: String::from("https://api.firecrawl.dev"),
            timeout_ms: 15000,
            max_results: 5,
            min_call_interval_ms: 1000,
        }
    }
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            breadth: 4,
            depth: 2,
            concurrency: 2,
            learnings_limit: 3,
            clarify: false,
            mode: ResearchMode::default(),
        }
    }
}
