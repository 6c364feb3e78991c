//! LLM客户端 - 提供统一的模型补全服务接口

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;

use crate::config::{Config, LLMConfig};
use crate::error::ResearchError;
use crate::llm::extractor;
use crate::utils::rate_limiter::RateLimiter;

mod providers;

use providers::ProviderClient;

/// 模型补全能力接口
///
/// 调用方只依赖该能力本身，不关心背后是哪个provider。
/// 空响应或仅空白的响应不视为错误，由下游的结构化提取处理。
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// 后端标识，用于日志
    fn name(&self) -> &str;

    /// 执行一次补全请求，返回原始响应文本
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// 基于rig provider的默认补全后端
struct ProviderBackend {
    client: ProviderClient,
    config: LLMConfig,
}

#[async_trait]
impl CompletionBackend for ProviderBackend {
    fn name(&self) -> &str {
        self.config.provider.as_str()
    }

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let agent = self
            .client
            .create_agent(&self.config.model, system_prompt, &self.config);
        agent.prompt(user_prompt).await
    }
}

/// LLM客户端 - 在补全后端之上叠加限流、超时与重试
#[derive(Clone)]
pub struct LLMClient {
    backend: Arc<dyn CompletionBackend>,
    config: LLMConfig,
    limiter: Arc<RateLimiter>,
    verbose: bool,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: &Config) -> Result<Self> {
        let client = ProviderClient::new(&config.llm)?;
        let backend = Arc::new(ProviderBackend {
            client,
            config: config.llm.clone(),
        });
        Ok(Self::with_backend(backend, &config.llm, config.verbose))
    }

    /// 用自定义后端创建客户端（测试用mock后端也走这里）
    pub fn with_backend(
        backend: Arc<dyn CompletionBackend>,
        config: &LLMConfig,
        verbose: bool,
    ) -> Self {
        let limiter = Arc::new(RateLimiter::new(1, config.min_call_interval_ms));
        Self {
            backend,
            config: config.clone(),
            limiter,
            verbose,
        }
    }

    /// 检查模型连接是否正常
    pub async fn check_connection(&self) -> Result<()> {
        println!("🔄 正在检查模型连接...");
        match self
            .complete("You are a helpful assistant.", "Hello")
            .await
        {
            Ok(_) => {
                println!("✅ 模型连接正常");
                Ok(())
            }
            Err(e) => {
                eprintln!("❌ 模型连接失败: {}", e);
                Err(e)
            }
        }
    }

    /// 执行一次补全调用，带限流、单次调用超时与重试
    ///
    /// 超时只作用于单次调用，超时后按重试策略换一次机会，
    /// 重试耗尽才向调用方返回`CompletionFailure`。
    pub async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let max_retries = self.config.retry_attempts;
        let retry_delay_ms = self.config.retry_delay_ms;
        let call_timeout = Duration::from_secs(self.config.timeout_seconds);
        let mut retries = 0;

        loop {
            self.limiter.acquire().await;

            let attempt =
                tokio::time::timeout(call_timeout, self.backend.complete(system_prompt, user_prompt))
                    .await;

            let err = match attempt {
                Ok(Ok(text)) => return Ok(text),
                Ok(Err(e)) => ResearchError::CompletionFailure(e.to_string()),
                Err(_) => ResearchError::CompletionFailure(format!(
                    "单次调用超过 {} 秒超时上限",
                    self.config.timeout_seconds
                )),
            };

            retries += 1;
            eprintln!(
                "❌ 调用模型服务出错，重试中 (第 {} / {} 次尝试): {}",
                retries, max_retries, err
            );
            if retries >= max_retries {
                return Err(err.into());
            }
            tokio::time::sleep(Duration::from_millis(retry_delay_ms)).await;
        }
    }

    /// 结构化数据提取方法
    ///
    /// 把目标类型的JSON Schema嵌入系统提示词，补全后经候选定位、清洗、
    /// 解析、校验得到类型化结果。解析或校验失败返回`MalformedModelOutput`，
    /// 此处不重试，由调用方决定如何处理。
    pub async fn extract<T>(&self, system_prompt: &str, user_prompt: &str) -> Result<T>
    where
        T: JsonSchema + DeserializeOwned,
    {
        let schema = serde_json::to_string_pretty(&schemars::schema_for!(T))?;
        let system_with_schema = format!(
            "{}\n\n你必须输出一个```json围栏代码块，其内容严格符合以下JSON Schema：\n{}",
            system_prompt, schema
        );

        let response = self.complete(&system_with_schema, user_prompt).await?;

        if self.verbose {
            println!("📋 模型原始输出:\n{}", response);
        }

        extractor::extract_structured::<T>(&response).map_err(|e| {
            eprintln!("⚠️ {}", e.diagnostic());
            e.into()
        })
    }
}
