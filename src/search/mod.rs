//! 网络搜索客户端 - 提供统一的搜索服务接口

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::error::ResearchError;
use crate::utils::rate_limiter::RateLimiter;

mod providers;

use providers::build_backend;

/// 单条搜索结果
///
/// 上游字段均可能缺失，URL为空的条目在收集来源时被跳过。
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SearchResultItem {
    pub url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// 抓取到的页面正文（markdown格式），比摘要信息量更大
    pub markdown: Option<String>,
}

impl SearchResultItem {
    /// 取信息量最大的非空正文字段
    pub fn contents(&self) -> Option<&str> {
        fn pick(s: &Option<String>) -> Option<&str> {
            s.as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty())
        }
        pick(&self.markdown).or_else(|| pick(&self.description))
    }
}

/// 单次搜索的限制参数
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub timeout_ms: u64,
    pub max_results: usize,
}

/// 网络搜索能力接口
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// 后端标识，用于日志
    fn name(&self) -> &str;

    /// 执行一次搜索请求
    async fn search(&self, query: &str, opts: &SearchOptions) -> Result<Vec<SearchResultItem>>;
}

/// 搜索客户端 - 在搜索后端之上叠加限流与超时
#[derive(Clone)]
pub struct SearchClient {
    backend: Arc<dyn SearchBackend>,
    config: SearchConfig,
    limiter: Arc<RateLimiter>,
}

impl SearchClient {
    /// 创建新的搜索客户端
    ///
    /// API KEY缺失不会导致构造失败，只有真正发起搜索时才会报错。
    pub fn new(config: &SearchConfig) -> Self {
        let backend = build_backend(config);
        Self::with_backend(backend, config)
    }

    /// 用自定义后端创建客户端（测试用mock后端也走这里）
    pub fn with_backend(backend: Arc<dyn SearchBackend>, config: &SearchConfig) -> Self {
        let limiter = Arc::new(RateLimiter::new(1, config.min_call_interval_ms));
        Self {
            backend,
            config: config.clone(),
            limiter,
        }
    }

    /// 执行一次搜索，带限流与单次调用超时
    ///
    /// 超时或传输错误以`SearchFailure`返回，由编排器作为分支内失败处理。
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResultItem>> {
        self.limiter.acquire().await;

        let opts = SearchOptions {
            timeout_ms: self.config.timeout_ms,
            max_results: self.config.max_results,
        };

        let attempt = tokio::time::timeout(
            Duration::from_millis(self.config.timeout_ms),
            self.backend.search(query, &opts),
        )
        .await;

        match attempt {
            Ok(Ok(mut results)) => {
                results.truncate(self.config.max_results);
                Ok(results)
            }
            Ok(Err(e)) => Err(ResearchError::SearchFailure(e.to_string()).into()),
            Err(_) => Err(ResearchError::SearchFailure(format!(
                "单次搜索超过 {} 毫秒超时上限",
                self.config.timeout_ms
            ))
            .into()),
        }
    }
}
