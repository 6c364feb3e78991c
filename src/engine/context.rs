use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Semaphore;

use crate::{config::Config, llm::client::LLMClient, search::SearchClient};

/// 研究上下文：进程启动时构建一次，贯穿整棵递归树
///
/// 没有任何模块级全局状态，所有协作方句柄都显式挂在上下文上。
/// `gate`是全进程唯一的并发准入闸门：无论递归多深，
/// 同时处于协作方调用阶段的分支数都不会超过配置的上限。
#[derive(Clone)]
pub struct ResearchContext {
    /// LLM调用器，用于与AI通信
    pub llm_client: LLMClient,
    /// 搜索调用器
    pub search_client: SearchClient,
    /// 配置
    pub config: Config,
    /// 全局并发准入闸门
    pub gate: Arc<Semaphore>,
}

impl ResearchContext {
    /// 创建新的研究上下文
    pub fn new(config: Config) -> Result<Self> {
        let llm_client = LLMClient::new(&config)?;
        let search_client = SearchClient::new(&config.search);
        let gate = Arc::new(Semaphore::new(config.research.concurrency.max(1)));

        Ok(Self {
            llm_client,
            search_client,
            config,
            gate,
        })
    }

    /// 用自定义协作方客户端组装上下文（测试用mock也走这里）
    pub fn with_clients(config: Config, llm_client: LLMClient, search_client: SearchClient) -> Self {
        let gate = Arc::new(Semaphore::new(config.research.concurrency.max(1)));
        Self {
            llm_client,
            search_client,
            config,
            gate,
        }
    }
}
