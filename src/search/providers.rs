//! 搜索Provider支持模块

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{SearchConfig, SearchProvider};
use crate::search::{SearchBackend, SearchOptions, SearchResultItem};

/// 根据配置创建相应的搜索后端
pub fn build_backend(config: &SearchConfig) -> Arc<dyn SearchBackend> {
    match config.provider {
        SearchProvider::Firecrawl => Arc::new(FirecrawlBackend::new(config)),
        SearchProvider::Tavily => Arc::new(TavilyBackend::new(config)),
    }
}

/// Firecrawl搜索后端，抓取结果页正文为markdown
pub struct FirecrawlBackend {
    http: reqwest::Client,
    api_key: String,
    api_base_url: String,
}

#[derive(Serialize)]
struct FirecrawlSearchRequest<'a> {
    query: &'a str,
    limit: usize,
    timeout: u64,
    #[serde(rename = "scrapeOptions")]
    scrape_options: FirecrawlScrapeOptions,
}

#[derive(Serialize)]
struct FirecrawlScrapeOptions {
    formats: Vec<&'static str>,
}

#[derive(Deserialize)]
struct FirecrawlSearchResponse {
    #[serde(default)]
    data: Vec<FirecrawlSearchItem>,
}

#[derive(Deserialize)]
struct FirecrawlSearchItem {
    url: Option<String>,
    title: Option<String>,
    description: Option<String>,
    markdown: Option<String>,
}

impl FirecrawlBackend {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SearchBackend for FirecrawlBackend {
    fn name(&self) -> &str {
        "firecrawl"
    }

    async fn search(&self, query: &str, opts: &SearchOptions) -> Result<Vec<SearchResultItem>> {
        if self.api_key.trim().is_empty() {
            bail!("未配置搜索API KEY");
        }

        let request = FirecrawlSearchRequest {
            query,
            limit: opts.max_results,
            timeout: opts.timeout_ms,
            scrape_options: FirecrawlScrapeOptions {
                formats: vec!["markdown"],
            },
        };

        let response = self
            .http
            .post(format!("{}/v1/search", self.api_base_url))
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_millis(opts.timeout_ms))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<FirecrawlSearchResponse>()
            .await?;

        Ok(response
            .data
            .into_iter()
            .map(|item| SearchResultItem {
                url: item.url,
                title: item.title,
                description: item.description,
                markdown: item.markdown,
            })
            .collect())
    }
}

/// Tavily搜索后端，返回摘要式正文
pub struct TavilyBackend {
    http: reqwest::Client,
    api_key: String,
    api_base_url: String,
}

#[derive(Serialize)]
struct TavilySearchRequest<'a> {
    query: &'a str,
    max_results: usize,
    search_depth: &'static str,
    include_raw_content: bool,
}

#[derive(Deserialize)]
struct TavilySearchResponse {
    #[serde(default)]
    results: Vec<TavilySearchItem>,
}

#[derive(Deserialize)]
struct TavilySearchItem {
    url: Option<String>,
    title: Option<String>,
    content: Option<String>,
}

impl TavilyBackend {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SearchBackend for TavilyBackend {
    fn name(&self) -> &str {
        "tavily"
    }

    async fn search(&self, query: &str, opts: &SearchOptions) -> Result<Vec<SearchResultItem>> {
        if self.api_key.trim().is_empty() {
            bail!("未配置搜索API KEY");
        }

        let request = TavilySearchRequest {
            query,
            max_results: opts.max_results,
            search_depth: "basic",
            include_raw_content: false,
        };

        let response = self
            .http
            .post(format!("{}/search", self.api_base_url))
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_millis(opts.timeout_ms))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<TavilySearchResponse>()
            .await?;

        Ok(response
            .results
            .into_iter()
            .map(|item| SearchResultItem {
                url: item.url,
                title: item.title,
                description: item.content,
                markdown: None,
            })
            .collect())
    }
}
