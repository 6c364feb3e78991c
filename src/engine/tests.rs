#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use anyhow::Result;
    use async_trait::async_trait;

    use crate::config::{Config, LLMConfig, SearchConfig};
    use crate::engine::context::ResearchContext;
    use crate::engine::orchestrator::ResearchOrchestrator;
    use crate::engine::types::{ResearchAccumulator, ResearchBudget};
    use crate::llm::client::{CompletionBackend, LLMClient};
    use crate::search::{SearchBackend, SearchClient, SearchOptions, SearchResultItem};

    type Responder = Box<dyn Fn(&str, &str) -> Result<String> + Send + Sync>;

    /// 脚本化的补全后端：按系统提示词区分规划/蒸馏/合成调用，
    /// 并记录总调用数与并发调用峰值
    struct MockCompletion {
        responder: Responder,
        calls: Arc<AtomicUsize>,
        in_flight: AtomicUsize,
        peak: Arc<AtomicUsize>,
        delay: Duration,
    }

    impl MockCompletion {
        fn new(responder: Responder) -> Self {
            Self {
                responder,
                calls: Arc::new(AtomicUsize::new(0)),
                in_flight: AtomicUsize::new(0),
                peak: Arc::new(AtomicUsize::new(0)),
                delay: Duration::ZERO,
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl CompletionBackend for MockCompletion {
        fn name(&self) -> &str {
            "mock"
        }

        async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let outcome = (self.responder)(system_prompt, user_prompt);
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            outcome
        }
    }

    /// 记录并发峰值的搜索后端，可按查询注入失败
    struct MockSearch {
        in_flight: AtomicUsize,
        peak: Arc<AtomicUsize>,
        failing_queries: HashSet<String>,
        delay: Duration,
    }

    impl MockSearch {
        fn new() -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                peak: Arc::new(AtomicUsize::new(0)),
                failing_queries: HashSet::new(),
                delay: Duration::ZERO,
            }
        }

        fn failing_on(mut self, query: &str) -> Self {
            self.failing_queries.insert(query.to_string());
            self
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl SearchBackend for MockSearch {
        fn name(&self) -> &str {
            "mock"
        }

        async fn search(
            &self,
            query: &str,
            _opts: &SearchOptions,
        ) -> Result<Vec<SearchResultItem>> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let outcome = if self.failing_queries.contains(query) {
                Err(anyhow::anyhow!("injected transport failure"))
            } else {
                Ok(vec![
                    SearchResultItem {
                        url: Some(format!("https://results.example/{}", query)),
                        title: Some(query.to_string()),
                        description: Some(format!("search results about {}", query)),
                        markdown: None,
                    },
                    SearchResultItem {
                        url: Some("https://shared.example/common".to_string()),
                        title: None,
                        description: Some("shared page".to_string()),
                        markdown: None,
                    },
                ])
            };

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            outcome
        }
    }

    fn test_config(breadth: u8, depth: u8, concurrency: usize) -> Config {
        let mut config = Config::default();
        config.research.breadth = breadth;
        config.research.depth = depth;
        config.research.concurrency = concurrency;
        config.llm = LLMConfig {
            retry_attempts: 1,
            retry_delay_ms: 1,
            timeout_seconds: 30,
            min_call_interval_ms: 0,
            ..Default::default()
        };
        config.search = SearchConfig {
            timeout_ms: 30_000,
            min_call_interval_ms: 0,
            ..Default::default()
        };
        config
    }

    fn planner_json(queries: &[(&str, &str)]) -> String {
        let entries: Vec<serde_json::Value> = queries
            .iter()
            .map(|(query, goal)| {
                serde_json::json!({"query": query, "research_goal": goal})
            })
            .collect();
        serde_json::json!({"queries": entries}).to_string()
    }

    /// 从蒸馏prompt里取出「」内的查询文本
    fn query_from_distill_prompt(user_prompt: &str) -> String {
        user_prompt
            .split('「')
            .nth(1)
            .and_then(|rest| rest.split('」').next())
            .unwrap_or_default()
            .to_string()
    }

    /// 标准responder：规划返回给定子查询，蒸馏按查询名产出learning与后续问题
    fn standard_responder(queries: Vec<(String, String)>) -> Responder {
        Box::new(move |system_prompt, user_prompt| {
            if system_prompt.contains("helpful assistant") {
                return Ok("ok".to_string());
            }
            if system_prompt.contains("搜索查询") {
                let pairs: Vec<(&str, &str)> = queries
                    .iter()
                    .map(|(q, g)| (q.as_str(), g.as_str()))
                    .collect();
                return Ok(planner_json(&pairs));
            }
            if system_prompt.contains("蒸馏") {
                let query = query_from_distill_prompt(user_prompt);
                return Ok(serde_json::json!({
                    "learnings": [
                        format!("learning about {}", query),
                        "shared learning"
                    ],
                    "follow_up_questions": [format!("follow-up on {}", query)]
                })
                .to_string());
            }
            Ok(serde_json::json!({"report_markdown": "# report"}).to_string())
        })
    }

    fn build_context(
        config: Config,
        backend: Arc<MockCompletion>,
        search: Arc<MockSearch>,
    ) -> ResearchContext {
        let llm_client = LLMClient::with_backend(backend, &config.llm, false);
        let search_client = SearchClient::with_backend(search, &config.search);
        ResearchContext::with_clients(config, llm_client, search_client)
    }

    #[tokio::test]
    async fn test_end_to_end_breadth_two_depth_one() {
        let config = test_config(2, 1, 2);
        let queries = vec![
            ("solar capacity 2025".to_string(), "查明光伏装机".to_string()),
            ("wind capacity 2025".to_string(), "查明风电装机".to_string()),
        ];
        let search = Arc::new(MockSearch::new());
        let backend = Arc::new(MockCompletion::new(standard_responder(queries)));
        let calls = backend.calls.clone();
        let context = build_context(config, backend, search);

        let orchestrator = ResearchOrchestrator::new();
        let result = orchestrator
            .research(
                &context,
                "renewable energy trends".to_string(),
                ResearchBudget::new(2, 1),
                ResearchAccumulator::default(),
            )
            .await
            .unwrap();

        // 两个分支的learning并集，重复的"shared learning"只出现一次
        assert!(
            result
                .learnings
                .contains(&"learning about solar capacity 2025".to_string())
        );
        assert!(
            result
                .learnings
                .contains(&"learning about wind capacity 2025".to_string())
        );
        assert_eq!(
            result
                .learnings
                .iter()
                .filter(|l| *l == &"shared learning".to_string())
                .count(),
            1
        );

        // URL并集无重复：每分支一个专属URL加一个共享URL
        assert_eq!(result.visited_urls.len(), 3);
        assert_eq!(
            result
                .visited_urls
                .iter()
                .filter(|u| *u == &"https://shared.example/common".to_string())
                .count(),
            1
        );

        // depth=1不发生递归：规划只在顶层调用一次（另有2次蒸馏调用）
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_branch_isolation_on_search_failure() {
        let config = test_config(2, 1, 2);
        let queries = vec![
            ("failing query".to_string(), "会失败的分支".to_string()),
            ("healthy query".to_string(), "正常的分支".to_string()),
        ];
        let search = Arc::new(MockSearch::new().failing_on("failing query"));
        let backend = Arc::new(MockCompletion::new(standard_responder(queries)));
        let context = build_context(config, backend, search);

        let orchestrator = ResearchOrchestrator::new();
        let result = orchestrator
            .research(
                &context,
                "topic".to_string(),
                ResearchBudget::new(2, 1),
                ResearchAccumulator::default(),
            )
            .await
            .unwrap();

        // 失败分支贡献为空，健康分支照常产出
        assert!(
            result
                .learnings
                .contains(&"learning about healthy query".to_string())
        );
        assert!(
            !result
                .learnings
                .iter()
                .any(|l| l.contains("failing query"))
        );
    }

    #[tokio::test]
    async fn test_invalid_sub_query_is_non_fatal() {
        let config = test_config(2, 1, 2);
        let queries = vec![
            ("   ".to_string(), "缺少查询文本".to_string()),
            ("valid query".to_string(), "正常的分支".to_string()),
        ];
        let search = Arc::new(MockSearch::new());
        let backend = Arc::new(MockCompletion::new(standard_responder(queries)));
        let context = build_context(config, backend, search);

        let orchestrator = ResearchOrchestrator::new();
        let result = orchestrator
            .research(
                &context,
                "topic".to_string(),
                ResearchBudget::new(2, 1),
                ResearchAccumulator::default(),
            )
            .await
            .unwrap();

        assert!(
            result
                .learnings
                .contains(&"learning about valid query".to_string())
        );
    }

    #[tokio::test]
    async fn test_concurrency_ceiling_respected() {
        let config = test_config(5, 1, 2);
        let queries: Vec<(String, String)> = (0..5)
            .map(|i| (format!("query {}", i), format!("goal {}", i)))
            .collect();
        let search = Arc::new(MockSearch::new().with_delay(Duration::from_millis(30)));
        let peak = search.peak.clone();
        let backend = Arc::new(MockCompletion::new(standard_responder(queries)));
        let context = build_context(config, backend, search);

        let orchestrator = ResearchOrchestrator::new();
        let result = orchestrator
            .research(
                &context,
                "topic".to_string(),
                ResearchBudget::new(5, 1),
                ResearchAccumulator::default(),
            )
            .await
            .unwrap();

        // 任一时刻处于搜索阶段的分支不超过全局上限2
        assert!(peak.load(Ordering::SeqCst) <= 2);
        // 5个分支的专属learning全部合并进来
        for i in 0..5 {
            assert!(
                result
                    .learnings
                    .contains(&format!("learning about query {}", i))
            );
        }
    }

    #[tokio::test]
    async fn test_completion_waits_bounded_across_recursion_levels() {
        let config = test_config(4, 2, 2);
        let queries: Vec<(String, String)> = (0..4)
            .map(|i| (format!("query {}", i), format!("goal {}", i)))
            .collect();
        let backend = Arc::new(
            MockCompletion::new(standard_responder(queries))
                .with_delay(Duration::from_millis(30)),
        );
        let peak = backend.peak.clone();
        let search = Arc::new(MockSearch::new());
        let context = build_context(config, backend, search);

        let orchestrator = ResearchOrchestrator::new();
        let result = orchestrator
            .research(
                &context,
                "topic".to_string(),
                ResearchBudget::new(4, 2),
                ResearchAccumulator::default(),
            )
            .await
            .unwrap();

        // 递归下层的规划调用与上层分支的蒸馏共享同一个全局闸门：
        // 任一时刻处于模型调用中的分支不超过上限2
        assert!(
            peak.load(Ordering::SeqCst) <= 2,
            "并发模型调用峰值 = {}",
            peak.load(Ordering::SeqCst)
        );
        assert!(!result.learnings.is_empty());
    }

    #[tokio::test]
    async fn test_recursion_decrements_depth_and_halves_breadth() {
        let config = test_config(2, 2, 2);
        let queries = vec![
            ("alpha".to_string(), "alpha目标".to_string()),
            ("beta".to_string(), "beta目标".to_string()),
        ];
        let search = Arc::new(MockSearch::new());
        let backend = Arc::new(MockCompletion::new(standard_responder(queries)));
        let calls = backend.calls.clone();
        let context = build_context(config, backend, search);

        let orchestrator = ResearchOrchestrator::new();
        let result = orchestrator
            .research(
                &context,
                "topic".to_string(),
                ResearchBudget::new(2, 2),
                ResearchAccumulator::default(),
            )
            .await
            .unwrap();

        // 第一层2个分支各自递归一层：规划1+2次，蒸馏2+2次，共7次模型调用
        assert_eq!(calls.load(Ordering::SeqCst), 7);
        assert!(!result.learnings.is_empty());
        // 两层搜索的URL都被收集且去重
        assert!(
            result
                .visited_urls
                .contains(&"https://shared.example/common".to_string())
        );
    }

    #[tokio::test]
    async fn test_top_level_planner_failure_propagates() {
        let config = test_config(2, 1, 2);
        let responder: Responder = Box::new(|system_prompt, _| {
            if system_prompt.contains("搜索查询") {
                return Ok("这不是有效的JSON输出".to_string());
            }
            Ok("{}".to_string())
        });
        let search = Arc::new(MockSearch::new());
        let backend = Arc::new(MockCompletion::new(responder));
        let context = build_context(config, backend, search);

        let orchestrator = ResearchOrchestrator::new();
        let result = orchestrator
            .research(
                &context,
                "topic".to_string(),
                ResearchBudget::new(2, 1),
                ResearchAccumulator::default(),
            )
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_exhausted_budget_returns_accumulator_unchanged() {
        let config = test_config(2, 0, 2);
        let search = Arc::new(MockSearch::new());
        let backend = Arc::new(MockCompletion::new(standard_responder(vec![])));
        let calls = backend.calls.clone();
        let context = build_context(config, backend, search);

        let mut seed = ResearchAccumulator::default();
        seed.add_learnings(vec!["已有发现".to_string()]);

        let orchestrator = ResearchOrchestrator::new();
        let result = orchestrator
            .research(
                &context,
                "topic".to_string(),
                ResearchBudget::new(2, 0),
                seed,
            )
            .await
            .unwrap();

        assert_eq!(result.learnings, vec!["已有发现"]);
        // 深度耗尽时不应发起任何协作方调用
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
