//! The full pipeline: a resilient cache backs a tool executor, and a warmer
//! pre-populates the cache from a seed list before any caller traffic
//! arrives (§2 control flow, §4.7, §4.8).

use futures::future::BoxFuture;
use querycache::cache::{CacheConfig, CacheStore};
use querycache::circuitbreaker::{CircuitBreaker, CircuitBreakerConfig};
use querycache::executor::{ExecutorConfig, ParamSchema, ParamType, ToolExecutor, ToolRecord, ToolRegistry, ToolSchema};
use querycache::ratelimiter::{RateLimiter, RateLimiterConfig};
use querycache::resilient::ResilientCache;
use querycache::warmer::{ContentType, SeedQuery, Warmer, WarmerConfig};
use serde_json::{json, Value};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Resilient cache: store gated by a breaker.
    let store = Arc::new(CacheStore::new(CacheConfig::builder().min_tokens(200).build()));
    let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerConfig::builder().build()));
    let cache = Arc::new(ResilientCache::new(store, breaker));

    // Warm the cache with a handful of seed queries before traffic arrives.
    let warmer = Warmer::new(
        Arc::clone(&cache),
        |query: &str| -> BoxFuture<'static, Result<String, String>> {
            let query = query.to_string();
            Box::pin(async move { Ok(format!("result set for: {query}")) })
        },
        WarmerConfig::builder().max_queries(10).build(),
    );
    let seeds = vec![
        SeedQuery::new("top sellers this week", ContentType::Sql),
        SeedQuery::new("inventory by warehouse", ContentType::Sql),
    ];
    let report = warmer.run(&seeds).await;
    println!(
        "warmed {}/{} queries, {} tokens added in {:?}",
        report.succeeded, report.attempted, report.tokens_added, report.elapsed
    );

    // Tool executor: a schema-validated, rate-limited search tool.
    let registry = Arc::new(ToolRegistry::new());
    registry
        .register(ToolRecord::new(
            "search",
            ToolSchema::new().param("query", ParamSchema::new(ParamType::String).required()),
            |args: Value| -> BoxFuture<'static, Result<Value, String>> {
                Box::pin(async move { Ok(json!({ "echo": args })) })
            },
        ))
        .unwrap();

    let limiter = Arc::new(RateLimiter::new(RateLimiterConfig::builder().max_calls_per_minute(30).build()));
    let executor = ToolExecutor::new(registry, ExecutorConfig::builder().max_concurrency(10).build())
        .with_rate_limiter(limiter);

    let call = querycache::executor::ToolCall {
        tool: "search".to_string(),
        args: json!({ "query": "top sellers this week" }),
        user_id: "demo-user".to_string(),
        token: None,
    };
    let result = executor.execute(call).await;
    println!("tool call success={} data={:?}", result.success, result.data);
}
