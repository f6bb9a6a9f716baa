//! Text capability for Cadence — pluggable provider support
//!
//! Provides a `TextCapability` trait with one wired implementation:
//! - **Dummy** — deterministic reference provider used for local runs and
//!   tests; its algorithms are load-bearing because stored `processed_text`
//!   and summaries were produced by them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::config::AiConfig;

// ============================================================================
// TextCapability trait
// ============================================================================

/// Knobs a provider is allowed to see. Derived from `OrgPolicy`, never the
/// whole policy — persona overrides are applied by the pipeline, not here.
#[derive(Debug, Clone)]
pub struct TextPolicy {
    pub normalize_case: bool,
    pub summary_limit: usize,
}

impl Default for TextPolicy {
    fn default() -> Self {
        Self {
            normalize_case: true,
            summary_limit: 280,
        }
    }
}

/// Structured metadata extracted from a treated text. Diagnostic output;
/// the core returns it to callers but never persists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interpretation {
    pub length: usize,
    pub keywords: Vec<String>,
}

/// Abstraction over text providers.
#[async_trait]
pub trait TextCapability: Send + Sync {
    /// Apply formatting policy to a single text.
    async fn reformat(&self, text: &str, policy: &TextPolicy) -> Result<String, CapabilityError>;

    /// Extract structured metadata from a text.
    async fn interpret(
        &self,
        text: &str,
        policy: &TextPolicy,
    ) -> Result<Interpretation, CapabilityError>;

    /// Summarize a day's texts, prefixed by `context`, truncated to
    /// `policy.summary_limit` characters.
    async fn summarize(
        &self,
        texts: &[String],
        context: &str,
        policy: &TextPolicy,
    ) -> Result<String, CapabilityError>;

    /// Estimated cost in cents for summarizing `texts`. Pure estimate, no I/O.
    fn estimate_cost_cents(&self, texts: &[String]) -> i64;

    /// Provider name for logging.
    fn name(&self) -> &str;
}

// ============================================================================
// Error types
// ============================================================================

/// Text provider errors
#[derive(Error, Debug)]
pub enum CapabilityError {
    #[error("Provider call failed: {0}")]
    Provider(String),

    #[error("Provider timed out after {0}s")]
    Timeout(u64),

    #[error("Unknown text provider: {0}")]
    UnknownProvider(String),
}

/// Create the configured provider, wrapped in the configured per-call
/// deadline. Only `dummy` ships with the core; real providers register here.
pub fn create_provider(config: &AiConfig) -> Result<Box<dyn TextCapability>, CapabilityError> {
    let inner: Box<dyn TextCapability> = match config.provider.as_str() {
        "dummy" => Box::new(DummyProvider),
        other => return Err(CapabilityError::UnknownProvider(other.to_string())),
    };
    Ok(Box::new(TimedCapability::new(inner, config.timeout_seconds)))
}

// ============================================================================
// TimedCapability
// ============================================================================

/// Deadline wrapper around any provider. The dummy provider returns
/// instantly; network-backed providers will not, and `timeout_seconds` from
/// config is enforced here rather than in every caller.
pub struct TimedCapability {
    inner: Box<dyn TextCapability>,
    timeout: Duration,
}

impl TimedCapability {
    pub fn new(inner: Box<dyn TextCapability>, timeout_seconds: u64) -> Self {
        Self {
            inner,
            timeout: Duration::from_secs(timeout_seconds),
        }
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, CapabilityError>> + Send,
    ) -> Result<T, CapabilityError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(CapabilityError::Timeout(self.timeout.as_secs())),
        }
    }
}

#[async_trait]
impl TextCapability for TimedCapability {
    async fn reformat(&self, text: &str, policy: &TextPolicy) -> Result<String, CapabilityError> {
        self.bounded(self.inner.reformat(text, policy)).await
    }

    async fn interpret(
        &self,
        text: &str,
        policy: &TextPolicy,
    ) -> Result<Interpretation, CapabilityError> {
        self.bounded(self.inner.interpret(text, policy)).await
    }

    async fn summarize(
        &self,
        texts: &[String],
        context: &str,
        policy: &TextPolicy,
    ) -> Result<String, CapabilityError> {
        self.bounded(self.inner.summarize(texts, context, policy))
            .await
    }

    fn estimate_cost_cents(&self, texts: &[String]) -> i64 {
        self.inner.estimate_cost_cents(texts)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

// ============================================================================
// DummyProvider
// ============================================================================

/// Reference provider. Every algorithm here is frozen: capitalize-first
/// normalization, naive length/4 token estimate, hard character truncation.
pub struct DummyProvider;

#[async_trait]
impl TextCapability for DummyProvider {
    async fn reformat(&self, text: &str, policy: &TextPolicy) -> Result<String, CapabilityError> {
        let trimmed = text.trim();
        if policy.normalize_case {
            Ok(capitalize(trimmed))
        } else {
            Ok(trimmed.to_string())
        }
    }

    async fn interpret(
        &self,
        text: &str,
        _policy: &TextPolicy,
    ) -> Result<Interpretation, CapabilityError> {
        Ok(Interpretation {
            length: text.chars().count(),
            keywords: text
                .split_whitespace()
                .take(3)
                .map(str::to_string)
                .collect(),
        })
    }

    async fn summarize(
        &self,
        texts: &[String],
        context: &str,
        policy: &TextPolicy,
    ) -> Result<String, CapabilityError> {
        let joined = texts
            .iter()
            .filter(|t| !t.is_empty())
            .map(|t| t.trim())
            .collect::<Vec<_>>()
            .join(" ");
        // Context is trimmed and concatenated without a separator; stored
        // summaries depend on this exact byte layout.
        let prefix = format!("{context} ");
        let base = format!("{}{}", prefix.trim(), joined);
        Ok(base.chars().take(policy.summary_limit).collect())
    }

    fn estimate_cost_cents(&self, texts: &[String]) -> i64 {
        // 1 cent per 100 tokens, a token being ~4 characters.
        let tokens: i64 = texts
            .iter()
            .map(|t| std::cmp::max(1, t.chars().count() as i64 / 4))
            .sum();
        tokens / 100
    }

    fn name(&self) -> &str {
        "dummy"
    }
}

/// Uppercase the first character, lowercase the rest.
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(limit: usize) -> TextPolicy {
        TextPolicy {
            normalize_case: true,
            summary_limit: limit,
        }
    }

    #[tokio::test]
    async fn test_reformat_trims_and_capitalizes() {
        let out = DummyProvider
            .reformat("  hello WORLD", &policy(280))
            .await
            .unwrap();
        assert_eq!(out, "Hello world");
    }

    #[tokio::test]
    async fn test_reformat_without_normalization() {
        let p = TextPolicy {
            normalize_case: false,
            summary_limit: 280,
        };
        let out = DummyProvider.reformat("  hello WORLD  ", &p).await.unwrap();
        assert_eq!(out, "hello WORLD");
    }

    #[tokio::test]
    async fn test_reformat_empty() {
        let out = DummyProvider.reformat("   ", &policy(280)).await.unwrap();
        assert_eq!(out, "");
    }

    #[tokio::test]
    async fn test_interpret_length_and_keywords() {
        let out = DummyProvider
            .interpret("fixed the flaky deploy pipeline", &policy(280))
            .await
            .unwrap();
        assert_eq!(out.length, 31);
        assert_eq!(out.keywords, vec!["fixed", "the", "flaky"]);
    }

    #[tokio::test]
    async fn test_summarize_joins_with_single_spaces() {
        let texts = vec!["did a thing ".to_string(), " did another".to_string()];
        let out = DummyProvider.summarize(&texts, "", &policy(280)).await.unwrap();
        assert_eq!(out, "did a thing did another");
    }

    #[tokio::test]
    async fn test_summarize_context_prefix_no_separator() {
        // The reference provider concatenates trimmed context directly.
        let texts = vec!["report".to_string()];
        let out = DummyProvider
            .summarize(&texts, "ctx", &policy(280))
            .await
            .unwrap();
        assert_eq!(out, "ctxreport");
    }

    #[tokio::test]
    async fn test_summarize_hard_truncation() {
        let texts = vec!["abcdefghij".to_string()];
        let out = DummyProvider.summarize(&texts, "", &policy(4)).await.unwrap();
        assert_eq!(out, "abcd");
    }

    #[tokio::test]
    async fn test_summarize_skips_empty_entries() {
        let texts = vec!["one".to_string(), "".to_string(), "two".to_string()];
        let out = DummyProvider.summarize(&texts, "", &policy(280)).await.unwrap();
        assert_eq!(out, "one two");
    }

    #[test]
    fn test_estimate_cost_floor_per_text() {
        // Three short texts: each rounds up to at least 1 token.
        let texts = vec!["ab".to_string(), "c".to_string(), "d".to_string()];
        assert_eq!(DummyProvider.estimate_cost_cents(&texts), 0);

        // 400 chars => 100 tokens => 1 cent.
        let texts = vec!["x".repeat(400)];
        assert_eq!(DummyProvider.estimate_cost_cents(&texts), 1);
    }

    /// Never completes within any sane deadline.
    struct StalledProvider;

    #[async_trait]
    impl TextCapability for StalledProvider {
        async fn reformat(
            &self,
            _text: &str,
            _policy: &TextPolicy,
        ) -> Result<String, CapabilityError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(String::new())
        }

        async fn interpret(
            &self,
            _text: &str,
            _policy: &TextPolicy,
        ) -> Result<Interpretation, CapabilityError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Interpretation {
                length: 0,
                keywords: Vec::new(),
            })
        }

        async fn summarize(
            &self,
            _texts: &[String],
            _context: &str,
            _policy: &TextPolicy,
        ) -> Result<String, CapabilityError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(String::new())
        }

        fn estimate_cost_cents(&self, _texts: &[String]) -> i64 {
            0
        }

        fn name(&self) -> &str {
            "stalled"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_capability_enforces_deadline() {
        let timed = TimedCapability::new(Box::new(StalledProvider), 10);

        let err = timed.reformat("x", &policy(280)).await.unwrap_err();
        assert!(matches!(err, CapabilityError::Timeout(10)));

        let err = timed
            .summarize(&["x".to_string()], "", &policy(280))
            .await
            .unwrap_err();
        assert!(matches!(err, CapabilityError::Timeout(10)));
    }

    #[tokio::test]
    async fn test_timed_capability_passes_fast_calls_through() {
        let timed = TimedCapability::new(Box::new(DummyProvider), 10);
        let out = timed.reformat("  hello WORLD", &policy(280)).await.unwrap();
        assert_eq!(out, "Hello world");
        assert_eq!(timed.name(), "dummy");
    }

    #[tokio::test]
    async fn test_create_provider_applies_configured_timeout() {
        let provider = create_provider(&AiConfig::default()).unwrap();
        assert_eq!(provider.name(), "dummy");
        let out = provider.reformat("  hi", &policy(280)).await.unwrap();
        assert_eq!(out, "Hi");
    }

    #[test]
    fn test_create_provider_unknown() {
        let cfg = AiConfig {
            provider: "gpt-next".to_string(),
            ..AiConfig::default()
        };
        assert!(matches!(
            create_provider(&cfg),
            Err(CapabilityError::UnknownProvider(_))
        ));
    }
}
