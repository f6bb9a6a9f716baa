//! Text-processing pipeline: policy application around the pluggable text
//! capability, plus the cost gate in front of summarization.

use crate::ai::{Interpretation, TextCapability, TextPolicy};
use crate::error::CadenceError;
use crate::models::OrgPolicy;

/// Returned instead of a summary when the estimated spend exceeds the
/// tenant's daily ceiling. Fixed string; callers and tests match on it.
pub const COST_LIMIT_MESSAGE: &str = "AI cost limit exceeded; summary not generated";

/// Output of `treat`. The interpretation is diagnostic only — callers may
/// discard it, the core never persists it.
#[derive(Debug, Clone)]
pub struct TreatedText {
    pub text: String,
    pub interpretation: Interpretation,
}

fn text_policy(policy: &OrgPolicy) -> TextPolicy {
    TextPolicy {
        normalize_case: policy.normalize_case,
        summary_limit: policy.summary_char_limit,
    }
}

/// Apply the tenant policy to one raw text: trim, normalize per policy,
/// then prefix the persona override when one is set.
pub async fn treat(
    capability: &dyn TextCapability,
    raw: &str,
    policy: &OrgPolicy,
    persona_override: Option<&str>,
) -> Result<TreatedText, CadenceError> {
    let tp = text_policy(policy);
    let reformatted = capability.reformat(raw, &tp).await?;
    let interpretation = capability.interpret(&reformatted, &tp).await?;

    let text = match persona_override.filter(|p| !p.is_empty()) {
        Some(persona) => format!("[{persona}] {reformatted}"),
        None => reformatted,
    };

    Ok(TreatedText {
        text,
        interpretation,
    })
}

/// Summarize one user's day of texts. The cost estimate is a hard gate: over
/// budget, the capability is never invoked and the fixed placeholder comes
/// back instead — the summary slot stays available either way.
pub async fn summarize_day(
    capability: &dyn TextCapability,
    texts: &[String],
    context: &str,
    policy: &OrgPolicy,
    max_cost_cents: i64,
) -> Result<String, CadenceError> {
    let estimated = capability.estimate_cost_cents(texts);
    if estimated > max_cost_cents {
        tracing::warn!(
            provider = capability.name(),
            estimated_cents = estimated,
            ceiling_cents = max_cost_cents,
            "summarization skipped: estimated cost over daily ceiling"
        );
        return Ok(COST_LIMIT_MESSAGE.to_string());
    }

    let summary = capability
        .summarize(texts, context, &text_policy(policy))
        .await?;
    Ok(summary)
}

// ============================================================================
// TESTS
// ============================================================================
