// Moderation domain models - canonical events plus the raw wire shapes they come from.
//
// The raw types mirror what the moderation service sends over the wire and stay
// deliberately loose (strings, optional fields). The canonical types are what the
// rest of the crate works with; the normalizer is the only bridge between the two.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

// ============================================================================
// CANONICAL EVENT
// ============================================================================

/// Unique id assigned to every event on the client side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Final verdict for a prompt, after vocabulary normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Allowed,
    Blocked,
    Sanitised,
}

impl Action {
    /// Blocked and sanitised prompts both count as caught.
    pub fn is_flagged(self) -> bool {
        matches!(self, Action::Blocked | Action::Sanitised)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Allowed => write!(f, "ALLOWED"),
            Action::Blocked => write!(f, "BLOCKED"),
            Action::Sanitised => write!(f, "SANITISED"),
        }
    }
}

/// Which analysis stage produced the final verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    T1,
    T2,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::T1 => write!(f, "T1"),
            Tier::T2 => write!(f, "T2"),
        }
    }
}

/// Tier-1 fast-path label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum T1Label {
    Safe,
    Suspicious,
    ObviousAttack,
}

impl T1Label {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "SAFE" => Some(T1Label::Safe),
            "SUSPICIOUS" => Some(T1Label::Suspicious),
            "OBVIOUS_ATTACK" => Some(T1Label::ObviousAttack),
            _ => None,
        }
    }
}

impl std::fmt::Display for T1Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            T1Label::Safe => write!(f, "SAFE"),
            T1Label::Suspicious => write!(f, "SUSPICIOUS"),
            T1Label::ObviousAttack => write!(f, "OBVIOUS_ATTACK"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Display order used by the severity histogram.
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    /// Case-insensitive parse. Anything outside the four levels (including "none") is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "critical" => Some(Severity::Critical),
            "high" => Some(Severity::High),
            "medium" => Some(Severity::Medium),
            "low" => Some(Severity::Low),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "CRITICAL"),
            Severity::High => write!(f, "HIGH"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::Low => write!(f, "LOW"),
        }
    }
}

/// The service reports confidence either as a label ("high") or as a score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Confidence {
    Score(f64),
    Label(String),
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::Score(score) => write!(f, "{:.2}", score),
            Confidence::Label(label) => write!(f, "{}", label),
        }
    }
}

/// Where the classification attached to an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisOrigin {
    /// Copied from the service's tier-2 analysis.
    Deep,
    /// Filled in locally for a blocked prompt that arrived without analysis.
    Synthesized,
}

/// Classification detail attached to an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// Display label, already translated from the service's internal code.
    pub attack_type: Option<String>,
    pub severity: Option<Severity>,
    pub confidence: Option<Confidence>,
    pub explanation: Option<String>,
    pub sanitised_version: Option<String>,
    pub origin: AnalysisOrigin,
}

/// Whether the verdict came from the remote service or the local heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerdictSource {
    Remote,
    LocalFallback,
}

/// One moderated prompt. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationEvent {
    pub id: EventId,
    pub prompt: String,
    pub action: Action,
    pub tier: Tier,
    pub timestamp: DateTime<Utc>,
    pub response_time: Duration,
    pub t1_label: Option<T1Label>,
    pub escalation_reason: Option<String>,
    pub analysis: Option<Analysis>,
    pub source: VerdictSource,
    /// Assistant reply forwarded by the service for allowed prompts.
    pub reply: Option<String>,
}

impl ModerationEvent {
    pub fn attack_type(&self) -> Option<&str> {
        self.analysis.as_ref().and_then(|a| a.attack_type.as_deref())
    }

    pub fn severity(&self) -> Option<Severity> {
        self.analysis.as_ref().and_then(|a| a.severity)
    }
}

// ============================================================================
// RAW WIRE SHAPES
// ============================================================================

/// The tier indicator arrives as an integer in practice. Any other JSON value is
/// still accepted here and read as "not the fast path" by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTier {
    Number(i64),
    Float(f64),
    Text(String),
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAnalysis {
    #[serde(default)]
    pub verdict: Option<String>,
    #[serde(default)]
    pub attack_type: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub confidence: Option<Confidence>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub sanitised_version: Option<String>,
}

/// Body of a `/chat` response, as sent by the service.
///
/// `tier` is the only field without a default: a response that does not say which
/// stage produced it is rejected as malformed. Its value can be anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawModerationResponse {
    #[serde(default)]
    pub action: Option<String>,
    pub tier: RawTier,
    #[serde(default)]
    pub t1_label: Option<String>,
    #[serde(default)]
    pub escalation_reason: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub analysis: Option<RawAnalysis>,
}

/// A raw response together with what the client observed while getting it.
#[derive(Debug, Clone)]
pub struct ModerationResult {
    pub raw: RawModerationResponse,
    pub source: VerdictSource,
    /// Wall-clock time the verdict was received.
    pub received_at: DateTime<Utc>,
    pub response_time: Duration,
    /// Session epoch captured before the request went out.
    pub epoch: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_response_requires_tier() {
        let missing = serde_json::from_str::<RawModerationResponse>(r#"{"action":"allow"}"#);
        assert!(missing.is_err());

        let ok: RawModerationResponse =
            serde_json::from_str(r#"{"action":"allow","tier":1}"#).unwrap();
        assert_eq!(ok.tier, RawTier::Number(1));
        assert!(ok.analysis.is_none());

        let null_tier: RawModerationResponse =
            serde_json::from_str(r#"{"action":"allow","tier":null}"#).unwrap();
        assert_eq!(null_tier.tier, RawTier::Other(serde_json::Value::Null));
    }

    #[test]
    fn test_confidence_accepts_label_or_score() {
        let label: RawAnalysis = serde_json::from_str(r#"{"confidence":"high"}"#).unwrap();
        assert_eq!(label.confidence, Some(Confidence::Label("high".to_string())));

        let score: RawAnalysis = serde_json::from_str(r#"{"confidence":0.92}"#).unwrap();
        assert_eq!(score.confidence, Some(Confidence::Score(0.92)));
    }

    #[test]
    fn test_severity_parse_is_case_insensitive() {
        assert_eq!(Severity::parse("CRITICAL"), Some(Severity::Critical));
        assert_eq!(Severity::parse(" Medium "), Some(Severity::Medium));
        assert_eq!(Severity::parse("none"), None);
    }

    #[test]
    fn test_flagged_actions() {
        assert!(Action::Blocked.is_flagged());
        assert!(Action::Sanitised.is_flagged());
        assert!(!Action::Allowed.is_flagged());
    }
}
