// Local fallback classifier.
//
// Used only when the moderation service cannot be reached. It is a keyword check,
// nothing more, and always answers at tier 1 with a response shaped exactly like
// the service's own.

use super::moderation_models::{RawAnalysis, RawModerationResponse, RawTier};

const SUSPICIOUS_MARKERS: &[&str] = &["ignore", "system", "admin", "password"];

/// Returns the first suspicious marker found in the prompt, if any.
pub fn find_marker(prompt: &str) -> Option<&'static str> {
    let lowered = prompt.to_lowercase();
    SUSPICIOUS_MARKERS
        .iter()
        .copied()
        .find(|marker| lowered.contains(marker))
}

/// Classify a prompt without the remote service. Never fails.
pub fn classify(prompt: &str) -> RawModerationResponse {
    match find_marker(prompt) {
        Some(marker) => RawModerationResponse {
            action: Some("block".to_string()),
            tier: RawTier::Number(1),
            t1_label: None,
            escalation_reason: None,
            session_id: None,
            response: None,
            analysis: Some(RawAnalysis {
                verdict: Some("BLOCK".to_string()),
                attack_type: Some("direct_jailbreak".to_string()),
                severity: Some("CRITICAL".to_string()),
                confidence: None,
                explanation: Some(format!(
                    "Detected potential prompt injection attempt (matched \"{}\")",
                    marker
                )),
                sanitised_version: None,
            }),
        },
        None => RawModerationResponse {
            action: Some("allow".to_string()),
            tier: RawTier::Number(1),
            t1_label: None,
            escalation_reason: None,
            session_id: None,
            response: None,
            analysis: None,
        },
    }
}
