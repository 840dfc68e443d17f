// Event normalizer - turns a raw service response into a canonical ModerationEvent.
//
// Pure apart from id generation: no I/O, no hidden state.

use super::moderation_models::{
    Action, Analysis, AnalysisOrigin, EventId, ModerationEvent, ModerationResult, RawAnalysis,
    RawTier, Severity, T1Label, Tier,
};

/// Attack type recorded for blocked prompts that arrive without deep analysis.
pub const OBVIOUS_ATTACK_LABEL: &str = "Obvious Attack";

/// Internal attack-type codes and their display labels.
const ATTACK_TYPE_LABELS: &[(&str, &str)] = &[
    ("direct_jailbreak", "Direct Jailbreak"),
    ("indirect_injection", "Indirect Injection"),
    ("role_hijacking", "Role Hijacking"),
    ("payload_smuggling", "Payload Smuggling"),
    ("context_manipulation", "Context Manipulation"),
    ("information_extraction", "Info Extraction"),
    ("obvious_attack", OBVIOUS_ATTACK_LABEL),
];

/// Map the service's action vocabulary onto the canonical enum.
pub fn normalize_action(raw: Option<&str>) -> Action {
    match raw.map(|a| a.trim().to_ascii_lowercase()).as_deref() {
        Some("block") => Action::Blocked,
        Some("sanitize") | Some("sanitise") => Action::Sanitised,
        _ => Action::Allowed,
    }
}

pub fn normalize_tier(raw: &RawTier) -> Tier {
    match raw {
        RawTier::Number(1) => Tier::T1,
        RawTier::Float(value) if *value == 1.0 => Tier::T1,
        RawTier::Text(text) if text.trim() == "1" => Tier::T1,
        _ => Tier::T2,
    }
}

/// Translate an attack-type code to its display label.
///
/// Unknown codes pass through verbatim. "none" and blank values mean the prompt
/// has no attack type at all.
pub fn attack_type_label(code: &str) -> Option<String> {
    let trimmed = code.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return None;
    }

    let lookup = trimmed.to_ascii_lowercase();
    let label = ATTACK_TYPE_LABELS
        .iter()
        .find(|(known, _)| *known == lookup)
        .map(|(_, label)| (*label).to_string())
        .unwrap_or_else(|| trimmed.to_string());

    Some(label)
}

fn copy_analysis(raw: &RawAnalysis) -> Analysis {
    let severity = raw.severity.as_deref().and_then(|s| {
        let parsed = Severity::parse(s);
        if parsed.is_none() {
            tracing::debug!(severity = s, "Ignoring unrecognized severity");
        }
        parsed
    });

    Analysis {
        attack_type: raw.attack_type.as_deref().and_then(attack_type_label),
        severity,
        confidence: raw.confidence.clone(),
        explanation: raw.explanation.clone(),
        sanitised_version: raw.sanitised_version.clone(),
        origin: AnalysisOrigin::Deep,
    }
}

fn synthesized_analysis() -> Analysis {
    Analysis {
        attack_type: Some(OBVIOUS_ATTACK_LABEL.to_string()),
        severity: Some(Severity::Critical),
        confidence: None,
        explanation: None,
        sanitised_version: None,
        origin: AnalysisOrigin::Synthesized,
    }
}

/// Build the canonical event for one exchange.
///
/// Blocked events always leave here with an attack type and a severity: missing
/// analysis is replaced by the obvious-attack classification, and gaps in a real
/// analysis are filled from it.
pub fn normalize(result: &ModerationResult, prompt: &str) -> ModerationEvent {
    let raw = &result.raw;
    let action = normalize_action(raw.action.as_deref());
    let tier = normalize_tier(&raw.tier);

    let analysis = match (&raw.analysis, action) {
        (Some(raw_analysis), Action::Blocked) => {
            let mut analysis = copy_analysis(raw_analysis);
            if analysis.attack_type.is_none() {
                analysis.attack_type = Some(OBVIOUS_ATTACK_LABEL.to_string());
            }
            if analysis.severity.is_none() {
                analysis.severity = Some(Severity::Critical);
            }
            Some(analysis)
        }
        (Some(raw_analysis), _) => Some(copy_analysis(raw_analysis)),
        (None, Action::Blocked) => Some(synthesized_analysis()),
        (None, _) => None,
    };

    ModerationEvent {
        id: EventId::new(),
        prompt: prompt.to_string(),
        action,
        tier,
        timestamp: result.received_at,
        response_time: result.response_time,
        t1_label: raw.t1_label.as_deref().and_then(T1Label::parse),
        escalation_reason: raw.escalation_reason.clone(),
        analysis,
        source: result.source,
        reply: raw.response.clone(),
    }
}
