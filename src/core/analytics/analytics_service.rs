// Session analytics - pure derivations over the moderation history.
//
// Nothing here is cached or maintained incrementally. Every view is recomputed
// from the event slice it is handed, so the same slice always gives the same answer.

use super::analytics_models::{
    AttackBucket, SessionAnalytics, SeverityBucket, SeverityDistribution, SummaryStats,
    ThreatAssessment, ThreatLevel, TierSplit, VerdictBreakdown, VerdictBucket,
};
use crate::core::moderation::{Action, ModerationEvent, Severity, Tier};

/// `part / whole * 100`, rounded half up. Zero when `whole` is zero.
fn rounded_percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part * 200 + whole) / (2 * whole)) as u32
}

fn bar_width(count: usize, max: usize) -> f64 {
    if max == 0 {
        return 0.0;
    }
    count as f64 / max as f64 * 100.0
}

fn flagged_count(events: &[ModerationEvent]) -> usize {
    events.iter().filter(|e| e.action.is_flagged()).count()
}

pub fn summarize(events: &[ModerationEvent]) -> SummaryStats {
    let processed = events.len();
    let blocked = flagged_count(events);

    SummaryStats {
        processed,
        blocked,
        detect_rate: rounded_percent(blocked, processed),
    }
}

pub fn verdict_breakdown(events: &[ModerationEvent]) -> VerdictBreakdown {
    let total = events.len();
    let count = |action: Action| events.iter().filter(|e| e.action == action).count();

    let bucket = |action: Action| {
        let count = count(action);
        VerdictBucket {
            action,
            count,
            percent: rounded_percent(count, total),
        }
    };

    VerdictBreakdown {
        total,
        buckets: [
            bucket(Action::Blocked),
            bucket(Action::Sanitised),
            bucket(Action::Allowed),
        ],
    }
}

/// Attack types by frequency, most common first.
///
/// Ties keep the order in which the attack types first appeared.
pub fn attack_distribution(events: &[ModerationEvent]) -> Vec<AttackBucket> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for attack_type in events.iter().filter_map(|e| e.attack_type()) {
        match counts.iter_mut().find(|(seen, _)| *seen == attack_type) {
            Some((_, count)) => *count += 1,
            None => counts.push((attack_type, 1)),
        }
    }

    // sort_by is stable, so first-seen order survives among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let max = counts.first().map(|(_, count)| *count).unwrap_or(0);
    counts
        .into_iter()
        .map(|(attack_type, count)| AttackBucket {
            attack_type: attack_type.to_string(),
            count,
            bar_width: bar_width(count, max),
        })
        .collect()
}

/// Severity histogram in fixed order. Events without a severity are left out entirely.
pub fn severity_distribution(events: &[ModerationEvent]) -> SeverityDistribution {
    let severities: Vec<Severity> = events.iter().filter_map(|e| e.severity()).collect();
    let counts =
        Severity::ALL.map(|severity| severities.iter().filter(|s| **s == severity).count());
    let max = counts.iter().copied().max().unwrap_or(0);

    let buckets = std::array::from_fn(|i| SeverityBucket {
        severity: Severity::ALL[i],
        count: counts[i],
        bar_width: bar_width(counts[i], max),
    });

    SeverityDistribution {
        total: severities.len(),
        buckets,
    }
}

pub fn tier_split(events: &[ModerationEvent]) -> TierSplit {
    let total = events.len();
    if total == 0 {
        return TierSplit::default();
    }

    let t1_count = events.iter().filter(|e| e.tier == Tier::T1).count();
    let t1_percent = rounded_percent(t1_count, total);

    TierSplit {
        t1_count,
        t2_count: total - t1_count,
        t1_percent,
        // Complement keeps the two halves summing to exactly 100
        t2_percent: 100 - t1_percent,
    }
}

/// Band the share of caught prompts: under 10% LOW, under 25% MEDIUM,
/// under 40% HIGH, anything above CRITICAL.
pub fn threat_level(events: &[ModerationEvent]) -> ThreatAssessment {
    let processed = events.len();
    if processed == 0 {
        return ThreatAssessment::default();
    }

    let blocked = flagged_count(events);
    // Compare blocked/processed against the thresholds without floating point
    let scaled = blocked * 100;
    let level = if scaled < 10 * processed {
        ThreatLevel::Low
    } else if scaled < 25 * processed {
        ThreatLevel::Medium
    } else if scaled < 40 * processed {
        ThreatLevel::High
    } else {
        ThreatLevel::Critical
    };

    ThreatAssessment {
        level,
        blocked_percent: rounded_percent(blocked, processed),
    }
}

pub fn session_analytics(events: &[ModerationEvent]) -> SessionAnalytics {
    SessionAnalytics {
        summary: summarize(events),
        threat: threat_level(events),
        verdicts: verdict_breakdown(events),
        attacks: attack_distribution(events),
        severities: severity_distribution(events),
        tiers: tier_split(events),
    }
}
