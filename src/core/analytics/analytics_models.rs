// Analytics view models - plain data derived from the session history.

use crate::core::moderation::{Action, Severity};
use serde::Serialize;

/// Headline counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SummaryStats {
    pub processed: usize,
    /// Blocked plus sanitised prompts.
    pub blocked: usize,
    /// `blocked / processed` as a rounded percentage, 0 for an empty session.
    pub detect_rate: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VerdictBucket {
    pub action: Action,
    pub count: usize,
    pub percent: u32,
}

/// Verdict mix in display order: BLOCKED, SANITISED, ALLOWED.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerdictBreakdown {
    pub total: usize,
    pub buckets: [VerdictBucket; 3],
}

impl VerdictBreakdown {
    pub fn bucket(&self, action: Action) -> &VerdictBucket {
        match action {
            Action::Blocked => &self.buckets[0],
            Action::Sanitised => &self.buckets[1],
            Action::Allowed => &self.buckets[2],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttackBucket {
    pub attack_type: String,
    pub count: usize,
    /// Bar length relative to the largest bucket, 0..=100.
    pub bar_width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeverityBucket {
    pub severity: Severity,
    pub count: usize,
    pub bar_width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeverityDistribution {
    /// Number of events carrying a severity.
    pub total: usize,
    pub buckets: [SeverityBucket; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TierSplit {
    pub t1_count: usize,
    pub t2_count: usize,
    pub t1_percent: u32,
    pub t2_percent: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
pub enum ThreatLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThreatLevel::Low => write!(f, "LOW"),
            ThreatLevel::Medium => write!(f, "MEDIUM"),
            ThreatLevel::High => write!(f, "HIGH"),
            ThreatLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ThreatAssessment {
    pub level: ThreatLevel,
    pub blocked_percent: u32,
}

/// Every derived view at once, computed from the same snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionAnalytics {
    pub summary: SummaryStats,
    pub threat: ThreatAssessment,
    pub verdicts: VerdictBreakdown,
    pub attacks: Vec<AttackBucket>,
    pub severities: SeverityDistribution,
    pub tiers: TierSplit,
}
