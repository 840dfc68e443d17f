// Append-only log of moderation events for one session.
//
// Events live behind an Arc so readers can take a snapshot and derive views
// without holding any lock. Appending while a snapshot is alive copies the
// vector once (copy-on-write); otherwise it is a plain push.

use crate::core::moderation::ModerationEvent;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryState {
    Empty,
    Active,
}

/// Immutable view of the log at one point in time, oldest event first.
#[derive(Debug, Clone, Default)]
pub struct HistorySnapshot {
    events: Arc<Vec<ModerationEvent>>,
}

impl HistorySnapshot {
    pub fn events(&self) -> &[ModerationEvent] {
        &self.events
    }

    /// Newest event first, for feed-style consumers.
    pub fn recent_first(&self) -> impl Iterator<Item = &ModerationEvent> {
        self.events.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn state(&self) -> HistoryState {
        if self.events.is_empty() {
            HistoryState::Empty
        } else {
            HistoryState::Active
        }
    }
}

#[derive(Debug, Default)]
pub struct SessionHistory {
    events: Arc<Vec<ModerationEvent>>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, event: ModerationEvent) {
        debug_assert!(
            self.events.iter().all(|e| e.id != event.id),
            "event ids must be unique within a session"
        );
        Arc::make_mut(&mut self.events).push(event);
    }

    /// Drop every event. Outstanding snapshots keep their own copy.
    pub fn clear(&mut self) {
        self.events = Arc::new(Vec::new());
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            events: Arc::clone(&self.events),
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::moderation::{Action, EventId, ModerationEvent, Tier, VerdictSource};
    use chrono::Utc;
    use std::time::Duration;

    pub(crate) fn event(prompt: &str, action: Action, tier: Tier) -> ModerationEvent {
        ModerationEvent {
            id: EventId::new(),
            prompt: prompt.to_string(),
            action,
            tier,
            timestamp: Utc::now(),
            response_time: Duration::from_millis(80),
            t1_label: None,
            escalation_reason: None,
            analysis: None,
            source: VerdictSource::Remote,
            reply: None,
        }
    }

    #[test]
    fn test_append_keeps_insertion_order() {
        let mut history = SessionHistory::new();
        assert_eq!(history.snapshot().state(), HistoryState::Empty);

        history.append(event("first", Action::Allowed, Tier::T1));
        history.append(event("second", Action::Blocked, Tier::T1));
        history.append(event("third", Action::Allowed, Tier::T2));

        let snapshot = history.snapshot();
        let prompts: Vec<&str> = snapshot.events().iter().map(|e| e.prompt.as_str()).collect();
        assert_eq!(prompts, vec!["first", "second", "third"]);

        let newest_first: Vec<&str> = snapshot.recent_first().map(|e| e.prompt.as_str()).collect();
        assert_eq!(newest_first, vec!["third", "second", "first"]);
        assert_eq!(history.snapshot().state(), HistoryState::Active);
    }

    #[test]
    fn test_snapshot_is_unaffected_by_later_writes() {
        let mut history = SessionHistory::new();
        history.append(event("before", Action::Allowed, Tier::T1));
        let snapshot = history.snapshot();

        history.append(event("after", Action::Allowed, Tier::T1));
        history.clear();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.events()[0].prompt, "before");
        assert_eq!(history.len(), 0);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut history = SessionHistory::new();
        history.clear();
        assert_eq!(history.snapshot().state(), HistoryState::Empty);

        history.append(event("one", Action::Sanitised, Tier::T2));
        history.clear();
        history.clear();
        assert_eq!(history.snapshot().state(), HistoryState::Empty);

        history.append(event("again", Action::Allowed, Tier::T1));
        assert_eq!(history.len(), 1);
        assert_eq!(history.snapshot().state(), HistoryState::Active);
    }
}
