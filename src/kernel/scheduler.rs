use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::time::Clock;

/// Upper bound on a timer's duration (one year).
pub const MAX_TIMER_SECONDS: u64 = 365 * 24 * 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduleId(pub Uuid);

impl ScheduleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleKind {
    Alarm,
    /// Requested duration in seconds.
    Timer { seconds: u64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: ScheduleId,
    pub kind: ScheduleKind,
    pub due: DateTime<Local>,
    pub created_at: DateTime<Local>,
}

impl ScheduleEntry {
    pub fn is_due(&self, now: DateTime<Local>) -> bool {
        self.due <= now
    }
}

#[derive(Debug)]
struct Slot {
    entry: ScheduleEntry,
    /// Claimed by the ticker; its alert is in progress.
    firing: bool,
}

/// Pending alarms and timers, shared between the dispatcher and the ticker.
///
/// Each collection sits behind its own mutex, held only for one append,
/// claim or removal. The dispatcher appends; the ticker claims due entries
/// (flagging them so a later scan skips them), fires them, then completes
/// them. A slot is removed exactly once.
pub struct AlarmRegistry {
    alarms: Mutex<Vec<Slot>>,
    timers: Mutex<Vec<Slot>>,
    clock: Arc<dyn Clock>,
}

impl AlarmRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            alarms: Mutex::new(Vec::new()),
            timers: Mutex::new(Vec::new()),
            clock,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Registers an alarm. Past times are kept and fire on the next tick.
    pub fn set_alarm(&self, at: DateTime<Local>) -> String {
        let entry = ScheduleEntry {
            id: ScheduleId::new(),
            kind: ScheduleKind::Alarm,
            due: at,
            created_at: self.clock.now(),
        };
        info!("Alarm registered for {}", at.format("%Y-%m-%d %H:%M:%S"));
        lock(&self.alarms).push(Slot { entry, firing: false });
        format!("Alarm set for {}.", at.format("%I:%M %p"))
    }

    /// Registers a timer. Durations beyond `MAX_TIMER_SECONDS` are capped, and
    /// the confirmation reports the capped value.
    pub fn set_timer(&self, seconds: u64) -> String {
        let seconds = seconds.min(MAX_TIMER_SECONDS);
        let now = self.clock.now();
        let due = i64::try_from(seconds)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .and_then(|d| now.checked_add_signed(d))
            .unwrap_or(now);
        let entry = ScheduleEntry {
            id: ScheduleId::new(),
            kind: ScheduleKind::Timer { seconds },
            due,
            created_at: now,
        };
        info!("Timer registered: {}s (due {})", seconds, due.format("%H:%M:%S"));
        lock(&self.timers).push(Slot { entry, firing: false });
        format!("Timer set for {} seconds.", seconds)
    }

    /// Removes a pending entry. Entries already claimed for firing are left alone.
    pub fn cancel(&self, id: ScheduleId) -> bool {
        for collection in [&self.alarms, &self.timers] {
            let mut slots = lock(collection);
            if let Some(pos) = slots.iter().position(|s| s.entry.id == id && !s.firing) {
                slots.remove(pos);
                return true;
            }
        }
        false
    }

    /// Claims every unclaimed entry due at `now`, alarms first.
    pub fn claim_due(&self, now: DateTime<Local>) -> Vec<ScheduleEntry> {
        let mut claimed = Vec::new();
        for collection in [&self.alarms, &self.timers] {
            let mut slots = lock(collection);
            for slot in slots.iter_mut().filter(|s| !s.firing && s.entry.is_due(now)) {
                slot.firing = true;
                claimed.push(slot.entry.clone());
            }
        }
        if !claimed.is_empty() {
            debug!("Claimed {} due entries", claimed.len());
        }
        claimed
    }

    /// Drops a claimed entry after its alert. Returns false if it was already gone.
    pub fn complete(&self, id: ScheduleId) -> bool {
        for collection in [&self.alarms, &self.timers] {
            let mut slots = lock(collection);
            if let Some(pos) = slots.iter().position(|s| s.entry.id == id) {
                slots.remove(pos);
                return true;
            }
        }
        false
    }

    pub fn pending_alarms(&self) -> Vec<ScheduleEntry> {
        lock(&self.alarms).iter().map(|s| s.entry.clone()).collect()
    }

    pub fn pending_timers(&self) -> Vec<ScheduleEntry> {
        lock(&self.timers).iter().map(|s| s.entry.clone()).collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.alarms).len() + lock(&self.timers).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock(m: &Mutex<Vec<Slot>>) -> MutexGuard<'_, Vec<Slot>> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}
