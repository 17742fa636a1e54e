//! org.freedesktop.systemd1.Timer properties

use chrono::{DateTime, Utc};

use crate::kind;
use crate::object::RemoteObject;

/// Timer-specific view of a `.timer` unit
pub type Timer = RemoteObject<kind::Timer>;

impl Timer {
    /// Unit activated when the timer elapses
    pub fn triggered_unit(&self) -> Option<String> {
        self.properties().str("Unit").map(str::to_owned)
    }

    /// Next wall-clock elapse, if a calendar trigger is armed
    pub fn next_elapse(&self) -> Option<DateTime<Utc>> {
        self.properties().timestamp("NextElapseUSecRealtime")
    }

    pub fn last_trigger(&self) -> Option<DateTime<Utc>> {
        self.properties().timestamp("LastTriggerUSec")
    }

    pub fn persistent(&self) -> Option<bool> {
        self.properties().bool("Persistent")
    }

    pub fn result(&self) -> Option<String> {
        self.properties().str("Result").map(str::to_owned)
    }
}
