//! org.freedesktop.systemd1.Service properties

use crate::kind;
use crate::object::RemoteObject;

/// Service-specific view of a `.service` unit
pub type Service = RemoteObject<kind::Service>;

impl Service {
    /// "simple", "forking", "oneshot", "notify", "dbus", ...
    pub fn service_type(&self) -> Option<String> {
        self.properties().str("Type").map(str::to_owned)
    }

    /// Main process id, `None` when no main process is running
    pub fn main_pid(&self) -> Option<u32> {
        self.properties().u32("MainPID").filter(|pid| *pid != 0)
    }

    pub fn control_pid(&self) -> Option<u32> {
        self.properties().u32("ControlPID").filter(|pid| *pid != 0)
    }

    /// Exit status of the last main process
    pub fn exec_main_status(&self) -> Option<i32> {
        self.properties().i32("ExecMainStatus")
    }

    /// "success", "exit-code", "signal", "timeout", ...
    pub fn result(&self) -> Option<String> {
        self.properties().str("Result").map(str::to_owned)
    }

    /// Automatic restarts since the last manual start
    pub fn restarts(&self) -> Option<u32> {
        self.properties().u32("NRestarts")
    }

    pub fn restart_policy(&self) -> Option<String> {
        self.properties().str("Restart").map(str::to_owned)
    }
}
