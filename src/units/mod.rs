//! org.freedesktop.systemd1.Unit wrapper and the per-type unit interfaces
//!
//! Every unit object implements the generic `Unit` interface plus one
//! type-specific interface (Service, Socket, ...). Both are views of the
//! same object path; use [`RemoteObject::open_as`] to switch between them.

mod mount;
mod path;
mod service;
mod socket;
mod target;
mod timer;

pub use mount::{Automount, Device, Mount, Swap};
pub use path::Path;
pub use service::Service;
pub use socket::Socket;
pub use target::{Snapshot, Target};
pub use timer::Timer;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::job::{job_if_exists, Job};
use crate::kind;
use crate::object::RemoteObject;
use zbus::zvariant::OwnedObjectPath;

/// Any systemd unit, through its generic interface
pub type Unit = RemoteObject<kind::Unit>;

impl Unit {
    /// Start the unit. `mode` is one of "fail", "replace", ...
    pub async fn start(&self, mode: &str) -> Result<Option<Job>> {
        self.job_verb("Start", mode).await
    }

    pub async fn stop(&self, mode: &str) -> Result<Option<Job>> {
        self.job_verb("Stop", mode).await
    }

    pub async fn reload(&self, mode: &str) -> Result<Option<Job>> {
        self.job_verb("Reload", mode).await
    }

    pub async fn restart(&self, mode: &str) -> Result<Option<Job>> {
        self.job_verb("Restart", mode).await
    }

    /// Restart only if the unit is running
    pub async fn try_restart(&self, mode: &str) -> Result<Option<Job>> {
        self.job_verb("TryRestart", mode).await
    }

    pub async fn reload_or_restart(&self, mode: &str) -> Result<Option<Job>> {
        self.job_verb("ReloadOrRestart", mode).await
    }

    pub async fn reload_or_try_restart(&self, mode: &str) -> Result<Option<Job>> {
        self.job_verb("ReloadOrTryRestart", mode).await
    }

    /// Send `signal` to the unit's processes. `whom` is "main", "control" or "all".
    pub async fn kill(&self, whom: &str, signal: i32) -> Result<()> {
        self.call_void("Kill", &(whom, signal)).await
    }

    /// Clear the failed state
    pub async fn reset_failed(&self) -> Result<()> {
        self.call_void("ResetFailed", &()).await
    }

    async fn job_verb(&self, method: &str, mode: &str) -> Result<Option<Job>> {
        let job_path: OwnedObjectPath = self.call(method, &mode).await?;
        job_if_exists(self.bus(), job_path).await
    }

    // ==================== Properties ====================

    /// Primary unit name, e.g. "sshd.service"
    pub fn id(&self) -> Option<String> {
        self.properties().str("Id").map(str::to_owned)
    }

    pub fn names(&self) -> Vec<String> {
        self.properties().strings("Names")
    }

    pub fn description(&self) -> Option<String> {
        self.properties().str("Description").map(str::to_owned)
    }

    /// "loaded", "not-found", "masked", ...
    pub fn load_state(&self) -> Option<String> {
        self.properties().str("LoadState").map(str::to_owned)
    }

    /// "active", "inactive", "failed", "activating", ...
    pub fn active_state(&self) -> Option<String> {
        self.properties().str("ActiveState").map(str::to_owned)
    }

    /// Type-specific state such as "running" or "dead"
    pub fn sub_state(&self) -> Option<String> {
        self.properties().str("SubState").map(str::to_owned)
    }

    /// Enablement status, same values as [`crate::Manager::get_unit_file_state`]
    pub fn unit_file_state(&self) -> Option<String> {
        self.properties().str("UnitFileState").map(str::to_owned)
    }

    pub fn fragment_path(&self) -> Option<String> {
        self.properties()
            .str("FragmentPath")
            .filter(|p| !p.is_empty())
            .map(str::to_owned)
    }

    pub fn is_active(&self) -> bool {
        matches!(self.active_state().as_deref(), Some("active" | "reloading"))
    }

    pub fn is_failed(&self) -> bool {
        self.active_state().as_deref() == Some("failed")
    }

    pub fn active_enter_timestamp(&self) -> Option<DateTime<Utc>> {
        self.properties().timestamp("ActiveEnterTimestamp")
    }

    pub fn inactive_enter_timestamp(&self) -> Option<DateTime<Utc>> {
        self.properties().timestamp("InactiveEnterTimestamp")
    }

    /// Path of the job currently pending for this unit, if any
    pub fn job_path(&self) -> Option<OwnedObjectPath> {
        self.properties()
            .struct_path("Job")
            .filter(|p| p.as_str() != "/")
            .map(|p| p.clone().into())
    }
}
