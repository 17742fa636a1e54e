//! org.freedesktop.systemd1.Manager facade
//!
//! The manager is the single top-level systemd object. It looks up and
//! enumerates units and jobs, queues lifecycle transitions by unit name,
//! manages unit file enablement and exposes the system power verbs.
//!
//! Open it once per process with [`Manager::connect`] on the shared
//! [`SystemBus`] and tear it down with [`Manager::disconnect`].

mod enable;
mod listing;

pub use listing::{JobEntry, UnitEntry, UnitFileChange, UnitFileEntry, UnitIter};

use zbus::zvariant::{ObjectPath, OwnedObjectPath};

use crate::bus::SystemBus;
use crate::error::Result;
use crate::job::{job_if_exists, Job};
use crate::kind;
use crate::object::RemoteObject;
use crate::units::{Snapshot, Unit};
use listing::{RawJobEntry, RawUnitEntry};

pub const MANAGER_PATH: &str = "/org/freedesktop/systemd1";

pub type Manager = RemoteObject<kind::Manager>;

impl Manager {
    /// Open the manager, watching it if the bus says so by default
    pub async fn connect(bus: &SystemBus) -> Result<Self> {
        Self::connect_with(bus, bus.watch_by_default()).await
    }

    /// Open the manager and ask systemd to emit its signals
    pub async fn connect_with(bus: &SystemBus, watch: bool) -> Result<Self> {
        let path: OwnedObjectPath = ObjectPath::from_static_str_unchecked(MANAGER_PATH).into();
        let manager = Self::open(bus, path, watch).await?;
        manager.subscribe_events().await?;
        Ok(manager)
    }

    /// Undo [`Manager::connect`]: stop systemd's signals and release the watch
    pub async fn disconnect(self) -> Result<()> {
        let unsubscribed = self.unsubscribe_events().await;
        self.close()?;
        unsubscribed
    }

    // ==================== Lookup ====================

    /// Unit by name, e.g. "sshd.service". Fails with `NoSuchUnit` if not loaded.
    pub async fn get_unit(&self, name: &str) -> Result<Unit> {
        let path: OwnedObjectPath = self.call("GetUnit", &name).await?;
        Unit::open(self.bus(), path, self.bus().watch_by_default()).await
    }

    /// Unit owning the process `pid`
    pub async fn get_unit_by_pid(&self, pid: u32) -> Result<Unit> {
        let path: OwnedObjectPath = self.call("GetUnitByPID", &pid).await?;
        Unit::open(self.bus(), path, self.bus().watch_by_default()).await
    }

    /// Unit by name, loading it from disk if needed
    pub async fn load_unit(&self, name: &str) -> Result<Unit> {
        let path: OwnedObjectPath = self.call("LoadUnit", &name).await?;
        Unit::open(self.bus(), path, self.bus().watch_by_default()).await
    }

    /// Job by numeric id. Fails with `NoSuchJob` if it is gone.
    pub async fn get_job(&self, id: u32) -> Result<Job> {
        let path: OwnedObjectPath = self.call("GetJob", &id).await?;
        Job::open(self.bus(), path, self.bus().watch_by_default()).await
    }

    // ==================== Enumeration ====================

    /// Raw `ListUnits` rows without opening any object
    pub async fn list_unit_entries(&self) -> Result<Vec<UnitEntry>> {
        let raw: Vec<RawUnitEntry> = self.call("ListUnits", &()).await?;
        Ok(raw.into_iter().map(UnitEntry::from).collect())
    }

    /// Raw `ListJobs` rows without opening any object
    pub async fn list_job_entries(&self) -> Result<Vec<JobEntry>> {
        let raw: Vec<RawJobEntry> = self.call("ListJobs", &()).await?;
        Ok(raw.into_iter().map(JobEntry::from).collect())
    }

    /// Open every loaded unit at once, inactive ones included.
    ///
    /// With `watch`, each unit holds a match rule on the bus. A large listing
    /// can exceed the per-client limit, in which case the whole call fails
    /// with `SubscriptionLimit`. Use [`Manager::iter_units`] or `watch = false`
    /// for big systems.
    pub async fn list_units(&self, watch: bool) -> Result<Vec<Unit>> {
        let entries = self.list_unit_entries().await?;
        log::debug!("Opening {} units (watch={})", entries.len(), watch);

        let mut units = Vec::with_capacity(entries.len());
        for entry in entries {
            units.push(Unit::open(self.bus(), entry.unit_path, watch).await?);
        }
        Ok(units)
    }

    /// Same listing as [`Manager::list_units`], opened one unit at a time
    pub async fn iter_units(&self, watch: bool) -> Result<UnitIter> {
        let entries = self.list_unit_entries().await?;
        Ok(UnitIter::new(self.bus().clone(), entries, watch))
    }

    /// Open every queued job
    pub async fn list_jobs(&self) -> Result<Vec<Job>> {
        let entries = self.list_job_entries().await?;

        let mut jobs = Vec::with_capacity(entries.len());
        for entry in entries {
            jobs.push(Job::open(self.bus(), entry.job_path, self.bus().watch_by_default()).await?);
        }
        Ok(jobs)
    }

    // ==================== Unit lifecycle ====================

    pub async fn start_unit(&self, name: &str, mode: &str) -> Result<Option<Job>> {
        self.unit_job_verb("StartUnit", name, mode).await
    }

    pub async fn stop_unit(&self, name: &str, mode: &str) -> Result<Option<Job>> {
        self.unit_job_verb("StopUnit", name, mode).await
    }

    pub async fn reload_unit(&self, name: &str, mode: &str) -> Result<Option<Job>> {
        self.unit_job_verb("ReloadUnit", name, mode).await
    }

    pub async fn restart_unit(&self, name: &str, mode: &str) -> Result<Option<Job>> {
        self.unit_job_verb("RestartUnit", name, mode).await
    }

    pub async fn try_restart_unit(&self, name: &str, mode: &str) -> Result<Option<Job>> {
        self.unit_job_verb("TryRestartUnit", name, mode).await
    }

    pub async fn reload_or_restart_unit(&self, name: &str, mode: &str) -> Result<Option<Job>> {
        self.unit_job_verb("ReloadOrRestartUnit", name, mode).await
    }

    pub async fn reload_or_try_restart_unit(&self, name: &str, mode: &str) -> Result<Option<Job>> {
        self.unit_job_verb("ReloadOrTryRestartUnit", name, mode).await
    }

    /// Stop `old_unit` and start `new_unit` in one transaction
    pub async fn start_unit_replace(&self, old_unit: &str, new_unit: &str, mode: &str) -> Result<Option<Job>> {
        let job_path: OwnedObjectPath = self.call("StartUnitReplace", &(old_unit, new_unit, mode)).await?;
        job_if_exists(self.bus(), job_path).await
    }

    /// Signal a unit's processes. `whom` is "main", "control" or "all".
    pub async fn kill_unit(&self, name: &str, whom: &str, signal: i32) -> Result<()> {
        self.call_void("KillUnit", &(name, whom, signal)).await
    }

    pub async fn reset_failed_unit(&self, name: &str) -> Result<()> {
        self.call_void("ResetFailedUnit", &name).await
    }

    /// Reset the failed state of every unit
    pub async fn reset_failed(&self) -> Result<()> {
        self.call_void("ResetFailed", &()).await
    }

    /// Cancel every queued job
    pub async fn clear_jobs(&self) -> Result<()> {
        self.call_void("ClearJobs", &()).await
    }

    async fn unit_job_verb(&self, method: &str, name: &str, mode: &str) -> Result<Option<Job>> {
        let job_path: OwnedObjectPath = self.call(method, &(name, mode)).await?;
        job_if_exists(self.bus(), job_path).await
    }

    // ==================== Snapshots ====================

    /// Create a snapshot unit of the current state (older systemd only)
    pub async fn create_snapshot(&self, name: &str, cleanup: bool) -> Result<Snapshot> {
        let path: OwnedObjectPath = self.call("CreateSnapshot", &(name, cleanup)).await?;
        Snapshot::open(self.bus(), path, self.bus().watch_by_default()).await
    }

    // ==================== Signals ====================

    /// Ask systemd to emit unit and job signals to this client
    pub async fn subscribe_events(&self) -> Result<()> {
        self.call_void("Subscribe", &()).await
    }

    pub async fn unsubscribe_events(&self) -> Result<()> {
        self.call_void("Unsubscribe", &()).await
    }

    // ==================== Environment ====================

    /// Add `NAME=value` assignments to the manager environment
    pub async fn set_environment(&self, assignments: &[&str]) -> Result<()> {
        self.call_void("SetEnvironment", &assignments).await
    }

    /// Remove variables by name from the manager environment
    pub async fn unset_environment(&self, names: &[&str]) -> Result<()> {
        self.call_void("UnsetEnvironment", &names).await
    }

    // ==================== Daemon and system ====================

    /// Human-readable state dump of the manager
    pub async fn dump(&self) -> Result<String> {
        self.call("Dump", &()).await
    }

    /// Reload all unit files (daemon-reload)
    pub async fn reload(&self) -> Result<()> {
        self.call_void("Reload", &()).await
    }

    /// Re-execute the manager binary, keeping state
    pub async fn reexecute(&self) -> Result<()> {
        self.call_void("Reexecute", &()).await
    }

    /// Ask the manager to exit (user managers and containers)
    pub async fn exit(&self) -> Result<()> {
        self.call_void("Exit", &()).await
    }

    pub async fn halt(&self) -> Result<()> {
        self.call_void("Halt", &()).await
    }

    pub async fn power_off(&self) -> Result<()> {
        self.call_void("PowerOff", &()).await
    }

    pub async fn reboot(&self) -> Result<()> {
        self.call_void("Reboot", &()).await
    }

    pub async fn k_exec(&self) -> Result<()> {
        self.call_void("KExec", &()).await
    }

    // ==================== Properties ====================

    pub fn version(&self) -> Option<String> {
        self.properties().str("Version").map(str::to_owned)
    }

    /// Number of loaded units
    pub fn unit_count(&self) -> Option<u32> {
        self.properties().u32("NNames")
    }

    /// Number of queued jobs
    pub fn job_count(&self) -> Option<u32> {
        self.properties().u32("NJobs")
    }

    /// "initializing", "starting", "running", "degraded", "maintenance", "stopping"
    pub fn system_state(&self) -> Option<String> {
        self.properties().str("SystemState").map(str::to_owned)
    }

    pub fn virtualization(&self) -> Option<String> {
        self.properties()
            .str("Virtualization")
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
    }
}
