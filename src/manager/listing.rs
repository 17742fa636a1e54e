//! Unit and job enumeration
//!
//! `ListUnits` and `ListJobs` return fixed-shape tuples. Only the object path
//! fields are needed to build wrappers: the 7th field of a unit entry and the
//! 5th field of a job entry.

use serde::Serialize;
use zbus::zvariant::OwnedObjectPath;

use crate::bus::SystemBus;
use crate::error::Result;
use crate::units::Unit;

/// Wire shape of one `ListUnits` entry, `(ssssssouso)`
pub(crate) type RawUnitEntry = (
    String,
    String,
    String,
    String,
    String,
    String,
    OwnedObjectPath,
    u32,
    String,
    OwnedObjectPath,
);

/// Wire shape of one `ListJobs` entry, `(usssoo)`
pub(crate) type RawJobEntry = (u32, String, String, String, OwnedObjectPath, OwnedObjectPath);

/// One row of `ListUnits`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitEntry {
    pub name: String,
    pub description: String,
    pub load_state: String,
    pub active_state: String,
    pub sub_state: String,
    /// Unit this one follows in state, empty if none
    pub following: String,
    pub unit_path: OwnedObjectPath,
    /// 0 when no job is queued
    pub job_id: u32,
    pub job_type: String,
    pub job_path: OwnedObjectPath,
}

impl From<RawUnitEntry> for UnitEntry {
    fn from(raw: RawUnitEntry) -> Self {
        let (name, description, load_state, active_state, sub_state, following, unit_path, job_id, job_type, job_path) =
            raw;
        Self {
            name,
            description,
            load_state,
            active_state,
            sub_state,
            following,
            unit_path,
            job_id,
            job_type,
            job_path,
        }
    }
}

/// One row of `ListJobs`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobEntry {
    pub id: u32,
    pub unit: String,
    pub job_type: String,
    /// "waiting" or "running"
    pub state: String,
    pub job_path: OwnedObjectPath,
    pub unit_path: OwnedObjectPath,
}

impl From<RawJobEntry> for JobEntry {
    fn from(raw: RawJobEntry) -> Self {
        let (id, unit, job_type, state, job_path, unit_path) = raw;
        Self {
            id,
            unit,
            job_type,
            state,
            job_path,
            unit_path,
        }
    }
}

/// A symlink change reported by the unit file verbs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitFileChange {
    /// "symlink" or "unlink"
    pub change_type: String,
    pub file: String,
    /// Symlink target, empty for unlink
    pub destination: String,
}

impl From<(String, String, String)> for UnitFileChange {
    fn from((change_type, file, destination): (String, String, String)) -> Self {
        Self {
            change_type,
            file,
            destination,
        }
    }
}

/// One row of `ListUnitFiles`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitFileEntry {
    pub path: String,
    /// Same values as a unit's `UnitFileState` property
    pub state: String,
}

impl From<(String, String)> for UnitFileEntry {
    fn from((path, state): (String, String)) -> Self {
        Self { path, state }
    }
}

/// Lazy walk over a unit listing.
///
/// The listing itself was fetched in one call; wrappers are built one at a
/// time, so stopping early never opens or watches the rest. Forward-only and
/// not restartable.
pub struct UnitIter {
    bus: SystemBus,
    entries: std::vec::IntoIter<UnitEntry>,
    watch: bool,
}

impl UnitIter {
    pub(crate) fn new(bus: SystemBus, entries: Vec<UnitEntry>, watch: bool) -> Self {
        Self {
            bus,
            entries: entries.into_iter(),
            watch,
        }
    }

    /// Build the wrapper for the next unit
    pub async fn next(&mut self) -> Option<Result<Unit>> {
        let entry = self.entries.next()?;
        Some(Unit::open(&self.bus, entry.unit_path, self.watch).await)
    }

    /// Units not yet visited
    pub fn remaining(&self) -> usize {
        self.entries.len()
    }
}

impl std::fmt::Debug for UnitIter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitIter")
            .field("remaining", &self.remaining())
            .field("watch", &self.watch)
            .finish()
    }
}
