//! Target and Snapshot units
//!
//! Targets are synchronization points; their interface carries no members
//! beyond the generic Unit ones. Snapshots only exist on older systemd.

use crate::error::Result;
use crate::kind;
use crate::object::RemoteObject;

pub type Target = RemoteObject<kind::Target>;

pub type Snapshot = RemoteObject<kind::Snapshot>;

impl Snapshot {
    /// Delete the snapshot unit
    pub async fn remove(&self) -> Result<()> {
        self.call_void("Remove", &()).await
    }

    /// Whether systemd removes the snapshot once it is activated
    pub fn cleanup(&self) -> Option<bool> {
        self.properties().bool("Cleanup")
    }
}
