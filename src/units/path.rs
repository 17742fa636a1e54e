//! org.freedesktop.systemd1.Path properties

use crate::kind;
use crate::object::RemoteObject;

/// Path-specific view of a `.path` unit
pub type Path = RemoteObject<kind::Path>;

impl Path {
    /// Unit activated when a watched path changes
    pub fn triggered_unit(&self) -> Option<String> {
        self.properties().str("Unit").map(str::to_owned)
    }

    pub fn make_directory(&self) -> Option<bool> {
        self.properties().bool("MakeDirectory")
    }

    pub fn result(&self) -> Option<String> {
        self.properties().str("Result").map(str::to_owned)
    }
}
