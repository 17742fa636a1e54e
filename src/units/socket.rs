//! org.freedesktop.systemd1.Socket properties

use crate::kind;
use crate::object::RemoteObject;

/// Socket-specific view of a `.socket` unit
pub type Socket = RemoteObject<kind::Socket>;

impl Socket {
    /// Connections accepted since the socket was started
    pub fn accepted(&self) -> Option<u32> {
        self.properties().u32("NAccepted")
    }

    /// Currently open connections (Accept=yes sockets)
    pub fn connections(&self) -> Option<u32> {
        self.properties().u32("NConnections")
    }

    pub fn result(&self) -> Option<String> {
        self.properties().str("Result").map(str::to_owned)
    }
}
