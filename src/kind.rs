//! Object kinds
//!
//! Every systemd object type is the same [`RemoteObject`](crate::RemoteObject)
//! configured with a different interface name. The types below only carry
//! that name.

/// Marker for one `org.freedesktop.systemd1.*` interface
pub trait ObjectKind: Send + Sync + 'static {
    const INTERFACE: &'static str;
}

macro_rules! object_kinds {
    ($($(#[$doc:meta])* $name:ident => $iface:literal,)*) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq)]
            pub enum $name {}

            impl ObjectKind for $name {
                const INTERFACE: &'static str = $iface;
            }
        )*
    };
}

object_kinds! {
    /// The single top-level service manager object
    Manager => "org.freedesktop.systemd1.Manager",
    /// Interface common to all units
    Unit => "org.freedesktop.systemd1.Unit",
    /// A queued or running state transition
    Job => "org.freedesktop.systemd1.Job",
    Service => "org.freedesktop.systemd1.Service",
    Socket => "org.freedesktop.systemd1.Socket",
    Timer => "org.freedesktop.systemd1.Timer",
    Path => "org.freedesktop.systemd1.Path",
    Automount => "org.freedesktop.systemd1.Automount",
    Device => "org.freedesktop.systemd1.Device",
    Mount => "org.freedesktop.systemd1.Mount",
    Swap => "org.freedesktop.systemd1.Swap",
    Target => "org.freedesktop.systemd1.Target",
    /// Only present on systemd versions that still support snapshots
    Snapshot => "org.freedesktop.systemd1.Snapshot",
}
