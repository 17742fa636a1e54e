//! Storage-related unit interfaces: Mount, Automount, Swap and Device

use crate::kind;
use crate::object::RemoteObject;

pub type Mount = RemoteObject<kind::Mount>;
pub type Automount = RemoteObject<kind::Automount>;
pub type Swap = RemoteObject<kind::Swap>;
pub type Device = RemoteObject<kind::Device>;

impl Mount {
    /// Mount point
    pub fn mount_point(&self) -> Option<String> {
        self.properties().str("Where").map(str::to_owned)
    }

    /// Mounted device or source
    pub fn what(&self) -> Option<String> {
        self.properties().str("What").map(str::to_owned)
    }

    pub fn fs_type(&self) -> Option<String> {
        self.properties().str("Type").map(str::to_owned)
    }

    pub fn options(&self) -> Option<String> {
        self.properties().str("Options").map(str::to_owned)
    }
}

impl Automount {
    pub fn mount_point(&self) -> Option<String> {
        self.properties().str("Where").map(str::to_owned)
    }

    /// Idle timeout in microseconds, 0 when disabled
    pub fn timeout_idle_usec(&self) -> Option<u64> {
        self.properties().u64("TimeoutIdleUSec")
    }
}

impl Swap {
    /// Swap device or file
    pub fn what(&self) -> Option<String> {
        self.properties().str("What").map(str::to_owned)
    }

    pub fn priority(&self) -> Option<i32> {
        self.properties().i32("Priority")
    }
}

impl Device {
    /// sysfs path of the device
    pub fn sysfs_path(&self) -> Option<String> {
        self.properties().str("SysFSPath").map(str::to_owned)
    }
}
