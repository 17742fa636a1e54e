//! Bus connection options
//!
//! Defaults target the real systemd on the system bus. Every field can be
//! overridden from the environment:
//!
//! - `SYSDBUS_ADDRESS`: `system`, `session` or a D-Bus address string
//! - `SYSDBUS_MAX_WATCHES`: cap on live property subscriptions
//! - `SYSDBUS_WATCH`: `0`/`1`, whether looked-up objects subscribe by default

use std::env;

pub const SYSTEMD_DESTINATION: &str = "org.freedesktop.systemd1";
pub const DEFAULT_SIGNAL_QUEUE: usize = 64;

/// Which bus to connect to
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BusAddress {
    #[default]
    System,
    Session,
    /// Explicit address, e.g. `unix:path=/run/dbus/system_bus_socket`
    Address(String),
}

impl BusAddress {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "" | "system" => Self::System,
            "session" | "user" => Self::Session,
            other => Self::Address(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BusOptions {
    pub address: BusAddress,
    /// Well-known name of the service manager
    pub destination: String,
    /// Upper bound on concurrently live subscriptions, `None` leaves it to the bus
    pub max_watches: Option<usize>,
    /// Whether wrappers returned by lookups and lifecycle verbs subscribe
    pub watch_by_default: bool,
    /// Signals buffered per subscription before older ones are dropped
    pub signal_queue: usize,
}

impl Default for BusOptions {
    fn default() -> Self {
        Self {
            address: BusAddress::System,
            destination: SYSTEMD_DESTINATION.to_string(),
            max_watches: None,
            watch_by_default: true,
            signal_queue: DEFAULT_SIGNAL_QUEUE,
        }
    }
}

impl BusOptions {
    /// Defaults overridden by `SYSDBUS_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut opts = Self::default();

        if let Some(addr) = lookup("SYSDBUS_ADDRESS") {
            opts.address = BusAddress::parse(&addr);
        }
        if let Some(max) = lookup("SYSDBUS_MAX_WATCHES") {
            match max.trim().parse::<usize>() {
                Ok(n) => opts.max_watches = Some(n),
                Err(_) => log::warn!("Ignoring invalid SYSDBUS_MAX_WATCHES={:?}", max),
            }
        }
        if let Some(watch) = lookup("SYSDBUS_WATCH") {
            opts.watch_by_default = matches!(watch.trim().to_lowercase().as_str(), "1" | "yes" | "true" | "on");
        }

        opts
    }

    pub fn with_max_watches(mut self, max: usize) -> Self {
        self.max_watches = Some(max);
        self
    }

    pub fn with_watch_by_default(mut self, watch: bool) -> Self {
        self.watch_by_default = watch;
        self
    }
}
