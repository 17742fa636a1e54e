//! sysdbus - typed client for the systemd D-Bus API
//!
//! Wraps the `org.freedesktop.systemd1` objects (manager, units, jobs) and
//! keeps a local copy of their properties in sync with property-change
//! signals.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │   Manager   │   Unit / Service / ...  │   Job   │
//! ├─────────────────────────────────────────────────┤
//! │  RemoteObject<K>: property mirror + watch state │
//! ├─────────────────────────────────────────────────┤
//! │       SystemBus (one shared zbus connection)    │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! ```no_run
//! # async fn run() -> sysdbus::Result<()> {
//! let bus = sysdbus::SystemBus::connect_system().await?;
//! let manager = sysdbus::Manager::connect(&bus).await?;
//!
//! let mut units = manager.iter_units(false).await?;
//! while let Some(unit) = units.next().await {
//!     let unit = unit?;
//!     println!("{} {:?}", unit, unit.active_state());
//! }
//!
//! manager.disconnect().await
//! # }
//! ```

pub mod bus;
pub mod config;
pub mod error;
pub mod job;
pub mod kind;
pub mod manager;
pub mod object;
pub mod properties;
pub mod subscription;
pub mod units;

pub use bus::SystemBus;
pub use config::{BusAddress, BusOptions};
pub use error::{Error, Result};
pub use job::Job;
pub use kind::ObjectKind;
pub use manager::{JobEntry, Manager, UnitEntry, UnitFileChange, UnitFileEntry, UnitIter};
pub use object::{ObjectHandle, RemoteObject, WatchStatus};
pub use properties::PropertySnapshot;
pub use subscription::Subscription;
pub use units::{Automount, Device, Mount, Path, Service, Snapshot, Socket, Swap, Target, Timer, Unit};
