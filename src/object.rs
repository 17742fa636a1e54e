//! Shared lifecycle of every wrapped D-Bus object
//!
//! ```text
//!   ┌───────────┐  subscribe  ┌──────────┐  unsubscribe  ┌──────────┐
//!   │ Unwatched │────────────▶│ Watching │──────────────▶│ Released │
//!   └─────┬─────┘             └──────────┘               └──────────┘
//!         └──────────────────── unsubscribe ────────────────────▲
//! ```
//!
//! A released object keeps serving its last snapshot. It is never refreshed
//! by signals again and cannot be watched again.

use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::watch;
use zbus::zvariant::{DynamicType, OwnedObjectPath, Type};

use crate::bus::SystemBus;
use crate::error::{Error, Result};
use crate::kind::ObjectKind;
use crate::properties::{PropertyMirror, PropertySnapshot};
use crate::subscription::Subscription;

/// Identifies a remote object: its path and the interface it is used through
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectHandle {
    path: OwnedObjectPath,
    interface: &'static str,
}

impl ObjectHandle {
    pub(crate) fn new(path: OwnedObjectPath, interface: &'static str) -> Self {
        Self { path, interface }
    }

    pub fn path(&self) -> &OwnedObjectPath {
        &self.path
    }

    pub fn interface(&self) -> &'static str {
        self.interface
    }
}

/// Externally visible subscription state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchStatus {
    Unwatched,
    Watching,
    Released,
}

enum WatchState {
    Unwatched,
    Watching(Subscription),
    Released,
}

impl WatchState {
    fn status(&self) -> WatchStatus {
        match self {
            Self::Unwatched => WatchStatus::Unwatched,
            Self::Watching(_) => WatchStatus::Watching,
            Self::Released => WatchStatus::Released,
        }
    }
}

/// A systemd object of kind `K`, with a mirrored property snapshot
pub struct RemoteObject<K: ObjectKind> {
    bus: SystemBus,
    mirror: PropertyMirror,
    watch: Mutex<WatchState>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ObjectKind> RemoteObject<K> {
    /// Open the object at `path`, fetch its properties and optionally watch it.
    ///
    /// `path` must come from a previous systemd reply.
    pub async fn open(bus: &SystemBus, path: OwnedObjectPath, watch: bool) -> Result<Self> {
        let handle = ObjectHandle::new(path, K::INTERFACE);
        let object = Self {
            bus: bus.clone(),
            mirror: PropertyMirror::new(bus.clone(), handle),
            watch: Mutex::new(WatchState::Unwatched),
            _kind: PhantomData,
        };

        // Register before the first fetch so no change slips in between
        if watch {
            object.subscribe().await?;
        }
        object.refresh().await?;

        Ok(object)
    }

    /// Open another interface of the same object
    pub async fn open_as<T: ObjectKind>(&self, watch: bool) -> Result<RemoteObject<T>> {
        RemoteObject::open(&self.bus, self.path().clone(), watch).await
    }

    pub fn handle(&self) -> &ObjectHandle {
        self.mirror.handle()
    }

    pub fn path(&self) -> &OwnedObjectPath {
        self.handle().path()
    }

    pub fn interface(&self) -> &'static str {
        K::INTERFACE
    }

    pub fn bus(&self) -> &SystemBus {
        &self.bus
    }

    /// Current snapshot. Frozen once the object is released.
    pub fn properties(&self) -> Arc<PropertySnapshot> {
        self.mirror.snapshot()
    }

    /// Receiver woken after every refresh
    pub fn updates(&self) -> watch::Receiver<Arc<PropertySnapshot>> {
        self.mirror.updates()
    }

    /// Fetch all properties now, replacing the snapshot
    pub async fn refresh(&self) -> Result<()> {
        self.mirror.refresh().await
    }

    pub fn watch_status(&self) -> WatchStatus {
        self.lock_watch().status()
    }

    /// Keep the snapshot in sync with property-change signals.
    ///
    /// No-op when already watching. Fails on a released object.
    pub async fn subscribe(&self) -> Result<()> {
        match self.watch_status() {
            WatchStatus::Watching => return Ok(()),
            WatchStatus::Released => return Err(self.released_error()),
            WatchStatus::Unwatched => {}
        }

        let mirror = self.mirror.clone();
        let subscription = Subscription::register(&self.bus, self.handle(), move || {
            let mirror = mirror.clone();
            async move {
                if let Err(e) = mirror.refresh().await {
                    log::warn!("{}: refresh after change signal failed: {}", mirror.handle().path(), e);
                }
            }
        })
        .await?;

        let mut state = self.lock_watch();
        match state.status() {
            WatchStatus::Unwatched => *state = WatchState::Watching(subscription),
            // A concurrent subscribe won; ours is disarmed on drop
            WatchStatus::Watching => {}
            WatchStatus::Released => return Err(self.released_error()),
        }
        Ok(())
    }

    /// Stop following property changes. Terminal.
    ///
    /// Calling this twice yields [`Error::DoubleRelease`].
    pub fn unsubscribe(&self) -> Result<()> {
        let previous = std::mem::replace(&mut *self.lock_watch(), WatchState::Released);
        match previous {
            WatchState::Watching(mut subscription) => subscription.release(),
            WatchState::Unwatched => Ok(()),
            WatchState::Released => Err(Error::DoubleRelease {
                path: self.path().to_string(),
            }),
        }
    }

    /// Explicit teardown: release the subscription and drop the wrapper
    pub fn close(self) -> Result<()> {
        self.unsubscribe()
    }

    pub(crate) async fn call<B, R>(&self, method: &str, body: &B) -> Result<R>
    where
        B: Serialize + DynamicType,
        R: DeserializeOwned + Type,
    {
        self.bus.call(self.handle(), method, body).await
    }

    pub(crate) async fn call_void<B>(&self, method: &str, body: &B) -> Result<()>
    where
        B: Serialize + DynamicType,
    {
        self.bus.call_void(self.handle(), method, body).await
    }

    fn lock_watch(&self) -> MutexGuard<'_, WatchState> {
        self.watch.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn released_error(&self) -> Error {
        Error::Released {
            path: self.path().to_string(),
        }
    }
}

impl<K: ObjectKind> std::fmt::Debug for RemoteObject<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteObject")
            .field("interface", &K::INTERFACE)
            .field("path", &self.path().as_str())
            .field("watch", &self.watch_status())
            .finish()
    }
}

impl<K: ObjectKind> std::fmt::Display for RemoteObject<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.properties().str("Id") {
            Some(id) => write!(f, "{}", id),
            None => write!(f, "{}", self.path().as_str()),
        }
    }
}
