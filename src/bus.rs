//! Shared bus connection
//!
//! One [`SystemBus`] is opened per process and cloned into every wrapper.
//! Wrappers never open, close or reset the underlying connection.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use zbus::connection::Builder;
use zbus::zvariant::{DynamicType, OwnedValue, Type};
use zbus::Connection;

use crate::config::{BusAddress, BusOptions};
use crate::error::{Error, Result};
use crate::object::ObjectHandle;
use crate::subscription::WatchBudget;

pub const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";

#[derive(Clone)]
pub struct SystemBus {
    inner: Arc<Inner>,
}

struct Inner {
    connection: Connection,
    destination: String,
    watch_by_default: bool,
    signal_queue: usize,
    budget: WatchBudget,
}

impl SystemBus {
    /// Connect to the system bus with default options
    pub async fn connect_system() -> Result<Self> {
        Self::connect(&BusOptions::default()).await
    }

    /// Connect to the bus described by `opts`
    pub async fn connect(opts: &BusOptions) -> Result<Self> {
        let builder = match &opts.address {
            BusAddress::System => Builder::system(),
            BusAddress::Session => Builder::session(),
            BusAddress::Address(addr) => Builder::address(addr.as_str()),
        }
        .map_err(Error::Connection)?;

        let connection = builder.build().await.map_err(Error::Connection)?;
        log::debug!("Connected to {:?} bus", opts.address);

        Ok(Self::from_connection(connection, opts))
    }

    /// Wrap an already established connection
    pub fn from_connection(connection: Connection, opts: &BusOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                connection,
                destination: opts.destination.clone(),
                watch_by_default: opts.watch_by_default,
                signal_queue: opts.signal_queue.max(1),
                budget: WatchBudget::new(opts.max_watches),
            }),
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.inner.connection
    }

    pub fn destination(&self) -> &str {
        &self.inner.destination
    }

    pub fn watch_by_default(&self) -> bool {
        self.inner.watch_by_default
    }

    /// Number of subscriptions currently alive on this bus
    pub fn active_watches(&self) -> usize {
        self.inner.budget.active()
    }

    pub(crate) fn signal_queue(&self) -> usize {
        self.inner.signal_queue
    }

    pub(crate) fn budget(&self) -> &WatchBudget {
        &self.inner.budget
    }

    /// Call `method` on the object's interface and decode the reply
    pub(crate) async fn call<B, R>(&self, handle: &ObjectHandle, method: &str, body: &B) -> Result<R>
    where
        B: Serialize + DynamicType,
        R: DeserializeOwned + Type,
    {
        self.call_on(handle, handle.interface(), method, body).await
    }

    /// Call a method whose reply carries no value
    pub(crate) async fn call_void<B>(&self, handle: &ObjectHandle, method: &str, body: &B) -> Result<()>
    where
        B: Serialize + DynamicType,
    {
        log::debug!("{} {}.{}", handle.path(), handle.interface(), method);
        self.inner
            .connection
            .call_method(
                Some(self.destination()),
                handle.path().as_str(),
                Some(handle.interface()),
                method,
                body,
            )
            .await
            .map_err(Error::from_call)?;
        Ok(())
    }

    /// Fetch every property the object exposes on its interface
    pub(crate) async fn get_all(&self, handle: &ObjectHandle) -> Result<HashMap<String, OwnedValue>> {
        self.call_on(handle, PROPERTIES_INTERFACE, "GetAll", &handle.interface())
            .await
    }

    async fn call_on<B, R>(&self, handle: &ObjectHandle, interface: &str, method: &str, body: &B) -> Result<R>
    where
        B: Serialize + DynamicType,
        R: DeserializeOwned + Type,
    {
        log::debug!("{} {}.{}", handle.path(), interface, method);
        let reply = self
            .inner
            .connection
            .call_method(
                Some(self.destination()),
                handle.path().as_str(),
                Some(interface),
                method,
                body,
            )
            .await
            .map_err(Error::from_call)?;

        reply.body().deserialize::<R>().map_err(Error::Transport)
    }
}

impl std::fmt::Debug for SystemBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemBus")
            .field("destination", &self.inner.destination)
            .field("active_watches", &self.active_watches())
            .finish()
    }
}
