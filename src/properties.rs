//! Property mirror
//!
//! A local copy of everything an object exposes through
//! `org.freedesktop.DBus.Properties.GetAll`. Each refresh builds a brand new
//! [`PropertySnapshot`] and swaps it in, so a reader always sees the result
//! of exactly one fetch. Fetches are numbered when they start; one that
//! completes after a newer fetch was applied is discarded.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use zbus::zvariant::{ObjectPath, OwnedValue, Value};

use crate::bus::SystemBus;
use crate::error::Result;
use crate::object::ObjectHandle;

/// Last known property values of one remote object
#[derive(Debug, Default)]
pub struct PropertySnapshot {
    values: HashMap<String, OwnedValue>,
    generation: u64,
}

impl PropertySnapshot {
    pub fn new(values: HashMap<String, OwnedValue>) -> Self {
        Self { values, generation: 0 }
    }

    /// Sequence number of the fetch that produced this snapshot, 0 if none
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Property names in no particular order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Untyped lookup for properties without a dedicated accessor
    pub fn get(&self, name: &str) -> Option<&Value<'static>> {
        self.values.get(name).map(|v| &**v)
    }

    /// Lookup converted into any type zvariant can produce from an owned value
    pub fn get_as<T>(&self, name: &str) -> Option<T>
    where
        T: TryFrom<OwnedValue>,
    {
        let value = self.values.get(name)?.try_clone().ok()?;
        T::try_from(value).ok()
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn u32(&self, name: &str) -> Option<u32> {
        match self.get(name)? {
            Value::U32(n) => Some(*n),
            _ => None,
        }
    }

    pub fn i32(&self, name: &str) -> Option<i32> {
        match self.get(name)? {
            Value::I32(n) => Some(*n),
            _ => None,
        }
    }

    pub fn u64(&self, name: &str) -> Option<u64> {
        match self.get(name)? {
            Value::U64(n) => Some(*n),
            _ => None,
        }
    }

    pub fn object_path(&self, name: &str) -> Option<&ObjectPath<'static>> {
        match self.get(name)? {
            Value::ObjectPath(p) => Some(p),
            _ => None,
        }
    }

    /// String array property (`as`), empty when absent
    pub fn strings(&self, name: &str) -> Vec<String> {
        match self.get(name) {
            Some(Value::Array(arr)) => arr
                .iter()
                .filter_map(|v| match v {
                    Value::Str(s) => Some(s.to_string()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Microsecond wall-clock timestamp; systemd reports 0 for "never"
    pub fn timestamp(&self, name: &str) -> Option<DateTime<Utc>> {
        let usec = self.u64(name).filter(|us| *us != 0 && *us != u64::MAX)?;
        DateTime::from_timestamp_micros(i64::try_from(usec).ok()?)
    }

    /// A `(uo)` or `(so)` struct property, returning its object path
    pub fn struct_path(&self, name: &str) -> Option<&ObjectPath<'static>> {
        match self.get(name)? {
            Value::Structure(s) => s.fields().iter().find_map(|f| match f {
                Value::ObjectPath(p) => Some(p),
                _ => None,
            }),
            _ => None,
        }
    }
}

/// Keeps one object's [`PropertySnapshot`] and replaces it on refresh
#[derive(Clone)]
pub struct PropertyMirror {
    inner: Arc<MirrorInner>,
}

struct MirrorInner {
    bus: SystemBus,
    handle: ObjectHandle,
    tx: watch::Sender<Arc<PropertySnapshot>>,
    next_generation: AtomicU64,
}

impl PropertyMirror {
    /// Mirror with an empty snapshot; callers refresh before handing it out
    pub(crate) fn new(bus: SystemBus, handle: ObjectHandle) -> Self {
        let (tx, _) = watch::channel(Arc::new(PropertySnapshot::default()));
        Self {
            inner: Arc::new(MirrorInner {
                bus,
                handle,
                tx,
                next_generation: AtomicU64::new(1),
            }),
        }
    }

    pub fn handle(&self) -> &ObjectHandle {
        &self.inner.handle
    }

    /// Fetch all properties and swap the snapshot in one step
    pub async fn refresh(&self) -> Result<()> {
        let generation = self.inner.next_generation.fetch_add(1, Ordering::SeqCst);
        let values = self.inner.bus.get_all(&self.inner.handle).await?;
        let count = values.len();

        if swap_if_newer(&self.inner.tx, values, generation) {
            log::debug!(
                "{}: refreshed {} properties of {}",
                self.inner.handle.path(),
                count,
                self.inner.handle.interface()
            );
        } else {
            log::debug!("{}: dropped stale fetch #{}", self.inner.handle.path(), generation);
        }
        Ok(())
    }

    pub fn snapshot(&self) -> Arc<PropertySnapshot> {
        self.inner.tx.borrow().clone()
    }

    /// Receiver that wakes on every completed refresh
    pub fn updates(&self) -> watch::Receiver<Arc<PropertySnapshot>> {
        self.inner.tx.subscribe()
    }
}

/// Install `values` unless a later fetch has already been applied
fn swap_if_newer(
    tx: &watch::Sender<Arc<PropertySnapshot>>,
    values: HashMap<String, OwnedValue>,
    generation: u64,
) -> bool {
    tx.send_if_modified(|current| {
        if current.generation > generation {
            return false;
        }
        *current = Arc::new(PropertySnapshot { values, generation });
        true
    })
}
