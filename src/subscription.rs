//! Property-change subscriptions
//!
//! A [`Subscription`] registers a `PropertiesChanged` match for one object and
//! runs a task that calls back on every delivered signal. The payload is not
//! inspected: any notification means "fetch everything again".
//!
//! Every live subscription costs one match rule on the bus, so the number of
//! them is bounded by a per-bus [`WatchBudget`].

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures_lite::StreamExt;
use tokio::task::JoinHandle;
use zbus::{MatchRule, MessageStream};

use crate::bus::{SystemBus, PROPERTIES_INTERFACE};
use crate::error::{Error, Result};
use crate::object::ObjectHandle;

/// Counts live subscriptions against an optional cap
#[derive(Debug, Clone)]
pub(crate) struct WatchBudget {
    active: Arc<AtomicUsize>,
    limit: Option<usize>,
}

impl WatchBudget {
    pub(crate) fn new(limit: Option<usize>) -> Self {
        Self {
            active: Arc::new(AtomicUsize::new(0)),
            limit,
        }
    }

    pub(crate) fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// The configured cap, or the current count when the bus enforces it
    pub(crate) fn effective_limit(&self) -> usize {
        self.limit.unwrap_or_else(|| self.active())
    }

    /// Give back the slot of a registration the bus refused and translate the error
    pub(crate) fn refuse(&self, permit: WatchPermit, err: zbus::Error) -> Error {
        drop(permit);
        Error::from_watch(err, self.effective_limit())
    }

    pub(crate) fn try_reserve(&self) -> Result<WatchPermit> {
        let mut current = self.active.load(Ordering::SeqCst);
        loop {
            if let Some(limit) = self.limit {
                if current >= limit {
                    return Err(Error::SubscriptionLimit { limit });
                }
            }
            match self.active.compare_exchange_weak(
                current,
                current + 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => {
                    return Ok(WatchPermit {
                        active: Arc::clone(&self.active),
                    })
                }
                Err(actual) => current = actual,
            }
        }
    }
}

/// One slot of the budget, returned when dropped
#[derive(Debug)]
pub(crate) struct WatchPermit {
    active: Arc<AtomicUsize>,
}

impl Drop for WatchPermit {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// An active interest registration for one object's property changes.
///
/// Must be released exactly once. [`Subscription::release`] on an already
/// released handle fails with [`Error::DoubleRelease`]. Dropping an armed
/// handle releases it silently.
#[derive(Debug)]
pub struct Subscription {
    path: String,
    armed: Option<Armed>,
}

#[derive(Debug)]
struct Armed {
    task: JoinHandle<()>,
    _permit: WatchPermit,
}

impl Subscription {
    /// Register the match and start delivering notifications to `on_change`
    pub(crate) async fn register<F, Fut>(bus: &SystemBus, handle: &ObjectHandle, mut on_change: F) -> Result<Self>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let permit = bus.budget().try_reserve()?;

        let rule = match_rule(handle).map_err(Error::Transport)?;
        let stream = match MessageStream::for_match_rule(rule, bus.connection(), Some(bus.signal_queue())).await {
            Ok(stream) => stream,
            Err(e) => return Err(bus.budget().refuse(permit, e)),
        };

        let path = handle.path().to_string();
        let label = path.clone();
        log::debug!("{}: watching {}", path, handle.interface());

        let task = tokio::spawn(async move {
            futures_lite::pin!(stream);
            while let Some(msg) = stream.next().await {
                match msg {
                    Ok(_) => on_change().await,
                    Err(e) => log::warn!("{}: bad property change signal: {}", label, e),
                }
            }
            log::debug!("{}: signal stream ended", label);
        });

        Ok(Self {
            path,
            armed: Some(Armed {
                task,
                _permit: permit,
            }),
        })
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Cancel the registration; the bus-side match goes away with the stream
    pub fn release(&mut self) -> Result<()> {
        match self.armed.take() {
            Some(armed) => {
                armed.task.abort();
                log::debug!("{}: subscription released", self.path);
                Ok(())
            }
            None => Err(Error::DoubleRelease {
                path: self.path.clone(),
            }),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(armed) = self.armed.take() {
            armed.task.abort();
        }
    }
}

fn match_rule(handle: &ObjectHandle) -> zbus::Result<MatchRule<'_>> {
    Ok(MatchRule::builder()
        .msg_type(zbus::message::Type::Signal)
        .interface(PROPERTIES_INTERFACE)?
        .member("PropertiesChanged")?
        .path(handle.path().as_str())?
        .arg(0, handle.interface())?
        .build())
}
