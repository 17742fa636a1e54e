//! org.freedesktop.systemd1.Job wrapper

use zbus::zvariant::OwnedObjectPath;

use crate::bus::SystemBus;
use crate::error::Result;
use crate::kind;
use crate::object::RemoteObject;

/// A queued or running state transition of a unit
pub type Job = RemoteObject<kind::Job>;

impl Job {
    /// Cancel the job
    pub async fn cancel(&self) -> Result<()> {
        self.call_void("Cancel", &()).await
    }

    /// Numeric job id
    pub fn id(&self) -> Option<u32> {
        self.properties().u32("Id")
    }

    /// "start", "stop", "reload", ...
    pub fn job_type(&self) -> Option<String> {
        self.properties().str("JobType").map(str::to_owned)
    }

    /// "waiting" or "running"
    pub fn state(&self) -> Option<String> {
        self.properties().str("State").map(str::to_owned)
    }

    /// Object path of the unit this job belongs to
    pub fn unit_path(&self) -> Option<OwnedObjectPath> {
        self.properties().struct_path("Unit").map(|p| p.clone().into())
    }
}

/// Open the job systemd just returned, if it still exists.
///
/// A transition that finishes synchronously leaves no job object behind. That
/// shows up as an unknown object or interface on the first property fetch and
/// is reported as `None` rather than an error.
///
/// The verb has already been carried out by the time this runs, so watching
/// the job is best effort: if no subscription can be registered the job is
/// returned unwatched.
pub(crate) async fn job_if_exists(bus: &SystemBus, path: OwnedObjectPath) -> Result<Option<Job>> {
    if path.as_str() == "/" {
        return Ok(None);
    }

    let job = match Job::open(bus, path.clone(), false).await {
        Ok(job) => job,
        Err(e) if e.is_vanished_object() => {
            log::debug!("{}: job finished before it could be opened", path.as_str());
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    if bus.watch_by_default() {
        match job.subscribe().await {
            // Catch changes made between the first fetch and the subscription
            Ok(()) => {
                if let Err(e) = job.refresh().await {
                    log::debug!("{}: refresh after subscribing failed: {}", path.as_str(), e);
                }
            }
            Err(e) => log::warn!("{}: job left unwatched: {}", path.as_str(), e),
        }
    }
    Ok(Some(job))
}
