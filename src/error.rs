//! Error types
//!
//! Every remote fault is translated once into [`Error::RemoteCall`] and handed
//! back to the caller. Nothing is retried here.

use zbus::DBusError;

/// Fault names that mean "the object behind this path is gone".
const VANISHED_OBJECT_FAULTS: &[&str] = &[
    "org.freedesktop.DBus.Error.UnknownObject",
    "org.freedesktop.DBus.Error.UnknownInterface",
    "org.freedesktop.DBus.Error.UnknownMethod",
    "org.freedesktop.systemd1.NoSuchJob",
];

const LIMITS_EXCEEDED: &str = "org.freedesktop.DBus.Error.LimitsExceeded";

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot connect to the bus: {0}")]
    Connection(#[source] zbus::Error),

    #[error("{kind}({message})")]
    RemoteCall {
        /// Short token such as `NoSuchUnit`
        kind: String,
        /// Full dotted fault name
        name: String,
        message: String,
    },

    #[error("Subscription limit reached ({limit} active watches)")]
    SubscriptionLimit { limit: usize },

    #[error("Subscription for {path} was already released")]
    DoubleRelease { path: String },

    #[error("Cannot watch {path}: subscription was released")]
    Released { path: String },

    #[error("D-Bus transport error: {0}")]
    Transport(#[source] zbus::Error),
}

impl Error {
    /// Build a remote fault from its dotted name and message.
    pub fn remote(name: &str, message: Option<&str>) -> Self {
        Self::RemoteCall {
            kind: fault_kind(name).to_string(),
            name: name.to_string(),
            message: message.unwrap_or_default().to_string(),
        }
    }

    /// Translate a zbus error raised by a method call.
    pub(crate) fn from_call(err: zbus::Error) -> Self {
        match err {
            zbus::Error::MethodError(name, message, _) => Self::remote(name.as_str(), message.as_deref()),
            zbus::Error::FDO(fdo) => Self::remote(fdo.name().as_str(), fdo.description()),
            other => Self::Transport(other),
        }
    }

    /// Translate an error raised while registering a signal match.
    pub(crate) fn from_watch(err: zbus::Error, limit: usize) -> Self {
        match Self::from_call(err) {
            Self::RemoteCall { name, .. } if name == LIMITS_EXCEEDED => Self::SubscriptionLimit { limit },
            other => other,
        }
    }

    /// Short error-kind token, if this is a remote fault.
    pub fn kind(&self) -> Option<&str> {
        match self {
            Self::RemoteCall { kind, .. } => Some(kind),
            _ => None,
        }
    }

    /// Lookup of a unit or job that systemd does not know.
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind(), Some("NoSuchUnit" | "NoSuchJob"))
    }

    /// The remote object vanished between being returned and being opened.
    pub(crate) fn is_vanished_object(&self) -> bool {
        match self {
            Self::RemoteCall { name, message, .. } => {
                VANISHED_OBJECT_FAULTS.contains(&name.as_str())
                    || message.contains("Unknown interface 'org.freedesktop.systemd1.Job'")
            }
            _ => false,
        }
    }
}

/// Extract the short kind token from a dotted fault name.
///
/// `org.freedesktop.systemd1.NoSuchUnit` yields `NoSuchUnit`. Names with fewer
/// than four segments fall back to their last segment.
pub fn fault_kind(name: &str) -> &str {
    name.split('.')
        .nth(3)
        .filter(|s| !s.is_empty())
        .or_else(|| name.rsplit('.').next())
        .unwrap_or(name)
}
