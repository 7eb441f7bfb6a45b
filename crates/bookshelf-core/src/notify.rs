//! Transient notifications
//!
//! A `Notifier` keeps an ordered queue of short messages. Each message may
//! carry a lifetime after which it removes itself; expiry timers run on the
//! ambient tokio runtime and are only cancelled by removing the notification.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::debug;

use crate::models::Tone;

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }

    /// Lifetime used by the convenience entry points
    pub fn default_duration(self) -> Duration {
        match self {
            Self::Success => Duration::from_millis(3000),
            Self::Error => Duration::from_millis(5000),
            Self::Warning => Duration::from_millis(4000),
            Self::Info => Duration::from_millis(3000),
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Success => "check_circle",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }

    pub fn tone(self) -> Tone {
        match self {
            Self::Success | Self::Info => Tone::Primary,
            Self::Warning => Tone::Accent,
            Self::Error => Tone::Warn,
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub kind: NotificationKind,
    /// `None` means the notification stays until removed
    #[serde(
        rename = "durationMs",
        serialize_with = "serialize_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<Duration>,
}

fn serialize_millis<S: serde::Serializer>(
    duration: &Option<Duration>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match duration {
        Some(d) => serializer.serialize_u64(d.as_millis() as u64),
        None => serializer.serialize_none(),
    }
}

struct Inner {
    queue: watch::Sender<Vec<Notification>>,
    next_id: AtomicU64,
}

impl Inner {
    fn remove(&self, id: u64) {
        self.queue.send_modify(|queue| queue.retain(|n| n.id != id));
    }
}

/// Ephemeral notification queue; clones share the same queue
#[derive(Clone)]
pub struct Notifier {
    inner: Arc<Inner>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        let (queue, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(Inner {
                queue,
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Live queue, oldest first
    pub fn observe(&self) -> watch::Receiver<Vec<Notification>> {
        self.inner.queue.subscribe()
    }

    pub fn snapshot(&self) -> Vec<Notification> {
        self.inner.queue.borrow().clone()
    }

    /// Append a notification, returning its id
    ///
    /// A non-zero `duration` schedules removal of this id once it elapses.
    pub fn push(
        &self,
        message: impl Into<String>,
        kind: NotificationKind,
        duration: Option<Duration>,
    ) -> u64 {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let duration = duration.filter(|d| !d.is_zero());

        let notification = Notification {
            id,
            message: message.into(),
            kind,
            duration,
        };
        self.inner
            .queue
            .send_modify(|queue| queue.push(notification));

        if let Some(duration) = duration {
            self.schedule_expiry(id, duration);
        }
        id
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.push_default(message, NotificationKind::Success)
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.push_default(message, NotificationKind::Error)
    }

    pub fn warning(&self, message: impl Into<String>) -> u64 {
        self.push_default(message, NotificationKind::Warning)
    }

    pub fn info(&self, message: impl Into<String>) -> u64 {
        self.push_default(message, NotificationKind::Info)
    }

    /// Remove by id; unknown ids are ignored
    pub fn remove(&self, id: u64) {
        self.inner.remove(id);
    }

    pub fn clear(&self) {
        self.inner.queue.send_modify(Vec::clear);
    }

    fn push_default(&self, message: impl Into<String>, kind: NotificationKind) -> u64 {
        self.push(message, kind, Some(kind.default_duration()))
    }

    fn schedule_expiry(&self, id: u64, duration: Duration) {
        let Ok(handle) = Handle::try_current() else {
            debug!("No runtime for expiry of notification {}, keeping it", id);
            return;
        };

        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        handle.spawn(async move {
            tokio::time::sleep(duration).await;
            if let Some(inner) = inner.upgrade() {
                inner.remove(id);
            }
        });
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("queue", &*self.inner.queue.borrow())
            .finish()
    }
}
