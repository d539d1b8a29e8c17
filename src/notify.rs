use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

pub const DEFAULT_TOAST_MS: u64 = 3000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// Receives user-facing messages. Delivery is fire and forget.
pub trait Notifier {
    fn notify(&self, message: &str, kind: NotificationKind);
}

#[derive(Clone, Debug, PartialEq)]
pub struct Toast {
    pub message: String,
    pub kind: NotificationKind,
    pub shown_at: Instant,
}

/// Holds the most recent message until it expires.
#[derive(Clone, Debug)]
pub struct ToastBoard {
    current: Rc<RefCell<Option<Toast>>>,
    ttl: Duration,
}

impl ToastBoard {
    pub fn new(ttl: Duration) -> Self {
        Self {
            current: Rc::new(RefCell::new(None)),
            ttl,
        }
    }

    /// Returns the visible toast at `now`, dropping it once expired.
    pub fn visible(&self, now: Instant) -> Option<Toast> {
        let mut current = self.current.borrow_mut();
        if let Some(toast) = current.as_ref() {
            if now.saturating_duration_since(toast.shown_at) >= self.ttl {
                *current = None;
            }
        }
        current.clone()
    }

    pub fn dismiss(&self) {
        self.current.borrow_mut().take();
    }
}

impl Default for ToastBoard {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_TOAST_MS))
    }
}

impl Notifier for ToastBoard {
    fn notify(&self, message: &str, kind: NotificationKind) {
        match kind {
            NotificationKind::Success => tracing::info!(text = message, "notification"),
            NotificationKind::Error => tracing::warn!(text = message, "notification"),
        }
        *self.current.borrow_mut() = Some(Toast {
            message: message.to_string(),
            kind,
            shown_at: Instant::now(),
        });
    }
}
