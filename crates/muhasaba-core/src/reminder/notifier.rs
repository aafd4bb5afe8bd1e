use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPermission {
    /// The user has not decided yet.
    Default,
    Granted,
    Denied,
}

/// Platform notification and haptics.
///
/// Delivery is best effort: implementations swallow and log their own
/// failures, the scheduler never retries.
pub trait Notifier {
    fn permission(&self) -> NotificationPermission;

    /// Ask the user. Only called while the permission is `Default`.
    fn request_permission(&mut self) -> NotificationPermission;

    fn notify(&mut self, title: &str, body: &str);

    /// Vibration pattern in milliseconds. No-op where unsupported.
    fn vibrate(&mut self, _pattern_ms: &[u64]) {}
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn permission(&self) -> NotificationPermission {
        (**self).permission()
    }

    fn request_permission(&mut self) -> NotificationPermission {
        (**self).request_permission()
    }

    fn notify(&mut self, title: &str, body: &str) {
        (**self).notify(title, body)
    }

    fn vibrate(&mut self, pattern_ms: &[u64]) {
        (**self).vibrate(pattern_ms)
    }
}
