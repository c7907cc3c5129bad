use tracing::warn;

/// Fire-and-forget channel for short messages shown to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Notifier that only writes to the log.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        warn!(notification = message, "Showing notification to user");
    }
}
