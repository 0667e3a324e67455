use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

/// Fire-and-forget sink for user-facing messages
pub trait Notifier: Send + Sync {
    fn enqueue(&self, message: &str, severity: Severity);
}

/// Writes messages to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn enqueue(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Success | Severity::Info => log::info!("{}", message),
            Severity::Warning => log::warn!("{}", message),
            Severity::Error => log::error!("{}", message),
        }
    }
}

impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    fn enqueue(&self, message: &str, severity: Severity) {
        (**self).enqueue(message, severity)
    }
}
