//! User-visible notifications on successful transfers.

use tracing::info;

pub const NOTIFICATION_TITLE: &str = "Magic Wormhole";

/// Delivers a desktop-style notification. Implemented by the frontend.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str);
}

/// Notifier that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, title: &str, body: &str) {
        info!(target: "burrow::notify", "{}: {}", title, body);
    }
}
