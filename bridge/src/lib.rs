mod message;
mod presentation;
mod shim;

pub use message::{NotificationBridge, NotificationMessage, NotificationRequest};
pub use presentation::{presentation_for, Presentation};
pub use shim::{NOTIFICATION_SHIM, SCRIPT_MESSAGE_HANDLER};

/// Delivery seam between the bridge and the platform notification
/// facility. The GTK app supplies the real implementation; tests
/// record what would have been shown.
pub trait NotificationSink {
    fn deliver(&self, request: &NotificationRequest, presentation: Presentation);
}
