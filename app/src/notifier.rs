use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use notify_rust::{Hint, Notification};
use tracing::{debug, warn};

use bridge::{NotificationRequest, NotificationSink, Presentation};

const CLICK_ACTION: &str = "default";

/// Freedesktop notification delivery.
///
/// Each shown notification gets its own worker thread that blocks on
/// the D-Bus action round-trip; default-action clicks are funneled
/// back over a channel the shell drains from its poll tick.
pub struct DesktopNotifier {
    app_name: String,
    clicks: Sender<()>,
}

impl DesktopNotifier {
    pub fn new(app_name: &str) -> (Self, Receiver<()>) {
        let (clicks, click_events) = mpsc::channel();
        (
            Self {
                app_name: app_name.to_string(),
                clicks,
            },
            click_events,
        )
    }
}

impl NotificationSink for DesktopNotifier {
    fn deliver(&self, request: &NotificationRequest, presentation: Presentation) {
        // The shell is focused and frontmost; the user is already
        // looking at the conversation.
        if presentation.is_suppressed() {
            debug!(tag = %request.tag, "notification suppressed while shell is focused");
            return;
        }

        let mut notification = Notification::new();
        notification
            .appname(&self.app_name)
            .summary(&request.title)
            .body(&request.body)
            .action(CLICK_ACTION, "Open")
            .hint(Hint::Custom(
                "x-dunst-stack-tag".to_string(),
                request.tag.clone(),
            ));
        if presentation.sound {
            notification.sound_name("message-new-instant");
        }

        let clicks = self.clicks.clone();
        thread::spawn(move || match notification.show() {
            Ok(handle) => {
                handle.wait_for_action(|action| {
                    if action == CLICK_ACTION {
                        let _ = clicks.send(());
                    }
                });
            }
            Err(err) => warn!(%err, "notification delivery failed"),
        });
    }
}
