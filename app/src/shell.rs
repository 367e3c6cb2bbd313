use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use adw::prelude::*;
use gtk::gio;
use gtk::glib;
use tracing::{debug, info, warn};
use webkit6::prelude::*;

use badge::derive_badge;
use bridge::{presentation_for, NotificationBridge, NotificationSink, SCRIPT_MESSAGE_HANDLER};
use engine::{restore_then, CookieJar, WebKitCookieJar};
use policy::{NavigationDecision, NavigationPolicy, NavigationRequest, NewWindowDecision};
use session::{SessionStore, SessionWriter, WriteOutcome};

use crate::notifier::DesktopNotifier;

const APP_TITLE: &str = "Messenger";
const APP_URL: &str = "https://www.messenger.com/";
const APP_DOMAIN: &str = "messenger.com";
const FIRST_PARTY_DOMAINS: &[&str] = &["messenger.com", "facebook.com", "fb.com", "fbcdn.net"];

const SESSION_DIR: &str = "wren-shell";
const SESSION_FILE: &str = "session.json";
const SAVE_INTERVAL: Duration = Duration::from_secs(60);
const POLL_INTERVAL: Duration = Duration::from_millis(250);
const SHUTDOWN_SAVE_TIMEOUT: Duration = Duration::from_secs(2);
// Covers cookie enumeration plus the bounded flush; exit never waits
// longer than this on I/O.
const SHUTDOWN_FALLBACK: Duration = Duration::from_millis(2500);

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum ShellPhase {
    Starting,
    Loading,
    Ready,
    Terminating,
}

#[derive(Debug)]
struct ShellState {
    phase: ShellPhase,
    badge: Option<u32>,
    save_timer: Option<glib::SourceId>,
}

/// Numeric unread pill in the header bar. The deriver stays pure; this
/// is the only place the visible badge is touched.
#[derive(Clone)]
struct BadgeIndicator {
    label: gtk::Label,
}

impl BadgeIndicator {
    fn new() -> Self {
        let label = gtk::Label::new(None);
        label.add_css_class("badge");
        label.set_visible(false);
        Self { label }
    }

    fn apply(&self, count: Option<u32>) {
        match count {
            Some(count) => {
                self.label.set_text(&count.to_string());
                self.label.set_visible(true);
            }
            None => {
                self.label.set_text("");
                self.label.set_visible(false);
            }
        }
    }
}

pub fn build_ui(app: &adw::Application) {
    let state = Rc::new(RefCell::new(ShellState {
        phase: ShellPhase::Starting,
        badge: None,
        save_timer: None,
    }));

    let content_manager = webkit6::UserContentManager::new();
    if !content_manager.register_script_message_handler(SCRIPT_MESSAGE_HANDLER, None) {
        warn!("failed to register the notification message handler");
    }
    let shim = webkit6::UserScript::new(
        bridge::NOTIFICATION_SHIM,
        webkit6::UserContentInjectedFrames::AllFrames,
        webkit6::UserScriptInjectionTime::Start,
        &[],
        &[],
    );
    content_manager.add_script(&shim);

    let webview = create_webview(&content_manager);
    let badge_indicator = BadgeIndicator::new();
    let header = build_header_bar(&badge_indicator);

    let content = gtk::Box::new(gtk::Orientation::Vertical, 0);
    content.append(&header);
    content.append(&webview);

    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title(APP_TITLE)
        .default_width(1100)
        .default_height(760)
        .content(&content)
        .build();
    window.present();

    let store = SessionStore::new(
        glib::user_data_dir().join(SESSION_DIR).join(SESSION_FILE),
    );
    let writer = Rc::new(SessionWriter::spawn(store.clone()));
    let jar = WebKitCookieJar::for_view(&webview);
    if jar.is_none() {
        warn!("web view has no cookie manager; session persistence disabled");
    }

    let nav_policy = Rc::new(NavigationPolicy::new(APP_DOMAIN, FIRST_PARTY_DOMAINS));
    let notification_bridge = NotificationBridge::new(APP_TITLE);
    let (notifier, click_events) = DesktopNotifier::new(APP_TITLE);

    // Page permission is governed by the shell through the injected
    // shim; every engine-level prompt is denied.
    webview.connect_permission_request(|_, request| {
        request.deny();
        true
    });

    let state_for_title = Rc::clone(&state);
    let badge_for_title = badge_indicator.clone();
    webview.connect_title_notify(move |view| {
        let title = view.title().map(|t| t.to_string()).unwrap_or_default();
        let count = derive_badge(&title);
        let mut shell = state_for_title.borrow_mut();
        if shell.badge != count {
            shell.badge = count;
            badge_for_title.apply(count);
        }
    });

    let window_for_messages = window.clone();
    content_manager.connect_script_message_received(Some(SCRIPT_MESSAGE_HANDLER), move |_, value| {
        let raw = value.to_str();
        let Some(request) = notification_bridge.handle(&raw) else {
            return;
        };
        // The compositor reports focus through `is-active`; one window
        // means focused and frontmost coincide here.
        let focused = window_for_messages.is_active();
        let presentation = presentation_for(focused, focused);
        notifier.deliver(&request, presentation);
    });

    let policy_for_nav = Rc::clone(&nav_policy);
    webview.connect_decide_policy(move |view, decision, decision_type| {
        let is_new_window = match decision_type {
            webkit6::PolicyDecisionType::NavigationAction => false,
            webkit6::PolicyDecisionType::NewWindowAction => true,
            _ => return false,
        };

        let Some(nav_decision) = decision.dynamic_cast_ref::<webkit6::NavigationPolicyDecision>()
        else {
            return false;
        };
        let Some(mut action) = nav_decision.navigation_action() else {
            return false;
        };
        let Some(request) = action.request() else {
            return false;
        };
        let Some(uri) = request.uri() else {
            return false;
        };
        let uri = uri.to_string();
        let host = host_of(&uri);
        let nav_request = NavigationRequest {
            uri: &uri,
            host: &host,
            link_activated: action.navigation_type() == webkit6::NavigationType::LinkClicked,
        };

        if is_new_window {
            match policy_for_nav.decide_new_window(&nav_request) {
                // One browsing surface: popups to the app's own domain
                // land in the existing view, never a second window.
                NewWindowDecision::LoadInShell => {
                    decision.ignore();
                    view.load_uri(&uri);
                }
                NewWindowDecision::OpenExternally => {
                    decision.ignore();
                    open_external(&uri);
                }
            }
            return true;
        }

        match policy_for_nav.decide(&nav_request) {
            NavigationDecision::Allow => false,
            NavigationDecision::OpenExternally => {
                decision.ignore();
                open_external(&uri);
                true
            }
        }
    });

    let state_for_load = Rc::clone(&state);
    let jar_for_load = jar.clone();
    let writer_for_load = Rc::clone(&writer);
    webview.connect_load_changed(move |_, event| {
        if event != webkit6::LoadEvent::Finished {
            return;
        }
        let mut shell = state_for_load.borrow_mut();
        if shell.phase == ShellPhase::Loading {
            shell.phase = ShellPhase::Ready;
            info!("shell ready");
            if let Some(jar) = &jar_for_load {
                shell.save_timer = Some(start_save_timer(jar, &writer_for_load));
            }
        }
    });

    webview.connect_load_failed(move |_, _event, uri, error| {
        warn!(uri, %error, "page load failed");
        false
    });

    start_poll_tick(&window, click_events, &writer);

    // Restore-then-load: the first navigation waits for every restored
    // cookie to be installed, otherwise the page starts logged out.
    let records = store.load();
    info!(count = records.len(), "session cookies loaded");
    match &jar {
        Some(jar) => {
            let state_for_restore = Rc::clone(&state);
            let webview_for_restore = webview.clone();
            restore_then(jar, &records, move || {
                state_for_restore.borrow_mut().phase = ShellPhase::Loading;
                webview_for_restore.load_uri(APP_URL);
            });
        }
        None => {
            state.borrow_mut().phase = ShellPhase::Loading;
            webview.load_uri(APP_URL);
        }
    }

    let state_for_close = Rc::clone(&state);
    let writer_for_close = Rc::clone(&writer);
    window.connect_close_request(move |window| {
        if state_for_close.borrow().phase == ShellPhase::Terminating {
            return glib::Propagation::Proceed;
        }
        {
            let mut shell = state_for_close.borrow_mut();
            shell.phase = ShellPhase::Terminating;
            if let Some(timer) = shell.save_timer.take() {
                timer.remove();
            }
        }

        let Some(jar) = &jar else {
            return glib::Propagation::Proceed;
        };

        let destroyed = Rc::new(Cell::new(false));
        let window_for_fallback = window.clone();
        let destroyed_for_fallback = Rc::clone(&destroyed);
        glib::timeout_add_local_once(SHUTDOWN_FALLBACK, move || {
            if !destroyed_for_fallback.get() {
                warn!("shutdown save did not complete in time");
                destroyed_for_fallback.set(true);
                window_for_fallback.destroy();
            }
        });

        let writer = Rc::clone(&writer_for_close);
        let window = window.clone();
        jar.fetch_all(Box::new(move |records| {
            writer.submit(records);
            if !writer.flush_within(SHUTDOWN_SAVE_TIMEOUT) {
                warn!("final session save timed out");
            }
            if !destroyed.get() {
                destroyed.set(true);
                window.destroy();
            }
        }));
        glib::Propagation::Stop
    });
}

fn build_header_bar(badge: &BadgeIndicator) -> adw::HeaderBar {
    let header = adw::HeaderBar::new();
    header.set_show_start_title_buttons(true);
    header.set_show_end_title_buttons(true);

    let title_box = gtk::Box::new(gtk::Orientation::Horizontal, 8);
    let title = gtk::Label::new(Some(APP_TITLE));
    title_box.append(&title);
    title_box.append(&badge.label);
    header.set_title_widget(Some(&title_box));

    header
}

fn create_webview(manager: &webkit6::UserContentManager) -> webkit6::WebView {
    let settings = webkit6::Settings::builder().enable_javascript(true).build();

    let webview = webkit6::WebView::builder()
        .settings(&settings)
        .user_content_manager(manager)
        .build();
    webview.set_hexpand(true);
    webview.set_vexpand(true);
    webview
}

fn start_save_timer(jar: &WebKitCookieJar, writer: &Rc<SessionWriter>) -> glib::SourceId {
    let jar = jar.clone();
    let writer = Rc::clone(writer);
    glib::timeout_add_local(SAVE_INTERVAL, move || {
        request_save(&jar, &writer);
        glib::ControlFlow::Continue
    })
}

fn request_save(jar: &WebKitCookieJar, writer: &Rc<SessionWriter>) {
    let writer = Rc::clone(writer);
    jar.fetch_all(Box::new(move |records| {
        writer.submit(records);
    }));
}

/// Drains notification clicks (bring the window forward) and writer
/// acks from the main loop.
fn start_poll_tick(
    window: &adw::ApplicationWindow,
    click_events: Receiver<()>,
    writer: &Rc<SessionWriter>,
) {
    let window = window.clone();
    let writer = Rc::clone(writer);
    glib::timeout_add_local(POLL_INTERVAL, move || {
        if click_events.try_recv().is_ok() {
            // Coalesce a burst of clicks into one present.
            while click_events.try_recv().is_ok() {}
            window.present();
        }
        for outcome in writer.poll() {
            if let WriteOutcome::Saved { count, .. } = outcome {
                debug!(count, "session save completed");
            }
        }
        glib::ControlFlow::Continue
    });
}

fn host_of(uri: &str) -> String {
    glib::Uri::parse(uri, glib::UriFlags::NONE)
        .ok()
        .and_then(|parsed| parsed.host().map(|host| host.to_string()))
        .unwrap_or_default()
}

fn open_external(uri: &str) {
    // Fire and forget; the platform's default handler takes over.
    if let Err(err) = gio::AppInfo::launch_default_for_uri(uri, None::<&gio::AppLaunchContext>) {
        warn!(uri, %err, "failed to open url externally");
    }
}
