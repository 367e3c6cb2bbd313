/// Name the shell registers with the engine's user content manager;
/// the shim posts to `window.webkit.messageHandlers.<name>`.
pub const SCRIPT_MESSAGE_HANDLER: &str = "notify";

/// Injected at document start into every frame. Replaces the page's
/// `Notification` constructor with one that forwards a `show` message
/// to the host, fire and forget. Permission is host-governed, so the
/// substitute always reports `granted`; `close()` only flips a local
/// flag. `maxActions` forwards the native value when present.
pub const NOTIFICATION_SHIM: &str = r#"
(() => {
    'use strict';
    const native = window.Notification;
    const maxActions =
        native && typeof native.maxActions === 'number' ? native.maxActions : 2;

    class WrenNotification {
        constructor(title, options) {
            options = options || {};
            this.title = String(title);
            this.body = options.body ? String(options.body) : '';
            this.tag = options.tag ? String(options.tag) : '';
            this.icon = options.icon ? String(options.icon) : '';
            this.onclick = null;
            this.onclose = null;
            this.onerror = null;
            this.onshow = null;
            this._closed = false;
            window.webkit.messageHandlers.notify.postMessage(JSON.stringify({
                type: 'show',
                title: this.title,
                body: this.body,
                tag: this.tag,
                icon: this.icon
            }));
        }

        close() {
            this._closed = true;
        }

        static get permission() {
            return 'granted';
        }

        static requestPermission(callback) {
            const granted = Promise.resolve('granted');
            if (typeof callback === 'function') {
                granted.then(callback);
            }
            return granted;
        }

        static get maxActions() {
            return maxActions;
        }
    }

    window.Notification = WrenNotification;
})();
"#;
