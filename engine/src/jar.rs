use gtk::gio;
use tracing::warn;
use webkit6::prelude::*;
use webkit6::soup;

use session::{CookieRecord, SameSite};

pub type FetchCallback = Box<dyn FnOnce(Vec<CookieRecord>)>;
pub type InstallCallback = Box<dyn FnOnce(bool)>;

/// Asynchronous access to the embedded engine's cookie jar. Both
/// operations complete via callback on the GTK main context.
pub trait CookieJar {
    /// Enumerates every cookie the engine currently holds.
    fn fetch_all(&self, on_done: FetchCallback);

    /// Installs one cookie. The callback reports whether the store
    /// accepted it.
    fn install(&self, record: &CookieRecord, on_done: InstallCallback);
}

/// Cookie jar backed by the WebKit network session.
#[derive(Debug, Clone)]
pub struct WebKitCookieJar {
    manager: webkit6::CookieManager,
}

impl WebKitCookieJar {
    pub fn new(manager: webkit6::CookieManager) -> Self {
        Self { manager }
    }

    /// Resolves the cookie manager behind a web view's network session.
    pub fn for_view(view: &webkit6::WebView) -> Option<Self> {
        view.network_session()
            .and_then(|session| session.cookie_manager())
            .map(Self::new)
    }
}

impl CookieJar for WebKitCookieJar {
    fn fetch_all(&self, on_done: FetchCallback) {
        self.manager
            .all_cookies(None::<&gio::Cancellable>, move |result| match result {
                Ok(cookies) => {
                    let records = cookies
                        .into_iter()
                        .filter_map(|mut cookie| record_from_cookie(&mut cookie))
                        .collect();
                    on_done(records);
                }
                Err(err) => {
                    warn!(%err, "cookie enumeration failed");
                    on_done(Vec::new());
                }
            });
    }

    fn install(&self, record: &CookieRecord, on_done: InstallCallback) {
        let Some(mut cookie) = cookie_from_record(record) else {
            on_done(false);
            return;
        };

        self.manager
            .add_cookie(&mut cookie, None::<&gio::Cancellable>, move |result| {
                if let Err(err) = &result {
                    warn!(%err, "cookie install failed");
                }
                on_done(result.is_ok());
            });
    }
}

/// Converts an engine cookie into a persistable record. Nameless or
/// domainless cookies cannot be restored and convert to `None`.
fn record_from_cookie(cookie: &mut soup::Cookie) -> Option<CookieRecord> {
    let name = cookie.name().to_string();
    let domain = cookie.domain().to_string();
    if name.is_empty() || domain.is_empty() {
        return None;
    }

    // libsoup marks domain cookies with a leading dot; its absence
    // means the cookie is host-only.
    let host_only = !domain.starts_with('.');

    Some(CookieRecord {
        name,
        value: cookie.value().to_string(),
        domain,
        path: cookie.path().to_string(),
        expires: cookie.expires().map(|expires| expires.to_unix()),
        secure: cookie.is_secure(),
        http_only: cookie.is_http_only(),
        host_only,
        same_site: same_site_from_policy(cookie.same_site_policy()),
    })
}

/// Builds an engine cookie from a persisted record.
fn cookie_from_record(record: &CookieRecord) -> Option<soup::Cookie> {
    if !record.is_valid() {
        return None;
    }

    let domain = if record.host_only {
        record.domain.trim_start_matches('.').to_string()
    } else if record.domain.starts_with('.') {
        record.domain.clone()
    } else {
        format!(".{}", record.domain)
    };

    // max_age -1 leaves the cookie a session cookie until an explicit
    // expiry is applied below.
    let mut cookie = soup::Cookie::new(&record.name, &record.value, &domain, &record.path, -1);
    cookie.set_secure(record.secure);
    cookie.set_http_only(record.http_only);
    if let Some(unix) = record.expires {
        if let Ok(expires) = gtk::glib::DateTime::from_unix_utc(unix) {
            cookie.set_expires(&expires);
        }
    }
    if let Some(same_site) = record.same_site {
        cookie.set_same_site_policy(policy_from_same_site(same_site));
    }
    Some(cookie)
}

fn same_site_from_policy(policy: soup::SameSitePolicy) -> Option<SameSite> {
    match policy {
        soup::SameSitePolicy::None => Some(SameSite::None),
        soup::SameSitePolicy::Lax => Some(SameSite::Lax),
        soup::SameSitePolicy::Strict => Some(SameSite::Strict),
        _ => None,
    }
}

fn policy_from_same_site(same_site: SameSite) -> soup::SameSitePolicy {
    match same_site {
        SameSite::None => soup::SameSitePolicy::None,
        SameSite::Lax => soup::SameSitePolicy::Lax,
        SameSite::Strict => soup::SameSitePolicy::Strict,
    }
}
