use tracing::debug;

/// One navigation attempt as seen by the engine. Constructed per
/// decision point and discarded immediately after classification.
#[derive(Debug, Clone, Copy)]
pub struct NavigationRequest<'a> {
    pub uri: &'a str,
    /// Host component of the target, empty for non-network schemes.
    pub host: &'a str,
    /// Whether the navigation came from a direct user link activation.
    pub link_activated: bool,
}

/// Outcome for a main-frame navigation.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum NavigationDecision {
    /// Let the engine proceed inside the shell.
    Allow,
    /// Cancel in the engine; the shell hands the URL to the platform's
    /// default browser.
    OpenExternally,
}

/// Outcome for a new-window (`target="_blank"`-style) request. The
/// shell maintains exactly one browsing surface, so no decision ever
/// creates a second view.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum NewWindowDecision {
    /// Redirect the navigation into the existing single view.
    LoadInShell,
    /// Refuse and open in the platform's default browser.
    OpenExternally,
}

/// Classifies navigations by host against a fixed allow-list of
/// first-party domain suffixes.
#[derive(Debug, Clone)]
pub struct NavigationPolicy {
    app_domain: String,
    allowed: Vec<String>,
}

impl NavigationPolicy {
    /// `app_domain` is the hosted application's own domain; `allowed`
    /// is the full first-party suffix allow-list (it should include
    /// `app_domain`).
    pub fn new(app_domain: &str, allowed: &[&str]) -> Self {
        Self {
            app_domain: app_domain.to_ascii_lowercase(),
            allowed: allowed.iter().map(|s| s.to_ascii_lowercase()).collect(),
        }
    }

    pub fn decide(&self, request: &NavigationRequest<'_>) -> NavigationDecision {
        // Non-network schemes (about:, data:, blob:) have no host and
        // stay inside the shell.
        if request.host.is_empty() {
            return NavigationDecision::Allow;
        }

        if self.is_first_party(request.host) {
            return NavigationDecision::Allow;
        }

        if request.link_activated || !request.host.is_empty() {
            debug!(uri = request.uri, "navigation handed off externally");
            return NavigationDecision::OpenExternally;
        }

        NavigationDecision::Allow
    }

    pub fn decide_new_window(&self, request: &NavigationRequest<'_>) -> NewWindowDecision {
        if host_matches(request.host, &self.app_domain) {
            NewWindowDecision::LoadInShell
        } else {
            debug!(uri = request.uri, "new-window request handed off externally");
            NewWindowDecision::OpenExternally
        }
    }

    fn is_first_party(&self, host: &str) -> bool {
        self.allowed.iter().any(|suffix| host_matches(host, suffix))
    }
}

/// Suffix match anchored at a label boundary: the host equals the
/// allowed domain or ends with `.` + the allowed domain. A raw suffix
/// check would also match look-alikes such as `evilmessenger.com`
/// against `messenger.com`.
fn host_matches(host: &str, suffix: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host == suffix
        || (host.len() > suffix.len()
            && host.ends_with(suffix)
            && host.as_bytes()[host.len() - suffix.len() - 1] == b'.')
}
