use serde::{Deserialize, Serialize};

/// Same-site policy carried by a persisted cookie.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    None,
    Lax,
    Strict,
}

/// One persisted session cookie.
///
/// The on-disk form is field-tagged JSON so fields can be added later
/// without breaking old session files; unknown fields are ignored on
/// read and missing optional fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CookieRecord {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default = "default_path")]
    pub path: String,
    /// Expiry as unix seconds. Absent for session cookies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<i64>,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub host_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<SameSite>,
}

fn default_path() -> String {
    "/".to_string()
}

impl CookieRecord {
    /// A record without a name or a domain cannot be installed back
    /// into the cookie store and is dropped on load.
    pub fn is_valid(&self) -> bool {
        !self.name.is_empty() && !self.domain.is_empty()
    }

    /// Identity tuple for a cookie. Later entries with the same
    /// identity overwrite earlier ones through the store's own
    /// replacement semantics; persistence does not de-duplicate.
    pub fn identity(&self) -> (&str, &str, &str) {
        (&self.name, &self.domain, &self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nameless_or_domainless_records_are_invalid() {
        let mut record = CookieRecord {
            name: "sid".into(),
            value: "abc".into(),
            domain: "messenger.com".into(),
            path: "/".into(),
            expires: None,
            secure: true,
            http_only: true,
            host_only: false,
            same_site: None,
        };
        assert!(record.is_valid());

        record.name.clear();
        assert!(!record.is_valid());

        record.name = "sid".into();
        record.domain.clear();
        assert!(!record.is_valid());
    }

    #[test]
    fn unknown_fields_and_missing_optionals_are_tolerated() {
        let raw = r#"{
            "name": "sid",
            "value": "abc",
            "domain": ".messenger.com",
            "flavor": "unknown-future-field"
        }"#;
        let record: CookieRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.path, "/");
        assert_eq!(record.expires, None);
        assert!(!record.secure);
        assert_eq!(record.same_site, None);
    }

    #[test]
    fn same_site_round_trips_lowercase() {
        let json = serde_json::to_string(&SameSite::Strict).unwrap();
        assert_eq!(json, "\"strict\"");
        let back: SameSite = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SameSite::Strict);
    }
}
