mod jar;
mod restore;

pub use jar::{CookieJar, FetchCallback, InstallCallback, WebKitCookieJar};
pub use restore::restore_then;
