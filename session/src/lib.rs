mod record;
mod store;
mod writer;

pub use record::{CookieRecord, SameSite};
pub use store::{SessionError, SessionStore};
pub use writer::{SessionWriter, WriteOutcome};
