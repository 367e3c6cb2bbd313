use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::debug;

use session::CookieRecord;

use crate::jar::CookieJar;

/// Fans out the installation of every restored cookie and runs `then`
/// exactly once after all installations acknowledge. The shell must
/// not begin its first navigation before this join completes, or the
/// hosted page starts unauthenticated for the whole session.
///
/// Failed installs still release the barrier; a single bad cookie must
/// not wedge startup.
pub fn restore_then(jar: &dyn CookieJar, records: &[CookieRecord], then: impl FnOnce() + 'static) {
    if records.is_empty() {
        then();
        return;
    }

    debug!(count = records.len(), "restoring session cookies");
    let remaining = Rc::new(Cell::new(records.len()));
    let then: Rc<RefCell<Option<Box<dyn FnOnce()>>>> = Rc::new(RefCell::new(Some(Box::new(then))));

    for record in records {
        let remaining = Rc::clone(&remaining);
        let then = Rc::clone(&then);
        jar.install(
            record,
            Box::new(move |_installed| {
                remaining.set(remaining.get() - 1);
                if remaining.get() == 0 {
                    if let Some(then) = then.borrow_mut().take() {
                        then();
                    }
                }
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jar::{FetchCallback, InstallCallback};

    /// Jar that parks install callbacks until the test acknowledges
    /// them, mimicking the engine's asynchronous completion.
    #[derive(Default)]
    struct FakeJar {
        pending: RefCell<Vec<(String, InstallCallback)>>,
    }

    impl FakeJar {
        fn ack_next(&self, installed: bool) {
            let (_, callback) = self.pending.borrow_mut().remove(0);
            callback(installed);
        }

        fn pending_names(&self) -> Vec<String> {
            self.pending
                .borrow()
                .iter()
                .map(|(name, _)| name.clone())
                .collect()
        }
    }

    impl CookieJar for FakeJar {
        fn fetch_all(&self, on_done: FetchCallback) {
            on_done(Vec::new());
        }

        fn install(&self, record: &CookieRecord, on_done: InstallCallback) {
            self.pending
                .borrow_mut()
                .push((record.name.clone(), on_done));
        }
    }

    fn record(name: &str) -> CookieRecord {
        CookieRecord {
            name: name.into(),
            value: "value".into(),
            domain: ".messenger.com".into(),
            path: "/".into(),
            expires: None,
            secure: true,
            http_only: true,
            host_only: false,
            same_site: None,
        }
    }

    #[test]
    fn continuation_waits_for_every_install() {
        let jar = FakeJar::default();
        let records = vec![record("a"), record("b"), record("c")];
        let done = Rc::new(Cell::new(false));

        let done_flag = Rc::clone(&done);
        restore_then(&jar, &records, move || done_flag.set(true));

        assert_eq!(jar.pending_names(), vec!["a", "b", "c"]);
        jar.ack_next(true);
        assert!(!done.get());
        jar.ack_next(true);
        assert!(!done.get());
        jar.ack_next(true);
        assert!(done.get());
    }

    #[test]
    fn empty_restore_continues_immediately() {
        let jar = FakeJar::default();
        let done = Rc::new(Cell::new(false));

        let done_flag = Rc::clone(&done);
        restore_then(&jar, &[], move || done_flag.set(true));

        assert!(done.get());
    }

    #[test]
    fn failed_installs_still_release_the_barrier() {
        let jar = FakeJar::default();
        let records = vec![record("a"), record("b")];
        let done = Rc::new(Cell::new(false));

        let done_flag = Rc::clone(&done);
        restore_then(&jar, &records, move || done_flag.set(true));

        jar.ack_next(false);
        jar.ack_next(true);
        assert!(done.get());
    }

    #[test]
    fn continuation_runs_exactly_once() {
        let jar = FakeJar::default();
        let records = vec![record("a"), record("b")];
        let runs = Rc::new(Cell::new(0u32));

        let counter = Rc::clone(&runs);
        restore_then(&jar, &records, move || counter.set(counter.get() + 1));

        jar.ack_next(true);
        jar.ack_next(true);
        assert_eq!(runs.get(), 1);
    }
}
