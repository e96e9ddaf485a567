//! Last-request-wins refresh coordination.
//!
//! Every refresh takes a ticket. Results travel back tagged with their ticket
//! and are accepted only if no newer refresh has been started since. Stale
//! results are dropped on arrival; the work that produced them is not
//! cancelled.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::thread;

use tracing::debug;

/// Identifies one refresh request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    generation: u64,
}

impl RefreshTicket {
    pub fn generation(self) -> u64 {
        self.generation
    }
}

/// A finished job and the ticket it was started under.
#[derive(Debug)]
pub struct Completed<T> {
    pub ticket: RefreshTicket,
    pub value: T,
}

#[derive(Debug, Clone, Default)]
pub struct RefreshCoordinator {
    latest: Arc<AtomicU64>,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request; every earlier ticket becomes stale.
    pub fn begin(&self) -> RefreshTicket {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        RefreshTicket { generation }
    }

    pub fn is_current(&self, ticket: RefreshTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.generation
    }

    /// Unwrap a completed job if it is still the latest request.
    pub fn accept<T>(&self, completed: Completed<T>) -> Option<T> {
        if self.is_current(completed.ticket) {
            Some(completed.value)
        } else {
            debug!(
                stale = completed.ticket.generation,
                latest = self.latest.load(Ordering::SeqCst),
                "dropping stale refresh result"
            );
            None
        }
    }

    /// Begin a request and run `job` on a worker thread.
    ///
    /// The result is sent on `tx` tagged with the returned ticket. A closed
    /// channel (the UI went away) is ignored.
    pub fn spawn<T, F>(&self, tx: Sender<Completed<T>>, job: F) -> RefreshTicket
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let ticket = self.begin();
        thread::spawn(move || {
            let value = job();
            let _ = tx.send(Completed { ticket, value });
        });
        ticket
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn only_the_latest_ticket_is_current() {
        let coord = RefreshCoordinator::new();
        let first = coord.begin();
        assert!(coord.is_current(first));
        let second = coord.begin();
        assert!(!coord.is_current(first));
        assert!(coord.is_current(second));
    }

    #[test]
    fn late_result_from_an_older_request_is_dropped() {
        let coord = RefreshCoordinator::new();
        let (tx, rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        // The first request finishes only after the second one has.
        let slow = coord.spawn(tx.clone(), move || {
            let _ = release_rx.recv();
            "old"
        });
        let fast = coord.spawn(tx, || "new");

        let first_in = rx.recv().unwrap();
        assert_eq!(first_in.ticket, fast);
        assert_eq!(coord.accept(first_in), Some("new"));

        release_tx.send(()).unwrap();
        let second_in = rx.recv().unwrap();
        assert_eq!(second_in.ticket, slow);
        assert_eq!(coord.accept(second_in), None);
    }

    #[test]
    fn clones_share_the_generation_counter() {
        let coord = RefreshCoordinator::new();
        let other = coord.clone();
        let t = coord.begin();
        other.begin();
        assert!(!coord.is_current(t));
    }
}
