use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::cancel::CancelToken;

/// Single-flight gate for manipulator operations.
///
/// At most one [`OperationGuard`] exists at a time. A caller that finds the
/// gate busy asks the holder to stop through the shared [`CancelToken`] and
/// sleeps on a condition variable until the guard is dropped.
#[derive(Debug, Default)]
pub struct OperationGate {
    in_progress: Mutex<bool>,
    released: Condvar,
    cancel: CancelToken,
}

impl OperationGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.in_progress
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Cancel the current holder (if any), wait for it to finish and take the
    /// gate.
    ///
    /// When several callers queue up, each newly admitted holder is itself
    /// asked to stop by the next waiter, so one of the queued requests runs
    /// to completion and the others are cancelled. Admission follows
    /// condition-variable wake order, not arrival order.
    pub fn acquire(&self) -> OperationGuard<'_> {
        let mut busy = self.lock();
        while *busy {
            self.cancel.cancel();
            log::debug!("operation in progress; cancelling and waiting");
            busy = self
                .released
                .wait(busy)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *busy = true;
        self.cancel.reset();
        drop(busy);
        // Wake remaining waiters so they re-signal the new holder.
        self.released.notify_all();
        OperationGuard { gate: self }
    }

    /// Ask the running operation to stop. Returns whether one was running.
    pub fn request_cancel(&self) -> bool {
        let busy = self.lock();
        if *busy {
            self.cancel.cancel();
        }
        *busy
    }

    pub fn is_busy(&self) -> bool {
        *self.lock()
    }

    /// Token polled by the operation holding the gate.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }
}

/// Proof of holding the [`OperationGate`]; releases it on drop.
#[derive(Debug)]
pub struct OperationGuard<'a> {
    gate: &'a OperationGate,
}

impl OperationGuard<'_> {
    pub fn cancel_token(&self) -> &CancelToken {
        &self.gate.cancel
    }
}

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        *self.gate.lock() = false;
        self.gate.released.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn guard_releases_on_drop() {
        let gate = OperationGate::new();
        {
            let _guard = gate.acquire();
            assert!(gate.is_busy());
        }
        assert!(!gate.is_busy());
        assert!(!gate.request_cancel());
    }

    #[test]
    fn guard_releases_on_panic() {
        let gate = Arc::new(OperationGate::new());
        let worker = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                let _guard = gate.acquire();
                panic!("operation failed");
            })
        };
        assert!(worker.join().is_err());
        assert!(!gate.is_busy());
    }

    #[test]
    fn second_acquire_cancels_and_waits_for_holder() {
        let gate = Arc::new(OperationGate::new());
        let (held_tx, held_rx) = mpsc::channel();
        let (order_tx, order_rx) = mpsc::channel();

        let first = {
            let gate = Arc::clone(&gate);
            let order_tx = order_tx.clone();
            thread::spawn(move || {
                let guard = gate.acquire();
                held_tx.send(()).expect("signal");
                while !guard.cancel_token().is_cancelled() {
                    thread::sleep(Duration::from_millis(1));
                }
                order_tx.send("first").expect("order");
            })
        };

        held_rx.recv().expect("first holds the gate");
        let guard = gate.acquire();
        order_tx.send("second").expect("order");
        assert!(!guard.cancel_token().is_cancelled());
        drop(guard);
        first.join().expect("first");

        let order: Vec<_> = order_rx.try_iter().collect();
        assert_eq!(order, ["first", "second"]);
    }

    #[test]
    fn queued_requests_leave_one_uncancelled_holder() {
        let gate = Arc::new(OperationGate::new());
        let (held_tx, held_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel();

        let hold = |name: &'static str, held_tx: Option<mpsc::Sender<()>>| {
            let gate = Arc::clone(&gate);
            let done_tx = done_tx.clone();
            thread::spawn(move || {
                let guard = gate.acquire();
                if let Some(tx) = held_tx {
                    tx.send(()).expect("signal");
                }
                let deadline = Instant::now() + Duration::from_millis(300);
                while !guard.cancel_token().is_cancelled() && Instant::now() < deadline {
                    thread::sleep(Duration::from_millis(1));
                }
                done_tx
                    .send((name, guard.cancel_token().is_cancelled()))
                    .expect("done");
            })
        };

        let first = hold("first", Some(held_tx));
        held_rx.recv().expect("first holds the gate");
        let queued = [hold("b", None), hold("c", None)];
        first.join().expect("first");
        for worker in queued {
            worker.join().expect("queued");
        }

        let done: Vec<_> = done_rx.try_iter().collect();
        assert_eq!(done.len(), 3);
        assert_eq!(done[0], ("first", true));
        let (last, rest) = done.split_last().expect("finished holders");
        assert!(!last.1, "last holder was cancelled: {done:?}");
        assert!(rest.iter().all(|&(_, cancelled)| cancelled), "{done:?}");
        assert!(!gate.is_busy());
    }

    #[test]
    fn request_cancel_reports_idle_gate() {
        let gate = OperationGate::new();
        assert!(!gate.request_cancel());
        assert!(!gate.cancel_token().is_cancelled());

        let _guard = gate.acquire();
        assert!(gate.request_cancel());
        assert!(gate.cancel_token().is_cancelled());
    }
}
