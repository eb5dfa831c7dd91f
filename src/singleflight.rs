use std::sync::Mutex;

use tokio::sync::oneshot;

/// Single-flight coordinator: at most one concurrent execution of an
/// operation, with every other caller riding the leader's result.
///
/// `join()` is a synchronous check-then-act: the caller that flips the
/// in-flight flag becomes the leader and must eventually call `settle()`;
/// everyone else receives a channel that resolves when the leader settles.
/// Waiters are resolved in enqueue order.
///
/// Deliberately independent of HTTP — the request layer uses it for token
/// refresh, and it is unit-testable on its own.
pub struct SingleFlight<T> {
    inner: Mutex<Inner<T>>,
}

struct Inner<T> {
    in_flight: bool,
    waiters: Vec<oneshot::Sender<T>>,
}

/// Outcome of joining a flight.
pub enum Flight<T> {
    /// This caller must perform the operation and call
    /// [`settle()`](SingleFlight::settle) with its result.
    Leader,
    /// Another caller is already performing the operation; await the
    /// receiver for its result. The sender is never dropped unsettled as
    /// long as the leader upholds its contract.
    Follower(oneshot::Receiver<T>),
}

impl<T: Clone> SingleFlight<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                in_flight: false,
                waiters: Vec::new(),
            }),
        }
    }

    /// Join the current flight, or start one.
    ///
    /// The flag check and waiter enqueue happen under one lock acquisition,
    /// before any suspension point, so two callers can never both lead.
    #[must_use]
    pub fn join(&self) -> Flight<T> {
        let mut inner = self.inner.lock().expect("singleflight lock poisoned");
        if inner.in_flight {
            let (tx, rx) = oneshot::channel();
            inner.waiters.push(tx);
            Flight::Follower(rx)
        } else {
            inner.in_flight = true;
            Flight::Leader
        }
    }

    /// Settle the in-flight operation: clear the flag and resolve every
    /// waiter, in enqueue order, with a clone of `value`.
    ///
    /// Must be called exactly once per `Flight::Leader`, on success and
    /// failure alike.
    pub fn settle(&self, value: T) {
        let waiters = {
            let mut inner = self.inner.lock().expect("singleflight lock poisoned");
            inner.in_flight = false;
            std::mem::take(&mut inner.waiters)
        };
        for waiter in waiters {
            // A follower that gave up is free to drop its receiver.
            let _ = waiter.send(value.clone());
        }
    }

    /// Whether a flight is currently outstanding.
    #[must_use]
    pub fn in_flight(&self) -> bool {
        self.inner.lock().expect("singleflight lock poisoned").in_flight
    }
}

impl<T: Clone> Default for SingleFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_joiner_leads() {
        let sf = SingleFlight::<u32>::new();
        assert!(matches!(sf.join(), Flight::Leader));
        assert!(sf.in_flight());
    }

    #[tokio::test]
    async fn followers_receive_the_leaders_result() {
        let sf = SingleFlight::<u32>::new();
        let Flight::Leader = sf.join() else {
            panic!("expected leader");
        };

        let mut receivers = Vec::new();
        for _ in 0..5 {
            match sf.join() {
                Flight::Leader => panic!("second leader while in flight"),
                Flight::Follower(rx) => receivers.push(rx),
            }
        }

        sf.settle(7);
        for rx in receivers {
            assert_eq!(rx.await.unwrap(), 7);
        }
    }

    #[tokio::test]
    async fn settle_resets_for_the_next_flight() {
        let sf = SingleFlight::<&'static str>::new();
        let Flight::Leader = sf.join() else {
            panic!("expected leader");
        };
        sf.settle("done");
        assert!(!sf.in_flight());

        // A fresh joiner leads again rather than waiting on a stale flight.
        assert!(matches!(sf.join(), Flight::Leader));
    }

    #[tokio::test]
    async fn dropped_follower_does_not_break_settle() {
        let sf = SingleFlight::<u32>::new();
        let Flight::Leader = sf.join() else {
            panic!("expected leader");
        };
        let Flight::Follower(rx) = sf.join() else {
            panic!("expected follower");
        };
        drop(rx);

        let Flight::Follower(live) = sf.join() else {
            panic!("expected follower");
        };
        sf.settle(1);
        assert_eq!(live.await.unwrap(), 1);
    }
}
