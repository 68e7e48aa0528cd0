//! Handing table data from a producer thread to the layout thread.
//!
//! The layout of a table may start while its data is still being computed.
//! [ReadyGate] is where the layout thread blocks until the producer publishes
//! the data, or until somebody cancels. Waiting re-checks the gate at a fixed
//! interval, so a cancellation that only flips a [CancelToken] is noticed
//! even though nobody notifies the condition variable.

use crate::config::LayoutConfig;
use crate::grid::GridSource;
use log::debug;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A cooperative cancellation flag shared between threads. Layout checks it
/// between rows and stops producing regions once it is set.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
enum GateState<T> {
    Pending,
    Ready(T),
    Cancelled,
}

/// A value that becomes ready at most once, or is cancelled
#[derive(Debug)]
pub struct ReadyGate<T> {
    state: Mutex<GateState<T>>,
    changed: Condvar,
    poll: Duration,
    cancel: CancelToken,
}

impl<T: Clone> ReadyGate<T> {
    /// A pending gate whose waiters re-check it every `poll`
    pub fn new(poll: Duration) -> ReadyGate<T> {
        ReadyGate::with_token(poll, CancelToken::new())
    }

    /// A pending gate that is also cancelled through `cancel`
    pub fn with_token(poll: Duration, cancel: CancelToken) -> ReadyGate<T> {
        ReadyGate {
            state: Mutex::new(GateState::Pending),
            changed: Condvar::new(),
            poll,
            cancel,
        }
    }

    /// The token that cancels this gate, for handing to whatever consumes
    /// the value
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Make `value` available to every waiter. Returns `false` if the gate was
    /// cancelled or already published, in which case `value` is dropped.
    pub fn publish(&self, value: T) -> bool {
        let mut state = self.state.lock();
        if !matches!(*state, GateState::Pending) || self.cancel.is_cancelled() {
            return false;
        }
        *state = GateState::Ready(value);
        self.changed.notify_all();
        true
    }

    /// Cancel the gate: current and future waiters get `None`. A value that is
    /// already published stays available.
    pub fn cancel(&self) {
        self.cancel.cancel();
        let mut state = self.state.lock();
        if matches!(*state, GateState::Pending) {
            *state = GateState::Cancelled;
        }
        self.changed.notify_all();
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.state.lock(), GateState::Ready(_))
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// The value, if it is already published
    pub fn try_get(&self) -> Option<T> {
        match &*self.state.lock() {
            GateState::Ready(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// Block until the value is published or the gate is cancelled
    pub fn wait(&self) -> Option<T> {
        let mut state = self.state.lock();
        loop {
            if let GateState::Ready(value) = &*state {
                return Some(value.clone());
            }
            if matches!(*state, GateState::Cancelled) {
                return None;
            }
            if self.cancel.is_cancelled() {
                debug!("gate cancelled while waiting");
                *state = GateState::Cancelled;
                return None;
            }
            self.changed.wait_for(&mut state, self.poll);
        }
    }
}

/// A grid that can be read from the layout thread while another thread
/// produced it
pub type SharedGrid = Arc<dyn GridSource + Send + Sync>;

/// The gate a table waits on when its data is produced elsewhere
pub type DeferredGrid = ReadyGate<SharedGrid>;

impl DeferredGrid {
    /// A pending gate polled at the interval `config` asks for
    pub fn for_config(config: &LayoutConfig) -> DeferredGrid {
        ReadyGate::new(config.gate_poll)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn waiters_wake_up_on_publish() {
        let gate = Arc::new(ReadyGate::new(Duration::from_millis(5)));
        let producer = {
            let gate = gate.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                gate.publish(42)
            })
        };
        assert_eq!(gate.wait(), Some(42));
        assert!(producer.join().expect("producer finished"));
        assert!(gate.is_ready());
        assert!(!gate.publish(7));
        assert_eq!(gate.try_get(), Some(42));
    }

    #[test]
    fn waiters_observe_cancellation() {
        let gate: Arc<ReadyGate<u32>> = Arc::new(ReadyGate::new(Duration::from_millis(5)));
        let canceller = {
            let gate = gate.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                gate.cancel();
            })
        };
        assert_eq!(gate.wait(), None);
        canceller.join().expect("canceller finished");
        assert!(!gate.publish(1));
        assert_eq!(gate.try_get(), None);
    }

    #[test]
    fn a_bare_token_is_noticed_by_polling() {
        let token = CancelToken::new();
        let gate: Arc<ReadyGate<u32>> =
            Arc::new(ReadyGate::with_token(Duration::from_millis(5), token.clone()));
        let waiter = {
            let gate = gate.clone();
            thread::spawn(move || gate.wait())
        };
        thread::sleep(Duration::from_millis(20));
        token.cancel();
        assert_eq!(waiter.join().expect("waiter finished"), None);
        assert!(gate.is_cancelled());
    }
}
