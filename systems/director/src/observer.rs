use std::{cell::RefCell, fmt, rc::Rc};

use wave_director_core::Signal;

/// Receives lifecycle signals published by the director.
///
/// Delivery is synchronous and happens on the thread driving the director.
pub trait DirectorObserver {
    /// Handles a single signal.
    fn on_signal(&mut self, signal: &Signal);
}

impl<F> DirectorObserver for F
where
    F: FnMut(&Signal),
{
    fn on_signal(&mut self, signal: &Signal) {
        self(signal);
    }
}

/// Handle returned by `subscribe`, used to remove the observer again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

#[derive(Default)]
pub(crate) struct Observers {
    next_id: u64,
    entries: Vec<(SubscriptionId, Box<dyn DirectorObserver>)>,
}

impl Observers {
    pub(crate) fn subscribe(&mut self, observer: Box<dyn DirectorObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.entries.push((id, observer));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(candidate, _)| *candidate != id);
        self.entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn notify(&mut self, signal: &Signal) {
        for (_, observer) in &mut self.entries {
            observer.on_signal(signal);
        }
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("subscribed", &self.entries.len())
            .finish()
    }
}

/// Observer that records every signal it receives.
///
/// Clones share the same underlying log, so one clone can be handed to the
/// director while another is kept for inspection.
#[derive(Clone, Debug, Default)]
pub struct SignalLog {
    signals: Rc<RefCell<Vec<Signal>>>,
}

impl SignalLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies the recorded signals in delivery order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Signal> {
        self.signals.borrow().clone()
    }

    /// Removes and returns the recorded signals.
    #[must_use]
    pub fn drain(&self) -> Vec<Signal> {
        std::mem::take(&mut *self.signals.borrow_mut())
    }

    /// Counts recorded signals matching `predicate`.
    #[must_use]
    pub fn count(&self, predicate: impl Fn(&Signal) -> bool) -> usize {
        self.signals
            .borrow()
            .iter()
            .filter(|signal| predicate(signal))
            .count()
    }
}

impl DirectorObserver for SignalLog {
    fn on_signal(&mut self, signal: &Signal) {
        self.signals.borrow_mut().push(signal.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsubscribed_observers_stop_receiving() {
        let mut observers = Observers::default();
        let first = SignalLog::new();
        let second = SignalLog::new();
        let first_id = observers.subscribe(Box::new(first.clone()));
        let _ = observers.subscribe(Box::new(second.clone()));

        observers.notify(&Signal::BeginWaveTiming);
        assert!(observers.unsubscribe(first_id));
        assert!(!observers.unsubscribe(first_id));
        observers.notify(&Signal::StopWaveTiming);

        assert_eq!(first.snapshot(), vec![Signal::BeginWaveTiming]);
        assert_eq!(
            second.snapshot(),
            vec![Signal::BeginWaveTiming, Signal::StopWaveTiming]
        );
        assert_eq!(observers.len(), 1);
    }

    #[test]
    fn closures_are_observers() {
        let mut observers = Observers::default();
        let seen = Rc::new(std::cell::Cell::new(0));
        let counter = Rc::clone(&seen);
        let _ = observers.subscribe(Box::new(move |_: &Signal| counter.set(counter.get() + 1)));
        observers.notify(&Signal::WaveMusicEnd);
        observers.notify(&Signal::AllWavesCleared);
        assert_eq!(seen.get(), 2);
    }
}
