use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

const NEVER: u64 = u64::MAX;

/// A lock-free debounce window: remembers the instant of the last accepted event and rejects
/// anything that arrives closer to it than [DebounceWindow::window].
///
/// Instants are stored as microseconds since the window's own epoch, so the whole state is a single
/// atomic word that an edge handler can read and write without locking or allocating.
pub struct DebounceWindow {
    epoch: Instant,
    last_accepted: AtomicU64,
    window: Duration,
}

impl DebounceWindow {
    pub fn new(epoch: Instant, window: Duration) -> Self {
        Self {
            epoch,
            last_accepted: AtomicU64::new(NEVER),
            window,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Whether an event at `now` falls outside the window of the last accepted event.
    /// Always true before the first acceptance.
    pub fn is_clear(&self, now: Instant) -> bool {
        let last = self.last_accepted.load(Ordering::Acquire);
        if last == NEVER {
            return true;
        }
        let elapsed = self.micros(now).saturating_sub(last);
        elapsed >= self.window.as_micros() as u64
    }

    /// Records `now` as the instant of the last accepted event.
    pub fn accept(&self, now: Instant) {
        self.last_accepted.store(self.micros(now), Ordering::Release);
    }

    /// The instant of the last accepted event, if any.
    pub fn last_accepted(&self) -> Option<Instant> {
        match self.last_accepted.load(Ordering::Acquire) {
            NEVER => None,
            micros => Some(self.epoch + Duration::from_micros(micros)),
        }
    }

    fn micros(&self, now: Instant) -> u64 {
        // Clamped below NEVER so a very late instant can't be mistaken for "no event yet".
        (now.saturating_duration_since(self.epoch).as_micros() as u64).min(NEVER - 1)
    }
}

impl Debug for DebounceWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "DebounceWindow({:?}, last: {:?})", self.window, self.last_accepted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_event_is_always_clear() {
        let epoch = Instant::now();
        let window = DebounceWindow::new(epoch, Duration::from_millis(200));

        assert!(window.is_clear(epoch));
        assert_eq!(window.last_accepted(), None);
    }

    #[test]
    fn events_inside_the_window_are_rejected() {
        let epoch = Instant::now();
        let window = DebounceWindow::new(epoch, Duration::from_millis(200));

        window.accept(epoch + Duration::from_millis(10));
        assert!(!window.is_clear(epoch + Duration::from_millis(10)));
        assert!(!window.is_clear(epoch + Duration::from_millis(209)));
        assert!(window.is_clear(epoch + Duration::from_millis(210)));
        assert_eq!(window.last_accepted(), Some(epoch + Duration::from_millis(10)));
    }
}
