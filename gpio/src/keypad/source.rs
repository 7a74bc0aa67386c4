use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};
use log::trace;
use crate::debounce::DebounceWindow;
use crate::keypad::KeypadKey;

/// Period of the row-scan timer.
pub const SCAN_PERIOD: Duration = Duration::from_millis(5);
/// Minimum time between two accepted keys.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(200);

const EMPTY: u8 = 0;

/// A key accepted by the [KeySource], with the instant it was accepted.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct KeyEvent {
    pub key: KeypadKey,
    pub at: Instant,
}

/// What the column edge handler did with an edge.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EdgeOutcome {
    /// The key was latched and is now pending.
    Accepted(KeypadKey),
    /// A previously accepted key hasn't been consumed yet, the edge was dropped.
    Pending,
    /// The edge arrived within the debounce window of the last accepted key.
    Bounced,
    /// The column index doesn't belong to the matrix.
    UnknownColumn,
}

/// Single-slot, single-producer/single-consumer key latch shared between the row-scan timer, the
/// column edge handler and the polling loop.
///
/// - The row-scan timer only writes the row index ([KeySource::advance_row]).
/// - The edge handler reads the row index and writes the debounce timestamp and then the slot, and
///   only while the slot is empty ([KeySource::on_column_edge]).
/// - The polling loop reads and clears the slot ([KeySource::take]).
///
/// The slot byte doubles as the "key ready" flag, so the key and its flag can never be observed
/// half-written, and a pending key is never overwritten.
pub struct KeySource {
    row: AtomicU8,
    pending: AtomicU8,
    debounce: DebounceWindow,
}

impl KeySource {
    pub fn new(debounce_window: Duration) -> Self {
        Self::with_epoch(Instant::now(), debounce_window)
    }

    /// Creates a source whose timestamps are measured from `epoch`. Instants passed to the source
    /// must not precede it.
    pub fn with_epoch(epoch: Instant, debounce_window: Duration) -> Self {
        Self {
            row: AtomicU8::new(0),
            pending: AtomicU8::new(EMPTY),
            debounce: DebounceWindow::new(epoch, debounce_window),
        }
    }

    pub fn debounce_window(&self) -> Duration {
        self.debounce.window()
    }

    /// The row currently driven by the scanner.
    pub fn current_row(&self) -> u8 {
        self.row.load(Ordering::Acquire)
    }

    /// Advances the row index cyclically (0, 1, 2, 3, 0, ...) and returns the new row.
    ///
    /// Must only be called from the row-scan timer.
    pub fn advance_row(&self) -> u8 {
        let next = (self.row.load(Ordering::Relaxed) + 1) % 4;
        self.row.store(next, Ordering::Release);
        next
    }

    /// Column edge handler. Never blocks and never allocates.
    ///
    /// Must only be called from a single edge context.
    pub fn on_column_edge(&self, column: u8, now: Instant) -> EdgeOutcome {
        if self.pending.load(Ordering::Acquire) != EMPTY {
            trace!("Edge on column {} dropped, a key is still pending.", column);
            return EdgeOutcome::Pending;
        }

        if !self.debounce.is_clear(now) {
            trace!("Edge on column {} bounced.", column);
            return EdgeOutcome::Bounced;
        }

        let Some(key) = KeypadKey::from_position((self.current_row(), column)) else {
            return EdgeOutcome::UnknownColumn;
        };

        // Timestamp first, the consumer reads it only once the slot is full.
        self.debounce.accept(now);
        self.pending.store(key.code(), Ordering::Release);
        EdgeOutcome::Accepted(key)
    }

    /// Whether an accepted key is waiting to be consumed.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire) != EMPTY
    }

    /// Consumes the pending key, if any.
    pub fn take(&self) -> Option<KeyEvent> {
        let key = KeypadKey::from_code(self.pending.load(Ordering::Acquire))?;
        let at = self.debounce.last_accepted()?;
        self.pending.store(EMPTY, Ordering::Release);
        Some(KeyEvent { key, at })
    }

    /// A lazy view over accepted keys. It yields keys as long as one is pending and ends otherwise;
    /// calling it again later picks up whatever arrived since.
    pub fn keys(&self) -> Keys<'_> {
        Keys { source: self }
    }
}

impl Default for KeySource {
    fn default() -> Self {
        Self::new(DEBOUNCE_WINDOW)
    }
}

impl Debug for KeySource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "KeySource(row: {}, pending: {:?}, {:?})",
            self.current_row(),
            KeypadKey::from_code(self.pending.load(Ordering::Relaxed)),
            self.debounce,
        )
    }
}

/// Iterator returned by [KeySource::keys].
#[derive(Debug)]
pub struct Keys<'a> {
    source: &'a KeySource,
}

impl Iterator for Keys<'_> {
    type Item = KeyEvent;

    fn next(&mut self) -> Option<KeyEvent> {
        self.source.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn press(source: &KeySource, row: u8, column: u8, now: Instant) -> EdgeOutcome {
        while source.current_row() != row {
            source.advance_row();
        }
        source.on_column_edge(column, now)
    }

    #[test]
    fn row_index_cycles_through_all_rows() {
        let source = KeySource::default();
        let rows: Vec<u8> = (0..6).map(|_| source.advance_row()).collect();
        assert_eq!(rows, vec![1, 2, 3, 0, 1, 2]);
    }

    #[test]
    fn accepts_and_resolves_the_key_under_the_active_row() {
        let epoch = Instant::now();
        let source = KeySource::with_epoch(epoch, DEBOUNCE_WINDOW);

        assert_eq!(press(&source, 1, 2, epoch), EdgeOutcome::Accepted(KeypadKey::Key6));
        assert!(source.is_pending());

        let event = source.take().expect("a pending key");
        assert_eq!(event, KeyEvent { key: KeypadKey::Key6, at: epoch });
        assert!(!source.is_pending());
        assert_eq!(source.take(), None);
    }

    #[test]
    fn two_edges_within_the_window_yield_one_key() {
        let epoch = Instant::now();
        let source = KeySource::with_epoch(epoch, DEBOUNCE_WINDOW);

        assert_eq!(press(&source, 0, 0, epoch + ms(1000)), EdgeOutcome::Accepted(KeypadKey::Key1));
        source.take();
        assert_eq!(press(&source, 0, 0, epoch + ms(1150)), EdgeOutcome::Bounced);
        assert_eq!(source.take(), None);

        assert_eq!(press(&source, 0, 0, epoch + ms(1200)), EdgeOutcome::Accepted(KeypadKey::Key1));
    }

    #[test]
    fn pending_key_is_never_overwritten() {
        let epoch = Instant::now();
        let source = KeySource::with_epoch(epoch, DEBOUNCE_WINDOW);

        assert_eq!(press(&source, 3, 2, epoch), EdgeOutcome::Accepted(KeypadKey::KeyHash));
        assert_eq!(press(&source, 0, 3, epoch + ms(500)), EdgeOutcome::Pending);

        let event = source.take().expect("the first key");
        assert_eq!(event.key, KeypadKey::KeyHash);
        assert_eq!(event.at, epoch);

        // The dropped edge didn't move the debounce window either.
        assert_eq!(press(&source, 0, 3, epoch + ms(600)), EdgeOutcome::Accepted(KeypadKey::KeyA));
    }

    #[test]
    fn unknown_columns_are_ignored() {
        let source = KeySource::default();
        assert_eq!(source.on_column_edge(4, Instant::now()), EdgeOutcome::UnknownColumn);
        assert!(!source.is_pending());
    }

    #[test]
    fn keys_iterator_is_restartable() {
        let epoch = Instant::now();
        let source = KeySource::with_epoch(epoch, DEBOUNCE_WINDOW);

        assert_eq!(source.keys().count(), 0);

        press(&source, 2, 0, epoch);
        let keys: Vec<KeypadKey> = source.keys().map(|event| event.key).collect();
        assert_eq!(keys, vec![KeypadKey::Key7]);

        press(&source, 2, 1, epoch + ms(250));
        let keys: Vec<KeypadKey> = source.keys().map(|event| event.key).collect();
        assert_eq!(keys, vec![KeypadKey::Key8]);
    }
}
