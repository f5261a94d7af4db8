//! Lifecycle state of the bridge.

/// Bridge lifecycle state
///
/// ```text
/// Uninitialized --init--> Initialized --start--> Started
///       ^                   |     ^                 |
///       +------deinit-------+     +------stop-------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// No storage or peripheral bound
    #[default]
    Uninitialized,
    /// Storage and peripheral bound, reception stopped
    Initialized,
    /// Continuous reception running, TX chain armed
    Started,
}

impl State {
    /// True once storage and peripheral are bound (includes `Started`)
    #[inline(always)]
    pub const fn is_initialized(self) -> bool {
        matches!(self, State::Initialized | State::Started)
    }

    /// True while reception runs and the TX chain is armed
    #[inline(always)]
    pub const fn is_started(self) -> bool {
        matches!(self, State::Started)
    }
}

/// Lifecycle state together with the peripheral bound at init.
///
/// Kept in one critical-section cell so a transition and the binding it
/// implies are always observed together. The two flags mark a live
/// [`RxReader`](super::io::RxReader) / [`TxWriter`](super::io::TxWriter),
/// which keeps each ring down to one consumer and one producer.
pub(crate) struct Lifecycle<'a, P> {
    pub(crate) state: State,
    pub(crate) peripheral: Option<&'a P>,
    pub(crate) reader_live: bool,
    pub(crate) writer_live: bool,
}

impl<P> Lifecycle<'_, P> {
    pub(crate) const fn new() -> Self {
        Self {
            state: State::Uninitialized,
            peripheral: None,
            reader_live: false,
            writer_live: false,
        }
    }
}
