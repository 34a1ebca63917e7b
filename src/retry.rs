//! Status partitioning and backoff for the retry loop.
//!
//! Every response status falls into exactly one [`StatusClass`], evaluated
//! as an ordered list of guards. Retryable statuses are re-sent after a
//! quadratic [`Backoff`] delay; every other class ends the call.

use std::time::Duration;

/// The outcome class of a single response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// `[200, 299]`: the body is decoded as an envelope.
    Success,
    /// `0`, `500` or anything above `501`: the request is re-sent.
    Retryable,
    /// The rest of `[400, 599]`, `501` included: the body is decoded as an error.
    ClientOrServerError,
    /// Outside every range above (1xx, 3xx, ...): the call fails without a message.
    Unknown,
}

impl StatusClass {
    /// Classifies a response status.
    ///
    /// Status `0` stands for "no response". `501` is terminal while `500` and
    /// everything from `502` up is retried; this boundary is kept as-is for
    /// compatibility with existing callers.
    ///
    /// # Examples
    ///
    /// ```
    /// use envelope_client::retry::StatusClass;
    ///
    /// assert_eq!(StatusClass::of(204), StatusClass::Success);
    /// assert_eq!(StatusClass::of(500), StatusClass::Retryable);
    /// assert_eq!(StatusClass::of(501), StatusClass::ClientOrServerError);
    /// assert_eq!(StatusClass::of(502), StatusClass::Retryable);
    /// assert_eq!(StatusClass::of(404), StatusClass::ClientOrServerError);
    /// assert_eq!(StatusClass::of(302), StatusClass::Unknown);
    /// ```
    pub fn of(status: u16) -> Self {
        match status {
            0 | 500 => StatusClass::Retryable,
            s if s > 501 => StatusClass::Retryable,
            200..=299 => StatusClass::Success,
            400..=599 => StatusClass::ClientOrServerError,
            _ => StatusClass::Unknown,
        }
    }

    /// Returns `true` if a response with this class is re-sent.
    pub fn is_retryable(self) -> bool {
        self == StatusClass::Retryable
    }
}

/// Quadratic backoff between retries.
///
/// Before retry number `n` (1-indexed) the loop waits `(n - 1)² × unit`, so
/// the first retry is immediate. The unit defaults to 50 ms. There is no
/// attempt cap: the loop ends only on a non-retryable status or cancellation.
///
/// # Examples
///
/// ```
/// use envelope_client::retry::Backoff;
/// use std::time::Duration;
///
/// let backoff = Backoff::default();
/// assert_eq!(backoff.delay(0), Duration::ZERO);
/// assert_eq!(backoff.delay(1), Duration::from_millis(50));
/// assert_eq!(backoff.delay(2), Duration::from_millis(200));
/// assert_eq!(backoff.delay(3), Duration::from_millis(450));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    unit: Duration,
}

impl Backoff {
    /// The default backoff unit.
    pub const DEFAULT_UNIT: Duration = Duration::from_millis(50);

    /// Creates a backoff with the given unit.
    pub fn new(unit: Duration) -> Self {
        Self { unit }
    }

    /// The backoff unit.
    pub fn unit(&self) -> Duration {
        self.unit
    }

    /// The wait for a retry given the number of retries already made.
    pub fn delay(&self, attempts: u32) -> Duration {
        self.unit.saturating_mul(attempts.saturating_mul(attempts))
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Self::DEFAULT_UNIT)
    }
}

/// Per-call retry bookkeeping.
///
/// Counts the retries made so far within one call. The count saturates
/// instead of overflowing, since the retry loop has no upper bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryState {
    attempts: u32,
}

impl RetryState {
    /// A fresh state with no retries made.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of retries made so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The 1-indexed number of the current send.
    pub fn attempt(&self) -> u32 {
        self.attempts.saturating_add(1)
    }

    /// The wait before the next retry, evaluated before it is recorded.
    pub fn delay(&self, backoff: &Backoff) -> Duration {
        backoff.delay(self.attempts)
    }

    /// Records that a retry is about to be sent.
    pub fn record_retry(&mut self) {
        self.attempts = self.attempts.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        for status in 200..=299 {
            assert_eq!(StatusClass::of(status), StatusClass::Success, "status {}", status);
        }
    }

    #[test]
    fn test_terminal_error_range() {
        for status in (400..=499).chain(std::iter::once(501)) {
            assert_eq!(
                StatusClass::of(status),
                StatusClass::ClientOrServerError,
                "status {}",
                status
            );
        }
    }

    #[test]
    fn test_retryable_statuses() {
        for status in [0, 500, 502, 503, 504, 599, 600, 999] {
            assert!(StatusClass::of(status).is_retryable(), "status {}", status);
        }
    }

    #[test]
    fn test_501_is_terminal_not_retried() {
        assert!(!StatusClass::of(501).is_retryable());
        assert!(StatusClass::of(502).is_retryable());
    }

    #[test]
    fn test_unknown_statuses() {
        for status in [1, 100, 101, 199, 300, 301, 304, 399] {
            assert_eq!(StatusClass::of(status), StatusClass::Unknown, "status {}", status);
        }
    }

    #[test]
    fn test_quadratic_backoff() {
        let backoff = Backoff::default();
        let delays: Vec<_> = (0..5).map(|n| backoff.delay(n)).collect();
        assert_eq!(
            delays,
            vec![
                Duration::ZERO,
                Duration::from_millis(50),
                Duration::from_millis(200),
                Duration::from_millis(450),
                Duration::from_millis(800),
            ]
        );
    }

    #[test]
    fn test_custom_unit() {
        let backoff = Backoff::new(Duration::from_secs(1));
        assert_eq!(backoff.delay(3), Duration::from_secs(9));
    }

    #[test]
    fn test_backoff_saturates() {
        let backoff = Backoff::new(Duration::MAX);
        assert_eq!(backoff.delay(2), Duration::MAX);
        assert_eq!(backoff.delay(0), Duration::ZERO);
    }

    #[test]
    fn test_retry_state_counts_retries() {
        let backoff = Backoff::default();
        let mut state = RetryState::new();
        assert_eq!(state.attempt(), 1);
        assert_eq!(state.delay(&backoff), Duration::ZERO);

        state.record_retry();
        assert_eq!(state.attempts(), 1);
        assert_eq!(state.attempt(), 2);
        assert_eq!(state.delay(&backoff), Duration::from_millis(50));

        state.record_retry();
        assert_eq!(state.delay(&backoff), Duration::from_millis(200));
    }

    #[test]
    fn test_retry_state_saturates_at_max() {
        let mut state = RetryState {
            attempts: u32::MAX - 1,
        };
        state.record_retry();
        state.record_retry();
        assert_eq!(state.attempts(), u32::MAX);
        assert_eq!(state.attempt(), u32::MAX);
        assert_eq!(state.delay(&Backoff::new(Duration::ZERO)), Duration::ZERO);
    }
}
