use embassy_time::Duration;

use crate::primitive::Os;

/// Polls `predicate` until it returns `true` or `timeout` elapses.
///
/// The task sleeps for `period` before each check, so the predicate is asked at most
/// `timeout / period` times and never before the first period has passed.
/// Returns `true` if the predicate succeeded within the timeout.
pub fn wait_until<O: Os>(
    period: Duration,
    timeout: Duration,
    mut predicate: impl FnMut() -> bool,
) -> bool {
    assert!(period.as_ticks() != 0, "Polling period must be non-zero");

    let iterations = timeout.as_ticks() / period.as_ticks();
    for _ in 0..iterations {
        O::delay(period);
        if predicate() {
            return true;
        }
    }
    trace!("wait_until: gave up after {} checks", iterations);
    false
}
