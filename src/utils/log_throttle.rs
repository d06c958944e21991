use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug)]
struct WindowState {
    window_started_at: Instant,
    suppressed: u64,
}

/// Rate limiter for a single noisy log event.
///
/// The first call in each window is let through and reports how many calls
/// were swallowed since the previous one.
#[derive(Debug)]
pub struct LogThrottle {
    interval: Duration,
    window: Mutex<Option<WindowState>>,
}

impl LogThrottle {
    pub fn new(interval: Duration) -> Self {
        LogThrottle {
            interval,
            window: Mutex::new(None),
        }
    }

    /// Returns `Some(suppressed_count)` when the event should be emitted,
    /// otherwise `None` and the event is counted as suppressed for the active window.
    pub fn should_emit(&self) -> Option<u64> {
        let mut window = self.window.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();

        match window.as_mut() {
            Some(state) if now.duration_since(state.window_started_at) < self.interval => {
                state.suppressed += 1;
                None
            }
            Some(state) => {
                let suppressed = state.suppressed;
                state.window_started_at = now;
                state.suppressed = 0;
                Some(suppressed)
            }
            None => {
                *window = Some(WindowState {
                    window_started_at: now,
                    suppressed: 0,
                });
                Some(0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LogThrottle;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn emits_then_suppresses_then_emits_with_count() {
        let throttle = LogThrottle::new(Duration::from_millis(20));

        assert_eq!(throttle.should_emit(), Some(0));
        assert_eq!(throttle.should_emit(), None);
        assert_eq!(throttle.should_emit(), None);

        sleep(Duration::from_millis(30));
        assert_eq!(throttle.should_emit(), Some(2));
    }

    #[test]
    fn zero_interval_never_suppresses() {
        let throttle = LogThrottle::new(Duration::ZERO);
        assert_eq!(throttle.should_emit(), Some(0));
        assert_eq!(throttle.should_emit(), Some(0));
    }
}
