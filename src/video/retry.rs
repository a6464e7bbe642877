use std::fmt::Display;
use std::thread::sleep;
use std::time::Duration;

use crate::ui::prelude::{Level, emit};

use super::error::RenderError;

/// Bounded retry with exponential backoff for flaky external calls
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            multiplier: 2.0,
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            ..Self::default()
        }
    }

    /// Delay after the failed attempt number `attempt` (0-based), capped
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(attempt.min(i32::MAX as u32) as i32);
        let secs = self.initial_delay.as_secs_f64() * factor;
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(secs)
    }

    /// Run `operation` until it succeeds or the attempts are used up
    pub fn run<T, E, F>(&self, label: &str, mut operation: F) -> Result<T, RenderError>
    where
        E: Display,
        F: FnMut(u32) -> Result<T, E>,
    {
        let attempts = self.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 0..attempts {
            match operation(attempt) {
                Ok(value) => return Ok(value),
                Err(err) => {
                    last_error = err.to_string();
                    if attempt + 1 == attempts {
                        break;
                    }
                    let delay = self.delay_for(attempt);
                    emit(
                        Level::Warn,
                        "retry.attempt_failed",
                        &format!(
                            "{label} failed (attempt {}/{attempts}): {last_error}; retrying in {:.1}s",
                            attempt + 1,
                            delay.as_secs_f64()
                        ),
                        None,
                    );
                    if !delay.is_zero() {
                        sleep(delay);
                    }
                }
            }
        }

        Err(RenderError::RetryExhausted {
            operation: label.to_string(),
            attempts,
            last: last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO)
    }

    #[test]
    fn stops_after_max_attempts() {
        let mut calls = 0;
        let result: Result<(), _> = instant(3).run("download", |_| {
            calls += 1;
            Err::<(), _>("boom")
        });

        assert_eq!(calls, 3);
        match result.unwrap_err() {
            RenderError::RetryExhausted {
                operation,
                attempts,
                last,
            } => {
                assert_eq!(operation, "download");
                assert_eq!(attempts, 3);
                assert_eq!(last, "boom");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn returns_first_success() {
        let value = instant(5)
            .run("fetch", |attempt| if attempt < 2 { Err("flaky") } else { Ok(attempt) })
            .unwrap();
        assert_eq!(value, 2);
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        let mut calls = 0;
        let _ = instant(0).run("fetch", |_| {
            calls += 1;
            Err::<(), _>("nope")
        });
        assert_eq!(calls, 1);
    }

    #[test]
    fn delays_grow_geometrically_up_to_cap() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_delay: Duration::from_millis(100),
            multiplier: 2.0,
            max_delay: Duration::from_millis(1_000),
        };
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(800));
        assert_eq!(policy.delay_for(4), Duration::from_millis(1_000));
        assert_eq!(policy.delay_for(60), Duration::from_millis(1_000));
    }
}
