//! Call wrappers: error catching, retries, timing, locking and timeouts.
//!
//! Each wrapper takes the callable as an argument instead of rewriting a
//! function definition, e.g.
//!
//! ```
//! use magickit::decorate::Catch;
//!
//! let value = Catch::new("parse").run(0, || "12".parse::<i32>());
//! assert_eq!(value, 12);
//! ```

use std::{fmt, future::Future, time::Duration};

use tracing::{error, info, warn, Level};

use crate::{
    error::{MagicError, Result},
    logger::log_with_level,
    response::{ErrorInfo, Response},
};

pub mod singleton;
pub mod thread;

pub use singleton::{singleton, Singleton};
pub use thread::{spawn, thread_safe, TaskHandle};

/// Turns failures of a callable into a log line and a fallback value.
#[derive(Debug, Clone)]
pub struct Catch {
    name: String,
    prefix: String,
    level: Level,
}

impl Catch {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: String::new(),
            level: Level::ERROR,
        }
    }

    /// Text put in front of the failure message.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Value of `f`, or `default` when it fails or panics.
    pub fn run<T, E, F>(&self, default: T, f: F) -> T
    where
        F: FnOnce() -> std::result::Result<T, E>,
        E: fmt::Display,
    {
        match Response::execute(f).into_result() {
            Ok(value) => value,
            Err(err) => {
                self.report(&err, true);
                default
            }
        }
    }

    /// Log the failure of `f` and hand it back to the caller.
    pub fn try_run<T, E, F>(&self, f: F) -> std::result::Result<T, ErrorInfo>
    where
        F: FnOnce() -> std::result::Result<T, E>,
        E: fmt::Display,
    {
        Response::execute(f).into_result().inspect_err(|err| self.report(err, false))
    }

    fn report(&self, err: &ErrorInfo, with_default: bool) {
        let mut message = format!("call {} failed - {}", self.name, err.message);
        if !self.prefix.is_empty() {
            message = format!("{}: {message}", self.prefix);
        }
        if with_default {
            message.push_str(", returning default");
        }
        log_with_level(self.level, &message);
    }
}

/// Re-runs a failing callable with a growing delay.
#[derive(Debug, Clone)]
pub struct Retry {
    name: String,
    attempts: u32,
    delay: Duration,
    max_delay: Duration,
    backoff: f64,
}

/// Upper bound for the delay between attempts unless set otherwise.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(3600);

impl Default for Retry {
    fn default() -> Self {
        Self {
            name: "task".to_string(),
            attempts: 3,
            delay: Duration::from_secs(1),
            max_delay: DEFAULT_MAX_DELAY,
            backoff: 1.0,
        }
    }
}

impl Retry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Total number of calls, at least one.
    pub fn attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Cap for the grown delay.
    pub fn max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Factor applied to the delay after every failed attempt. Negative or
    /// non-finite values are treated as 1.0.
    pub fn backoff(mut self, factor: f64) -> Self {
        self.backoff = if factor.is_finite() && factor >= 0.0 { factor } else { 1.0 };
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.attempts
    }

    pub fn initial_delay(&self) -> Duration {
        self.delay
    }

    pub fn run<T, E, F>(&self, mut f: F) -> Result<T>
    where
        F: FnMut() -> std::result::Result<T, E>,
        E: fmt::Display,
    {
        let mut delay = self.delay.min(self.max_delay);
        let mut last_error = String::new();

        for attempt in 1..=self.attempts {
            match Response::execute(&mut f).into_result() {
                Ok(value) => return Ok(value),
                Err(err) => last_error = err.message,
            }
            if attempt < self.attempts {
                self.report_attempt(attempt, delay, &last_error);
                std::thread::sleep(delay);
                delay = self.next_delay(delay);
            }
        }
        Err(self.exhausted(last_error))
    }

    /// Async [`Retry::run`]; waits with `tokio::time::sleep`. Panics inside
    /// the future are not caught.
    pub async fn run_async<T, E, F, Fut>(&self, mut f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: fmt::Display,
    {
        let mut delay = self.delay.min(self.max_delay);
        let mut last_error = String::new();

        for attempt in 1..=self.attempts {
            match f().await {
                Ok(value) => return Ok(value),
                Err(err) => last_error = ErrorInfo::from_error(&err).message,
            }
            if attempt < self.attempts {
                self.report_attempt(attempt, delay, &last_error);
                tokio::time::sleep(delay).await;
                delay = self.next_delay(delay);
            }
        }
        Err(self.exhausted(last_error))
    }

    fn next_delay(&self, delay: Duration) -> Duration {
        Duration::try_from_secs_f64(delay.as_secs_f64() * self.backoff)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    fn report_attempt(&self, attempt: u32, delay: Duration, last_error: &str) {
        warn!(
            name = %self.name,
            attempt,
            error = %last_error,
            "call {} attempt {attempt} failed, retrying in {:.1}s",
            self.name,
            delay.as_secs_f64()
        );
    }

    fn exhausted(&self, last_error: String) -> MagicError {
        error!(name = %self.name, attempts = self.attempts, "call {} failed after all attempts", self.name);
        MagicError::RetriesExhausted {
            attempts: self.attempts,
            last_error,
        }
    }

    pub fn run_or<T, E, F>(&self, default: T, f: F) -> T
    where
        F: FnMut() -> std::result::Result<T, E>,
        E: fmt::Display,
    {
        self.run(f).unwrap_or(default)
    }
}

struct TimerGuard<'a> {
    name: &'a str,
    start: std::time::Instant,
}

impl Drop for TimerGuard<'_> {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        info!(
            name = self.name,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "{} finished in {:.2}ms",
            self.name,
            elapsed.as_secs_f64() * 1000.0
        );
    }
}

/// Run `f`, logging its start and elapsed time. The completion line is
/// written even when `f` panics.
pub fn timer<T, F: FnOnce() -> T>(name: &str, f: F) -> T {
    info!(name, "{name} started");
    let _guard = TimerGuard {
        name,
        start: std::time::Instant::now(),
    };
    f()
}

/// Run a blocking callable on the blocking pool, giving up after `limit`.
///
/// On timeout the callable keeps running in the background; only its
/// result is discarded.
pub async fn timeout<T, F>(limit: Duration, f: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let task = tokio::task::spawn_blocking(f);
    match tokio::time::timeout(limit, task).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(join_err)) => {
            let message = if join_err.is_panic() {
                ErrorInfo::from_panic(join_err.into_panic().as_ref()).message
            } else {
                join_err.to_string()
            };
            Err(MagicError::TaskFailed(message))
        }
        Err(_) => {
            let timeout_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
            warn!(timeout_ms, "call timed out");
            Err(MagicError::Timeout { timeout_ms })
        }
    }
}

/// [`timeout`] with a fallback value for timeouts and panics.
pub async fn timeout_or<T, F>(limit: Duration, default: T, f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    timeout(limit, f).await.unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::test_support::CaptureWriter;
    use std::cell::Cell;

    #[test]
    fn catch_returns_value_on_success() {
        assert_eq!(Catch::new("parse").run(0, || "41".parse::<i32>()), 41);
    }

    #[test]
    fn catch_logs_and_returns_default() {
        let capture = CaptureWriter::default();
        let value = tracing::dispatcher::with_default(&capture.dispatch(), || {
            Catch::new("parse")
                .prefix("config")
                .level(Level::WARN)
                .run(-1, || "x".parse::<i32>())
        });
        assert_eq!(value, -1);
        let out = capture.contents();
        assert!(out.contains("WARN"));
        assert!(out.contains("config: call parse failed - invalid digit found in string, returning default"));
    }

    #[test]
    fn catch_handles_panics() {
        let value = Catch::new("boom").run(7, || -> std::result::Result<i32, String> { panic!("kaboom") });
        assert_eq!(value, 7);
    }

    #[test]
    fn try_run_passes_error_through() {
        let capture = CaptureWriter::default();
        let err = tracing::dispatcher::with_default(&capture.dispatch(), || {
            Catch::new("load").try_run(|| Err::<(), _>("missing file")).unwrap_err()
        });
        assert_eq!(err.message, "missing file");
        assert!(capture.contents().contains("call load failed - missing file"));
        assert!(!capture.contents().contains("returning default"));
    }

    #[test]
    fn retry_succeeds_after_failures() {
        let calls = Cell::new(0);
        let retry = Retry::new().attempts(3).delay(Duration::from_millis(1));
        let value = retry
            .run(|| {
                calls.set(calls.get() + 1);
                if calls.get() < 3 {
                    Err("not yet")
                } else {
                    Ok(calls.get())
                }
            })
            .unwrap();
        assert_eq!(value, 3);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn retry_exhausts() {
        let capture = CaptureWriter::default();
        let calls = Cell::new(0);
        let result = tracing::dispatcher::with_default(&capture.dispatch(), || {
            Retry::new()
                .name("flaky")
                .attempts(2)
                .delay(Duration::ZERO)
                .run(|| {
                    calls.set(calls.get() + 1);
                    Err::<(), _>(format!("failure {}", calls.get()))
                })
        });
        match result {
            Err(MagicError::RetriesExhausted { attempts, last_error }) => {
                assert_eq!(attempts, 2);
                assert_eq!(last_error, "failure 2");
            }
            other => panic!("unexpected: {other:?}"),
        }
        let out = capture.contents();
        assert!(out.contains("call flaky attempt 1 failed"));
        assert!(out.contains("call flaky failed after all attempts"));
    }

    #[test]
    fn retry_run_or_and_minimum_attempts() {
        let retry = Retry::new().attempts(0).delay(Duration::ZERO);
        assert_eq!(retry.max_attempts(), 1);
        assert_eq!(retry.run_or(5, || Err::<i32, _>("no")), 5);
    }

    #[test]
    fn growing_delay_is_capped() {
        let retry = Retry::new()
            .delay(Duration::from_secs(10))
            .backoff(1e300)
            .max_delay(Duration::from_secs(60));
        assert_eq!(retry.next_delay(Duration::from_secs(10)), Duration::from_secs(60));
        assert_eq!(Retry::new().backoff(f64::MAX).next_delay(Duration::MAX), DEFAULT_MAX_DELAY);
        assert_eq!(Retry::new().backoff(2.0).next_delay(Duration::from_secs(1)), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn async_retry_succeeds_after_failures() {
        let mut calls = 0;
        let retry = Retry::new().attempts(3).delay(Duration::from_millis(1));
        let value = retry
            .run_async(|| {
                calls += 1;
                let n = calls;
                async move {
                    if n < 2 {
                        Err("not yet")
                    } else {
                        Ok(n)
                    }
                }
            })
            .await
            .unwrap();
        assert_eq!(value, 2);

        let err = Retry::new()
            .attempts(2)
            .delay(Duration::ZERO)
            .run_async(|| async { Err::<(), _>("down") })
            .await
            .unwrap_err();
        assert!(matches!(err, MagicError::RetriesExhausted { attempts: 2, .. }));
    }

    #[test]
    fn timer_logs_completion() {
        let capture = CaptureWriter::default();
        let value = tracing::dispatcher::with_default(&capture.dispatch(), || timer("sum", || 2 + 2));
        assert_eq!(value, 4);
        let out = capture.contents();
        assert!(out.contains("sum started"));
        assert!(out.contains("sum finished in"));
    }

    #[tokio::test]
    async fn timeout_returns_value_in_time() {
        let value = timeout(Duration::from_secs(5), || 21 * 2).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn timeout_expires() {
        let result = timeout(Duration::from_millis(20), || {
            std::thread::sleep(Duration::from_millis(300));
            1
        })
        .await;
        assert!(matches!(result, Err(MagicError::Timeout { timeout_ms: 20 })));
    }

    #[tokio::test]
    async fn timeout_reports_panics() {
        let result = timeout(Duration::from_secs(5), || -> i32 { panic!("inside task") }).await;
        match result {
            Err(MagicError::TaskFailed(message)) => assert_eq!(message, "inside task"),
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(timeout_or(Duration::from_secs(5), 9, || -> i32 { panic!("again") }).await, 9);
    }
}
