//! Execution results: run a callable, time it, and keep the outcome as data.
//!
//! A [`Response`] is created once per invocation and never mutated. Failures
//! of the callable (an `Err` return or a panic) are recorded in it and never
//! propagate to the caller of [`Response::execute`] / [`Response::call`].

use std::{
    collections::BTreeMap,
    fmt,
    panic::{self, AssertUnwindSafe},
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::{error::Result, tools::json::to_string_indented};

mod capture;
mod invoke;

pub use invoke::Invoke;

/// Smallest duration reported for a call, in seconds.
const MIN_EXECUTION_SECS: f64 = 1e-6;

/// Failure recorded by a [`Response`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{name}: {message}")]
pub struct ErrorInfo {
    /// Short type name of the error, or `panic`.
    pub name: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    /// The message is never empty: an error with blank `Display` output is
    /// described by its type name.
    pub fn from_error<E: fmt::Display>(err: &E) -> Self {
        let name = capture::short_type_name::<E>();
        let message = capture::describe(&name, err.to_string());
        Self::new(name, message)
    }

    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = capture::describe(capture::PANIC_NAME, capture::panic_message(payload));
        Self::new(capture::PANIC_NAME, message)
    }
}

/// Outcome of one invocation of a callable.
#[derive(Debug, Clone)]
pub struct Response<T> {
    outcome: std::result::Result<T, ErrorInfo>,
    execution_time: f64,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    metadata: BTreeMap<String, Value>,
}

impl<T> Response<T> {
    /// Run a fallible callable. `Err` and panics both become failure data.
    pub fn execute<F, E>(f: F) -> Self
    where
        F: FnOnce() -> std::result::Result<T, E>,
        E: fmt::Display,
    {
        Self::capture(|| f().map_err(|e| ErrorInfo::from_error(&e)))
    }

    /// Run a callable returning a plain value; only a panic can fail it.
    pub fn call<F>(f: F) -> Self
    where
        F: FnOnce() -> T,
    {
        Self::capture(|| Ok(f()))
    }

    /// [`Response::execute`] with the arguments passed as a tuple.
    ///
    /// ```
    /// use magickit::Response;
    ///
    /// fn parse(text: &str, radix: u32) -> Result<i64, std::num::ParseIntError> {
    ///     i64::from_str_radix(text, radix)
    /// }
    ///
    /// let response = Response::execute_with(parse, ("ff", 16));
    /// assert_eq!(response.result(), Some(&255));
    /// ```
    pub fn execute_with<A, F, E>(f: F, args: A) -> Self
    where
        F: Invoke<A, Output = std::result::Result<T, E>>,
        E: fmt::Display,
    {
        Self::execute(move || f.invoke(args))
    }

    /// [`Response::call`] with the arguments passed as a tuple.
    pub fn call_with<A, F>(f: F, args: A) -> Self
    where
        F: Invoke<A, Output = T>,
    {
        Self::call(move || f.invoke(args))
    }

    /// Build a response from an outcome measured elsewhere.
    pub fn from_outcome(outcome: std::result::Result<T, ErrorInfo>, elapsed: Duration) -> Self {
        let finished_at = Utc::now();
        let started_at = chrono::Duration::from_std(elapsed)
            .ok()
            .and_then(|d| finished_at.checked_sub_signed(d))
            .unwrap_or(finished_at);
        Self {
            outcome,
            execution_time: round_secs(elapsed),
            started_at,
            finished_at,
            metadata: BTreeMap::new(),
        }
    }

    fn capture<F>(f: F) -> Self
    where
        F: FnOnce() -> std::result::Result<T, ErrorInfo>,
    {
        let started_at = Utc::now();
        let start = Instant::now();
        let caught = {
            let _quiet = capture::QuietPanics::enter();
            panic::catch_unwind(AssertUnwindSafe(f))
        };
        let elapsed = start.elapsed();
        let outcome = match caught {
            Ok(outcome) => outcome,
            Err(payload) => Err(ErrorInfo::from_panic(payload.as_ref())),
        };
        let finished_at = Utc::now();

        Self {
            outcome,
            execution_time: round_secs(elapsed),
            started_at,
            finished_at,
            metadata: BTreeMap::new(),
        }
    }

    pub fn success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn has_error(&self) -> bool {
        self.outcome.is_err()
    }

    pub fn result(&self) -> Option<&T> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        self.outcome.as_ref().err()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error().map(|e| e.message.as_str())
    }

    pub fn error_name(&self) -> Option<&str> {
        self.error().map(|e| e.name.as_str())
    }

    /// Seconds spent in the callable, rounded to microseconds.
    pub fn execution_time(&self) -> f64 {
        self.execution_time
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_secs_f64(self.execution_time)
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn into_result(self) -> std::result::Result<T, ErrorInfo> {
        self.outcome
    }

    /// The returned value, dropping any failure details.
    pub fn into_value(self) -> Option<T> {
        self.outcome.ok()
    }

    /// Extended view including timestamps, metadata and the error type.
    pub fn info(&self) -> Value {
        serde_json::json!({
            "success": self.success(),
            "execution_time": self.execution_time,
            "started_at": self.started_at.to_rfc3339(),
            "finished_at": self.finished_at.to_rfc3339(),
            "metadata": self.metadata,
            "error": self.error_message(),
            "error_name": self.error_name(),
        })
    }
}

impl<T: Serialize> Response<T> {
    /// Borrowed view of the four serialized fields.
    pub fn record(&self) -> ResponseRecord<&T> {
        ResponseRecord {
            success: self.success(),
            result: self.result(),
            error_message: self.error_message().map(str::to_owned),
            execution_time: self.execution_time,
        }
    }

    /// Render `success`, `result`, `error_message` and `execution_time`.
    /// `None` is compact; `Some(n)` indents nested levels by `n` spaces.
    pub fn to_json(&self, indent: Option<usize>) -> Result<String> {
        let record = self.record();
        match indent {
            Some(width) => to_string_indented(&record, width),
            None => Ok(serde_json::to_string(&record)?),
        }
    }

    /// Serialize only the returned value (`null` on failure).
    pub fn json_str(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.result())?)
    }
}

impl<T: AsRef<str>> Response<T> {
    /// Parse a textual result as JSON. `Ok(None)` when the call failed.
    pub fn json<V: DeserializeOwned>(&self) -> Result<Option<V>> {
        match self.result() {
            Some(text) => Ok(Some(serde_json::from_str(text.as_ref())?)),
            None => Ok(None),
        }
    }
}

impl<T: fmt::Debug> fmt::Display for Response<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Ok(value) => write!(
                f,
                "Response[success] - elapsed: {:.6}s, result: {:?}",
                self.execution_time, value
            ),
            Err(err) => write!(
                f,
                "Response[failure] - elapsed: {:.6}s, error: {}",
                self.execution_time, err.message
            ),
        }
    }
}

/// The serialized form of a [`Response`].
///
/// `result` is `null` both on failure and for a successful call whose value
/// itself serializes to `null` (`()`, `None`). Parsing such a record back
/// gives `result: None`; use `success` to tell the two apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord<T> {
    pub success: bool,
    pub result: Option<T>,
    pub error_message: Option<String>,
    pub execution_time: f64,
}

impl<T: DeserializeOwned> ResponseRecord<T> {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

fn round_secs(elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64().max(MIN_EXECUTION_SECS);
    (secs * 1_000_000.0).round() / 1_000_000.0
}
