//! Conditional tracing macros (zero-cost when feature disabled).
//!
//! With the `tracing` feature enabled these forward to the `tracing` crate;
//! without it they compile to nothing. Field values are plain expressions, so
//! pass string data as `&str`.

/// Create an info-level span for a major operation.
#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        tracing::info_span!($name $(, $($field)*)?)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        $crate::trace::NoopSpan
    };
}

/// Emit an info-level event for key measurements.
#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::info!(name: $name, $($key = $value),+)
    };
    ($name:expr) => {
        tracing::info!(name: $name)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
    ($name:expr) => {};
}

/// Emit a warn-level event for recoverable, per-item failures.
#[cfg(feature = "tracing")]
macro_rules! trace_warn {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::warn!(name: $name, $($key = $value),+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
}

/// Emit an error-level event for invariant violations.
#[cfg(feature = "tracing")]
macro_rules! trace_error {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::error!(name: $name, $($key = $value),+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_error {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
}

pub(crate) use trace_error;
pub(crate) use trace_event;
pub(crate) use trace_span;
pub(crate) use trace_warn;

/// A no-op span guard used when tracing is disabled.
///
/// Lets `let _guard = trace_span!(...).entered();` compile without
/// conditional code at call sites.
#[cfg(not(feature = "tracing"))]
pub struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    /// Returns self, mimicking `Span::entered()`.
    #[inline]
    pub fn entered(self) -> Self {
        self
    }
}
