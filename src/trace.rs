//! Feature-gated logging macros.
//!
//! With the `tracing` feature the engine logs through the `tracing` crate.
//! Steps and rule changes go to `debug`, terminal states to `info`, budget
//! and divergence failures to `warn`, single rewrites and overlaps to
//! `trace`. Without the feature every macro expands to nothing.
//!
//! ```rust,ignore
//! #[cfg(feature = "tracing")]
//! use crate::trace::{debug, debug_span};
//!
//! #[cfg(feature = "tracing")]
//! let _span = debug_span!("step", n = self.steps).entered();
//! #[cfg(feature = "tracing")]
//! debug!(rules = self.rules.len(), "step done");
//! ```

#[cfg(feature = "tracing")]
pub use tracing::{debug, debug_span, error, info, span, trace, warn, Level, Span};

#[cfg(not(feature = "tracing"))]
mod noop {
    /// Stand-in for `tracing::Span`.
    pub struct Span;

    impl Span {
        pub fn none() -> Self {
            Span
        }

        pub fn entered(self) -> SpanGuard {
            SpanGuard
        }
    }

    pub struct SpanGuard;

    #[derive(Clone, Copy, Debug)]
    pub struct Level;

    impl Level {
        pub const TRACE: Level = Level;
        pub const DEBUG: Level = Level;
        pub const INFO: Level = Level;
    }

    #[macro_export]
    macro_rules! trace {
        ($($tt:tt)*) => {};
    }

    #[macro_export]
    macro_rules! debug {
        ($($tt:tt)*) => {};
    }

    #[macro_export]
    macro_rules! info {
        ($($tt:tt)*) => {};
    }

    #[macro_export]
    macro_rules! warn {
        ($($tt:tt)*) => {};
    }

    #[macro_export]
    macro_rules! error {
        ($($tt:tt)*) => {};
    }

    #[macro_export]
    macro_rules! span {
        ($($tt:tt)*) => {
            $crate::trace::Span::none()
        };
    }

    #[macro_export]
    macro_rules! debug_span {
        ($($tt:tt)*) => {
            $crate::trace::Span::none()
        };
    }

    pub use crate::{debug, debug_span, error, info, span, trace, warn};
}

#[cfg(not(feature = "tracing"))]
pub use noop::*;

/// Environment variable holding the log filter, e.g. `OKB_LOG=okb=debug`.
pub const LOG_ENV: &str = "OKB_LOG";

/// Install a stderr subscriber filtered by `OKB_LOG` (falling back to
/// `RUST_LOG`, then `warn`). Safe to call more than once.
#[cfg(feature = "tracing")]
pub fn init_subscriber() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .with_ansi(false),
        )
        .with(filter)
        .try_init()
        .ok();
}

#[cfg(not(feature = "tracing"))]
pub fn init_subscriber() {}

#[cfg(test)]
#[path = "tests/trace.rs"]
mod tests;
