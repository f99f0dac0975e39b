//! Diagnostic sink
//!
//! The dialer never logs through global state directly; it holds an
//! `Arc<dyn Logger>` supplied at construction. [`TracingLogger`] is the default
//! and forwards to `tracing`. Templates and positional values arrive as
//! [`fmt::Arguments`], built with `format_args!`.

use std::fmt;

/// Pluggable logger with four severities
pub trait Logger: Send + Sync {
    fn debug(&self, args: fmt::Arguments<'_>);
    fn info(&self, args: fmt::Arguments<'_>);
    fn warn(&self, args: fmt::Arguments<'_>);
    fn error(&self, args: fmt::Arguments<'_>);
}

/// Default logger backed by `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(target: "svcdial", "{}", args);
    }

    fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(target: "svcdial", "{}", args);
    }

    fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(target: "svcdial", "{}", args);
    }

    fn error(&self, args: fmt::Arguments<'_>) {
        tracing::error!(target: "svcdial", "{}", args);
    }
}

/// Logger that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn debug(&self, _args: fmt::Arguments<'_>) {}
    fn info(&self, _args: fmt::Arguments<'_>) {}
    fn warn(&self, _args: fmt::Arguments<'_>) {}
    fn error(&self, _args: fmt::Arguments<'_>) {}
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Level {
        Debug,
        Info,
        Warn,
        Error,
    }

    /// Logger that keeps every entry for later assertions
    #[derive(Default)]
    pub struct RecordingLogger {
        entries: Mutex<Vec<(Level, String)>>,
    }

    impl RecordingLogger {
        pub fn entries(&self) -> Vec<(Level, String)> {
            self.entries.lock().clone()
        }

        pub fn contains(&self, level: Level, needle: &str) -> bool {
            self.entries
                .lock()
                .iter()
                .any(|(l, msg)| *l == level && msg.contains(needle))
        }

        fn push(&self, level: Level, args: fmt::Arguments<'_>) {
            self.entries.lock().push((level, args.to_string()));
        }
    }

    impl Logger for RecordingLogger {
        fn debug(&self, args: fmt::Arguments<'_>) {
            self.push(Level::Debug, args);
        }

        fn info(&self, args: fmt::Arguments<'_>) {
            self.push(Level::Info, args);
        }

        fn warn(&self, args: fmt::Arguments<'_>) {
            self.push(Level::Warn, args);
        }

        fn error(&self, args: fmt::Arguments<'_>) {
            self.push(Level::Error, args);
        }
    }
}
