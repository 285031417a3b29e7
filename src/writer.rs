//! A value paired with an accumulated text log.
//!
//! Composing writers with [`Writer::and_then`] concatenates their logs in
//! the order the steps ran:
//!
//! ```
//! use oxide::Writer;
//!
//! let add_one = |x: i32| Writer::new(x + 1, format!("Added 1 to {x}\n"));
//! let double = |x: i32| Writer::new(x * 2, format!("Multiplied {x} by 2\n"));
//!
//! let (result, log) = Writer::of(5)
//!     .and_then(add_one)
//!     .and_then(double)
//!     .prepend("Procedure:\n")
//!     .append("Done!")
//!     .into_parts();
//!
//! assert_eq!(result, 12);
//! assert_eq!(log, "Procedure:\nAdded 1 to 5\nMultiplied 6 by 2\nDone!");
//! ```

/// A value with a log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Writer<T> {
    value: T,
    log: String,
}

impl<T> Writer<T> {
    /// A writer with an empty log.
    #[must_use]
    pub const fn of(value: T) -> Self {
        Self {
            value,
            log: String::new(),
        }
    }

    /// A writer with the given log.
    #[must_use]
    pub fn new(value: T, log: impl Into<String>) -> Self {
        Self {
            value,
            log: log.into(),
        }
    }

    /// Transforms the value and keeps the log.
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Writer<U> {
        Writer {
            value: f(self.value),
            log: self.log,
        }
    }

    /// Runs the next step; its log is appended to this writer's log.
    #[must_use]
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Writer<U>) -> Writer<U> {
        f(self.value).prepend(&self.log)
    }

    /// Adds text to the end of the log.
    #[must_use]
    pub fn append(mut self, text: &str) -> Self {
        self.log.push_str(text);
        self
    }

    /// Adds text to the start of the log.
    #[must_use]
    pub fn prepend(mut self, text: &str) -> Self {
        self.log.insert_str(0, text);
        self
    }

    /// Returns the value.
    #[must_use]
    pub const fn value(&self) -> &T {
        &self.value
    }

    /// Returns the log.
    #[must_use]
    pub fn log(&self) -> &str {
        &self.log
    }

    /// Consumes the writer, returning the value.
    #[must_use]
    pub fn into_value(self) -> T {
        self.value
    }

    /// Consumes the writer, returning the value and the log.
    #[must_use]
    pub fn into_parts(self) -> (T, String) {
        (self.value, self.log)
    }
}
