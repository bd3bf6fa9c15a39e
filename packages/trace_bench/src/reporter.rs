//! Console reporting boundary.
//!
//! The profilers never format colors themselves; they hand a severity tag and
//! a formatted line to a [`Reporter`], which decides how to present it.

use std::fmt::Debug;

use crossterm::style::Stylize;

/// Severity tag attached to every reported line.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "the severity scale is fixed; reporters match on all of it"
)]
pub enum Severity {
    /// Plain result output.
    Info,
    /// A favorable status, e.g. running an optimized build.
    Success,
    /// A condition that degrades result quality but does not abort the run.
    Warning,
    /// A condition that prevented measurement.
    Error,
}

/// Receives status and result lines from the profilers.
///
/// Implementations are free to color, redirect or record the lines; the
/// profilers only ever supply a (tag, text) pair.
pub trait Reporter: Debug + Send + Sync {
    /// Emits one line with the given severity.
    fn line(&self, severity: Severity, text: &str);
}

/// Writes colored lines to the controlling terminal.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    /// Creates a console reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reporter for ConsoleReporter {
    #[cfg_attr(test, mutants::skip)] // Too difficult to test stdout output reliably - manually tested.
    fn line(&self, severity: Severity, text: &str) {
        match severity {
            Severity::Info => println!("{text}"),
            Severity::Success => println!("{}", text.green()),
            Severity::Warning => println!("{}", text.yellow()),
            Severity::Error => println!("{}", text.red()),
        }
    }
}

/// Records every line for later inspection. Test use only.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingReporter {
    lines: std::sync::Mutex<Vec<(Severity, String)>>,
}

#[cfg(test)]
impl RecordingReporter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn lines(&self) -> Vec<(Severity, String)> {
        self.lines.lock().expect(crate::ERR_POISONED_LOCK).clone()
    }

    pub(crate) fn contains(&self, severity: Severity, fragment: &str) -> bool {
        self.lines()
            .iter()
            .any(|(tag, text)| *tag == severity && text.contains(fragment))
    }
}

#[cfg(test)]
impl Reporter for RecordingReporter {
    fn line(&self, severity: Severity, text: &str) {
        self.lines
            .lock()
            .expect(crate::ERR_POISONED_LOCK)
            .push((severity, text.to_string()));
    }
}
