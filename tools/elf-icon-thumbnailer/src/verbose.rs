//! Thumbnailer diagnostics on stderr.
//!
//! A thumbnail run writes nothing but the output file when it goes as
//! planned. `-v` adds the section report, the chosen icon and timings;
//! `-q` also drops the notice printed when no icon matches the requested
//! size exactly.

use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Instant;

/// How much the thumbnailer reports besides errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// `-q`
    Quiet = 0,
    /// Size fallback notices.
    Default = 1,
    /// `-v`
    Verbose = 2,
}

impl Verbosity {
    /// Level selected by the `-q`/`-v` flags.
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Default
        }
    }
}

static VERBOSITY: AtomicU8 = AtomicU8::new(Verbosity::Default as u8);

/// Set once from the command line, before any thumbnail work.
pub fn init(level: Verbosity) {
    VERBOSITY.store(level as u8, Ordering::Relaxed);
}

/// Returns `true` if output meant for `level` should be printed.
pub fn enabled(level: Verbosity) -> bool {
    VERBOSITY.load(Ordering::Relaxed) >= level as u8
}

/// Returns `true` under `-v`.
pub fn is_verbose() -> bool {
    enabled(Verbosity::Verbose)
}

/// `eprintln!` under `-v`.
macro_rules! vprintln {
    ($($arg:tt)*) => {
        if $crate::verbose::is_verbose() {
            eprintln!($($arg)*);
        }
    };
}

pub(crate) use vprintln;

/// `eprintln!` unless `-q`.
macro_rules! dprintln {
    ($($arg:tt)*) => {
        if $crate::verbose::enabled($crate::verbose::Verbosity::Default) {
            eprintln!($($arg)*);
        }
    };
}

pub(crate) use dprintln;

/// Reports how long a scan step took when dropped under `-v`.
pub struct Timer {
    label: &'static str,
    start: Instant,
}

impl Timer {
    /// Starts timing `label`.
    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        if is_verbose() {
            eprintln!("  {}: {:.1?}", self.label, self.start.elapsed());
        }
    }
}
