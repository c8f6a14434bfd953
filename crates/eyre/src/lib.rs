//! The `eyre` hook every binary in this workspace installs before doing
//! anything else: a `Debug` reporter that prints an error's cause chain as
//! an indented list instead of `eyre`'s default single-line dump.

use std::error::Error;
use std::fmt::{self, Write};

use indenter::indented;

/// Installs this crate's hook as the global `eyre` error reporter.
///
/// Safe to call more than once: `eyre::set_hook` errors if a hook is
/// already installed, which we swallow, since every caller just wants
/// *some* hook in place by the time errors are reported.
pub fn install() {
    let _ = eyre::set_hook(Box::new(|_| Box::new(Handler)));
}

struct Handler;

impl eyre::EyreHandler for Handler {
    fn debug(&self, error: &(dyn Error + 'static), f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            return fmt::Debug::fmt(error, f);
        }

        write!(f, "{error}")?;

        if let Some(cause) = error.source() {
            write!(f, "\n\nCaused by:")?;
            for (i, cause) in std::iter::successors(Some(cause), |e| e.source()).enumerate() {
                writeln!(f)?;
                write!(indented(f).ind(i), "{cause}")?;
            }
        }

        Ok(())
    }
}
