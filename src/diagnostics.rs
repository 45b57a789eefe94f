//! Where construction-time problems go.
//!
//! The checker never stops at the first problem; it reports every violation to a
//! [`DiagnosticSink`] and keeps building.

use std::{
    fmt::{self, Display, Formatter},
    io::Write,
};

use tracing::{error, warn};

use crate::SourceLocation;

pub trait DiagnosticSink {
    fn emit_error(&mut self, location: &SourceLocation, message: &str);

    /// Report one problem that involves several places in the source.
    fn emit_conflict(&mut self, message: &str, locations: &[(SourceLocation, String)]);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    Error {
        location: SourceLocation,
        message: String,
    },
    Conflict {
        message: String,
        locations: Vec<(SourceLocation, String)>,
    },
}

impl Diagnostic {
    pub fn message(&self) -> &str {
        match self {
            Diagnostic::Error { message, .. } | Diagnostic::Conflict { message, .. } => message,
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Error { location, message } => write!(f, "{}: {}", location, message),
            Diagnostic::Conflict { message, locations } => {
                write!(f, "{}", message)?;
                for (location, detail) in locations {
                    write!(f, "\n{}: {}", location, detail)?;
                }
                Ok(())
            }
        }
    }
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn emit_error(&mut self, location: &SourceLocation, message: &str) {
        self.push(Diagnostic::Error {
            location: location.clone(),
            message: message.to_owned(),
        });
    }

    fn emit_conflict(&mut self, message: &str, locations: &[(SourceLocation, String)]) {
        self.push(Diagnostic::Conflict {
            message: message.to_owned(),
            locations: locations.to_vec(),
        });
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn emit_error(&mut self, location: &SourceLocation, message: &str) {
        (**self).emit_error(location, message)
    }

    fn emit_conflict(&mut self, message: &str, locations: &[(SourceLocation, String)]) {
        (**self).emit_conflict(message, locations)
    }
}

/// Writes each diagnostic as text lines to a stream such as stderr.
pub struct WriterSink<W: Write>(pub W);

impl<W: Write> WriterSink<W> {
    fn write(&mut self, diagnostic: Diagnostic) {
        if let Err(e) = writeln!(self.0, "{}", diagnostic) {
            warn!(error = %e, "failed to write diagnostic");
        }
    }

    pub fn into_inner(self) -> W {
        self.0
    }
}

impl<W: Write> DiagnosticSink for WriterSink<W> {
    fn emit_error(&mut self, location: &SourceLocation, message: &str) {
        self.write(Diagnostic::Error {
            location: location.clone(),
            message: message.to_owned(),
        })
    }

    fn emit_conflict(&mut self, message: &str, locations: &[(SourceLocation, String)]) {
        self.write(Diagnostic::Conflict {
            message: message.to_owned(),
            locations: locations.to_vec(),
        })
    }
}

/// Reports diagnostics as `tracing` error events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit_error(&mut self, location: &SourceLocation, message: &str) {
        error!(%location, "{}", message);
    }

    fn emit_conflict(&mut self, message: &str, locations: &[(SourceLocation, String)]) {
        error!(places = locations.len(), "{}", message);
        for (location, detail) in locations {
            error!(%location, "{}", detail);
        }
    }
}
