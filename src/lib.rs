//! KWS: a typed, single-static-assignment instruction set for a lazily evaluated
//! configuration language, with one construction trace replayed against
//! interchangeable backends.
//!
//! A compiled unit implements [`RenderClient`]; each backend implements
//! [`ir::Factory`]. The crate ships three backends: [`check::Checker`]
//! (diagnostics only), [`text::Printer`] (disassembly) and [`lower::Lowering`]
//! (a backend-neutral module for emitters).

#[macro_use]
pub mod atoms {
    include!(concat!(env!("OUT_DIR"), "/name_atom.rs"));
}

pub mod check;
pub mod concurrent;
mod contract;
pub mod diagnostics;
pub mod ir;
pub mod location;
pub mod lower;
mod render;
pub mod text;

pub use contract::ContractViolation;
pub use diagnostics::{Diagnostic, DiagnosticSink};
pub use location::SourceLocation;
pub use render::{check_api_usage, lower, pretty_print, RenderClient};

/// Interned name used for functions, blocks and lookups.
pub type Name = atoms::NameAtom;

pub mod prelude {
    pub use crate::ir::{
        Block, Dispatch, Factory, Function, FunctionKind, Instructions, IrType, ResultType,
        RuntimeType, UnitKind,
    };
    pub use crate::{RenderClient, SourceLocation};
}
