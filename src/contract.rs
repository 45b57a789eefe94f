use thiserror::Error;

use crate::{ir::Op, Name};

/// Misuse of the builder's sequencing contract.
///
/// These are bugs in the render client, not in the program being compiled, so
/// every backend panics with this error's text instead of reporting a diagnostic.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    #[error("function `{0}` has already been finished")]
    AlreadyFinished(Name),
    #[error("function `{function}` was modified through block `{block}` after it was finished")]
    ModifiedAfterFinish { function: Name, block: Name },
    #[error("block `{block}` in function `{function}` is reachable but has no terminator")]
    Unterminated { function: Name, block: Name },
    #[error("block `{block}` in function `{function}` branches to a block outside the function")]
    DanglingEdge { function: Name, block: Name },
    #[error("block `{0}` has already been terminated")]
    AlreadyTerminated(Name),
    #[error("`{0}` produces a value and must be emitted, not used as an effect")]
    NotAnEffect(Op),
    #[error("`{0}` produces no value and must be used as an effect")]
    NoResult(Op),
    #[error("block `{0}` belongs to a different backend instance")]
    ForeignBlock(Name),
}

#[track_caller]
pub(crate) fn violated(violation: ContractViolation) -> ! {
    panic!("{}", violation)
}
