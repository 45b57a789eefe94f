//! The builder contract shared by every backend.

mod attribute;
mod block;
mod dispatch;
mod factory;
mod function;
mod ops;
mod query;
mod types;

pub use attribute::{AttributeContext, AttributeFlavour};
pub use block::{Block, Edge, Terminator};
pub use dispatch::Dispatch;
pub use factory::Factory;
pub use function::{Function, FunctionKind, UnitKind, ValueOf};
pub use ops::{Arg, Instructions, Op, Slot};
pub use query::{BlockGraph, TraversalError};
pub use types::{IrType, ResultType, RuntimeType};
