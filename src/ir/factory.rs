use super::{Block, Function, FunctionKind, IrType};
use crate::SourceLocation;

/// A backend that can build functions.
///
/// Backends implement [`Factory::create`]; the per-kind constructors are the
/// surface render clients use.
pub trait Factory {
    type Block: Block;
    type Function: Function<Block = Self::Block>;

    fn create(
        &mut self,
        kind: FunctionKind,
        location: &SourceLocation,
        name: &str,
        export: bool,
        entry_block_name: &str,
        captures: &[IrType],
    ) -> Self::Function;

    /// The unit's top-level function. Must be created exactly once per render.
    fn create_file(
        &mut self,
        location: &SourceLocation,
        name: &str,
        entry_block_name: &str,
    ) -> Self::Function {
        self.create(FunctionKind::File, location, name, false, entry_block_name, &[])
    }

    fn create_definition(
        &mut self,
        location: &SourceLocation,
        name: &str,
        export: bool,
        entry_block_name: &str,
        captures: &[IrType],
    ) -> Self::Function {
        self.create(
            FunctionKind::Definition,
            location,
            name,
            export,
            entry_block_name,
            captures,
        )
    }

    fn create_override(
        &mut self,
        location: &SourceLocation,
        name: &str,
        export: bool,
        entry_block_name: &str,
        captures: &[IrType],
    ) -> Self::Function {
        self.create(
            FunctionKind::Override,
            location,
            name,
            export,
            entry_block_name,
            captures,
        )
    }

    fn create_accumulator(
        &mut self,
        location: &SourceLocation,
        name: &str,
        export: bool,
        entry_block_name: &str,
        captures: &[IrType],
    ) -> Self::Function {
        self.create(
            FunctionKind::Accumulator,
            location,
            name,
            export,
            entry_block_name,
            captures,
        )
    }

    fn create_collector(
        &mut self,
        location: &SourceLocation,
        name: &str,
        export: bool,
        entry_block_name: &str,
        captures: &[IrType],
    ) -> Self::Function {
        self.create(
            FunctionKind::Collector,
            location,
            name,
            export,
            entry_block_name,
            captures,
        )
    }

    fn create_distributor(
        &mut self,
        location: &SourceLocation,
        name: &str,
        export: bool,
        entry_block_name: &str,
        captures: &[IrType],
    ) -> Self::Function {
        self.create(
            FunctionKind::Distributor,
            location,
            name,
            export,
            entry_block_name,
            captures,
        )
    }
}
