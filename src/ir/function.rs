use std::fmt::{Display, Error, Formatter};

use super::{Block, IrType, ResultType};

/// Shorthand for the value type of a block type.
pub type ValueOf<B> = <B as Block>::Value;

/// Whether a compilation unit is a top-level file or a library fragment that
/// is evaluated inside a caller-supplied context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UnitKind {
    #[default]
    Root,
    Definition,
}

/// The six kinds of function a factory can create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    File,
    Definition,
    Override,
    Accumulator,
    Collector,
    Distributor,
}

impl FunctionKind {
    pub const ALL: [FunctionKind; 6] = [
        FunctionKind::File,
        FunctionKind::Definition,
        FunctionKind::Override,
        FunctionKind::Accumulator,
        FunctionKind::Collector,
        FunctionKind::Distributor,
    ];

    /// Parameters of the entry block, fixed by the kind.
    pub fn entry_parameters(self, unit: UnitKind) -> &'static [IrType] {
        match self {
            FunctionKind::File => match unit {
                UnitKind::Root => &[],
                UnitKind::Definition => &[IrType::Context],
            },
            FunctionKind::Definition | FunctionKind::Distributor => &[IrType::Context],
            FunctionKind::Override | FunctionKind::Accumulator => &[IrType::Context, IrType::Any],
            FunctionKind::Collector => &[IrType::Context, IrType::Fricassee],
        }
    }

    pub fn result(self) -> ResultType {
        match self {
            FunctionKind::Accumulator => ResultType::Accumulator,
            FunctionKind::Distributor => ResultType::Fricassee,
            FunctionKind::File
            | FunctionKind::Definition
            | FunctionKind::Override
            | FunctionKind::Collector => ResultType::Any,
        }
    }

    /// Tag of the value returned by `access`; the file function cannot be referenced.
    pub fn reference_type(self) -> Option<IrType> {
        match self {
            FunctionKind::File => None,
            FunctionKind::Definition => Some(IrType::Definition),
            FunctionKind::Override => Some(IrType::Override),
            FunctionKind::Accumulator => Some(IrType::Accumulator),
            FunctionKind::Collector => Some(IrType::Collector),
            FunctionKind::Distributor => Some(IrType::Distributor),
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            FunctionKind::File => "file",
            FunctionKind::Definition => "definition",
            FunctionKind::Override => "override",
            FunctionKind::Accumulator => "accumulator",
            FunctionKind::Collector => "collector",
            FunctionKind::Distributor => "distributor",
        }
    }
}

impl Display for FunctionKind {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        write!(f, "{}", self.keyword())
    }
}

/// A function under construction. Handles are cheap to clone.
///
/// `create_block`, `entry_block` and every block operation are only valid
/// until `finish`; `finish` itself is valid exactly once.
pub trait Function: Clone {
    type Block: Block;

    /// Bind `captures` and produce a reference to this function, usable from
    /// `block` in another function. Valid after `finish`.
    fn access(
        &self,
        block: &Self::Block,
        captures: &[ValueOf<Self::Block>],
    ) -> ValueOf<Self::Block>;

    fn capture(&self, index: usize) -> ValueOf<Self::Block>;

    fn captures(&self) -> usize;

    fn create_block(&self, name: &str, parameter_types: &[IrType]) -> Self::Block;

    fn entry_block(&self) -> Self::Block;

    fn finish(&self);

    fn result(&self) -> ResultType;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn file_entry_depends_on_unit() {
        assert!(FunctionKind::File.entry_parameters(UnitKind::Root).is_empty());
        assert_eq!(
            FunctionKind::File.entry_parameters(UnitKind::Definition),
            &[IrType::Context]
        );
    }

    #[test]
    fn only_file_is_inaccessible() {
        let inaccessible: Vec<_> = FunctionKind::ALL
            .into_iter()
            .filter(|kind| kind.reference_type().is_none())
            .collect();
        assert_eq!(inaccessible, [FunctionKind::File]);
        assert_eq!(
            FunctionKind::Distributor.result().return_type(),
            IrType::Fricassee
        );
    }
}
