use slotmap::{new_key_type, HopSlotMap, SlotMap};

use crate::{
    ir::{Arg, BlockGraph, FunctionKind, IrType, Op, RuntimeType},
    Name, SourceLocation,
};

new_key_type! {
    pub struct FunctionRef;
    pub struct BlockRef;
}

/// Artifact name for a unit, e.g. `lib/net/http` lowers to `kws.library.lib.net.http`.
pub fn library_name(unit_name: &str) -> String {
    format!("kws.library.{}", unit_name.replace('/', "."))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    Parameter { block: BlockRef, index: usize },
    Capture(usize),
    /// The value produced by the instruction at `index` in `block`.
    Result { block: BlockRef, index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LValue {
    pub function: FunctionRef,
    pub register: Register,
    pub ty: IrType,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Op { op: Op, args: Vec<Arg<LValue>> },
    Access {
        function: FunctionRef,
        captures: Vec<LValue>,
    },
    Location {
        location: SourceLocation,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Jump {
    pub target: BlockRef,
    pub arguments: Vec<LValue>,
}

/// The runtime error raised when a boxed value has a type no arm handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeError {
    pub expected: Vec<RuntimeType>,
    pub context: Option<String>,
}

impl TypeError {
    pub fn message(&self, actual: RuntimeType) -> String {
        if self.expected.is_empty() {
            return match &self.context {
                Some(context) => format!("Unexpected {} {}.", actual, context),
                None => format!("Unexpected {}.", actual),
            };
        }
        let expected = self
            .expected
            .iter()
            .map(|ty| ty.pretty_name())
            .collect::<Vec<_>>()
            .join(" or ");
        match &self.context {
            Some(context) => format!("Expected {} {}, but got {}.", expected, context, actual),
            None => format!("Expected {}, but got {}.", expected, actual),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arm {
    /// Jump with the unboxed value appended to the arguments.
    Jump(Jump),
    Raise(TypeError),
}

/// One row of a numeric promotion switch. Operands marked for promotion are
/// converted from int to float before being appended to the jump's arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionCase {
    pub left: RuntimeType,
    pub right: RuntimeType,
    pub promote_left: bool,
    pub promote_right: bool,
    pub target: Jump,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exit {
    Jump(Jump),
    Branch {
        condition: LValue,
        when_true: Jump,
        when_false: Jump,
    },
    /// A complete switch: exactly one arm per runtime type, in type order.
    Switch {
        value: LValue,
        arms: Vec<(RuntimeType, Arm)>,
    },
    Promote {
        left: LValue,
        right: LValue,
        cases: Vec<PromotionCase>,
        otherwise: TypeError,
    },
    Return {
        value: LValue,
        builders: Vec<LValue>,
    },
    Raise {
        message: LValue,
    },
}

impl Exit {
    pub fn successors(&self) -> Vec<BlockRef> {
        match self {
            Exit::Jump(jump) => vec![jump.target],
            Exit::Branch {
                when_true,
                when_false,
                ..
            } => vec![when_true.target, when_false.target],
            Exit::Switch { arms, .. } => arms
                .iter()
                .filter_map(|(_, arm)| match arm {
                    Arm::Jump(jump) => Some(jump.target),
                    Arm::Raise(_) => None,
                })
                .collect(),
            Exit::Promote { cases, .. } => cases.iter().map(|case| case.target.target).collect(),
            Exit::Return { .. } | Exit::Raise { .. } => Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct LoweredBlock {
    pub name: Name,
    pub function: FunctionRef,
    pub parameters: Vec<IrType>,
    pub instructions: Vec<Instruction>,
    pub exit: Option<Exit>,
    pub(super) successors: Vec<BlockRef>,
}

#[derive(Debug)]
pub struct LoweredFunction {
    pub name: Name,
    pub kind: FunctionKind,
    pub export: bool,
    pub location: SourceLocation,
    pub captures: Vec<IrType>,
    pub entry: BlockRef,
    pub blocks: Vec<BlockRef>,
    pub(super) finished: bool,
}

/// A lowered unit, ready for an emitter.
#[derive(Debug)]
pub struct Module {
    name: String,
    pub(super) functions: SlotMap<FunctionRef, LoweredFunction>,
    pub(super) blocks: HopSlotMap<BlockRef, LoweredBlock>,
}

impl Module {
    pub(super) fn new(name: String) -> Self {
        Module {
            name,
            functions: SlotMap::with_key(),
            blocks: HopSlotMap::with_key(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn functions(&self) -> impl Iterator<Item = (FunctionRef, &LoweredFunction)> {
        self.functions.iter()
    }

    pub fn function(&self, function: FunctionRef) -> Option<&LoweredFunction> {
        self.functions.get(function)
    }

    pub fn function_named(&self, name: &str) -> Option<&LoweredFunction> {
        self.functions.values().find(|f| &*f.name == name)
    }

    pub fn block(&self, block: BlockRef) -> Option<&LoweredBlock> {
        self.blocks.get(block)
    }

    /// Find a block of `function` by name.
    pub fn block_named(&self, function: &LoweredFunction, name: &str) -> Option<&LoweredBlock> {
        function
            .blocks
            .iter()
            .filter_map(|block| self.blocks.get(*block))
            .find(|block| &*block.name == name)
    }
}

impl BlockGraph for Module {
    type Key = BlockRef;

    fn successors(&self, block: BlockRef) -> Option<&[BlockRef]> {
        self.blocks.get(block).map(|b| b.successors.as_slice())
    }
}
