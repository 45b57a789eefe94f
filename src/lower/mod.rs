//! A backend-neutral lowering of the IR into a [`Module`].
//!
//! Lowering makes the run-time behaviour explicit: every `br.a` becomes a
//! complete nine-way switch whose missing arms raise a type error, and numeric
//! promotion branches become switches over the operand types.

mod module;

use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

use tracing::{debug, instrument, trace, warn};

pub use module::{
    library_name, Arm, BlockRef, Exit, FunctionRef, Instruction, Jump, LValue, LoweredBlock,
    LoweredFunction, Module, PromotionCase, Register, TypeError,
};

use crate::{
    contract::{violated, ContractViolation},
    ir::{
        Arg, Block, BlockGraph, Dispatch, Edge, Factory, Function, FunctionKind, IrType, Op,
        ResultType, RuntimeType, Terminator, UnitKind,
    },
    Name, SourceLocation,
};

struct State {
    unit: UnitKind,
    module: Module,
}

impl State {
    fn ensure_function_open(&self, function: FunctionRef) {
        let f = &self.module.functions[function];
        if f.finished {
            violated(ContractViolation::AlreadyFinished(f.name.clone()));
        }
    }

    /// Blocks may only change while their function is open and before they are terminated.
    fn ensure_block_open(&self, block: BlockRef) {
        let b = &self.module.blocks[block];
        let f = &self.module.functions[b.function];
        if f.finished {
            violated(ContractViolation::ModifiedAfterFinish {
                function: f.name.clone(),
                block: b.name.clone(),
            });
        }
        if b.exit.is_some() {
            violated(ContractViolation::AlreadyTerminated(b.name.clone()));
        }
    }

    fn new_block(&mut self, function: FunctionRef, name: &str, parameters: &[IrType]) -> BlockRef {
        self.module.blocks.insert(LoweredBlock {
            name: Name::from(name),
            function,
            parameters: parameters.to_vec(),
            instructions: Vec::new(),
            exit: None,
            successors: Vec::new(),
        })
    }

    /// Append an instruction and name its result.
    fn push(&mut self, block: BlockRef, instruction: Instruction, ty: IrType) -> LValue {
        self.ensure_block_open(block);
        let b = &mut self.module.blocks[block];
        let index = b.instructions.len();
        b.instructions.push(instruction);
        LValue {
            function: b.function,
            register: Register::Result { block, index },
            ty,
        }
    }
}

pub struct Lowering {
    state: Rc<RefCell<State>>,
}

impl Lowering {
    /// A lowering for the unit called `unit_name`; see [`library_name`].
    pub fn new(unit: UnitKind, unit_name: &str) -> Self {
        Lowering {
            state: Rc::new(RefCell::new(State {
                unit,
                module: Module::new(library_name(unit_name)),
            })),
        }
    }

    pub fn into_module(self) -> Module {
        let mut state = self.state.borrow_mut();
        let name = state.module.name().to_owned();
        std::mem::replace(&mut state.module, Module::new(name))
    }
}

impl Factory for Lowering {
    type Block = LowerBlock;
    type Function = LowerFunction;

    #[instrument(level = "debug", skip(self, location, captures))]
    fn create(
        &mut self,
        kind: FunctionKind,
        location: &SourceLocation,
        name: &str,
        export: bool,
        entry_block_name: &str,
        captures: &[IrType],
    ) -> LowerFunction {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let parameters = kind.entry_parameters(state.unit);
        let key = state.module.functions.insert_with_key(|key| {
            let entry = state.module.blocks.insert(LoweredBlock {
                name: Name::from(entry_block_name),
                function: key,
                parameters: parameters.to_vec(),
                instructions: Vec::new(),
                exit: None,
                successors: Vec::new(),
            });
            LoweredFunction {
                name: Name::from(name),
                kind,
                export,
                location: location.clone(),
                captures: captures.to_vec(),
                entry,
                blocks: vec![entry],
                finished: false,
            }
        });
        LowerFunction {
            state: self.state.clone(),
            key,
        }
    }
}

#[derive(Clone)]
pub struct LowerFunction {
    state: Rc<RefCell<State>>,
    key: FunctionRef,
}

impl LowerFunction {
    pub fn key(&self) -> FunctionRef {
        self.key
    }
}

impl Function for LowerFunction {
    type Block = LowerBlock;

    fn access(&self, block: &LowerBlock, captures: &[LValue]) -> LValue {
        let mut state = self.state.borrow_mut();
        let ty = state.module.functions[self.key]
            .kind
            .reference_type()
            .unwrap_or(IrType::Any);
        state.push(
            block.key,
            Instruction::Access {
                function: self.key,
                captures: captures.to_vec(),
            },
            ty,
        )
    }

    fn capture(&self, index: usize) -> LValue {
        let state = self.state.borrow();
        state.ensure_function_open(self.key);
        let function = &state.module.functions[self.key];
        let ty = function.captures.get(index).copied().unwrap_or_else(|| {
            warn!(function = %function.name, index, "capture out of bounds");
            IrType::Any
        });
        LValue {
            function: self.key,
            register: Register::Capture(index),
            ty,
        }
    }

    fn captures(&self) -> usize {
        self.state.borrow().module.functions[self.key].captures.len()
    }

    fn create_block(&self, name: &str, parameter_types: &[IrType]) -> LowerBlock {
        let mut state = self.state.borrow_mut();
        state.ensure_function_open(self.key);
        let key = state.new_block(self.key, name, parameter_types);
        state.module.functions[self.key].blocks.push(key);
        LowerBlock {
            state: self.state.clone(),
            key,
        }
    }

    fn entry_block(&self) -> LowerBlock {
        let state = self.state.borrow();
        state.ensure_function_open(self.key);
        LowerBlock {
            state: self.state.clone(),
            key: state.module.functions[self.key].entry,
        }
    }

    fn finish(&self) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        state.ensure_function_open(self.key);

        let function = &state.module.functions[self.key];
        let reachable = match state.module.reachable_from(function.entry) {
            Ok(reachable) => reachable,
            Err(_) => violated(ContractViolation::DanglingEdge {
                function: function.name.clone(),
                block: state.module.blocks[function.entry].name.clone(),
            }),
        };
        for block in &reachable {
            let b = &state.module.blocks[*block];
            if b.exit.is_none() {
                violated(ContractViolation::Unterminated {
                    function: function.name.clone(),
                    block: b.name.clone(),
                });
            }
        }

        let function = &mut state.module.functions[self.key];
        let blocks = &mut state.module.blocks;
        function.blocks.retain(|block| {
            let keep = reachable.contains(block);
            if !keep {
                if let Some(dropped) = blocks.remove(*block) {
                    trace!(block = %dropped.name, "dropping unreachable block");
                }
            }
            keep
        });
        function.finished = true;
        debug!(function = %function.name, blocks = function.blocks.len(), "lowered");
    }

    fn result(&self) -> ResultType {
        self.state.borrow().module.functions[self.key].kind.result()
    }
}

#[derive(Clone)]
pub struct LowerBlock {
    state: Rc<RefCell<State>>,
    key: BlockRef,
}

/// Arms registered so far; lowering fills in the rest.
pub struct LowerDispatch {
    arms: BTreeMap<RuntimeType, Jump>,
}

impl Dispatch for LowerDispatch {
    type Block = LowerBlock;
    type Value = LValue;

    fn arm(&mut self, tag: RuntimeType, target: &LowerBlock, captures: &[LValue]) {
        self.arms.insert(
            tag,
            Jump {
                target: target.key,
                arguments: captures.to_vec(),
            },
        );
    }
}

fn jump(edge: &Edge<LowerBlock>) -> Jump {
    Jump {
        target: edge.target.key,
        arguments: edge.arguments.clone(),
    }
}

fn numeric_error() -> TypeError {
    TypeError {
        expected: vec![RuntimeType::Float, RuntimeType::Int],
        context: None,
    }
}

fn promotion_case(
    left: RuntimeType,
    right: RuntimeType,
    target: &Edge<LowerBlock>,
) -> PromotionCase {
    let float_path = left == RuntimeType::Float || right == RuntimeType::Float;
    PromotionCase {
        left,
        right,
        promote_left: float_path && left == RuntimeType::Int,
        promote_right: float_path && right == RuntimeType::Int,
        target: jump(target),
    }
}

fn lower_switch(value: LValue, dispatch: &LowerDispatch, error: Option<&str>) -> Exit {
    let missing = TypeError {
        expected: dispatch.arms.keys().copied().collect(),
        context: error.map(str::to_owned),
    };
    let arms: Vec<_> = RuntimeType::ALL
        .into_iter()
        .map(|tag| match dispatch.arms.get(&tag) {
            Some(jump) => (tag, Arm::Jump(jump.clone())),
            None => (tag, Arm::Raise(missing.clone())),
        })
        .collect();
    trace!(
        handled = dispatch.arms.len(),
        raising = arms.len() - dispatch.arms.len(),
        "lowered dispatch"
    );
    Exit::Switch { value, arms }
}

fn lower(terminator: &Terminator<LowerBlock>) -> Exit {
    use RuntimeType::{Float, Int};

    match terminator {
        Terminator::Br(edge) => Exit::Jump(jump(edge)),
        Terminator::BrZ {
            condition,
            when_true,
            when_false,
        } => Exit::Branch {
            condition: *condition,
            when_true: jump(when_true),
            when_false: jump(when_false),
        },
        Terminator::BrA {
            value,
            dispatch,
            error,
        } => lower_switch(*value, dispatch, error.as_deref()),
        Terminator::BrAa {
            left,
            right,
            int_path,
            float_path,
        } => Exit::Promote {
            left: *left,
            right: *right,
            cases: vec![
                promotion_case(Int, Int, int_path),
                promotion_case(Int, Float, float_path),
                promotion_case(Float, Int, float_path),
                promotion_case(Float, Float, float_path),
            ],
            otherwise: numeric_error(),
        },
        Terminator::BrIa {
            left,
            right,
            int_path,
            float_path,
        } => Exit::Promote {
            left: *left,
            right: *right,
            cases: vec![
                promotion_case(Int, Int, int_path),
                promotion_case(Int, Float, float_path),
            ],
            otherwise: numeric_error(),
        },
        Terminator::BrFa {
            left,
            right,
            float_path,
        } => Exit::Promote {
            left: *left,
            right: *right,
            cases: vec![
                promotion_case(Float, Int, float_path),
                promotion_case(Float, Float, float_path),
            ],
            otherwise: numeric_error(),
        },
        Terminator::Ret(value) => Exit::Return {
            value: *value,
            builders: Vec::new(),
        },
        Terminator::RetBuilders { value, builders } => Exit::Return {
            value: *value,
            builders: builders.clone(),
        },
        Terminator::Error(message) => Exit::Raise { message: *message },
    }
}

impl Block for LowerBlock {
    type Value = LValue;
    type Dispatch = LowerDispatch;

    fn emit(&self, op: Op, args: Vec<Arg<LValue>>) -> LValue {
        let ty = op
            .result()
            .unwrap_or_else(|| violated(ContractViolation::NoResult(op)));
        self.state
            .borrow_mut()
            .push(self.key, Instruction::Op { op, args }, ty)
    }

    fn effect(&self, op: Op, args: Vec<Arg<LValue>>) {
        if op.result().is_some() {
            violated(ContractViolation::NotAnEffect(op));
        }
        let mut state = self.state.borrow_mut();
        state.ensure_block_open(self.key);
        state.module.blocks[self.key]
            .instructions
            .push(Instruction::Op { op, args });
    }

    fn terminate(&self, terminator: Terminator<Self>) {
        let exit = lower(&terminator);
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        state.ensure_block_open(self.key);
        let successors = exit.successors();
        let function = state.module.blocks[self.key].function;
        let outside = successors.iter().any(|target| {
            state
                .module
                .blocks
                .get(*target)
                .map_or(true, |target| target.function != function)
        });
        if outside {
            violated(ContractViolation::DanglingEdge {
                function: state.module.functions[function].name.clone(),
                block: state.module.blocks[self.key].name.clone(),
            });
        }
        let block = &mut state.module.blocks[self.key];
        block.successors = successors;
        block.exit = Some(exit);
    }

    fn parameter(&self, index: usize) -> LValue {
        let state = self.state.borrow();
        let block = &state.module.blocks[self.key];
        let function = &state.module.functions[block.function];
        if function.finished {
            violated(ContractViolation::ModifiedAfterFinish {
                function: function.name.clone(),
                block: block.name.clone(),
            });
        }
        let ty = block.parameters.get(index).copied().unwrap_or_else(|| {
            warn!(block = %block.name, index, "parameter out of bounds");
            IrType::Any
        });
        LValue {
            function: block.function,
            register: Register::Parameter {
                block: self.key,
                index,
            },
            ty,
        }
    }

    fn parameters(&self) -> usize {
        self.state.borrow().module.blocks[self.key].parameters.len()
    }

    fn create_dispatch(&self) -> LowerDispatch {
        LowerDispatch {
            arms: BTreeMap::new(),
        }
    }

    fn update(&self, location: &SourceLocation, message: &str) {
        let mut state = self.state.borrow_mut();
        state.ensure_block_open(self.key);
        state.module.blocks[self.key]
            .instructions
            .push(Instruction::Location {
                location: location.clone(),
                message: message.to_owned(),
            });
    }
}
