//! A backend that builds nothing and reports every construction-time problem.

mod block;

use std::{cell::RefCell, rc::Rc};

use slotmap::{new_key_type, SlotMap};
use tracing::{debug, instrument};

pub use block::{CheckBlock, CheckDispatch};

use crate::{
    contract::{violated, ContractViolation},
    diagnostics::DiagnosticSink,
    ir::{BlockGraph, Factory, Function, FunctionKind, IrType, ResultType, UnitKind},
    Name, SourceLocation,
};

new_key_type! {
    pub struct FunctionKey;
    pub struct BlockKey;
}

/// A value as the checker sees it: who produced it, and its tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checked {
    function: FunctionKey,
    ty: IrType,
}

impl Checked {
    pub fn ty(&self) -> IrType {
        self.ty
    }
}

struct FunctionState {
    kind: FunctionKind,
    name: Name,
    location: SourceLocation,
    captures: Vec<IrType>,
    entry: BlockKey,
    finished: bool,
}

struct BlockState {
    function: FunctionKey,
    name: Name,
    parameters: Vec<IrType>,
    location: SourceLocation,
    terminated: bool,
    successors: Vec<BlockKey>,
}

struct State<'s> {
    sink: &'s mut dyn DiagnosticSink,
    unit: UnitKind,
    file_created: bool,
    functions: SlotMap<FunctionKey, FunctionState>,
    blocks: SlotMap<BlockKey, BlockState>,
}

impl BlockGraph for State<'_> {
    type Key = BlockKey;

    fn successors(&self, block: BlockKey) -> Option<&[BlockKey]> {
        self.blocks.get(block).map(|b| b.successors.as_slice())
    }
}

impl<'s> State<'s> {
    /// Report at the block's most recent location.
    fn report(&mut self, block: BlockKey, message: &str) {
        let location = self.blocks[block].location.clone();
        self.sink.emit_error(&location, message);
    }

    fn ensure_function_open(&self, function: FunctionKey) {
        let f = &self.functions[function];
        if f.finished {
            violated(ContractViolation::AlreadyFinished(f.name.clone()));
        }
    }

    fn ensure_block_open(&self, block: BlockKey) {
        let b = &self.blocks[block];
        let f = &self.functions[b.function];
        if f.finished {
            violated(ContractViolation::ModifiedAfterFinish {
                function: f.name.clone(),
                block: b.name.clone(),
            });
        }
    }

    fn check_live(&mut self, block: BlockKey, operation: &str) {
        self.ensure_block_open(block);
        if self.blocks[block].terminated {
            self.report(
                block,
                &format!("“{}” was called after terminal instruction.", operation),
            );
        }
    }

    fn check_value(&mut self, block: BlockKey, operation: &str, expected: IrType, value: &Checked) {
        if value.function != self.blocks[block].function {
            self.report(
                block,
                &format!("“{}” was called with parameter from another function.", operation),
            );
        } else if value.ty != expected {
            self.report(
                block,
                &format!(
                    "“{}” expected {} but was given {}.",
                    operation, expected, value.ty
                ),
            );
        }
    }

    /// Record a control-flow edge and check the values it passes against the
    /// target's parameters. `payload` is what the branch itself appends after
    /// `arguments` (unboxed values for dispatch and promotion).
    fn check_edge(
        &mut self,
        block: BlockKey,
        operation: &str,
        target: BlockKey,
        arguments: &[Checked],
        payload: &[IrType],
    ) {
        if self.blocks[target].function != self.blocks[block].function {
            self.report(
                block,
                &format!("Target block for “{}” not from this function.", operation),
            );
            return;
        }
        self.blocks[block].successors.push(target);

        let parameters = self.blocks[target].parameters.clone();
        let supplied = arguments.len() + payload.len();
        if parameters.len() != supplied {
            let message = format!(
                "“{}” passes {} arguments to block “{}”, which takes {}.",
                operation,
                supplied,
                self.blocks[target].name,
                parameters.len()
            );
            self.report(block, &message);
            return;
        }
        for (argument, expected) in arguments.iter().zip(&parameters) {
            self.check_value(block, operation, *expected, argument);
        }
        for (index, (actual, expected)) in payload
            .iter()
            .zip(&parameters[arguments.len()..])
            .enumerate()
        {
            if actual != expected {
                let message = format!(
                    "“{}” passes {} as parameter {} of block “{}”, which expects {}.",
                    operation,
                    actual,
                    arguments.len() + index,
                    self.blocks[target].name,
                    expected
                );
                self.report(block, &message);
            }
        }
    }

    fn result_of(&self, block: BlockKey) -> ResultType {
        self.functions[self.blocks[block].function].kind.result()
    }
}

/// The API-usage checker. Create one per render, then call [`Checker::complete`].
pub struct Checker<'s> {
    state: Rc<RefCell<State<'s>>>,
}

impl<'s> Checker<'s> {
    pub fn new(sink: &'s mut dyn DiagnosticSink, unit: UnitKind) -> Self {
        Checker {
            state: Rc::new(RefCell::new(State {
                sink,
                unit,
                file_created: false,
                functions: SlotMap::with_key(),
                blocks: SlotMap::with_key(),
            })),
        }
    }

    /// Report what can only be known once the render is over: a missing file
    /// function and functions that were never finished.
    pub fn complete(self) {
        let mut guard = self.state.borrow_mut();
        let State {
            sink,
            file_created,
            functions,
            ..
        } = &mut *guard;
        if !*file_created {
            sink.emit_error(&SourceLocation::unknown(), "File function was never created.");
        }
        for function in functions.values().filter(|f| !f.finished) {
            sink.emit_error(
                &function.location,
                &format!("Function “{}” was never finished.", function.name),
            );
        }
    }
}

impl<'s> Factory for Checker<'s> {
    type Block = CheckBlock<'s>;
    type Function = CheckFunction<'s>;

    #[instrument(level = "debug", skip(self, location, captures))]
    fn create(
        &mut self,
        kind: FunctionKind,
        location: &SourceLocation,
        name: &str,
        export: bool,
        entry_block_name: &str,
        captures: &[IrType],
    ) -> CheckFunction<'s> {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        if kind == FunctionKind::File {
            if state.file_created {
                state
                    .sink
                    .emit_error(location, "File function has already been created.");
            }
            state.file_created = true;
        }

        let parameters = kind.entry_parameters(state.unit).to_vec();
        let key = state.functions.insert_with_key(|key| {
            let entry = state.blocks.insert(BlockState {
                function: key,
                name: Name::from(entry_block_name),
                parameters,
                location: location.clone(),
                terminated: false,
                successors: Vec::new(),
            });
            FunctionState {
                kind,
                name: Name::from(name),
                location: location.clone(),
                captures: captures.to_vec(),
                entry,
                finished: false,
            }
        });

        CheckFunction {
            state: self.state.clone(),
            key,
        }
    }
}

#[derive(Clone)]
pub struct CheckFunction<'s> {
    state: Rc<RefCell<State<'s>>>,
    key: FunctionKey,
}

impl<'s> Function for CheckFunction<'s> {
    type Block = CheckBlock<'s>;

    fn access(&self, block: &CheckBlock<'s>, captures: &[Checked]) -> Checked {
        block.ensure_same_checker(&self.state);
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        state.check_live(block.key, "access");

        let caller = state.blocks[block.key].function;
        let callee = &state.functions[self.key];
        let kind = callee.kind;
        let name = callee.name.clone();
        let expected = callee.captures.clone();

        let ty = match kind.reference_type() {
            Some(ty) => ty,
            None => {
                state.report(
                    block.key,
                    &format!("File function “{}” cannot be accessed.", name),
                );
                IrType::Any
            }
        };
        if expected.len() != captures.len() {
            state.report(
                block.key,
                &format!(
                    "Function “{}” takes {} captures, but {} were given.",
                    name,
                    expected.len(),
                    captures.len()
                ),
            );
        } else {
            for (capture, ty) in captures.iter().zip(expected) {
                state.check_value(block.key, "access", ty, capture);
            }
        }
        Checked {
            function: caller,
            ty,
        }
    }

    fn capture(&self, index: usize) -> Checked {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        state.ensure_function_open(self.key);
        let function = &state.functions[self.key];
        match function.captures.get(index) {
            Some(ty) => Checked {
                function: self.key,
                ty: *ty,
            },
            None => {
                let location = function.location.clone();
                let message = format!(
                    "Capture {} out of bounds for function “{}”.",
                    index, function.name
                );
                state.sink.emit_error(&location, &message);
                Checked {
                    function: self.key,
                    ty: IrType::Any,
                }
            }
        }
    }

    fn captures(&self) -> usize {
        self.state.borrow().functions[self.key].captures.len()
    }

    fn create_block(&self, name: &str, parameter_types: &[IrType]) -> CheckBlock<'s> {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        state.ensure_function_open(self.key);
        let function = &state.functions[self.key];
        debug!(function = %function.name, block = name, "creating block");
        let location = function.location.clone();
        let key = state.blocks.insert(BlockState {
            function: self.key,
            name: Name::from(name),
            parameters: parameter_types.to_vec(),
            location,
            terminated: false,
            successors: Vec::new(),
        });
        CheckBlock {
            state: self.state.clone(),
            key,
        }
    }

    fn entry_block(&self) -> CheckBlock<'s> {
        let state = self.state.borrow();
        state.ensure_function_open(self.key);
        CheckBlock {
            state: self.state.clone(),
            key: state.functions[self.key].entry,
        }
    }

    fn finish(&self) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        state.ensure_function_open(self.key);

        let entry = state.functions[self.key].entry;
        let reachable = match state.reachable_from(entry) {
            Ok(reachable) => reachable,
            Err(_) => violated(ContractViolation::DanglingEdge {
                function: state.functions[self.key].name.clone(),
                block: state.blocks[entry].name.clone(),
            }),
        };
        let unterminated: Vec<_> = reachable
            .into_iter()
            .filter(|block| !state.blocks[*block].terminated)
            .collect();
        for block in unterminated {
            let message = format!(
                "Block “{}” has no terminal instruction.",
                state.blocks[block].name
            );
            state.report(block, &message);
        }
        state.functions[self.key].finished = true;
        debug!(function = %state.functions[self.key].name, "finished");
    }

    fn result(&self) -> ResultType {
        self.state.borrow().functions[self.key].kind.result()
    }
}
