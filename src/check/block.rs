use std::{cell::RefCell, rc::Rc};

use tracing::trace;

use super::{BlockKey, Checked, State};
use crate::{
    contract::{violated, ContractViolation},
    ir::{Arg, Block, Dispatch, Edge, IrType, Op, ResultType, RuntimeType, Slot, Terminator},
    SourceLocation,
};

#[derive(Clone)]
pub struct CheckBlock<'s> {
    pub(super) state: Rc<RefCell<State<'s>>>,
    pub(super) key: BlockKey,
}

/// Dispatch arms collected until `br_a` checks them.
pub struct CheckDispatch<'s> {
    arms: Vec<(RuntimeType, CheckBlock<'s>, Vec<Checked>)>,
}

impl<'s> Dispatch for CheckDispatch<'s> {
    type Block = CheckBlock<'s>;
    type Value = Checked;

    fn arm(&mut self, tag: RuntimeType, target: &CheckBlock<'s>, captures: &[Checked]) {
        self.arms.push((tag, target.clone(), captures.to_vec()));
    }
}

impl<'s> CheckBlock<'s> {
    /// Blocks from another checker have keys that mean nothing here.
    pub(super) fn ensure_same_checker(&self, state: &Rc<RefCell<State<'s>>>) {
        if !Rc::ptr_eq(&self.state, state) {
            let name = self.state.borrow().blocks[self.key].name.clone();
            violated(ContractViolation::ForeignBlock(name));
        }
    }

    fn check_instruction(&self, op: Op, args: &[Arg<Checked>]) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let operation = op.mnemonic();
        state.check_live(self.key, operation);

        let slots = op.operands();
        let malformed = slots.len() != args.len()
            || args.iter().zip(slots).any(|(arg, slot)| !arg.fits(*slot));
        if malformed {
            state.report(
                self.key,
                &format!("“{}” was called with malformed operands.", operation),
            );
            return;
        }
        for (arg, slot) in args.iter().zip(slots) {
            match (arg, slot) {
                (Arg::One(value), Slot::One(ty)) => {
                    state.check_value(self.key, operation, *ty, value)
                }
                (Arg::Many(values), Slot::Many(ty)) => {
                    for value in values {
                        state.check_value(self.key, operation, *ty, value);
                    }
                }
                (Arg::Context(context), Slot::Context) => {
                    if let Some(flavour) = op.flavour() {
                        if !flavour.allowed(*context) {
                            state.report(
                                self.key,
                                &format!("Illegal {} in {}.", flavour, context),
                            );
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn check_edge(
        &self,
        state: &mut State<'s>,
        operation: &str,
        edge: &Edge<Self>,
        payload: &[IrType],
    ) {
        edge.target.ensure_same_checker(&self.state);
        state.check_edge(self.key, operation, edge.target.key, &edge.arguments, payload);
    }
}

impl<'s> Block for CheckBlock<'s> {
    type Value = Checked;
    type Dispatch = CheckDispatch<'s>;

    fn emit(&self, op: Op, args: Vec<Arg<Checked>>) -> Checked {
        let ty = op
            .result()
            .unwrap_or_else(|| violated(ContractViolation::NoResult(op)));
        self.check_instruction(op, &args);
        Checked {
            function: self.state.borrow().blocks[self.key].function,
            ty,
        }
    }

    fn effect(&self, op: Op, args: Vec<Arg<Checked>>) {
        if op.result().is_some() {
            violated(ContractViolation::NotAnEffect(op));
        }
        self.check_instruction(op, &args);
    }

    fn terminate(&self, terminator: Terminator<Self>) {
        let operation = terminator.mnemonic();
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        state.check_live(self.key, operation);

        match &terminator {
            Terminator::Br(edge) => self.check_edge(state, operation, edge, &[]),
            Terminator::BrZ {
                condition,
                when_true,
                when_false,
            } => {
                state.check_value(self.key, operation, IrType::Bool, condition);
                self.check_edge(state, operation, when_true, &[]);
                self.check_edge(state, operation, when_false, &[]);
            }
            Terminator::BrA {
                value,
                dispatch,
                error: _,
            } => {
                state.check_value(self.key, operation, IrType::Any, value);
                if dispatch.arms.is_empty() {
                    state.report(self.key, "br.a has no branches.");
                }
                let mut seen = Vec::with_capacity(dispatch.arms.len());
                for (tag, target, captures) in &dispatch.arms {
                    target.ensure_same_checker(&self.state);
                    if seen.contains(tag) {
                        let message = format!(
                            "Attempted to add {}, but block for {} already present.",
                            state.blocks[target.key].name, tag
                        );
                        state.report(self.key, &message);
                        continue;
                    }
                    seen.push(*tag);
                    let payload: Vec<_> = tag.ir_type().into_iter().collect();
                    state.check_edge(self.key, operation, target.key, captures, &payload);
                }
            }
            Terminator::BrAa {
                left,
                right,
                int_path,
                float_path,
            } => {
                state.check_value(self.key, operation, IrType::Any, left);
                state.check_value(self.key, operation, IrType::Any, right);
                self.check_edge(state, operation, int_path, &[IrType::Int, IrType::Int]);
                self.check_edge(state, operation, float_path, &[IrType::Float, IrType::Float]);
            }
            Terminator::BrIa {
                left,
                right,
                int_path,
                float_path,
            } => {
                state.check_value(self.key, operation, IrType::Int, left);
                state.check_value(self.key, operation, IrType::Any, right);
                self.check_edge(state, operation, int_path, &[IrType::Int, IrType::Int]);
                self.check_edge(state, operation, float_path, &[IrType::Float, IrType::Float]);
            }
            Terminator::BrFa {
                left,
                right,
                float_path,
            } => {
                state.check_value(self.key, operation, IrType::Float, left);
                state.check_value(self.key, operation, IrType::Any, right);
                self.check_edge(state, operation, float_path, &[IrType::Float, IrType::Float]);
            }
            Terminator::Ret(value) => match state.result_of(self.key) {
                ResultType::Accumulator => state.report(self.key, "Incorrect return used."),
                result => state.check_value(self.key, operation, result.return_type(), value),
            },
            Terminator::RetBuilders { value, builders } => {
                if state.result_of(self.key) != ResultType::Accumulator {
                    state.report(self.key, "Incorrect return used.");
                } else {
                    state.check_value(self.key, operation, IrType::Any, value);
                    for builder in builders {
                        state.check_value(self.key, operation, IrType::Builder, builder);
                    }
                }
            }
            Terminator::Error(message) => {
                state.check_value(self.key, operation, IrType::Str, message)
            }
        }
        state.blocks[self.key].terminated = true;
    }

    fn parameter(&self, index: usize) -> Checked {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        state.ensure_block_open(self.key);
        let block = &state.blocks[self.key];
        let function = block.function;
        match block.parameters.get(index) {
            Some(ty) => Checked { function, ty: *ty },
            None => {
                let message = format!(
                    "Parameter {} out of bounds for block “{}”.",
                    index, block.name
                );
                state.report(self.key, &message);
                Checked {
                    function,
                    ty: IrType::Any,
                }
            }
        }
    }

    fn parameters(&self) -> usize {
        self.state.borrow().blocks[self.key].parameters.len()
    }

    fn create_dispatch(&self) -> CheckDispatch<'s> {
        CheckDispatch { arms: Vec::new() }
    }

    fn update(&self, location: &SourceLocation, message: &str) {
        let mut state = self.state.borrow_mut();
        state.ensure_block_open(self.key);
        trace!(%location, note = message, "moving block location");
        state.blocks[self.key].location = location.clone();
    }
}
