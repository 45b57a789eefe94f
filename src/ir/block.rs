use super::{Arg, Dispatch, Op};
use crate::SourceLocation;

/// A transfer of control to `target`, supplying its leading parameters.
pub struct Edge<B: Block> {
    pub target: B,
    pub arguments: Vec<B::Value>,
}

impl<B: Block> Edge<B> {
    pub fn new(target: &B, arguments: &[B::Value]) -> Self {
        Edge {
            target: target.clone(),
            arguments: arguments.to_vec(),
        }
    }
}

/// The single instruction that ends a block.
pub enum Terminator<B: Block> {
    Br(Edge<B>),
    /// Branch on a bool.
    BrZ {
        condition: B::Value,
        when_true: Edge<B>,
        when_false: Edge<B>,
    },
    /// Branch on the runtime type of a boxed value. Missing arms raise a type
    /// error mentioning `error` at run time.
    BrA {
        value: B::Value,
        dispatch: B::Dispatch,
        error: Option<String>,
    },
    /// Numeric promotion of two boxed values. Both ints go to `int_path` with
    /// the unboxed pair appended; otherwise both are promoted to floats.
    BrAa {
        left: B::Value,
        right: B::Value,
        int_path: Edge<B>,
        float_path: Edge<B>,
    },
    /// Numeric promotion of an unboxed int against a boxed value.
    BrIa {
        left: B::Value,
        right: B::Value,
        int_path: Edge<B>,
        float_path: Edge<B>,
    },
    /// Numeric promotion of an unboxed float against a boxed value.
    BrFa {
        left: B::Value,
        right: B::Value,
        float_path: Edge<B>,
    },
    Ret(B::Value),
    /// Return from an accumulator: the value plus the builders to apply.
    RetBuilders {
        value: B::Value,
        builders: Vec<B::Value>,
    },
    /// Raise a runtime error with a string message.
    Error(B::Value),
}

impl<B: Block> Terminator<B> {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Terminator::Br(_) => "br",
            Terminator::BrZ { .. } => "br.z",
            Terminator::BrA { .. } => "br.a",
            Terminator::BrAa { .. } => "br.aa",
            Terminator::BrIa { .. } => "br.ia",
            Terminator::BrFa { .. } => "br.fa",
            Terminator::Ret(_) | Terminator::RetBuilders { .. } => "ret",
            Terminator::Error(_) => "error",
        }
    }
}

/// A basic block under construction.
///
/// Handles are cheap to clone and all clones refer to the same block. The
/// backend hooks are `emit`, `effect` and `terminate`; the per-instruction
/// methods live on [`Instructions`](super::Instructions) and the terminator
/// helpers below all funnel into `terminate`.
pub trait Block: Clone {
    type Value: Clone;
    type Dispatch: Dispatch<Block = Self, Value = Self::Value>;

    /// Append a value-producing instruction.
    fn emit(&self, op: Op, args: Vec<Arg<Self::Value>>) -> Self::Value;

    /// Append an instruction that produces no value.
    fn effect(&self, op: Op, args: Vec<Arg<Self::Value>>);

    fn terminate(&self, terminator: Terminator<Self>);

    fn parameter(&self, index: usize) -> Self::Value;

    fn parameters(&self) -> usize;

    fn create_dispatch(&self) -> Self::Dispatch;

    /// Attribute the instructions that follow to `location`.
    fn update(&self, location: &SourceLocation, message: &str);

    fn br(&self, target: &Self, arguments: &[Self::Value]) {
        self.terminate(Terminator::Br(Edge::new(target, arguments)))
    }

    fn br_z(
        &self,
        condition: &Self::Value,
        true_target: &Self,
        true_arguments: &[Self::Value],
        false_target: &Self,
        false_arguments: &[Self::Value],
    ) {
        self.terminate(Terminator::BrZ {
            condition: condition.clone(),
            when_true: Edge::new(true_target, true_arguments),
            when_false: Edge::new(false_target, false_arguments),
        })
    }

    fn br_a(&self, value: &Self::Value, dispatch: Self::Dispatch, error: Option<&str>) {
        self.terminate(Terminator::BrA {
            value: value.clone(),
            dispatch,
            error: error.map(str::to_owned),
        })
    }

    fn br_aa(
        &self,
        left: &Self::Value,
        right: &Self::Value,
        int_target: &Self,
        int_arguments: &[Self::Value],
        float_target: &Self,
        float_arguments: &[Self::Value],
    ) {
        self.terminate(Terminator::BrAa {
            left: left.clone(),
            right: right.clone(),
            int_path: Edge::new(int_target, int_arguments),
            float_path: Edge::new(float_target, float_arguments),
        })
    }

    fn br_ia(
        &self,
        left: &Self::Value,
        right: &Self::Value,
        int_target: &Self,
        int_arguments: &[Self::Value],
        float_target: &Self,
        float_arguments: &[Self::Value],
    ) {
        self.terminate(Terminator::BrIa {
            left: left.clone(),
            right: right.clone(),
            int_path: Edge::new(int_target, int_arguments),
            float_path: Edge::new(float_target, float_arguments),
        })
    }

    fn br_fa(
        &self,
        left: &Self::Value,
        right: &Self::Value,
        target: &Self,
        arguments: &[Self::Value],
    ) {
        self.terminate(Terminator::BrFa {
            left: left.clone(),
            right: right.clone(),
            float_path: Edge::new(target, arguments),
        })
    }

    fn ret(&self, value: &Self::Value) {
        self.terminate(Terminator::Ret(value.clone()))
    }

    fn ret_builders(&self, value: &Self::Value, builders: &[Self::Value]) {
        self.terminate(Terminator::RetBuilders {
            value: value.clone(),
            builders: builders.to_vec(),
        })
    }

    fn error(&self, message: &Self::Value) {
        self.terminate(Terminator::Error(message.clone()))
    }
}
