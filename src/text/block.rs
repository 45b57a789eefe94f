use std::{
    cell::RefCell,
    collections::BTreeMap,
    fmt::{Display, Error, Formatter},
    rc::Rc,
};

use super::FunctionText;
use crate::{
    contract::{violated, ContractViolation},
    ir::{Arg, Block, Dispatch, Edge, IrType, Op, RuntimeType, Terminator},
    Name, SourceLocation,
};

/// A value as printed: the name it was bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Printable(Rc<str>);

impl Printable {
    pub(super) fn new(name: String) -> Self {
        Printable(name.into())
    }
}

impl Display for Printable {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        write!(f, "{}", self.0)
    }
}

pub(super) struct BlockText {
    pub(super) name: Name,
    pub(super) parameters: Vec<IrType>,
    pub(super) lines: Vec<String>,
    counter: usize,
}

impl BlockText {
    pub(super) fn new(name: &str, parameters: &[IrType]) -> Self {
        BlockText {
            name: Name::from(name),
            parameters: parameters.to_vec(),
            lines: Vec::new(),
            counter: 0,
        }
    }

    pub(super) fn header(&self) -> String {
        format!(
            "block {}({}):",
            self.name,
            join(
                self.parameters
                    .iter()
                    .enumerate()
                    .map(|(index, ty)| format!("p{}:{}", index, ty.letter()))
            )
        )
    }

    fn next_value(&mut self) -> Printable {
        let value = Printable::new(format!("v{}_{}", self.name, self.counter));
        self.counter += 1;
        value
    }
}

fn join(items: impl Iterator<Item = String>) -> String {
    items.collect::<Vec<_>>().join(", ")
}

fn list(values: &[Printable]) -> String {
    format!("({})", join(values.iter().map(ToString::to_string)))
}

fn operand(arg: &Arg<Printable>) -> String {
    match arg {
        Arg::One(value) => value.to_string(),
        Arg::Many(values) => list(values),
        Arg::Int(value) => value.to_string(),
        Arg::Float(value) => format!("{:?}", value),
        Arg::Str(value) => format!("{:?}", value),
        Arg::Names(names) => format!(
            "({})",
            join(names.iter().map(|name| format!("{:?}", &**name)))
        ),
        Arg::Types(types) => format!(
            "({})",
            join(types.iter().map(|ty| ty.letter().to_string()))
        ),
        Arg::Context(context) => context.keyword().to_owned(),
    }
}

fn instruction(op: Op, args: &[Arg<Printable>]) -> String {
    if args.is_empty() {
        op.mnemonic().to_owned()
    } else {
        format!("{} {}", op.mnemonic(), join(args.iter().map(operand)))
    }
}

#[derive(Clone)]
pub struct TextBlock {
    pub(super) inner: Rc<RefCell<BlockText>>,
    pub(super) function: Rc<RefCell<FunctionText>>,
}

/// Arms are printed in runtime type order, whatever order they were added in.
pub struct TextDispatch {
    arms: BTreeMap<RuntimeType, String>,
}

impl Dispatch for TextDispatch {
    type Block = TextBlock;
    type Value = Printable;

    fn arm(&mut self, tag: RuntimeType, target: &TextBlock, captures: &[Printable]) {
        self.arms.insert(tag, target.reference(captures));
    }
}

impl TextBlock {
    fn ensure_open(&self) {
        let function = self.function.borrow();
        if function.finished {
            violated(ContractViolation::ModifiedAfterFinish {
                function: function.name.clone(),
                block: self.inner.borrow().name.clone(),
            });
        }
    }

    fn reference(&self, arguments: &[Printable]) -> String {
        format!("{}{}", self.inner.borrow().name, list(arguments))
    }

    fn edge(edge: &Edge<Self>) -> String {
        edge.target.reference(&edge.arguments)
    }

    pub(super) fn push(&self, line: String) {
        self.ensure_open();
        self.inner.borrow_mut().lines.push(line);
    }

    /// Append `line` as the definition of a fresh value.
    pub(super) fn bind(&self, line: String) -> Printable {
        self.ensure_open();
        let mut inner = self.inner.borrow_mut();
        let value = inner.next_value();
        inner.lines.push(format!("{} = {}", value, line));
        value
    }
}

impl Block for TextBlock {
    type Value = Printable;
    type Dispatch = TextDispatch;

    fn emit(&self, op: Op, args: Vec<Arg<Printable>>) -> Printable {
        self.bind(instruction(op, &args))
    }

    fn effect(&self, op: Op, args: Vec<Arg<Printable>>) {
        self.push(instruction(op, &args))
    }

    fn terminate(&self, terminator: Terminator<Self>) {
        let mnemonic = terminator.mnemonic();
        let line = match &terminator {
            Terminator::Br(edge) => format!("{} {}", mnemonic, Self::edge(edge)),
            Terminator::BrZ {
                condition,
                when_true,
                when_false,
            } => format!(
                "{} {}, {}, {}",
                mnemonic,
                condition,
                Self::edge(when_true),
                Self::edge(when_false)
            ),
            Terminator::BrA {
                value,
                dispatch,
                error,
            } => {
                let arms = join(
                    dispatch
                        .arms
                        .iter()
                        .map(|(tag, arm)| format!("{}:{}", tag.letter(), arm)),
                );
                match error {
                    Some(error) => format!("{} {}, {} {:?}", mnemonic, value, arms, error),
                    None => format!("{} {}, {}", mnemonic, value, arms),
                }
            }
            Terminator::BrAa {
                left,
                right,
                int_path,
                float_path,
            }
            | Terminator::BrIa {
                left,
                right,
                int_path,
                float_path,
            } => format!(
                "{} {}, {}, {}, {}",
                mnemonic,
                left,
                right,
                Self::edge(int_path),
                Self::edge(float_path)
            ),
            Terminator::BrFa {
                left,
                right,
                float_path,
            } => format!(
                "{} {}, {}, {}",
                mnemonic,
                left,
                right,
                Self::edge(float_path)
            ),
            Terminator::Ret(value) | Terminator::Error(value) => {
                format!("{} {}", mnemonic, value)
            }
            Terminator::RetBuilders { value, builders } => {
                format!("{} {}, {}", mnemonic, value, list(builders))
            }
        };
        self.push(line)
    }

    fn parameter(&self, index: usize) -> Printable {
        self.ensure_open();
        Printable::new(format!("{}.p{}", self.inner.borrow().name, index))
    }

    fn parameters(&self) -> usize {
        self.inner.borrow().parameters.len()
    }

    fn create_dispatch(&self) -> TextDispatch {
        TextDispatch {
            arms: BTreeMap::new(),
        }
    }

    fn update(&self, location: &SourceLocation, message: &str) {
        self.push(format!("# {}: {}", location, message))
    }
}
