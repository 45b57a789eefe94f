#![allow(dead_code)]

use std::{cell::RefCell, rc::Rc};

use kws::{
    ir::{Arg, AttributeContext, Edge, Op, Terminator},
    prelude::*,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

pub fn location(line: usize) -> SourceLocation {
    SourceLocation::new("sample.flbgst", line, 0, line, 12)
}

/// A small unit exercising every function kind the tests care about: a
/// definition with a capture and a partial dispatch, an accumulator returning
/// builders, a distributor building a lazy chain, and a file function that
/// references the definition.
pub struct SampleUnit;

impl RenderClient for SampleUnit {
    fn render<F: Factory>(&self, factory: &mut F) {
        let file = factory.create_file(&location(1), "file", "entry");

        let total = factory.create_definition(&location(2), "total", true, "start", &[IrType::Int]);
        let start = total.entry_block();
        let on_int = total.create_block("on_int", &[IrType::Int, IrType::Int]);
        let on_str = total.create_block("on_str", &[IrType::Str]);
        start.update(&location(3), "x");
        let value = start.lookup(&start.parameter(0), &["x"]);
        let mut dispatch = start.create_dispatch();
        dispatch.dispatch_int(&on_int, &[total.capture(0)]);
        dispatch.dispatch_str(&on_str, &[]);
        start.br_a(&value, dispatch, Some("for x"));
        let sum = on_int.add_i(&on_int.parameter(0), &on_int.parameter(1));
        on_int.ret(&on_int.itoa(&sum));
        on_str.ret(&on_str.stoa(&on_str.parameter(0)));
        total.finish();

        let accumulator = factory.create_accumulator(&location(4), "sum", false, "entry", &[]);
        let entry = accumulator.entry_block();
        let name = entry.s("total");
        let builder = entry.new_x_sa(AttributeContext::FrameCreate, &name, &entry.parameter(1));
        entry.ret_builders(&entry.parameter(1), &[builder]);
        accumulator.finish();

        let pipeline = factory.create_distributor(&location(5), "pipeline", false, "entry", &[]);
        let entry = pipeline.entry_block();
        let context = entry.parameter(0);
        let frame = entry.new_r_i(&context, &entry.i(1), &entry.i(3));
        let chain = entry.rtoe(&frame, &context);
        entry.ret(&entry.take_ei(&chain, &entry.i(2)));
        pipeline.finish();

        let entry = file.entry_block();
        let one = entry.i(1);
        total.access(&entry, &[one.clone()]);
        let frame = entry.nil_r();
        entry.disperse_s(&frame, &entry.s("answer"), &entry.itoa(&one));
        entry.ret(&entry.nil_a());
        file.finish();
    }
}

/// One recorded builder call: what kind of call, the opcode, and the tags of
/// the values it consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub tag: &'static str,
    pub opcode: String,
    pub operands: Vec<IrType>,
}

pub type Log = Rc<RefCell<Vec<Event>>>;

/// Values handed out by a [`Stub`] backend.
pub trait StubValue: Clone {
    fn make(id: usize, ty: IrType) -> Self;
    fn tag(&self) -> IrType;
}

impl StubValue for IrType {
    fn make(_: usize, ty: IrType) -> Self {
        ty
    }

    fn tag(&self) -> IrType {
        *self
    }
}

impl StubValue for (usize, IrType) {
    fn make(id: usize, ty: IrType) -> Self {
        (id, ty)
    }

    fn tag(&self) -> IrType {
        self.1
    }
}

struct Shared {
    log: Log,
    next: RefCell<usize>,
}

impl Shared {
    fn record(&self, tag: &'static str, opcode: impl Into<String>, operands: Vec<IrType>) {
        self.log.borrow_mut().push(Event {
            tag,
            opcode: opcode.into(),
            operands,
        });
    }

    fn fresh<V: StubValue>(&self, ty: IrType) -> V {
        let mut next = self.next.borrow_mut();
        *next += 1;
        V::make(*next, ty)
    }
}

/// A backend that only records what it is asked to do.
pub struct Stub<V> {
    unit: UnitKind,
    shared: Rc<Shared>,
    marker: std::marker::PhantomData<V>,
}

impl<V> Stub<V> {
    pub fn new(unit: UnitKind) -> Self {
        Stub {
            unit,
            shared: Rc::new(Shared {
                log: Rc::default(),
                next: RefCell::new(0),
            }),
            marker: std::marker::PhantomData,
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.shared.log.borrow().clone()
    }
}

pub struct StubFunction<V> {
    shared: Rc<Shared>,
    kind: FunctionKind,
    name: String,
    entry: StubBlock<V>,
    captures: Vec<IrType>,
}

impl<V> Clone for StubFunction<V> {
    fn clone(&self) -> Self {
        StubFunction {
            shared: self.shared.clone(),
            kind: self.kind,
            name: self.name.clone(),
            entry: self.entry.clone(),
            captures: self.captures.clone(),
        }
    }
}

pub struct StubBlock<V> {
    shared: Rc<Shared>,
    name: String,
    parameters: Rc<Vec<IrType>>,
    marker: std::marker::PhantomData<V>,
}

impl<V> Clone for StubBlock<V> {
    fn clone(&self) -> Self {
        StubBlock {
            shared: self.shared.clone(),
            name: self.name.clone(),
            parameters: self.parameters.clone(),
            marker: std::marker::PhantomData,
        }
    }
}

pub struct StubDispatch<V> {
    shared: Rc<Shared>,
    marker: std::marker::PhantomData<V>,
}

fn tags<V: StubValue>(values: &[V]) -> Vec<IrType> {
    values.iter().map(StubValue::tag).collect()
}

fn edge_tags<V: StubValue>(edge: &Edge<StubBlock<V>>) -> Vec<IrType> {
    tags(&edge.arguments)
}

impl<V: StubValue> Factory for Stub<V> {
    type Block = StubBlock<V>;
    type Function = StubFunction<V>;

    fn create(
        &mut self,
        kind: FunctionKind,
        _location: &SourceLocation,
        name: &str,
        _export: bool,
        entry_block_name: &str,
        captures: &[IrType],
    ) -> StubFunction<V> {
        self.shared
            .record("create", kind.keyword(), captures.to_vec());
        StubFunction {
            shared: self.shared.clone(),
            kind,
            name: name.to_owned(),
            entry: StubBlock {
                shared: self.shared.clone(),
                name: entry_block_name.to_owned(),
                parameters: Rc::new(kind.entry_parameters(self.unit).to_vec()),
                marker: std::marker::PhantomData,
            },
            captures: captures.to_vec(),
        }
    }
}

impl<V: StubValue> Function for StubFunction<V> {
    type Block = StubBlock<V>;

    fn access(&self, _block: &StubBlock<V>, captures: &[V]) -> V {
        self.shared.record("access", self.name.clone(), tags(captures));
        self.shared
            .fresh(self.kind.reference_type().unwrap_or(IrType::Any))
    }

    fn capture(&self, index: usize) -> V {
        self.shared.fresh(self.captures[index])
    }

    fn captures(&self) -> usize {
        self.captures.len()
    }

    fn create_block(&self, name: &str, parameter_types: &[IrType]) -> StubBlock<V> {
        self.shared
            .record("block", name, parameter_types.to_vec());
        StubBlock {
            shared: self.shared.clone(),
            name: name.to_owned(),
            parameters: Rc::new(parameter_types.to_vec()),
            marker: std::marker::PhantomData,
        }
    }

    fn entry_block(&self) -> StubBlock<V> {
        self.entry.clone()
    }

    fn finish(&self) {
        self.shared.record("finish", self.name.clone(), Vec::new());
    }

    fn result(&self) -> ResultType {
        self.kind.result()
    }
}

impl<V: StubValue> Dispatch for StubDispatch<V> {
    type Block = StubBlock<V>;
    type Value = V;

    fn arm(&mut self, tag: RuntimeType, target: &StubBlock<V>, captures: &[V]) {
        self.shared.record(
            "arm",
            format!("{}:{}", tag.letter(), target.name),
            tags(captures),
        );
    }
}

impl<V: StubValue> Block for StubBlock<V> {
    type Value = V;
    type Dispatch = StubDispatch<V>;

    fn emit(&self, op: Op, args: Vec<Arg<V>>) -> V {
        self.effect(op, args);
        self.shared.fresh(op.result().unwrap_or(IrType::Any))
    }

    fn effect(&self, op: Op, args: Vec<Arg<V>>) {
        let operands = args.iter().flat_map(|arg| tags(arg.values())).collect();
        self.shared.record("op", op.mnemonic(), operands);
    }

    fn terminate(&self, terminator: Terminator<Self>) {
        let operands = match &terminator {
            Terminator::Br(edge) => edge_tags(edge),
            Terminator::BrZ {
                condition,
                when_true,
                when_false,
            } => [vec![condition.tag()], edge_tags(when_true), edge_tags(when_false)].concat(),
            Terminator::BrA { value, .. } => vec![value.tag()],
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
            } => [
                vec![left.tag(), right.tag()],
                edge_tags(int_path),
                edge_tags(float_path),
            ]
            .concat(),
            Terminator::BrFa {
                left,
                right,
                float_path,
            } => [vec![left.tag(), right.tag()], edge_tags(float_path)].concat(),
            Terminator::Ret(value) | Terminator::Error(value) => vec![value.tag()],
            Terminator::RetBuilders { value, builders } => {
                [vec![value.tag()], tags(builders)].concat()
            }
        };
        self.shared.record("terminate", terminator.mnemonic(), operands);
    }

    fn parameter(&self, index: usize) -> V {
        self.shared.fresh(self.parameters[index])
    }

    fn parameters(&self) -> usize {
        self.parameters.len()
    }

    fn create_dispatch(&self) -> StubDispatch<V> {
        StubDispatch {
            shared: self.shared.clone(),
            marker: std::marker::PhantomData,
        }
    }

    fn update(&self, _location: &SourceLocation, message: &str) {
        self.shared.record("update", message, Vec::new());
    }
}
