//! A backend that prints the IR as text, one instruction per line.
//!
//! The printer performs no checking: whatever the render client builds is
//! printed as-is, so pair it with the checker when the input is suspect.

mod block;

use std::{cell::RefCell, rc::Rc};

use tracing::{debug, instrument};

pub use block::{Printable, TextBlock, TextDispatch};

use block::BlockText;

use crate::{
    contract::{violated, ContractViolation},
    ir::{Factory, Function, FunctionKind, IrType, ResultType, UnitKind},
    Name, SourceLocation,
};

pub(crate) struct FunctionText {
    name: Name,
    header: String,
    blocks: Vec<Rc<RefCell<BlockText>>>,
    finished: bool,
}

pub struct Printer {
    unit: UnitKind,
    lines: Rc<RefCell<Vec<String>>>,
}

impl Printer {
    pub fn new(unit: UnitKind) -> Self {
        Printer {
            unit,
            lines: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// The lines of every finished function, in the order they were finished.
    pub fn into_lines(self) -> Vec<String> {
        self.lines.take()
    }
}

impl Factory for Printer {
    type Block = TextBlock;
    type Function = TextFunction;

    #[instrument(level = "debug", skip(self, location, captures))]
    fn create(
        &mut self,
        kind: FunctionKind,
        location: &SourceLocation,
        name: &str,
        export: bool,
        entry_block_name: &str,
        captures: &[IrType],
    ) -> TextFunction {
        let parameters = kind.entry_parameters(self.unit);
        let mut header = format!(
            "{}{} {}({})",
            if export { "export " } else { "" },
            kind,
            name,
            parameters
                .iter()
                .enumerate()
                .map(|(index, ty)| format!("p{}:{}", index, ty.letter()))
                .collect::<Vec<_>>()
                .join(", ")
        );
        if !captures.is_empty() {
            header.push_str(&format!(
                " captures({})",
                captures
                    .iter()
                    .enumerate()
                    .map(|(index, ty)| format!("c{}:{}", index, ty.letter()))
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
        header.push_str(&format!(" {{ # {}", location));

        let entry = Rc::new(RefCell::new(BlockText::new(entry_block_name, parameters)));
        TextFunction {
            inner: Rc::new(RefCell::new(FunctionText {
                name: Name::from(name),
                header,
                blocks: vec![entry],
                finished: false,
            })),
            output: self.lines.clone(),
            kind,
            captures: captures.to_vec(),
        }
    }
}

#[derive(Clone)]
pub struct TextFunction {
    inner: Rc<RefCell<FunctionText>>,
    output: Rc<RefCell<Vec<String>>>,
    kind: FunctionKind,
    captures: Vec<IrType>,
}

impl TextFunction {
    fn ensure_open(&self) {
        let inner = self.inner.borrow();
        if inner.finished {
            violated(ContractViolation::AlreadyFinished(inner.name.clone()));
        }
    }

    fn block(&self, inner: Rc<RefCell<BlockText>>) -> TextBlock {
        TextBlock {
            inner,
            function: self.inner.clone(),
        }
    }
}

impl Function for TextFunction {
    type Block = TextBlock;

    fn access(&self, block: &TextBlock, captures: &[Printable]) -> Printable {
        let name = self.inner.borrow().name.clone();
        block.bind(format!(
            "access {}({})",
            name,
            captures
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    fn capture(&self, index: usize) -> Printable {
        self.ensure_open();
        Printable::new(format!("c{}", index))
    }

    fn captures(&self) -> usize {
        self.captures.len()
    }

    fn create_block(&self, name: &str, parameter_types: &[IrType]) -> TextBlock {
        self.ensure_open();
        let block = Rc::new(RefCell::new(BlockText::new(name, parameter_types)));
        self.inner.borrow_mut().blocks.push(block.clone());
        self.block(block)
    }

    fn entry_block(&self) -> TextBlock {
        self.ensure_open();
        let entry = self.inner.borrow().blocks[0].clone();
        self.block(entry)
    }

    fn finish(&self) {
        self.ensure_open();
        let mut inner = self.inner.borrow_mut();
        inner.finished = true;
        debug!(function = %inner.name, kind = %self.kind, "printing");

        let mut output = self.output.borrow_mut();
        output.push(inner.header.clone());
        for block in &inner.blocks {
            let block = block.borrow();
            output.push(block.header());
            output.extend(block.lines.iter().cloned());
        }
        output.push("}".to_owned());
    }

    fn result(&self) -> ResultType {
        self.kind.result()
    }
}
