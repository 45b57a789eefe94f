mod common;

use common::location;
use kws::{lower::Lowering, prelude::*, text::Printer};

#[test]
#[should_panic(expected = "was modified through block `entry` after it was finished")]
fn printer_rejects_emit_after_finish() {
    let mut printer = Printer::new(UnitKind::Root);
    let file = printer.create_file(&location(1), "file", "entry");
    let entry = file.entry_block();
    entry.ret(&entry.nil_a());
    file.finish();
    entry.i(7);
}

#[test]
#[should_panic(expected = "function `def` has already been finished")]
fn lowering_rejects_finish_twice() {
    let mut lowering = Lowering::new(UnitKind::Root, "unit");
    let def = lowering.create_definition(&location(1), "def", false, "entry", &[]);
    let entry = def.entry_block();
    entry.ret(&entry.nil_a());
    def.finish();
    def.finish();
}

#[test]
#[should_panic(expected = "`disperse.s` produces no value and must be used as an effect")]
fn effects_cannot_be_emitted() {
    let mut lowering = Lowering::new(UnitKind::Root, "unit");
    let file = lowering.create_file(&location(1), "file", "entry");
    file.entry_block().emit(kws::ir::Op::DisperseS, Vec::new());
}

#[test]
fn access_is_allowed_after_finish() {
    let mut lowering = Lowering::new(UnitKind::Root, "unit");
    let file = lowering.create_file(&location(1), "file", "entry");
    let def = lowering.create_definition(&location(2), "def", false, "entry", &[]);
    let inner = def.entry_block();
    inner.ret(&inner.nil_a());
    def.finish();

    let entry = file.entry_block();
    let reference = def.access(&entry, &[]);
    assert_eq!(reference.ty, IrType::Definition);
    entry.ret(&entry.nil_a());
    file.finish();
}

#[test]
fn locations_render_one_based() {
    let location = SourceLocation::new("f.txt", 1, 2, 3, 4);
    assert_eq!(location.to_string(), "f.txt:2:3-4:5");
    assert_eq!("f.txt:2:3-4:5".parse::<SourceLocation>(), Ok(location));
}
