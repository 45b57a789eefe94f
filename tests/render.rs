mod common;

use common::{init_tracing, location, SampleUnit, Stub};
use kws::{
    check_api_usage,
    diagnostics::{Diagnostic, TracingSink},
    lower::{Arm, Exit, Instruction},
    pretty_print,
    prelude::*,
};

#[test]
fn sample_unit_passes_the_checker() {
    init_tracing();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    check_api_usage(&SampleUnit, &mut diagnostics, UnitKind::Root);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);

    check_api_usage(&SampleUnit, &mut TracingSink, UnitKind::Root);
}

#[test]
fn lowering_fills_in_missing_arms() {
    init_tracing();
    let module = kws::lower(&SampleUnit, UnitKind::Root, "samples/unit");
    assert_eq!(module.name(), "kws.library.samples.unit");
    assert_eq!(module.functions().count(), 4);

    let total = module.function_named("total").expect("total");
    let start = module.block(total.entry).expect("start");
    let arms = match start.exit.as_ref() {
        Some(Exit::Switch { arms, .. }) => arms,
        other => panic!("expected a switch, got {:?}", other),
    };
    let raises = arms
        .iter()
        .filter(|(_, arm)| matches!(arm, Arm::Raise(_)))
        .count();
    assert_eq!(raises, 7);
    assert_eq!(arms.len(), RuntimeType::ALL.len());
}

#[test]
fn printing_is_deterministic() {
    let first = pretty_print(&SampleUnit, UnitKind::Root);
    let second = pretty_print(&SampleUnit, UnitKind::Root);
    assert_eq!(first, second);
    assert_eq!(
        first[0],
        "export definition total(p0:c) captures(c0:i) { # sample.flbgst:3:1-3:13"
    );
    assert!(first.contains(&"# sample.flbgst:4:1-4:13: x".to_owned()));
    assert_eq!(first.iter().filter(|line| *line == "}").count(), 4);
}

#[test]
fn backends_see_the_same_calls() {
    let mut tags = Stub::<IrType>::new(UnitKind::Root);
    SampleUnit.render(&mut tags);
    let mut numbered = Stub::<(usize, IrType)>::new(UnitKind::Root);
    SampleUnit.render(&mut numbered);

    let events = tags.events();
    assert_eq!(events, numbered.events());
    let add = events
        .iter()
        .find(|event| event.opcode == "add.i")
        .expect("add.i");
    assert_eq!(add.operands, [IrType::Int, IrType::Int]);
    let arms: Vec<_> = events
        .iter()
        .filter(|event| event.tag == "arm")
        .map(|event| event.opcode.as_str())
        .collect();
    assert_eq!(arms, ["i:on_int", "s:on_str"]);
}

#[test]
fn lowering_keeps_the_recorded_operations() {
    let mut stub = Stub::<IrType>::new(UnitKind::Root);
    SampleUnit.render(&mut stub);
    let mut recorded: Vec<_> = stub
        .events()
        .into_iter()
        .filter(|event| event.tag == "op")
        .map(|event| (event.opcode, event.operands))
        .collect();
    recorded.sort();

    let module = kws::lower(&SampleUnit, UnitKind::Root, "samples/unit");
    let mut lowered: Vec<_> = module
        .functions()
        .flat_map(|(_, function)| function.blocks.iter())
        .filter_map(|block| module.block(*block))
        .flat_map(|block| block.instructions.iter())
        .filter_map(|instruction| match instruction {
            Instruction::Op { op, args } => Some((
                op.mnemonic().to_owned(),
                args.iter()
                    .flat_map(|arg| arg.values())
                    .map(|value| value.ty)
                    .collect::<Vec<_>>(),
            )),
            _ => None,
        })
        .collect();
    lowered.sort();

    assert!(!recorded.is_empty());
    assert_eq!(recorded, lowered);
}

#[test]
fn definition_units_pass_a_context_to_the_file() {
    let lines = pretty_print(&SampleUnit, UnitKind::Definition);
    assert!(lines
        .iter()
        .any(|line| line == "file file(p0:c) { # sample.flbgst:2:1-2:13"));

    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    check_api_usage(&SampleUnit, &mut diagnostics, UnitKind::Definition);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    assert_eq!(location(1).to_string(), "sample.flbgst:2:1-2:13");
}
