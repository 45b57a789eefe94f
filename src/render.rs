use tracing::{info, instrument};

use crate::{
    check::Checker,
    diagnostics::DiagnosticSink,
    ir::{Factory, UnitKind},
    lower::{Lowering, Module},
    text::Printer,
};

/// A compiled unit: replays the same sequence of factory calls against
/// whichever backend it is handed.
pub trait RenderClient {
    fn render<F: Factory>(&self, factory: &mut F);
}

/// Render `client` against the checker, reporting every misuse to `sink`.
#[instrument(level = "debug", skip(client, sink))]
pub fn check_api_usage<C: RenderClient + ?Sized>(
    client: &C,
    sink: &mut dyn DiagnosticSink,
    unit: UnitKind,
) {
    let mut checker = Checker::new(sink, unit);
    client.render(&mut checker);
    checker.complete();
}

#[instrument(level = "debug", skip(client))]
pub fn pretty_print<C: RenderClient + ?Sized>(client: &C, unit: UnitKind) -> Vec<String> {
    let mut printer = Printer::new(unit);
    client.render(&mut printer);
    printer.into_lines()
}

#[instrument(level = "debug", skip(client))]
pub fn lower<C: RenderClient + ?Sized>(client: &C, unit: UnitKind, unit_name: &str) -> Module {
    let mut lowering = Lowering::new(unit, unit_name);
    client.render(&mut lowering);
    let module = lowering.into_module();
    info!(module = module.name(), functions = module.functions().count(), "lowered unit");
    module
}
