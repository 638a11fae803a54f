//! Running the optimizer on a project directory and reporting the run.

use crate::error::OptError;
use crate::{optimize, OptimizeReport};
use std::path::Path;
use tqec_config::load_config;
use tqec_diagnostics::{DiagnosticRenderer, DiagnosticSink, TerminalRenderer};
use tqec_lattice::Graph;

/// Loads `<dir>/tqec.toml` and optimizes `graph` with it.
pub fn optimize_project(
    graph: &mut Graph,
    dir: &Path,
    sink: &DiagnosticSink,
) -> Result<OptimizeReport, OptError> {
    let config = load_config(dir)?;
    optimize(graph, &config, sink)
}

/// Renders every diagnostic in `sink`, followed by a one-line summary of `report`.
pub fn render_run(report: &OptimizeReport, sink: &DiagnosticSink, color: bool) -> String {
    let renderer = TerminalRenderer::new(color);
    let mut out = String::new();
    for diag in sink.diagnostics() {
        out.push_str(&renderer.render(&diag));
    }
    let phases: Vec<String> = report.phases.iter().map(|p| p.kind.to_string()).collect();
    out.push_str(&format!(
        "volume {} -> {}, {} loops after reduction, phases [{}]; {}\n",
        report.volume_before,
        report.volume_after,
        report.reduction.loops_after,
        phases.join(", "),
        sink.summary()
    ));
    out
}
