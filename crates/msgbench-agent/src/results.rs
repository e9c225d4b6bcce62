//! Rendering phase reports for stdout

use anyhow::{Context, Result};
use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use msgbench_common::PhaseReport;

/// How the agent prints its report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Render `report` in the requested format
pub fn render(report: &PhaseReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(report)),
        OutputFormat::Json => {
            serde_json::to_string_pretty(report).context("Failed to serialize phase report")
        }
    }
}

/// One row per operation kind, followed by a summary line
pub fn render_table(report: &PhaseReport) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Operation"),
            Cell::new("Samples"),
            Cell::new("Failed"),
            Cell::new("Success"),
            Cell::new("Min (ms)"),
            Cell::new("Avg (ms)"),
            Cell::new("p50 (ms)"),
            Cell::new("p90 (ms)"),
            Cell::new("p99 (ms)"),
            Cell::new("p99.9 (ms)"),
            Cell::new("Max (ms)"),
            Cell::new("msg/s"),
        ]);

    for (operation, summary) in &report.operations {
        let stats = &summary.latency;
        let latency_cell = |value: f64| {
            if stats.is_empty() {
                Cell::new("-")
            } else {
                Cell::new(format!("{value:.2}"))
            }
        };
        table.add_row(vec![
            Cell::new(operation),
            Cell::new(summary.samples),
            Cell::new(summary.unsuccessful),
            Cell::new(format!("{:.1}%", summary.success_ratio * 100.0)),
            latency_cell(stats.min_ms),
            latency_cell(stats.avg_ms),
            latency_cell(stats.p50_ms),
            latency_cell(stats.p90_ms),
            latency_cell(stats.p99_ms),
            latency_cell(stats.p999_ms),
            latency_cell(stats.max_ms),
            Cell::new(format!("{:.1}", report.throughput(*operation))),
        ]);
    }

    let mut out = format!(
        "=== {} x{} ({} bytes) started {} ===\n{table}\nElapsed: {:.1} ms",
        report.scenario,
        report.message_count,
        report.message_size,
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.elapsed_ms,
    );
    if let Some(reason) = &report.aborted {
        out.push_str(&format!("\nABORTED: {reason}"));
    }
    out
}
