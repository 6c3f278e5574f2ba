use batch_transform_engine::PassReport;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

pub fn render(report: &PassReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(report)?),
        OutputFormat::Table => Ok(render_table(report)),
    }
}

fn render_table(report: &PassReport) -> String {
    let stats = &report.stats;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec!["Pass", &report.pass_id.to_string()]);
    table.add_row(vec!["Mode", report.mode.as_str()]);
    table.add_row(vec!["Items", &stats.total_items.to_string()]);
    table.add_row(vec!["Succeeded", &stats.succeeded.to_string()]);
    table.add_row(vec!["Failed", &stats.failed.to_string()]);
    table.add_row(vec!["Quarantined", &report.quarantined.to_string()]);
    if report.unprocessed > 0 {
        table.add_row(vec!["Unprocessed", &report.unprocessed.to_string()]);
    }
    table.add_row(vec!["Bytes in", &format_bytes(stats.original_bytes)]);
    table.add_row(vec!["Bytes out", &format_bytes(stats.transformed_bytes)]);
    table.add_row(vec!["Saved", &format!("{:.1}%", stats.percent_saved)]);
    table.add_row(vec!["Workers", &report.workers_spawned.to_string()]);
    table.add_row(vec!["Elapsed", &format!("{} ms", report.elapsed_ms)]);

    let mut out = table.to_string();

    if !report.results.failed.is_empty() {
        let mut failures = Table::new();
        failures.load_preset(UTF8_FULL);
        failures.set_header(vec!["Failed item", "Kind", "Attempts", "Reason"]);
        for (item, failure) in &report.results.failed {
            failures.add_row(vec![
                item.key.clone(),
                failure.classification.as_str().to_string(),
                failure.attempts.to_string(),
                failure.reason.clone(),
            ]);
        }
        out.push('\n');
        out.push_str(&failures.to_string());
    }

    out
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
