use crate::batch::BatchReport;
use comfy_table::{Attribute, Cell, CellAlignment, Table};

pub fn summary_table(report: &BatchReport) -> Table {
    let mut table = Table::new();
    table
        .set_header(vec![
            Cell::new("")
                .add_attribute(Attribute::Bold)
                .set_alignment(CellAlignment::Center),
            Cell::new("Source")
                .add_attribute(Attribute::Bold)
                .set_alignment(CellAlignment::Center),
            Cell::new("Input")
                .add_attribute(Attribute::Bold)
                .set_alignment(CellAlignment::Center),
            Cell::new("Time")
                .add_attribute(Attribute::Bold)
                .set_alignment(CellAlignment::Center),
            Cell::new("Result").add_attribute(Attribute::Bold),
        ])
        .load_preset(comfy_table::presets::ASCII_BORDERS_ONLY_CONDENSED);

    for outcome in &report.outcomes {
        let (icon, result) = match &outcome.result {
            Ok(()) => ("✅", "tiled".to_string()),
            Err(e) => ("❌", e.to_string()),
        };
        let input = outcome
            .input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(icon).set_alignment(CellAlignment::Center),
            Cell::new(&outcome.source),
            Cell::new(input),
            Cell::new(format!("{:.1}s", outcome.elapsed.as_secs_f64()))
                .set_alignment(CellAlignment::Right),
            Cell::new(result),
        ]);
    }

    table
}

pub fn print_batch_summary(report: &BatchReport) {
    println!("\nBatch summary:\n{}", summary_table(report));

    let failed = report.failed();
    if failed > 0 {
        println!("\nWarnings:");
        println!(
            "  ⚠️ Failed to process {} of {} file(s); partial tile directories were left in place",
            failed,
            report.total()
        );
        println!("\nTips:");
        println!("  Re-run with --verbose to see the full GDAL output");
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{ProcessError, SourceOutcome};
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn one_row_per_outcome() {
        let report = BatchReport {
            outcomes: vec![
                SourceOutcome {
                    source: "alpha".into(),
                    input: PathBuf::from("in/alpha.tif"),
                    result: Ok(()),
                    elapsed: Duration::from_millis(1500),
                },
                SourceOutcome {
                    source: "beta".into(),
                    input: PathBuf::from("in/beta.tiff"),
                    result: Err(ProcessError::Exit {
                        program: "gdal2tiles.py".into(),
                        status: Some(2),
                        stderr: "bad zoom".into(),
                    }),
                    elapsed: Duration::from_millis(200),
                },
            ],
        };

        let table = summary_table(&report);
        assert_eq!(table.row_count(), 2);
        let rendered = table.to_string();
        assert!(rendered.contains("alpha.tif"));
        assert!(rendered.contains("1.5s"));
        assert!(rendered.contains("gdal2tiles.py failed with code 2: bad zoom"));
    }
}
