use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::catalog::MeasureKind;
use crate::types::{AuditReport, PackageMeasure};

pub fn render_package_table(report: &AuditReport) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Rank", "Measure", "Detail", "MMBtu/yr", "$/yr", "Cost", "SIR", "NPV", "Life",
    ]);

    for m in &report.package {
        let sir_cell = if m.required || m.sir >= 1.0 {
            Cell::new(format!("{:.2}", m.sir)).fg(Color::Green)
        } else {
            Cell::new(format!("{:.2}", m.sir)).fg(Color::Yellow)
        };
        let label = if m.required {
            format!("{} *", m.measure)
        } else {
            m.measure.clone()
        };
        table.add_row(Row::from(vec![
            Cell::new(m.rank.to_string()),
            Cell::new(label),
            Cell::new(m.detail.clone()),
            Cell::new(format!("{:.1}", m.annual_savings_mmbtu)),
            Cell::new(format!("{:.0}", m.annual_savings_dollars)),
            Cell::new(format!("{:.0}", m.cost)),
            sir_cell,
            Cell::new(format!("{:.0}", m.npv)),
            Cell::new(format!("{:.0}", m.life_years)),
        ]));
    }

    let mut out = String::new();
    out.push_str(&table.to_string());
    out.push_str(&format!(
        "\nPackage: {} measures, cost ${:.0}, saves ${:.0}/yr ({:.1} MMBtu/yr), SIR {:.2}",
        report.summary.measure_count,
        report.summary.total_cost,
        report.summary.total_annual_savings_dollars,
        report.summary.total_annual_savings_mmbtu,
        report.summary.package_sir,
    ));
    if let Some(calibration) = &report.calibration {
        out.push_str(&format!(
            "\nBilling calibration applied: heating x{:.2} ({} periods), cooling x{:.2} ({} periods)",
            calibration.factors.heating,
            calibration.heating_periods,
            calibration.factors.cooling,
            calibration.cooling_periods,
        ));
    }
    for note in &report.notes {
        out.push_str(&format!("\nNote: {note}"));
    }
    out
}

pub fn render_npv_only_table(measures: &[PackageMeasure]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Measure", "Detail", "$/yr", "Cost", "SIR", "NPV"]);
    for m in measures {
        table.add_row(vec![
            m.measure.clone(),
            m.detail.clone(),
            format!("{:.0}", m.annual_savings_dollars),
            format!("{:.0}", m.cost),
            format!("{:.2}", m.sir),
            format!("{:.0}", m.npv),
        ]);
    }
    table.to_string()
}

pub fn render_catalog_table() -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Slug", "Measure", "Category", "Priority", "Life (yr)"]);
    for kind in MeasureKind::ALL {
        table.add_row(vec![
            kind.as_slug().to_string(),
            kind.label().to_string(),
            kind.econ_category().to_string(),
            kind.default_priority().to_string(),
            format!("{:.0}", kind.default_life_years()),
        ]);
    }
    table.to_string()
}
