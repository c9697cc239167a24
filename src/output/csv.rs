use anyhow::Result;

use crate::types::{AuditReport, PackageMeasure};

pub fn package_to_csv(report: &AuditReport) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "rank",
        "measure",
        "detail",
        "components",
        "annual_savings_mmbtu",
        "annual_savings_dollars",
        "cost",
        "sir",
        "npv",
        "life_years",
        "priority",
        "required",
    ])?;
    for m in &report.package {
        write_measure(&mut writer, m)?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn npv_only_to_csv(measures: &[PackageMeasure]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "measure",
        "detail",
        "annual_savings_dollars",
        "cost",
        "sir",
        "npv",
    ])?;
    for m in measures {
        writer.write_record([
            m.measure.clone(),
            m.detail.clone(),
            format!("{:.2}", m.annual_savings_dollars),
            format!("{:.2}", m.cost),
            format!("{:.4}", m.sir),
            format!("{:.2}", m.npv),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

fn write_measure(writer: &mut csv::Writer<Vec<u8>>, m: &PackageMeasure) -> Result<()> {
    writer.write_record([
        m.rank.to_string(),
        m.kind.as_slug().to_string(),
        m.detail.clone(),
        m.components.join(";"),
        format!("{:.3}", m.annual_savings_mmbtu),
        format!("{:.2}", m.annual_savings_dollars),
        format!("{:.2}", m.cost),
        format!("{:.4}", m.sir),
        format!("{:.2}", m.npv),
        format!("{:.0}", m.life_years),
        m.priority.to_string(),
        m.required.to_string(),
    ])?;
    Ok(())
}
