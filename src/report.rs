use std::io::{self, Write};

use crate::sim::{SimReport, base_real_temperature};

/// Hour-of-day table of depicted temperature per kind against the base real curve.
/// Runs shorter than a day wrap around their own history.
pub fn write_summary_table<W: Write>(out: &mut W, report: &SimReport) -> io::Result<()> {
    writeln!(out, "\n\nItem Temperatures Table (Real vs Depicted)")?;
    writeln!(
        out,
        "{:<10}{:<20}{:<25}{:<20}",
        "Hour", "Type", "Depicted Temp (°C)", "Real Temp (°C)"
    )?;
    writeln!(out, "{}", "-".repeat(75))?;

    let rows = report
        .block_history
        .iter()
        .map(|(k, v)| (k.name(), v))
        .chain(report.item_history.iter().map(|(k, v)| (k.name(), v)));
    let rows: Vec<(&str, &Vec<f32>)> = rows.filter(|(_, v)| !v.is_empty()).collect();

    for hour in 0..24 {
        let real = base_real_temperature(hour);
        for (name, temps) in &rows {
            let depicted = temps[hour % temps.len()];
            writeln!(
                out,
                "{:02}:00      {:<20}{:<25.2}{:<20.2}",
                hour, name, depicted, real
            )?;
        }
    }
    Ok(())
}
