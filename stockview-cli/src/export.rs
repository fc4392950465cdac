//! Export of one charted run as JSON or CSV, plus the console summary.

use anyhow::Result;
use serde::Serialize;

use stockview_core::domain::{AlignedChartSeries, RunSnapshot};
use stockview_core::RunOutput;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChartExport<'a> {
    snapshot: &'a RunSnapshot,
    standard_deviation: f64,
    series: &'a AlignedChartSeries,
}

pub fn to_json(output: &RunOutput) -> Result<String> {
    let export = ChartExport {
        snapshot: &output.snapshot,
        standard_deviation: output.std_dev.value(),
        series: &output.series,
    };
    Ok(serde_json::to_string_pretty(&export)?)
}

/// One row per trading day. Columns: date, t, price, regression,
/// moving_average (empty before the first full window).
pub fn to_csv(output: &RunOutput) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "t", "price", "regression", "moving_average"])?;

    for p in output.series.points() {
        wtr.write_record([
            p.date.to_string(),
            p.t.to_string(),
            format!("{:.6}", p.price),
            format!("{:.6}", p.regression),
            p.moving_average.map(|v| format!("{v:.6}")).unwrap_or_default(),
        ])?;
    }

    Ok(String::from_utf8(wtr.into_inner()?)?)
}

pub fn print_summary(output: &RunOutput) {
    let snapshot = &output.snapshot;
    let range = snapshot.range();
    let series = &output.series;
    let levels = series.levels();

    println!();
    println!("=== {} ===", snapshot.company());
    println!("Period:           {} to {}", range.start(), range.end());
    println!("Trading days:     {}", series.len());
    println!("MA window:        {}", snapshot.period());
    println!("σ:                {}", output.std_dev);
    println!();
    println!("--- Levels ---");
    println!("Major resistance: {:.2}", levels.major_resistance);
    println!("Minor resistance: {:.2}", levels.minor_resistance);
    println!("Minor support:    {:.2}", levels.minor_support);
    println!("Major support:    {:.2}", levels.major_support);
    println!();
    println!(
        "{:<12} {:>5} {:>12} {:>12} {:>12}",
        "Date", "t", "Close", "Trend", "MA"
    );
    for p in series.points() {
        let ma = p
            .moving_average
            .map(|v| format!("{v:.2}"))
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<12} {:>5} {:>12.2} {:>12.2} {:>12}",
            p.display_date(),
            p.t,
            p.price,
            p.regression,
            ma
        );
    }
    println!();
}
