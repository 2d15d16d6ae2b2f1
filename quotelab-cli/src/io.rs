//! Step files (JSON lines) and order exports (JSON lines, CSV).

use anyhow::{Context, Result};
use serde::{Serialize, de::DeserializeOwned};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use quotelab_core::domain::StepOutput;

/// Read one JSON value per non-blank line.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut items = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let item = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid JSON line", path.display(), i + 1))?;
        items.push(item);
    }
    Ok(items)
}

pub fn write_jsonl<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    for item in items {
        serde_json::to_writer(&mut out, item).context("Failed to serialize line")?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct OrderRow<'a> {
    step: usize,
    timestamp: u64,
    product: &'a str,
    side: &'static str,
    price: i64,
    quantity: i64,
}

/// One CSV row per order intent, in step then product order.
pub fn write_orders_csv(path: &Path, outputs: &[StepOutput]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create orders CSV {}", path.display()))?;
    for (step, output) in outputs.iter().enumerate() {
        for order in output.all_orders() {
            writer.serialize(OrderRow {
                step,
                timestamp: output.timestamp,
                product: &order.product,
                side: if order.quantity > 0 { "buy" } else { "sell" },
                price: order.price,
                quantity: order.quantity.abs(),
            })?;
        }
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quotelab_core::domain::{OrderDepth, OrderIntent, Side, StepInput};
    use std::collections::BTreeMap;

    #[test]
    fn jsonl_roundtrip_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("steps.jsonl");
        let steps = vec![
            StepInput::new(0).with_depth("KELP", OrderDepth::from_levels(&[(2027, 5)], &[(2029, 7)])),
            StepInput::new(100).with_position("KELP", -3),
        ];
        write_jsonl(&path, &steps).unwrap();

        let mut text = std::fs::read_to_string(&path).unwrap();
        text.push_str("\n   \n");
        std::fs::write(&path, text).unwrap();

        let back: Vec<StepInput> = read_jsonl(&path).unwrap();
        assert_eq!(back, steps);
    }

    #[test]
    fn malformed_line_reports_position() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("steps.jsonl");
        std::fs::write(&path, "{\"timestamp\": 0}\nnot json\n").unwrap();
        let err = read_jsonl::<StepInput>(&path).unwrap_err();
        assert!(format!("{err}").ends_with(":2: invalid JSON line"));
    }

    #[test]
    fn orders_csv_has_one_row_per_intent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.csv");
        let mut orders = BTreeMap::new();
        orders.insert(
            "KELP".to_string(),
            vec![
                OrderIntent::new("KELP", Side::Buy, 2027, 5),
                OrderIntent::new("KELP", Side::Sell, 2030, 4),
            ],
        );
        let outputs = vec![
            StepOutput::default(),
            StepOutput {
                timestamp: 100,
                orders,
                ..StepOutput::default()
            },
        ];
        write_orders_csv(&path, &outputs).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "step,timestamp,product,side,price,quantity");
        assert_eq!(lines[1], "1,100,KELP,buy,2027,5");
        assert_eq!(lines[2], "1,100,KELP,sell,2030,4");
        assert_eq!(lines.len(), 3);
    }
}
