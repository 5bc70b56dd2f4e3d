use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Column order for schedule rows.
const SCHEDULE_COLUMNS: [&str; 6] = ["month", "payment", "principal", "interest", "remaining", "is_paid"];

/// Format output as tables using the tabled crate.
///
/// Scalar result fields go in a field/value table; a `schedule` array gets
/// its own month-by-month table underneath.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => print_result(result, map),
            _ => print_result(map, &Map::new()),
        },
        _ => println!("{}", value),
    }
}

fn print_result(result: &Map<String, Value>, envelope: &Map<String, Value>) {
    println!("{}", summary_table(result));

    if let Some(Value::Array(rows)) = result.get("schedule") {
        if rows.is_empty() {
            println!("\n(empty schedule)");
        } else {
            println!("\n{}", schedule_table(rows));
        }
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn summary_table(result: &Map<String, Value>) -> Table {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in result {
        match val {
            Value::Array(_) if key == "schedule" => {}
            Value::Object(inner) => {
                for (sub, v) in inner {
                    builder.push_record([format!("{key}.{sub}"), format_value(v)]);
                }
            }
            _ => {
                builder.push_record([key.clone(), format_value(val)]);
            }
        }
    }
    builder.build()
}

fn schedule_table(rows: &[Value]) -> Table {
    let mut builder = Builder::default();
    builder.push_record(SCHEDULE_COLUMNS);
    for row in rows {
        let cells: Vec<String> = SCHEDULE_COLUMNS
            .iter()
            .map(|c| row.get(*c).map(format_value).unwrap_or_default())
            .collect();
        builder.push_record(cells);
    }
    builder.build()
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "paid".to_string(),
        Value::Bool(false) => String::new(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schedule_table_orders_columns() {
        let rows = vec![json!({
            "remaining": "0.00", "month": 1, "is_paid": true,
            "interest": "10.00", "principal": "1000.00", "payment": "1010.00"
        })];
        let rendered = schedule_table(&rows).to_string();
        let header = rendered.lines().nth(1).unwrap();
        let month = header.find("month").unwrap();
        let remaining = header.find("remaining").unwrap();
        assert!(month < remaining);
        assert!(rendered.contains("paid"));
    }

    #[test]
    fn test_summary_skips_schedule_and_flattens() {
        let result = json!({
            "monthly_payment": "1010.00",
            "schedule": [{"month": 1}],
            "strategies": {"base": "x"}
        });
        let rendered = summary_table(result.as_object().unwrap()).to_string();
        assert!(rendered.contains("strategies.base"));
        assert!(!rendered.contains("\"month\""));
    }
}
