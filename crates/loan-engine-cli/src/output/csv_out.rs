use serde_json::{Map, Value};
use std::io;

/// Write output as CSV to stdout.
///
/// A result carrying a `schedule` is written as one row per month; anything
/// else becomes a two-column field/value listing.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Object(map) => match map.get("schedule") {
            Some(Value::Array(rows)) => write_rows(&mut wtr, rows),
            _ => write_fields(&mut wtr, map),
        },
        Value::Array(rows) => write_rows(&mut wtr, rows),
        _ => {
            let _ = wtr.write_record([&format_csv_value(result)]);
        }
    }

    let _ = wtr.flush();
}

fn write_fields<W: io::Write>(wtr: &mut csv::Writer<W>, map: &Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in map {
        match val {
            // One level of nesting (strategies, recommendation) as dotted keys
            Value::Object(inner) => {
                for (sub, v) in inner {
                    let _ = wtr.write_record([format!("{key}.{sub}"), format_csv_value(v)]);
                }
            }
            _ => {
                let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
            }
        }
    }
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        for item in rows {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
        return;
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);
    for item in rows {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&row);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(f: impl FnOnce(&mut csv::Writer<Vec<u8>>)) -> String {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        f(&mut wtr);
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_schedule_rows() {
        let rows = vec![
            json!({"month": 1, "payment": "17332.66", "is_paid": true}),
            json!({"month": 2, "payment": "17332.66", "is_paid": false}),
        ];
        let out = render(|w| write_rows(w, &rows));
        // serde_json objects iterate in key order
        assert_eq!(out, "is_paid,month,payment\ntrue,1,17332.66\nfalse,2,17332.66\n");
    }

    #[test]
    fn test_nested_fields_are_dotted() {
        let v = json!({"recommendation": {"better": "reduce_term"}, "monthly_payment": "100"});
        let out = render(|w| write_fields(w, v.as_object().unwrap()));
        assert!(out.contains("recommendation.better,reduce_term"));
        assert!(out.contains("monthly_payment,100"));
    }
}
