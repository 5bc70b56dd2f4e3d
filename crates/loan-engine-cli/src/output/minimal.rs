use serde_json::Value;

/// Headline figure of each command, tried in order. Dotted paths reach into
/// nested objects.
const PRIORITY_PATHS: [&str; 9] = [
    "recommendation.better",
    "new_term_months",
    "monthly_payment",
    "interest_saved",
    "current_remaining",
    "remaining_amount",
    "total_monthly_cost",
    "term_months",
    "savings",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        for path in PRIORITY_PATHS {
            if let Some(val) = lookup(result_obj, path) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |v, key| v.get(key))
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
