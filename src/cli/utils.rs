use std::io::Read;

use serde_json::{json, Map, Value};

use crate::cli::OutputFormat;
use crate::client::LoginSurface;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(Value::Object(extra)), Some(object)) = (data, response.as_object_mut()) {
                object.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an API result: pretty JSON, or one line per record in text mode
pub fn output_value(output_format: &OutputFormat, value: &Value) -> anyhow::Result<()> {
    match (output_format, value) {
        (OutputFormat::Text, Value::Array(rows)) => {
            if rows.is_empty() {
                println!("No records found");
            }
            for row in rows {
                println!("{}", serde_json::to_string(row)?);
            }
        }
        _ => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

/// Parse repeated `column=value` arguments; later duplicates win.
pub fn parse_filters(filters: &[String]) -> anyhow::Result<Map<String, Value>> {
    let mut criteria = Map::new();
    for filter in filters {
        let (column, value) = filter
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("filter '{}' must look like column=value", filter))?;
        if column.is_empty() {
            return Err(anyhow::anyhow!("filter '{}' has an empty column", filter));
        }
        criteria.insert(column.to_string(), Value::String(value.to_string()));
    }
    Ok(criteria)
}

/// Read a JSON document from stdin
pub fn read_stdin_json() -> anyhow::Result<Value> {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    if input.trim().is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_str(&input).map_err(|e| anyhow::anyhow!("invalid_json: {}", e))
}

/// Read one line (e.g. a password) from stdin
pub fn read_stdin_line() -> anyhow::Result<String> {
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// The terminal's login surface: tell the user how to sign in again.
pub struct CliSurface;

impl LoginSurface for CliSurface {
    fn redirect(&self) {
        eprintln!("Session expired. Run `oficina login <email>` to sign in again.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_parse_into_criteria() {
        let criteria = parse_filters(&["status=open".into(), "plate=ABC=1".into(), "status=closed".into()]).unwrap();
        assert_eq!(criteria["status"], "closed");
        assert_eq!(criteria["plate"], "ABC=1");
    }

    #[test]
    fn malformed_filters_are_rejected() {
        assert!(parse_filters(&["status".into()]).is_err());
        assert!(parse_filters(&["=open".into()]).is_err());
    }
}
