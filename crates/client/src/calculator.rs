//! The local `calculate` tool: a pure function over `{a, b, operator}`.

use arachne_common::{ArachneError, Result};
use serde_json::Value;

/// Evaluate a calculate call and format the result.
///
/// Operands may be numbers or numeric strings. Both word and symbol
/// operator spellings are accepted; `root` computes `a^(1/b)`. Integral
/// results are formatted without a trailing fraction (`6`, not `6.0`).
pub fn calculate(arguments: &Value) -> Result<String> {
    let a = operand(arguments, "a")?;
    let b = operand(arguments, "b")?;
    let operator = arguments
        .get("operator")
        .and_then(Value::as_str)
        .ok_or_else(|| ArachneError::Tool("Missing operator".to_string()))?;

    Ok(format_number(apply(a, b, operator)?))
}

fn operand(arguments: &Value, key: &str) -> Result<f64> {
    match arguments.get(key) {
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| ArachneError::Tool(format!("Operand {key} is out of range"))),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| ArachneError::Tool(format!("Operand {key} is not numeric: {s}"))),
        _ => Err(ArachneError::Tool(format!("Missing operand {key}"))),
    }
}

fn apply(a: f64, b: f64, operator: &str) -> Result<f64> {
    let result = match operator {
        "add" | "+" => a + b,
        "subtract" | "-" => a - b,
        "multiply" | "*" => a * b,
        "divide" | "/" => a / b,
        "power" | "^" => a.powf(b),
        "root" => a.powf(1.0 / b),
        _ => return Err(ArachneError::Tool(format!("Unknown operator: {operator}"))),
    };
    Ok(result)
}

/// `18 / 3` prints as `6`, `5 / 2` as `2.5`.
fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
