use crate::formula::expression::Expr;
use crate::formula::expression::Function;
use crate::formula::expression::Operator;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static NON_NUMERIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^0-9.\-]").expect("Hardcode regex pattern"));
static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)").expect("Hardcode regex pattern"));

/// Field access for the row a formula is evaluated against.
pub trait RowLookup {
    /// Text of the named field, `None` when the row has no such field
    fn field(&self, name: &str) -> Option<&str>;
}

impl RowLookup for HashMap<String, String> {
    fn field(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl RowLookup for HashMap<String, Option<String>> {
    fn field(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Option::as_deref)
    }
}

/// Cleans a stored value into a number.
///
/// Every character other than a digit, `.` or `-` is removed and the longest
/// numeric prefix of what remains is parsed; no prefix yields `0`.
/// `"34.00 €"` gives `34.0`, `"1.2.3"` gives `1.2`.
pub fn coerce(value: &str) -> f64 {
    let cleaned = NON_NUMERIC.replace_all(value, "");
    LEADING_NUMBER
        .find(&cleaned)
        .and_then(|number| number.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

pub fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

/// Rounds half away from zero to `places` decimals; negative places round to tens, hundreds…
pub fn round(value: f64, places: f64) -> f64 {
    let factor = 10f64.powi(places.trunc() as i32);
    (value * factor).round() / factor
}

/// Evaluates a compiled expression against one row.
///
/// Missing fields and unknown columns read as `0`; division by zero follows
/// IEEE rules.
pub fn evaluate<R: RowLookup + ?Sized>(expr: &Expr, row: &R) -> f64 {
    match expr {
        Expr::Number { value } => *value,
        Expr::Field { name } => row.field(name).map_or(0.0, coerce),
        Expr::UnknownColumn { .. } => 0.0,
        Expr::Negate { operand } => -evaluate(operand, row),
        Expr::Binary { operator, left, right } => {
            let left = evaluate(left, row);
            let right = evaluate(right, row);
            match operator {
                Operator::Add => left + right,
                Operator::Subtract => left - right,
                Operator::Multiply => left * right,
                Operator::Divide => left / right,
                Operator::Power => left.powf(right),
            }
        }
        Expr::Call { function, arguments } => {
            let values: Vec<f64> = arguments.iter().map(|argument| evaluate(argument, row)).collect();
            match function {
                Function::Sum => sum(&values),
                Function::Round => round(values.first().copied().unwrap_or(0.0), values.get(1).copied().unwrap_or(0.0)),
            }
        }
    }
}
