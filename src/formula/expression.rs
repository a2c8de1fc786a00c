use serde::Deserialize;
use serde::Serialize;
use std::fmt::Display;
use std::fmt::Formatter;

/// Built-in functions available to compiled formulas
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Function {
    /// Variadic numeric addition
    Sum,
    /// Value plus optional decimal-place count
    Round,
}

impl Function {
    /// Maps a spreadsheet function name (any case) to the library
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "SUM" => Some(Self::Sum),
            "ROUND" => Some(Self::Round),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Round => "round",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

impl Operator {
    pub fn parse(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(Self::Add),
            '-' => Some(Self::Subtract),
            '*' => Some(Self::Multiply),
            '/' => Some(Self::Divide),
            '^' => Some(Self::Power),
            _ => None,
        }
    }

    pub const fn symbol(&self) -> char {
        match self {
            Self::Add => '+',
            Self::Subtract => '-',
            Self::Multiply => '*',
            Self::Divide => '/',
            Self::Power => '^',
        }
    }

    pub const fn precedence(&self) -> u8 {
        match self {
            Self::Add | Self::Subtract => 1,
            Self::Multiply | Self::Divide => 2,
            Self::Power => 3,
        }
    }
}

/// Data-only compiled formula, evaluated against one row of its table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    Number { value: f64 },
    /// Numeric value of a field of the current row
    Field { name: String },
    /// Reference to a column letter with no field; evaluates to zero
    UnknownColumn { letters: String },
    Negate { operand: Box<Expr> },
    Binary {
        operator: Operator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call { function: Function, arguments: Vec<Expr> },
}

impl Expr {
    pub fn number(value: f64) -> Self {
        Expr::Number { value }
    }

    pub fn field(name: &str) -> Self {
        Expr::Field { name: name.to_owned() }
    }

    pub fn binary(operator: Operator, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Binary { operator, .. } => operator.precedence(),
            _ => u8::MAX,
        }
    }
}

/// Renders the portable form, e.g. `coerce(row.precio) * 0.21`
impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Number { value } => write!(f, "{value}"),
            Expr::Field { name } => write!(f, "coerce(row.{name})"),
            Expr::UnknownColumn { letters } => write!(f, "0 /* unknown column {letters} */"),
            Expr::Negate { operand } if matches!(**operand, Expr::Binary { .. }) => write!(f, "-({operand})"),
            Expr::Negate { operand } => write!(f, "-{operand}"),
            Expr::Binary { operator, left, right } => {
                if left.precedence() < operator.precedence() {
                    write!(f, "({left})")?;
                } else {
                    write!(f, "{left}")?;
                }
                write!(f, " {} ", operator.symbol())?;
                if right.precedence() <= operator.precedence() {
                    write!(f, "({right})")
                } else {
                    write!(f, "{right}")
                }
            }
            Expr::Call { function, arguments } => {
                write!(f, "{}(", function.as_str())?;
                for (index, argument) in arguments.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{argument}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_respects_precedence() {
        let expr = Expr::binary(
            Operator::Multiply,
            Expr::binary(Operator::Add, Expr::field("a"), Expr::number(1.0)),
            Expr::binary(Operator::Subtract, Expr::field("b"), Expr::number(2.5)),
        );
        assert_eq!(expr.to_string(), "(coerce(row.a) + 1) * (coerce(row.b) - 2.5)");

        let expr = Expr::binary(
            Operator::Add,
            Expr::binary(Operator::Multiply, Expr::field("a"), Expr::number(2.0)),
            Expr::Negate { operand: Box::new(Expr::number(3.0)) },
        );
        assert_eq!(expr.to_string(), "coerce(row.a) * 2 + -3");
    }

    #[test]
    fn display_calls_and_placeholders() {
        let expr = Expr::Call {
            function: Function::Round,
            arguments: vec![Expr::UnknownColumn { letters: "Z".to_owned() }, Expr::number(2.0)],
        };
        assert_eq!(expr.to_string(), "round(0 /* unknown column Z */, 2)");
    }

    #[test]
    fn serialized_form_is_tagged() {
        let expr = Expr::binary(Operator::Multiply, Expr::field("precio"), Expr::number(0.21));
        let json = serde_json::to_string(&expr).unwrap();
        assert_eq!(
            json,
            r#"{"kind":"binary","operator":"multiply","left":{"kind":"field","name":"precio"},"right":{"kind":"number","value":0.21}}"#
        );
        assert_eq!(serde_json::from_str::<Expr>(&json).unwrap(), expr);
    }
}
