use crate::formula::expression::Expr;
use crate::formula::expression::Function;
use crate::formula::expression::Operator;
use crate::formula::lexer::Lexer;
use crate::formula::lexer::Token;
use crate::formula::FormulaError;
use std::collections::HashMap;
use std::iter::Peekable;
use std::vec::IntoIter;

/// Namespace prefix LibreOffice writes in front of OpenFormula text
const NAMESPACE_PREFIX: &str = "of:";

/// Translates formula text into an [`Expr`] using a column-letter to field-name map.
///
/// References keep only their column letters: `[.C7]` reads field `C` of the
/// row being evaluated, whatever its row number.
pub struct FormulaCompiler<'a> {
    letters: &'a HashMap<String, String>,
}

impl<'a> FormulaCompiler<'a> {
    pub fn new(letters: &'a HashMap<String, String>) -> Self {
        FormulaCompiler { letters }
    }

    pub fn compile(&self, formula: &str) -> Result<Expr, FormulaError> {
        let body = strip_prefix(formula);
        let tokens = Lexer::new(body).tokenize()?;
        let mut parser = Parser {
            formula,
            letters: self.letters,
            tokens: tokens.into_iter().peekable(),
        };
        let expr = parser.expression()?;
        match parser.tokens.next() {
            None => Ok(expr),
            Some(token) => Err(parser.unexpected(token)),
        }
    }
}

/// Removes `of:` and the leading `=`, e.g. `of:=[.C7]*0.21` becomes `[.C7]*0.21`
pub(crate) fn strip_prefix(formula: &str) -> &str {
    let mut body = formula.trim();
    if let Some(prefix) = body.get(..NAMESPACE_PREFIX.len()) {
        if prefix.eq_ignore_ascii_case(NAMESPACE_PREFIX) {
            body = &body[NAMESPACE_PREFIX.len()..];
        }
    }
    body.strip_prefix('=').unwrap_or(body).trim_start()
}

struct Parser<'a> {
    formula: &'a str,
    letters: &'a HashMap<String, String>,
    tokens: Peekable<IntoIter<Token>>,
}

impl Parser<'_> {
    fn unexpected(&self, token: Token) -> FormulaError {
        FormulaError::UnexpectedTokenError {
            formula: self.formula.to_owned(),
            token: format!("{token:?}"),
        }
    }

    fn next(&mut self) -> Result<Token, FormulaError> {
        self.tokens
            .next()
            .ok_or_else(|| FormulaError::UnexpectedEndError(self.formula.to_owned()))
    }

    fn next_operator(&mut self, accepted: &[char]) -> Option<Operator> {
        match self.tokens.peek() {
            Some(Token::Operator(symbol)) if accepted.contains(symbol) => {
                let operator = Operator::parse(*symbol);
                self.tokens.next();
                operator
            }
            _ => None,
        }
    }

    fn expression(&mut self) -> Result<Expr, FormulaError> {
        let mut left = self.term()?;
        while let Some(operator) = self.next_operator(&['+', '-']) {
            let right = self.term()?;
            left = Expr::binary(operator, left, right);
        }
        Ok(left)
    }

    fn term(&mut self) -> Result<Expr, FormulaError> {
        let mut left = self.power()?;
        while let Some(operator) = self.next_operator(&['*', '/']) {
            let right = self.power()?;
            left = Expr::binary(operator, left, right);
        }
        Ok(left)
    }

    fn power(&mut self) -> Result<Expr, FormulaError> {
        let mut left = self.unary()?;
        while let Some(operator) = self.next_operator(&['^']) {
            let right = self.unary()?;
            left = Expr::binary(operator, left, right);
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, FormulaError> {
        match self.next_operator(&['+', '-']) {
            Some(Operator::Subtract) => Ok(Expr::Negate {
                operand: Box::new(self.unary()?),
            }),
            Some(_) => self.unary(),
            None => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Expr, FormulaError> {
        match self.next()? {
            Token::Number(value) => Ok(Expr::number(value)),
            Token::Reference(letters) => Ok(self.reference(letters)),
            Token::Name(name) => self.call(name),
            Token::OpenParen => {
                let expr = self.expression()?;
                match self.next()? {
                    Token::CloseParen => Ok(expr),
                    token => Err(self.unexpected(token)),
                }
            }
            token => Err(self.unexpected(token)),
        }
    }

    fn reference(&self, letters: String) -> Expr {
        match self.letters.get(&letters) {
            Some(name) => Expr::field(name),
            None => {
                tracing::warn!(formula = self.formula, letters = %letters, "reference to unmapped column compiled as 0");
                Expr::UnknownColumn { letters }
            }
        }
    }

    fn call(&mut self, name: String) -> Result<Expr, FormulaError> {
        let function = Function::parse(&name).ok_or_else(|| FormulaError::UnknownFunctionError(name.to_owned()))?;
        match self.next()? {
            Token::OpenParen => (),
            token => return Err(self.unexpected(token)),
        }

        let mut arguments = Vec::new();
        if self.tokens.next_if_eq(&Token::CloseParen).is_none() {
            loop {
                arguments.push(self.expression()?);
                match self.next()? {
                    Token::Separator => continue,
                    Token::CloseParen => break,
                    token => return Err(self.unexpected(token)),
                }
            }
        }

        let arity_ok = match function {
            Function::Sum => !arguments.is_empty(),
            Function::Round => (1..=2).contains(&arguments.len()),
        };
        if !arity_ok {
            return Err(FormulaError::ArgumentCountError {
                function: name,
                count: arguments.len(),
            });
        }
        Ok(Expr::Call { function, arguments })
    }
}
