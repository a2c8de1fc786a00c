use crate::formula::FormulaError;
use regex::Regex;
use std::iter::Peekable;
use std::str::CharIndices;
use std::sync::LazyLock;

/// `.C7`, `.$C$7` or `.C$7`: a single same-sheet cell
static REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\.\$?([A-Za-z]{1,3})\$?[0-9]+$").expect("Hardcode regex pattern"));

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Token {
    Number(f64),
    /// Column letters of a cell reference, upper-cased
    Reference(String),
    Name(String),
    Operator(char),
    OpenParen,
    CloseParen,
    Separator,
}

/// Splits OpenFormula text into tokens.
pub(crate) struct Lexer<'a> {
    formula: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(formula: &'a str) -> Self {
        Lexer {
            formula,
            chars: formula.char_indices().peekable(),
        }
    }

    pub(crate) fn tokenize(mut self) -> Result<Vec<Token>, FormulaError> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Option<Token>, FormulaError> {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}

        let Some(&(start, c)) = self.chars.peek() else {
            return Ok(None);
        };
        let token = match c {
            '0'..='9' | '.' => self.number(start)?,
            '[' => self.reference(start)?,
            c if c.is_alphabetic() || c == '_' => self.name(start),
            '(' => self.single(Token::OpenParen),
            ')' => self.single(Token::CloseParen),
            ';' | ',' => self.single(Token::Separator),
            '+' | '-' | '*' | '/' | '^' => self.single(Token::Operator(c)),
            _ => {
                return Err(FormulaError::UnexpectedCharacterError {
                    formula: self.formula.to_owned(),
                    character: c,
                })
            }
        };
        Ok(Some(token))
    }

    fn single(&mut self, token: Token) -> Token {
        self.chars.next();
        token
    }

    fn take_while<F: Fn(char) -> bool>(&mut self, predicate: F) {
        while self.chars.next_if(|&(_, c)| predicate(c)).is_some() {}
    }

    fn offset(&mut self) -> usize {
        self.chars.peek().map_or(self.formula.len(), |&(index, _)| index)
    }

    fn number(&mut self, start: usize) -> Result<Token, FormulaError> {
        self.take_while(|c| c.is_ascii_digit() || c == '.');
        if self.chars.next_if(|&(_, c)| c == 'e' || c == 'E').is_some() {
            self.chars.next_if(|&(_, c)| c == '+' || c == '-');
            self.take_while(|c| c.is_ascii_digit());
        }
        let end = self.offset();
        let text = &self.formula[start..end];
        text.parse::<f64>()
            .map(Token::Number)
            .map_err(|_| FormulaError::InvalidNumberError(text.to_owned()))
    }

    fn reference(&mut self, start: usize) -> Result<Token, FormulaError> {
        self.chars.next();
        self.take_while(|c| c != ']');
        let end = self.offset();
        if self.chars.next().is_none() {
            return Err(FormulaError::UnexpectedEndError(self.formula.to_owned()));
        }
        let inner = &self.formula[start + 1..end];
        match REFERENCE.captures(inner) {
            Some(captures) => Ok(Token::Reference(captures[1].to_ascii_uppercase())),
            None => Err(FormulaError::UnsupportedReferenceError(inner.to_owned())),
        }
    }

    fn name(&mut self, start: usize) -> Token {
        self.take_while(|c| c.is_alphanumeric() || c == '_' || c == '.');
        let end = self.offset();
        Token::Name(self.formula[start..end].to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tokenize(formula: &str) -> Result<Vec<Token>, FormulaError> {
        Lexer::new(formula).tokenize()
    }

    #[test]
    fn tokenize_arithmetic() {
        assert_eq!(
            tokenize("[.C7]*0.21").unwrap(),
            vec![
                Token::Reference("C".to_owned()),
                Token::Operator('*'),
                Token::Number(0.21),
            ]
        );
        assert_eq!(
            tokenize(" ( [.$b$2] + 1.5e2 )^-2 ").unwrap(),
            vec![
                Token::OpenParen,
                Token::Reference("B".to_owned()),
                Token::Operator('+'),
                Token::Number(150.0),
                Token::CloseParen,
                Token::Operator('^'),
                Token::Operator('-'),
                Token::Number(2.0),
            ]
        );
    }

    #[test]
    fn tokenize_function_call() {
        assert_eq!(
            tokenize("ROUND([.A1];2)").unwrap(),
            vec![
                Token::Name("ROUND".to_owned()),
                Token::OpenParen,
                Token::Reference("A".to_owned()),
                Token::Separator,
                Token::Number(2.0),
                Token::CloseParen,
            ]
        );
    }

    #[test]
    fn tokenize_rejects_ranges_and_strings() {
        assert!(matches!(
            tokenize("SUM([.B2:.B5])"),
            Err(FormulaError::UnsupportedReferenceError(inner)) if inner == ".B2:.B5"
        ));
        assert!(matches!(
            tokenize("[$Hoja2.A1]"),
            Err(FormulaError::UnsupportedReferenceError(_))
        ));
        assert!(matches!(
            tokenize(r#"[.A1]&"x""#),
            Err(FormulaError::UnexpectedCharacterError { character: '&', .. })
        ));
        assert!(matches!(tokenize("[.A1"), Err(FormulaError::UnexpectedEndError(_))));
        assert!(matches!(tokenize("1.2.3"), Err(FormulaError::InvalidNumberError(text)) if text == "1.2.3"));
    }
}
