/// One decoded `table:table-cell` (or covered cell) of a row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cell {
    /// Trimmed text content, empty when the cell has no text node
    pub text: String,
    /// Number of consecutive column positions this cell stands for
    pub repeat: usize,
    /// Raw `table:formula` attribute, e.g. `of:=[.C7]*0.21`
    pub formula: Option<String>,
}

impl Cell {
    pub fn new(text: &str) -> Self {
        Cell {
            text: text.trim().to_owned(),
            repeat: 1,
            formula: None,
        }
    }

    pub fn repeated(mut self, repeat: usize) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn with_formula(mut self, formula: &str) -> Self {
        self.formula = Some(formula.to_owned());
        self
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
