use crate::spreadsheet::cell::Cell;

/// A row of cells as stored in the document, still compressed by repeat counts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    pub cells: Vec<Cell>,
    /// Value of `table:number-rows-repeated`
    pub repeat: usize,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Row { cells, repeat: 1 }
    }

    /// Expands repeated cells into `(position, cell)` pairs, 0-based.
    /// Stops at `limit` positions so trailing filler cells are never walked.
    pub fn positions(&self, limit: usize) -> impl Iterator<Item = (usize, &Cell)> + '_ {
        self.cells
            .iter()
            .scan(0usize, |position, cell| {
                let start = *position;
                *position = start.saturating_add(cell.repeat);
                Some((start, cell))
            })
            .take_while(move |(start, _)| *start < limit)
            .flat_map(move |(start, cell)| {
                let end = start.saturating_add(cell.repeat).min(limit);
                (start..end).map(move |position| (position, cell))
            })
    }

    /// Returns true if no cell of the row carries text or a formula
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|cell| cell.is_empty() && cell.formula.is_none())
    }
}

/// One sheet of the document: the first row is the header, the rest is data.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sheet {
    /// Raw `table:name`
    pub name: String,
    pub rows: Vec<Row>,
}

impl Sheet {
    pub fn new(name: &str) -> Self {
        Sheet {
            name: name.to_owned(),
            rows: Vec::new(),
        }
    }

    pub fn header(&self) -> Option<&Row> {
        self.rows.first()
    }

    pub fn data_rows(&self) -> &[Row] {
        self.rows.get(1..).unwrap_or_default()
    }
}
