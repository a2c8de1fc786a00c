use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::sheet::Row;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::ParseError;
use crate::spreadsheet::SheetParseError;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::name::QName;

/// XML element name for spreadsheet root
const SPREADSHEET: QName = QName(b"office:spreadsheet");
/// XML element name for table (sheet)
const TABLE: QName = QName(b"table:table");
/// XML element name for table row
const TABLE_ROW: QName = QName(b"table:table-row");
/// XML element name for table cell
const TABLE_CELL: QName = QName(b"table:table-cell");
/// XML element name for covered table cell (merged cells)
const TABLE_COVERED_CELL: QName = QName(b"table:covered-table-cell");
/// XML element name for annotations (comments)
const ANNOTATION: QName = QName(b"office:annotation");
/// XML element name for paragraph text
const PARAGRAPH: QName = QName(b"text:p");
/// XML element name for string (space) text
const STRING: QName = QName(b"text:s");
const TAB: QName = QName(b"text:tab");
const LINE_BREAK: QName = QName(b"text:line-break");

/// Upper bound for the space count of a single `text:s` element
const MAX_SPACES: usize = 1024;

/// Decodes `content.xml` into sheets.
///
/// Only the structure `office:spreadsheet` → `table:table` → `table:table-row`
/// → `table:table-cell` is read; styles, column definitions and shapes are skipped.
/// A document without a spreadsheet body or with malformed XML is rejected as a
/// whole. A bad attribute or entity inside one sheet only fails that sheet.
pub(crate) fn parse_sheets(xml: &[u8]) -> Result<Vec<Result<Sheet, SheetParseError>>, ParseError> {
    let mut reader = XmlReader::new(xml);
    let mut sheets = Vec::<Result<Sheet, SheetParseError>>::new();
    let mut found_spreadsheet = false;

    // Sheet state
    let mut sheet: Option<Sheet> = None;
    let mut failure: Option<ParseError> = None;
    let mut row: Option<Row> = None;
    let mut cell: Option<Cell> = None;
    let mut value = String::new();
    let mut paragraphs = 0usize;
    let mut paragraph_context = false;
    // Context state
    let mut table_depth = 0usize; // nested tables inside cells are flattened away
    let mut comment_context = false;

    match_xml_events!(reader => {
        Event::Start(event) if event.name() == SPREADSHEET => found_spreadsheet = true,
        Event::End(event) if event.name() == SPREADSHEET => break,
        Event::Start(event) if found_spreadsheet && event.name() == TABLE => {
            table_depth += 1;
            if table_depth == 1 {
                let name = match event.get_attribute_value("table:name") {
                    Ok(Some(name)) => name.into_owned(),
                    Ok(None) => {
                        failure = Some(ParseError::MissingSheetNameError);
                        format!("#{}", sheets.len() + 1)
                    }
                    Err(error) => {
                        failure = Some(error);
                        format!("#{}", sheets.len() + 1)
                    }
                };
                sheet = Some(Sheet::new(&name));
            }
        }
        Event::End(event) if event.name() == TABLE => {
            table_depth = table_depth.saturating_sub(1);
            if table_depth == 0 {
                if let Some(sheet) = sheet.take() {
                    sheets.push(match failure.take() {
                        Some(source) => Err(SheetParseError {
                            sheet: sheet.name,
                            source,
                        }),
                        None => Ok(sheet),
                    });
                }
                row = None;
                cell = None;
                paragraph_context = false;
            }
        }
        Event::Start(event) if table_depth == 1 && event.name() == TABLE_ROW => {
            let repeat = event.parse_attribute_value::<usize>("table:number-rows-repeated");
            row = record(repeat, &mut failure).map(|repeat| Row {
                cells: Vec::new(),
                repeat: repeat.unwrap_or(1).max(1),
            });
        }
        Event::End(event) if table_depth == 1 && event.name() == TABLE_ROW => {
            if let (Some(sheet), Some(row)) = (sheet.as_mut(), row.take()) {
                sheet.rows.push(row);
            }
        }
        Event::Start(event) if table_depth == 1 && (event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL) => {
            cell = record(open_cell(&event), &mut failure);
            value.clear();
            paragraphs = 0;
            paragraph_context = false;
            comment_context = false;
        }
        Event::End(event) if table_depth == 1 && (event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL) => {
            if let (Some(row), Some(mut cell)) = (row.as_mut(), cell.take()) {
                cell.text = value.trim().to_owned();
                row.cells.push(cell);
            }
        }
        // Cell text content
        Event::Start(event) if cell.is_some() && event.name() == ANNOTATION => comment_context = true,
        Event::End(event) if cell.is_some() && event.name() == ANNOTATION => comment_context = false,
        Event::Start(event) if cell.is_some() && !comment_context && event.name() == PARAGRAPH => {
            if paragraphs > 0 {
                value.push('\n');
            }
            paragraphs += 1;
            paragraph_context = true;
        }
        Event::End(event) if cell.is_some() && !comment_context && event.name() == PARAGRAPH => paragraph_context = false,
        Event::Start(event) if paragraph_context && !comment_context && event.name() == STRING => {
            let count = event.parse_attribute_value::<usize>("text:c");
            if let Some(count) = record(count, &mut failure) {
                let count = count.unwrap_or(1).min(MAX_SPACES);
                value.push_str(&" ".repeat(count));
            }
        }
        Event::Start(event) if paragraph_context && !comment_context && event.name() == TAB => value.push('\t'),
        Event::Start(event) if paragraph_context && !comment_context && event.name() == LINE_BREAK => value.push('\n'),
        Event::Text(event) if paragraph_context && !comment_context => {
            record(value.push_bytes_text(&event), &mut failure);
        }
        Event::GeneralRef(event) if paragraph_context && !comment_context => {
            record(value.push_bytes_ref(&event), &mut failure);
        }
    });

    if !found_spreadsheet {
        Err(ParseError::MissingSpreadsheetError)?;
    }
    Ok(sheets)
}

/// Reads the repeat count and formula of a cell element
fn open_cell<'a>(event: &'a BytesStart<'a>) -> Result<Cell, ParseError> {
    let repeat = event
        .parse_attribute_value::<usize>("table:number-columns-repeated")?
        .unwrap_or(1);
    let formula = event
        .get_attribute_value("table:formula")?
        .map(|formula| formula.into_owned());
    Ok(Cell {
        text: String::new(),
        repeat: repeat.max(1),
        formula,
    })
}

/// Keeps the first error of the current sheet; `None` when `result` failed
fn record<T>(result: Result<T, ParseError>, failure: &mut Option<ParseError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            failure.get_or_insert(error);
            None
        }
    }
}
