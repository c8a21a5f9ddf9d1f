//! Workbook abstraction for broker exports.
//!
//! The reconciler only needs named sheets of header/rows records, so
//! parsing is hidden behind `WorkbookParserTrait`. The bundled parser
//! reads a multi-sheet CSV convention where each sheet starts with a
//! `## SheetName` marker line followed by a header row.

use super::import_model::ImportError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    /// Case-insensitive header lookup.
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(header))
    }

    /// Cell at `(row, column index)`, trimmed. Missing cells read as
    /// empty, matching how spreadsheet tools drop trailing blanks.
    pub fn cell<'a>(&'a self, row: &'a [String], index: Option<usize>) -> &'a str {
        index
            .and_then(|i| row.get(i))
            .map(|c| c.trim())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }
}

pub trait WorkbookParserTrait: Send + Sync {
    fn parse(&self, bytes: &[u8]) -> Result<Workbook, ImportError>;
}

/// Parses the `## Sheet` delimited CSV format produced by our export
/// tooling and by hand-maintained broker sheets.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvWorkbookParser;

impl CsvWorkbookParser {
    pub fn new() -> Self {
        CsvWorkbookParser
    }

    fn parse_block(name: &str, block: &str) -> Result<Sheet, ImportError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(block.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| ImportError::UnreadableWorkbook(format!("sheet {}: {}", name, e)))?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record
                .map_err(|e| ImportError::UnreadableWorkbook(format!("sheet {}: {}", name, e)))?;
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }

        Ok(Sheet {
            name: name.to_string(),
            headers,
            rows,
        })
    }
}

impl WorkbookParserTrait for CsvWorkbookParser {
    fn parse(&self, bytes: &[u8]) -> Result<Workbook, ImportError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ImportError::UnreadableWorkbook(e.to_string()))?;

        let mut workbook = Workbook::default();
        let mut current_name: Option<String> = None;
        let mut current_block = String::new();

        for line in text.lines() {
            if let Some(marker) = line.trim_start().strip_prefix("##") {
                if let Some(name) = current_name.take() {
                    workbook
                        .sheets
                        .push(Self::parse_block(&name, &current_block)?);
                }
                current_name = Some(marker.trim().to_string());
                current_block.clear();
            } else if current_name.is_some() {
                current_block.push_str(line);
                current_block.push('\n');
            } else if !line.trim().is_empty() {
                return Err(ImportError::UnreadableWorkbook(
                    "content before the first '## Sheet' marker".to_string(),
                ));
            }
        }
        if let Some(name) = current_name {
            workbook
                .sheets
                .push(Self::parse_block(&name, &current_block)?);
        }

        if workbook.sheets.is_empty() {
            return Err(ImportError::UnreadableWorkbook(
                "no sheets found".to_string(),
            ));
        }
        Ok(workbook)
    }
}
