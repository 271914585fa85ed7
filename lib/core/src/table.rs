//! Reader for the header-less, comma separated tables written by the
//! feature extractor.
//!
//! Fields may be wrapped in double quotes (needed when a file path contains
//! a comma); a doubled quote inside a quoted field is a literal quote.
//! Records never span lines.

use crate::{Error, Result};
use std::io::BufRead;

/// One parsed table row with its 1-based line number
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub line: usize,
    pub fields: Vec<String>,
}

/// Read all non-blank records from `reader`.
///
/// `source_name` is only used in error messages.
pub fn read_records<R: BufRead>(reader: R, source_name: &str) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        let trimmed = line.trim_end_matches('\r');
        if trimmed.trim().is_empty() {
            continue;
        }
        let fields = split_record(trimmed)
            .map_err(|message| Error::parse(source_name, line_no, message))?;
        records.push(Record {
            line: line_no,
            fields,
        });
    }
    Ok(records)
}

/// Split one line into fields
pub fn split_record(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();
    let mut in_quotes = false;
    let mut field_was_quoted = false;

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    current.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => current.push(c),
            }
            continue;
        }
        match c {
            ',' => {
                fields.push(std::mem::take(&mut current));
                field_was_quoted = false;
            }
            '"' if current.is_empty() && !field_was_quoted => {
                in_quotes = true;
                field_was_quoted = true;
            }
            '"' => return Err("unexpected quote inside unquoted field".to_string()),
            _ if field_was_quoted => {
                return Err(format!("unexpected character '{}' after closing quote", c))
            }
            _ => current.push(c),
        }
    }

    if in_quotes {
        return Err("unterminated quoted field".to_string());
    }
    fields.push(current);
    Ok(fields)
}

/// Parse a float cell, naming the column on failure
pub(crate) fn parse_float(
    cell: &str,
    column: &str,
    source_name: &str,
    line: usize,
) -> Result<f64> {
    cell.trim().parse::<f64>().map_err(|_| {
        Error::parse(
            source_name,
            line,
            format!("column '{}': '{}' is not a number", column, cell),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_split_plain() {
        let fields = split_record("audio/a.mp3,120.5,C,major").unwrap();
        assert_eq!(fields, vec!["audio/a.mp3", "120.5", "C", "major"]);
    }

    #[test]
    fn test_split_quoted_with_comma() {
        let fields = split_record("\"audio/Hello, World.mp3\",1.0").unwrap();
        assert_eq!(fields, vec!["audio/Hello, World.mp3", "1.0"]);
    }

    #[test]
    fn test_split_escaped_quote() {
        let fields = split_record("\"say \"\"hi\"\"\",2").unwrap();
        assert_eq!(fields, vec!["say \"hi\"", "2"]);
    }

    #[test]
    fn test_split_empty_fields() {
        let fields = split_record("a,,b,").unwrap();
        assert_eq!(fields, vec!["a", "", "b", ""]);
    }

    #[test]
    fn test_split_unterminated_quote() {
        assert!(split_record("\"abc,1").is_err());
    }

    #[test]
    fn test_read_records_skips_blank_lines() {
        let data = "a,1\r\n\n   \nb,2\n";
        let records = read_records(Cursor::new(data), "test.csv").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line, 1);
        assert_eq!(records[1].line, 4);
        assert_eq!(records[1].fields, vec!["b", "2"]);
    }

    #[test]
    fn test_read_records_reports_line() {
        let data = "a,1\n\"broken,2\n";
        let err = read_records(Cursor::new(data), "test.csv").unwrap_err();
        match err {
            Error::Parse { line, source_name, .. } => {
                assert_eq!(line, 2);
                assert_eq!(source_name, "test.csv");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
