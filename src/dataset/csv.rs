//! Minimal CSV encoding and parsing for the flat dataset tables.
//!
//! Quoting follows RFC 4180: fields containing commas, quotes, or line breaks
//! are wrapped in double quotes with embedded quotes doubled. The parser
//! accepts both LF and CRLF records; the encoder always emits LF.

use thiserror::Error;

/// Errors raised while parsing CSV bytes.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Input is not valid UTF-8.
    #[error("CSV is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// A record has a different field count than the header.
    #[error("CSV record {record} has {found} fields, expected {expected}")]
    RaggedRecord {
        record: usize,
        expected: usize,
        found: usize,
    },

    /// A quoted field is malformed.
    #[error("CSV record {record}: {reason}")]
    Malformed { record: usize, reason: String },

    /// The input has no header record.
    #[error("CSV input is empty")]
    Empty,
}

/// Encodes a header plus rows as CSV text.
pub fn encode(header: &[String], rows: &[Vec<String>]) -> String {
    // Rough preallocation: header + rows, ~16 bytes per field.
    let field_count = header.len();
    let mut out = String::with_capacity((rows.len() + 1) * field_count * 16);
    encode_record(header.iter().map(String::as_str), &mut out);
    for row in rows {
        encode_record(row.iter().map(String::as_str), &mut out);
    }
    out
}

fn encode_record<'a>(fields: impl Iterator<Item = &'a str>, out: &mut String) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        encode_field(field, out);
    }
    out.push('\n');
}

fn encode_field(field: &str, out: &mut String) {
    let needs_quoting = field
        .chars()
        .any(|c| matches!(c, ',' | '"' | '\n' | '\r'));
    if !needs_quoting {
        out.push_str(field);
        return;
    }
    out.push('"');
    for c in field.chars() {
        if c == '"' {
            out.push('"');
        }
        out.push(c);
    }
    out.push('"');
}

/// Parses CSV bytes into a header record and data records.
///
/// Every record must have the same field count as the header; a trailing
/// newline after the last record is accepted.
pub fn parse(bytes: &[u8]) -> Result<(Vec<String>, Vec<Vec<String>>), CsvError> {
    let text = std::str::from_utf8(bytes)?;
    let mut records = parse_records(text)?;
    if records.is_empty() {
        return Err(CsvError::Empty);
    }

    let header = records.remove(0);
    for (i, record) in records.iter().enumerate() {
        if record.len() != header.len() {
            return Err(CsvError::RaggedRecord {
                // Record numbers are 1-based and count the header.
                record: i + 2,
                expected: header.len(),
                found: record.len(),
            });
        }
    }
    Ok((header, records))
}

/// Splits CSV text into records of fields, honoring quoted fields.
fn parse_records(text: &str) -> Result<Vec<Vec<String>>, CsvError> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();
    // Tracks whether the current record has any content, so a trailing
    // newline does not produce a phantom empty record.
    let mut record_started = false;

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => {
                if !field.is_empty() {
                    return Err(CsvError::Malformed {
                        record: records.len() + 1,
                        reason: "quote inside unquoted field".to_string(),
                    });
                }
                in_quotes = true;
                record_started = true;
            }
            ',' => {
                fields.push(std::mem::take(&mut field));
                record_started = true;
            }
            '\r' => {
                // Consumed as part of CRLF; a bare CR is treated the same.
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                fields.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut fields));
                record_started = false;
            }
            '\n' => {
                fields.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut fields));
                record_started = false;
            }
            _ => {
                field.push(c);
                record_started = true;
            }
        }
    }

    if in_quotes {
        return Err(CsvError::Malformed {
            record: records.len() + 1,
            reason: "unterminated quoted field".to_string(),
        });
    }
    if record_started || !fields.is_empty() {
        fields.push(field);
        records.push(fields);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_encode_plain_fields() {
        let header = strings(&["a", "b"]);
        let rows = vec![strings(&["1", "2"]), strings(&["3", "4"])];
        assert_eq!(encode(&header, &rows), "a,b\n1,2\n3,4\n");
    }

    #[test]
    fn test_encode_quotes_special_fields() {
        let header = strings(&["id", "text"]);
        let rows = vec![strings(&["1", "hello, world"]), strings(&["2", "say \"hi\""])];
        assert_eq!(
            encode(&header, &rows),
            "id,text\n1,\"hello, world\"\n2,\"say \"\"hi\"\"\"\n"
        );
    }

    #[test]
    fn test_parse_roundtrip() {
        let header = strings(&["id", "desc", "value"]);
        let rows = vec![
            strings(&["1", "plain", "10.00"]),
            strings(&["2", "with, comma", ""]),
            strings(&["3", "line\nbreak", "\"quoted\""]),
        ];
        let encoded = encode(&header, &rows);
        let (parsed_header, parsed_rows) = parse(encoded.as_bytes()).unwrap();
        assert_eq!(parsed_header, header);
        assert_eq!(parsed_rows, rows);
    }

    #[test]
    fn test_parse_accepts_crlf() {
        let (header, rows) = parse(b"a,b\r\n1,2\r\n").unwrap();
        assert_eq!(header, strings(&["a", "b"]));
        assert_eq!(rows, vec![strings(&["1", "2"])]);
    }

    #[test]
    fn test_parse_without_trailing_newline() {
        let (_, rows) = parse(b"a,b\n1,2").unwrap();
        assert_eq!(rows, vec![strings(&["1", "2"])]);
    }

    #[test]
    fn test_parse_empty_trailing_field() {
        let (_, rows) = parse(b"a,b\n1,\n").unwrap();
        assert_eq!(rows, vec![strings(&["1", ""])]);
    }

    #[test]
    fn test_ragged_record_rejected() {
        let err = parse(b"a,b\n1,2,3\n").unwrap_err();
        assert!(matches!(
            err,
            CsvError::RaggedRecord {
                record: 2,
                expected: 2,
                found: 3
            }
        ));
    }

    #[test]
    fn test_unterminated_quote_rejected() {
        assert!(matches!(
            parse(b"a\n\"unterminated\n"),
            Err(CsvError::Malformed { .. })
        ));
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(matches!(parse(b""), Err(CsvError::Empty)));
    }
}
