//! Reader for the request trace file.
//!
//! One request per line: `<op>,<address>[,<data>]`. The operation is a
//! single `W`/`R` letter in either case, numbers are decimal or
//! `0x`-prefixed hex, and whitespace around any token is ignored. Writes
//! must carry a data column, reads must not (an empty or absent third
//! column is fine). Whitespace-only lines are skipped. Diagnostics name the
//! 1-based source line.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::common::Request;
use crate::error::SimError;

pub fn read_requests(path: &Path) -> Result<Vec<Request>, SimError> {
    let file = File::open(path).map_err(|source| SimError::InputIo {
        path: path.to_path_buf(),
        source,
    })?;
    parse_requests(BufReader::new(file), path)
}

fn parse_requests<R: BufRead>(reader: R, path: &Path) -> Result<Vec<Request>, SimError> {
    let mut requests = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| SimError::InputIo {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(request) = parse_line(&line, i + 1)? {
            requests.push(request);
        }
    }
    if requests.is_empty() {
        return Err(SimError::EmptyTrace);
    }
    Ok(requests)
}

fn parse_line(line: &str, line_no: usize) -> Result<Option<Request>, SimError> {
    if line.trim().is_empty() {
        return Ok(None);
    }
    let columns: Vec<&str> = line.split(',').collect();
    if columns.len() > 3 {
        return Err(SimError::TooManyColumns { line: line_no });
    }

    let we = parse_operation(columns[0], line_no)?;

    let addr = match columns.get(1).map(|c| c.trim()) {
        Some(token) if !token.is_empty() => parse_number(token, line_no)?,
        _ => return Err(SimError::MissingAddress { line: line_no }),
    };

    let data = match columns.get(2).map(|c| c.trim()) {
        Some(token) if !token.is_empty() => {
            if !we {
                return Err(SimError::DataOnRead {
                    line: line_no,
                    found: first_char_code(token),
                });
            }
            parse_number(token, line_no)?
        }
        _ => {
            if we {
                return Err(SimError::MissingData { line: line_no });
            }
            0
        }
    };

    Ok(Some(Request { addr, data, we }))
}

/// A single 'W' or 'R', case-insensitive, surrounded by optional
/// whitespace. Anything else is rejected with the offending character.
fn parse_operation(column: &str, line_no: usize) -> Result<bool, SimError> {
    let mut op = None;
    for ch in column.chars() {
        if ch.is_whitespace() {
            continue;
        }
        match (ch, op) {
            ('W' | 'w', None) => op = Some(true),
            ('R' | 'r', None) => op = Some(false),
            _ => {
                return Err(SimError::InvalidOperation {
                    line: line_no,
                    found: ch as u32,
                })
            }
        }
    }
    op.ok_or(SimError::MissingOperation { line: line_no })
}

fn parse_number(token: &str, line_no: usize) -> Result<u32, SimError> {
    let (digits, radix) = match token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (token, 10),
    };
    u32::from_str_radix(digits, radix).map_err(|_| SimError::InvalidNumber {
        line: line_no,
        token: token.to_string(),
    })
}

fn first_char_code(token: &str) -> u32 {
    token.chars().next().map_or(0, |ch| ch as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn parse(input: &str) -> Result<Vec<Request>, SimError> {
        parse_requests(Cursor::new(input), &PathBuf::from("test.csv"))
    }

    #[test]
    fn reads_and_writes_in_hex_and_decimal() {
        let requests = parse("W,0x10,0xDEADBEEF\nR,16\nw,32,42\nr,0X20\n").unwrap();
        assert_eq!(
            requests,
            vec![
                Request {
                    addr: 0x10,
                    data: 0xDEADBEEF,
                    we: true
                },
                Request {
                    addr: 16,
                    data: 0,
                    we: false
                },
                Request {
                    addr: 32,
                    data: 42,
                    we: true
                },
                Request {
                    addr: 0x20,
                    data: 0,
                    we: false
                },
            ]
        );
    }

    #[test]
    fn whitespace_around_tokens_is_ignored() {
        let requests = parse("  W , 0x10 , 7 \n R ,8,\n").unwrap();
        assert_eq!(requests[0].addr, 0x10);
        assert_eq!(requests[0].data, 7);
        assert!(!requests[1].we);
    }

    #[test]
    fn empty_lines_are_skipped_but_counted() {
        let err = parse("R,0\n\n   \nX,1\n").unwrap_err();
        assert!(
            matches!(err, SimError::InvalidOperation { line: 4, found } if found == u32::from(b'X'))
        );
    }

    #[test]
    fn read_with_data_is_rejected() {
        let err = parse("R,0x10,5\n").unwrap_err();
        assert!(matches!(err, SimError::DataOnRead { line: 1, .. }));
    }

    #[test]
    fn write_without_data_is_rejected() {
        assert!(matches!(
            parse("W,0x10\n").unwrap_err(),
            SimError::MissingData { line: 1 }
        ));
        assert!(matches!(
            parse("W,0x10,   \n").unwrap_err(),
            SimError::MissingData { line: 1 }
        ));
    }

    #[test]
    fn missing_or_empty_columns_are_rejected() {
        assert!(matches!(
            parse("R\n").unwrap_err(),
            SimError::MissingAddress { line: 1 }
        ));
        assert!(matches!(
            parse("R, ,5\n").unwrap_err(),
            SimError::MissingAddress { line: 1 }
        ));
        assert!(matches!(
            parse(",0x10\n").unwrap_err(),
            SimError::MissingOperation { line: 1 }
        ));
    }

    #[test]
    fn too_many_columns_are_rejected() {
        assert!(matches!(
            parse("W,0,1,2\n").unwrap_err(),
            SimError::TooManyColumns { line: 1 }
        ));
        assert!(matches!(
            parse("R,0,,\n").unwrap_err(),
            SimError::TooManyColumns { line: 1 }
        ));
    }

    #[test]
    fn double_operation_letter_is_rejected() {
        assert!(matches!(
            parse("WR,0\n").unwrap_err(),
            SimError::InvalidOperation { line: 1, .. }
        ));
    }

    #[test]
    fn out_of_range_and_garbage_numbers_are_rejected() {
        assert!(matches!(
            parse("W,0x100000000,1\n").unwrap_err(),
            SimError::InvalidNumber { line: 1, .. }
        ));
        assert!(matches!(
            parse("R,12abc\n").unwrap_err(),
            SimError::InvalidNumber { line: 1, .. }
        ));
        assert!(matches!(
            parse("R,0x\n").unwrap_err(),
            SimError::InvalidNumber { line: 1, .. }
        ));
        assert!(matches!(
            parse("R,-4\n").unwrap_err(),
            SimError::InvalidNumber { line: 1, .. }
        ));
    }

    #[test]
    fn an_empty_file_has_nothing_to_run() {
        assert!(matches!(parse("").unwrap_err(), SimError::EmptyTrace));
        assert!(matches!(parse("\n  \n").unwrap_err(), SimError::EmptyTrace));
    }

    #[test]
    fn boundary_values_parse() {
        let requests = parse("W,4294967295,0xFFFFFFFF\nR,0\n").unwrap();
        assert_eq!(requests[0].addr, u32::MAX);
        assert_eq!(requests[0].data, u32::MAX);
        assert_eq!(requests[1].addr, 0);
    }
}
