//! JSON I/O handling for CLI
//!
//! - Input: one JSON object per line on stdin, blank lines skipped
//! - Output: one JSON object per line on stdout
//! - UTF-8 only

use std::io::{self, BufRead, Write};

use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Read JSON requests from stdin until EOF (for the serve command)
pub fn read_requests() -> impl Iterator<Item = CliResult<Value>> {
    parse_lines(io::stdin().lock())
}

fn parse_lines<R: BufRead>(input: R) -> impl Iterator<Item = CliResult<Value>> {
    input.lines().filter_map(|line| match line {
        Ok(line) if line.trim().is_empty() => None,
        Ok(line) => Some(serde_json::from_str(&line).map_err(CliError::from)),
        Err(e) => Some(Err(CliError::from(e))),
    })
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });

    write_line(&response)
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    });

    write_line(&response)
}

fn write_line(response: &Value) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_lines_skips_blank() {
        let input = Cursor::new("{\"op\":\"find\"}\n\n   \n{\"op\":\"book\"}\n");
        let requests: Vec<_> = parse_lines(input).map(|r| r.unwrap()).collect();

        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1]["op"], "book");
    }

    #[test]
    fn test_parse_lines_reports_bad_json() {
        let input = Cursor::new("not json\n{\"op\":\"find\"}\n");
        let requests: Vec<_> = parse_lines(input).collect();

        assert!(matches!(&requests[0], Err(e) if !e.ends_session()));
        assert!(requests[1].is_ok());
    }
}
