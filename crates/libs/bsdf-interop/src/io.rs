//! Readers and writers for the two line-oriented text grammars.
//!
//! Readers never retain state across files; a dataset is created from the
//! bytes of one file, transformed in memory and consumed by a writer. File
//! handles live inside the reader/writer call and are closed on every exit
//! path when the buffered stream drops.

use crate::error::Error;
use std::io::BufRead;

pub mod speos;
pub mod zemax;

/// Sequential line access over a buffered reader, with the trailing line
/// terminator stripped.
struct LineReader<R: BufRead> {
    inner: R,
    line_no: usize,
}

impl<R: BufRead> LineReader<R> {
    fn new(inner: R) -> Self { Self { inner, line_no: 0 } }

    /// Number of the most recently returned line, 1-based.
    fn line_no(&self) -> usize { self.line_no }

    /// Returns the next line, or an error at end of file.
    fn next_line(&mut self) -> Result<String, Error> {
        let mut buf = String::new();
        let read = self.inner.read_line(&mut buf)?;
        if read == 0 {
            return Err(Error::MalformedData(format!(
                "unexpected end of file after line {}",
                self.line_no
            )));
        }
        self.line_no += 1;
        while buf.ends_with('\n') || buf.ends_with('\r') {
            buf.pop();
        }
        Ok(buf)
    }

    /// Returns the next line that is neither blank nor a `#` comment.
    fn next_content(&mut self) -> Result<String, Error> {
        loop {
            let line = self.next_line()?;
            let trimmed = line.trim_start();
            if !trimmed.is_empty() && !trimmed.starts_with('#') {
                return Ok(line);
            }
        }
    }
}

/// Parses every whitespace-separated token of a line as a float.
fn parse_floats(line: &str, line_no: usize) -> Result<Vec<f64>, Error> {
    line.split_whitespace()
        .map(|token| {
            token.parse::<f64>().map_err(|_| {
                Error::MalformedData(format!("invalid number '{token}' on line {line_no}"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn line_reader_skips_comments_and_blanks() {
        let text = "# comment\n\nSource  Measured\nnext\n";
        let mut lines = LineReader::new(Cursor::new(text));
        assert_eq!(lines.next_content().unwrap(), "Source  Measured");
        assert_eq!(lines.next_content().unwrap(), "next");
        assert!(lines.next_content().is_err());
    }

    #[test]
    fn parse_floats_handles_tabs_and_spaces() {
        let values = parse_floats("0\t30.5  60\t90", 1).unwrap();
        assert_eq!(values, vec![0.0, 30.5, 60.0, 90.0]);
        assert!(parse_floats("1.0 abc", 2).is_err());
    }
}
