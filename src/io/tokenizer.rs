//! Forward-only token stream over a TSPLIB file.
//!
//! Tokens are separated by any run of whitespace and `:` characters. The stream is
//! line-aware, because a few keys (`NAME`, `COMMENT`) take the remainder of their line
//! and coordinate autodetection inspects a whole line.

use std::io::BufRead;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Line {}: input ended, but expected {expected}", lineno + 1)]
    UnexpectedEof {
        lineno: usize,
        expected: &'static str,
    },

    #[error("Line {}: expected {expected}, found `{found}`", lineno + 1)]
    UnexpectedToken {
        lineno: usize,
        expected: &'static str,
        found: String,
    },
}

pub fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || c == ':'
}

pub struct Tokenizer<R> {
    reader: R,
    line: String,
    pos: usize,
    lines_read: usize,
}

impl<R: BufRead> Tokenizer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            pos: 0,
            lines_read: 0,
        }
    }

    /// 0-based number of the line the stream currently points into.
    pub fn lineno(&self) -> usize {
        self.lines_read.saturating_sub(1)
    }

    /// Returns the next token without consuming it.
    pub fn peek_token(&mut self) -> Result<Option<&str>, TokenError> {
        if !self.skip_delimiters()? {
            return Ok(None);
        }

        let end = self.token_end();
        Ok(Some(&self.line[self.pos..end]))
    }

    pub fn next_token(&mut self) -> Result<Option<String>, TokenError> {
        if !self.skip_delimiters()? {
            return Ok(None);
        }

        let end = self.token_end();
        let token = self.line[self.pos..end].to_string();
        self.pos = end;
        Ok(Some(token))
    }

    pub fn expect_token(&mut self, expected: &'static str) -> Result<String, TokenError> {
        match self.next_token()? {
            Some(token) => Ok(token),
            None => Err(TokenError::UnexpectedEof {
                lineno: self.lineno(),
                expected,
            }),
        }
    }

    pub fn next_int(&mut self, expected: &'static str) -> Result<i64, TokenError> {
        let token = self.expect_token(expected)?;
        match token.parse::<i64>() {
            Ok(value) => Ok(value),
            Err(_) => Err(self.unexpected(expected, token)),
        }
    }

    pub fn next_float(&mut self, expected: &'static str) -> Result<f64, TokenError> {
        let token = self.expect_token(expected)?;
        match token.parse::<f64>() {
            Ok(value) => Ok(value),
            Err(_) => Err(self.unexpected(expected, token)),
        }
    }

    /// Consumes the next token only if it is an integer. Returns `None` at the end of the
    /// input or if the next token is something else, which is then left in the stream.
    pub fn next_int_if_present(&mut self) -> Result<Option<i64>, TokenError> {
        let value = self
            .peek_token()?
            .and_then(|token| token.parse::<i64>().ok());

        if value.is_some() {
            self.next_token()?;
        }

        Ok(value)
    }

    /// Consumes and returns the rest of the current line, without leading delimiters
    /// and trailing whitespace. Never advances to another line.
    pub fn rest_of_line(&mut self) -> String {
        let rest = self.line[self.pos..]
            .trim_start_matches(is_delimiter)
            .trim_end()
            .to_string();
        self.pos = self.line.len();
        rest
    }

    /// Skips delimiters (including line breaks) and consumes the line the next token
    /// starts on.
    pub fn next_line(&mut self) -> Result<Option<String>, TokenError> {
        if !self.skip_delimiters()? {
            return Ok(None);
        }

        Ok(Some(self.rest_of_line()))
    }

    pub fn unexpected(&self, expected: &'static str, found: String) -> TokenError {
        TokenError::UnexpectedToken {
            lineno: self.lineno(),
            expected,
            found,
        }
    }

    /// Moves to the start of the next token; returns `false` at the end of the input.
    fn skip_delimiters(&mut self) -> Result<bool, TokenError> {
        loop {
            if let Some(offset) = self.line[self.pos..].find(|c: char| !is_delimiter(c)) {
                self.pos += offset;
                return Ok(true);
            }

            self.line.clear();
            self.pos = 0;
            if self.reader.read_line(&mut self.line)? == 0 {
                return Ok(false);
            }
            self.lines_read += 1;
        }
    }

    fn token_end(&self) -> usize {
        self.line[self.pos..]
            .find(is_delimiter)
            .map_or(self.line.len(), |offset| self.pos + offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_whitespace_and_colons() {
        let data = b"NAME: foo\nTYPE : TSP\n\n  DIMENSION:5 \r\n";
        let mut tokens = Tokenizer::new(&data[..]);

        let mut all = Vec::new();
        while let Some(t) = tokens.next_token().unwrap() {
            all.push(t);
        }

        assert_eq!(all, ["NAME", "foo", "TYPE", "TSP", "DIMENSION", "5"]);
        assert_eq!(tokens.next_token().unwrap(), None);
    }

    #[test]
    fn rest_of_line_stays_on_line() {
        let data = b"NAME : a280 (drilling)  \nCOMMENT\nTYPE";
        let mut tokens = Tokenizer::new(&data[..]);

        assert_eq!(tokens.next_token().unwrap().as_deref(), Some("NAME"));
        assert_eq!(tokens.rest_of_line(), "a280 (drilling)");
        assert_eq!(tokens.next_token().unwrap().as_deref(), Some("COMMENT"));
        assert_eq!(tokens.rest_of_line(), "");
        assert_eq!(tokens.next_token().unwrap().as_deref(), Some("TYPE"));
        assert_eq!(tokens.lineno(), 2);
    }

    #[test]
    fn next_line_crosses_line_breaks() {
        let data = b"NODE_COORD_SECTION\n\n 1 2.5 3\n2 4 5";
        let mut tokens = Tokenizer::new(&data[..]);

        tokens.next_token().unwrap();
        assert_eq!(tokens.next_line().unwrap().as_deref(), Some("1 2.5 3"));
        assert_eq!(tokens.next_int("index").unwrap(), 2);
        assert_eq!(tokens.next_float("x").unwrap(), 4.0);
        assert_eq!(tokens.next_float("y").unwrap(), 5.0);
        assert_eq!(tokens.next_line().unwrap(), None);
    }

    #[test]
    fn optional_integers() {
        let data = b"3 -1 EOF";
        let mut tokens = Tokenizer::new(&data[..]);

        assert_eq!(tokens.next_int_if_present().unwrap(), Some(3));
        assert_eq!(tokens.next_int_if_present().unwrap(), Some(-1));
        assert_eq!(tokens.next_int_if_present().unwrap(), None);
        assert_eq!(tokens.peek_token().unwrap(), Some("EOF"));
        assert_eq!(tokens.next_token().unwrap().as_deref(), Some("EOF"));
        assert_eq!(tokens.next_int_if_present().unwrap(), None);
    }

    #[test]
    fn malformed_numbers() {
        let data = b"12\nabc";
        let mut tokens = Tokenizer::new(&data[..]);

        assert_eq!(tokens.next_int("weight").unwrap(), 12);
        assert!(matches!(
            tokens.next_int("weight"),
            Err(TokenError::UnexpectedToken { lineno: 1, expected: "weight", ref found }) if found == "abc"
        ));
        assert!(matches!(
            tokens.next_float("x"),
            Err(TokenError::UnexpectedEof { lineno: 1, expected: "x" })
        ));
    }
}
