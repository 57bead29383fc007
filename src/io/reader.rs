use std::io::BufRead;

use crate::error::{Error, ParseErrorKind, Result};

/// Byte-at-a-time reader which folds `\r\n` into `\n` and keeps track of
/// the position for diagnostics.
pub struct ByteReader<R> {
    inner: R,
    path: String,
    line: u64,
    bytes: u64,
}

impl<R: BufRead> ByteReader<R> {
    pub fn new(inner: R, path: impl Into<String>) -> Self {
        Self {
            inner,
            path: path.into(),
            line: 1,
            bytes: 0,
        }
    }

    fn read_raw(&mut self) -> Result<Option<u8>> {
        let buf = match self.inner.fill_buf() {
            Ok(buf) => buf,
            Err(source) => {
                return Err(Error::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let byte = buf.first().copied();
        if byte.is_some() {
            self.inner.consume(1);
            self.bytes += 1;
        }
        Ok(byte)
    }

    /// Returns the next logical byte, `None` at the end of the input.
    pub fn next(&mut self) -> Result<Option<u8>> {
        let mut byte = self.read_raw()?;
        if byte == Some(b'\r') {
            byte = self.read_raw()?;
            if byte != Some(b'\n') {
                return Err(self.error(ParseErrorKind::CarriageReturn));
            }
        }
        if byte == Some(b'\n') {
            self.line += 1;
        }
        Ok(byte)
    }

    pub fn error(&self, kind: ParseErrorKind) -> Error {
        Error::Parse {
            line: self.line,
            path: self.path.clone(),
            kind,
        }
    }

    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ParseErrorKind;

    use super::ByteReader;

    fn drain(input: &[u8]) -> (Vec<u8>, u64, u64) {
        let mut reader = ByteReader::new(input, "<test>");
        let mut out = vec![];
        while let Some(byte) = reader.next().unwrap() {
            out.push(byte);
        }
        (out, reader.line(), reader.bytes())
    }

    #[test]
    fn crlf() {
        let (out, line, bytes) = drain(b"1 0\r\n2 0\n");
        assert_eq!(out, b"1 0\n2 0\n");
        assert_eq!(line, 3);
        assert_eq!(bytes, 9);
    }

    #[test]
    fn bare_carriage_return() {
        let mut reader = ByteReader::new(&b"p\rcnf"[..], "<test>");
        assert_eq!(reader.next().unwrap(), Some(b'p'));
        let err = reader.next().unwrap_err();
        assert_eq!(err.parse_kind(), Some(&ParseErrorKind::CarriageReturn));
        assert!(err.to_string().starts_with("parse error at line 1 in '<test>'"));
    }

    #[test]
    fn carriage_return_at_end() {
        let mut reader = ByteReader::new(&b"\r"[..], "<test>");
        assert!(reader.next().is_err());
    }

    #[test]
    fn empty() {
        let (out, line, bytes) = drain(b"");
        assert!(out.is_empty());
        assert_eq!((line, bytes), (1, 0));
    }
}
