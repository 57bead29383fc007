//! Streaming DIMACS CNF parser.
//!
//! Literals are handed to a [`ClauseSink`] as soon as they are read, the
//! terminating zeros included, so no clause is ever buffered here.

use std::{io::BufRead, time::Instant};

use log::info;

use crate::{
    error::{ParseErrorKind, Result},
    solver::ClauseSink,
    types::Lit,
};

use super::reader::ByteReader;

/// The `p cnf <variables> <clauses>` line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub variables: Lit,
    pub clauses: usize,
}

/// Summary of a successful parse.
#[derive(Clone, Copy, Debug)]
pub struct Dimacs {
    pub header: Header,
    pub clauses: usize,
    pub seconds: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Lexer {
    Blank,
    Comment,
}

struct CountErrors {
    leading_zero: ParseErrorKind,
    way_too_big: ParseErrorKind,
    too_big: ParseErrorKind,
}

pub struct Parser<'a, R> {
    reader: &'a mut ByteReader<R>,
    lexer: Lexer,
}

impl<'a, R: BufRead> Parser<'a, R> {
    pub fn new(reader: &'a mut ByteReader<R>) -> Self {
        Self {
            reader,
            lexer: Lexer::Blank,
        }
    }

    fn fail<T>(&self, kind: ParseErrorKind) -> Result<T> {
        Err(self.reader.error(kind))
    }

    fn expect(&mut self, byte: u8, expected: &'static str, after: &str) -> Result<()> {
        if self.reader.next()? != Some(byte) {
            return self.fail(ParseErrorKind::expected(expected, after));
        }
        Ok(())
    }

    fn skip_blanks(&mut self) -> Result<Option<u8>> {
        loop {
            match self.reader.next()? {
                Some(b' ' | b'\t') => continue,
                other => return Ok(other),
            }
        }
    }

    /// Reads the rest of a decimal count whose first digit is `first`.
    /// Returns the value and the byte following it.
    fn read_count(
        &mut self,
        first: u8,
        limit: usize,
        errors: CountErrors,
    ) -> Result<(usize, Option<u8>)> {
        let mut count = (first - b'0') as usize;
        loop {
            let byte = self.reader.next()?;
            let digit = match byte {
                Some(digit @ b'0'..=b'9') => (digit - b'0') as usize,
                _ => return Ok((count, byte)),
            };
            if count == 0 {
                return self.fail(errors.leading_zero);
            }
            if limit / 10 < count {
                return self.fail(errors.way_too_big);
            }
            count *= 10;
            if limit - digit < count {
                return self.fail(errors.too_big);
            }
            count += digit;
        }
    }

    pub fn parse_header(&mut self) -> Result<Header> {
        let mut byte = self.reader.next()?;
        while byte == Some(b'c') {
            loop {
                match self.reader.next()? {
                    Some(b'\n') => break,
                    None => return self.fail(ParseErrorKind::HeaderCommentEof),
                    _ => (),
                }
            }
            byte = self.reader.next()?;
        }
        if byte != Some(b'p') {
            return self.fail(ParseErrorKind::ExpectedHeader);
        }
        self.expect(b' ', "space", "p")?;
        self.expect(b'c', "'c'", "p ")?;
        self.expect(b'n', "'n'", "p c")?;
        self.expect(b'f', "'f'", "p cn")?;
        if !matches!(self.reader.next()?, Some(b' ' | b'\t')) {
            return self.fail(ParseErrorKind::expected("space", "p cnf"));
        }

        let first = match self.skip_blanks()? {
            Some(digit @ b'0'..=b'9') => digit,
            _ => return self.fail(ParseErrorKind::expected("digit", "p cnf ")),
        };
        let (variables, byte) = self.read_count(
            first,
            Lit::MAX as usize,
            CountErrors {
                leading_zero: ParseErrorKind::VariablesLeadingZero,
                way_too_big: ParseErrorKind::VariablesWayTooBig,
                too_big: ParseErrorKind::VariablesTooBig,
            },
        )?;
        let variables = variables as Lit;
        if !matches!(byte, Some(b' ' | b'\t')) {
            return self.fail(ParseErrorKind::expected(
                "space",
                format!("p cnf {variables}"),
            ));
        }

        let first = match self.skip_blanks()? {
            Some(digit @ b'0'..=b'9') => digit,
            _ => {
                return self.fail(ParseErrorKind::expected(
                    "digit",
                    format!("p cnf {variables} "),
                ))
            }
        };
        let (clauses, mut byte) = self.read_count(
            first,
            usize::MAX,
            CountErrors {
                leading_zero: ParseErrorKind::ClausesLeadingZero,
                way_too_big: ParseErrorKind::ClausesWayTooMany,
                too_big: ParseErrorKind::ClausesTooMany,
            },
        )?;
        if matches!(byte, Some(b' ' | b'\t')) {
            byte = self.skip_blanks()?;
        }
        if byte != Some(b'\n') {
            return self.fail(ParseErrorKind::expected(
                "new line",
                format!("p cnf {variables} {clauses}"),
            ));
        }

        Ok(Header { variables, clauses })
    }

    fn skip_comment(&mut self) -> Result<()> {
        loop {
            match self.reader.next()? {
                Some(b'\n') => return Ok(()),
                None => return self.fail(ParseErrorKind::CommentEof),
                _ => (),
            }
        }
    }

    /// Lexes the next body literal, `None` at the end of the input.
    ///
    /// A number directly followed by `c` switches the lexer into comment
    /// mode instead of being rejected, e.g. `1c comment`.
    /// `accepting` is false once all declared clauses have been read.
    fn next_literal(&mut self, accepting: bool) -> Result<Option<Lit>> {
        loop {
            if self.lexer == Lexer::Comment {
                self.skip_comment()?;
                self.lexer = Lexer::Blank;
            }

            let byte = match self.reader.next()? {
                None => return Ok(None),
                Some(b' ' | b'\t' | b'\n') => continue,
                Some(b'c') => {
                    self.lexer = Lexer::Comment;
                    continue;
                }
                Some(byte) => byte,
            };

            let (negative, first) = match byte {
                b'-' => match self.reader.next()? {
                    Some(digit @ b'0'..=b'9') => (true, digit),
                    _ => return self.fail(ParseErrorKind::expected("digit", "-")),
                },
                b'0'..=b'9' => (false, byte),
                _ => return self.fail(ParseErrorKind::ExpectedNumber),
            };

            if !accepting {
                return self.fail(ParseErrorKind::TooManyClauses);
            }

            let mut lit = (first - b'0') as Lit;
            let terminator = loop {
                let byte = self.reader.next()?;
                let digit = match byte {
                    Some(digit @ b'0'..=b'9') => (digit - b'0') as Lit,
                    _ => break byte,
                };
                if lit == 0 {
                    return self.fail(ParseErrorKind::LiteralLeadingZero);
                }
                lit = match lit.checked_mul(10) {
                    Some(lit) => lit,
                    None => return self.fail(ParseErrorKind::NumberWayTooLarge),
                };
                lit = match lit.checked_add(digit) {
                    Some(lit) => lit,
                    None => return self.fail(ParseErrorKind::NumberTooLarge),
                };
            };
            if negative {
                lit = -lit;
            }

            match terminator {
                None | Some(b' ' | b'\t' | b'\n') => (),
                Some(b'c') => self.lexer = Lexer::Comment,
                Some(_) => return self.fail(ParseErrorKind::UnexpectedCharacter(lit)),
            }

            return Ok(Some(lit));
        }
    }

    /// Forwards all body literals to `sink` and returns the number of clauses.
    pub fn parse_body<S: ClauseSink + ?Sized>(
        &mut self,
        header: &Header,
        sink: &mut S,
    ) -> Result<usize> {
        let mut parsed: usize = 0;
        let mut last: Lit = 0;

        while let Some(lit) = self.next_literal(parsed < header.clauses)? {
            if lit.unsigned_abs() > header.variables.unsigned_abs() {
                return self.fail(ParseErrorKind::LiteralOutOfRange {
                    lit,
                    max: header.variables,
                });
            }
            if lit == 0 {
                parsed += 1;
            }
            sink.add(lit);
            last = lit;
        }

        if last != 0 {
            return self.fail(ParseErrorKind::MissingZero(last));
        }
        if parsed < header.clauses {
            if parsed + 1 == header.clauses {
                return self.fail(ParseErrorKind::SingleClauseMissing);
            }
            return self.fail(ParseErrorKind::ClausesMissing(header.clauses - parsed));
        }

        Ok(parsed)
    }
}

/// Parses a complete DIMACS file from `reader` into `sink`.
pub fn parse<R: BufRead, S: ClauseSink + ?Sized>(
    reader: &mut ByteReader<R>,
    sink: &mut S,
) -> Result<Dimacs> {
    let start = Instant::now();
    info!("parsing '{}'", reader.path());

    let mut parser = Parser::new(reader);
    let header = parser.parse_header()?;
    info!(
        "parsed 'p cnf {} {}' header",
        header.variables, header.clauses
    );

    let clauses = parser.parse_body(&header, sink)?;
    let seconds = start.elapsed().as_secs_f64();
    if clauses == 1 {
        info!("parsed exactly one clause in {seconds:.2} seconds");
    } else {
        info!("parsed {clauses} clauses in {seconds:.2} seconds");
    }

    Ok(Dimacs {
        header,
        clauses,
        seconds,
    })
}
