use std::io;

use thiserror::Error;

use crate::types::Lit;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that terminates the process before (or instead of) solving.
#[derive(Debug, Error)]
pub enum Error {
    #[error("parse error at line {line} in '{path}': {kind}")]
    Parse {
        line: u64,
        path: String,
        kind: ParseErrorKind,
    },

    #[error("can not access '{0}'")]
    Access(String),

    #[error("can not open '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to write output: {0}")]
    Write(#[from] io::Error),

    #[error("failed to install signal handlers: {0}")]
    Signal(#[source] io::Error),

    #[error("{0}")]
    Usage(String),
}

impl Error {
    pub fn parse_kind(&self) -> Option<&ParseErrorKind> {
        match self {
            Error::Parse { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

/// The rule of the DIMACS grammar that was violated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("expected new line after carriage return")]
    CarriageReturn,

    #[error("unexpected end-of-file in header comment")]
    HeaderCommentEof,

    #[error("expected 'p' or 'c'")]
    ExpectedHeader,

    #[error("expected {expected} after '{after}'")]
    Expected {
        expected: &'static str,
        after: String,
    },

    #[error("invalid digit after '0' while parsing maximum variable")]
    VariablesLeadingZero,

    #[error("maximum variable number way too big")]
    VariablesWayTooBig,

    #[error("maximum variable number too big")]
    VariablesTooBig,

    #[error("invalid digit after '0' while parsing number of clauses")]
    ClausesLeadingZero,

    #[error("way too many clauses specified")]
    ClausesWayTooMany,

    #[error("too many clauses specified")]
    ClausesTooMany,

    #[error("unexpected end-of-file in comment")]
    CommentEof,

    #[error("expected number")]
    ExpectedNumber,

    #[error("more clauses than specified")]
    TooManyClauses,

    #[error("invalid digit after '0' in number")]
    LiteralLeadingZero,

    #[error("number way too large")]
    NumberWayTooLarge,

    #[error("number too large")]
    NumberTooLarge,

    #[error("unexpected character after '{0}'")]
    UnexpectedCharacter(Lit),

    #[error("literal '{lit}' exceeds maximum variable index '{max}'")]
    LiteralOutOfRange { lit: Lit, max: Lit },

    #[error("terminating zero after literal '{0}' missing")]
    MissingZero(Lit),

    #[error("single clause missing")]
    SingleClauseMissing,

    #[error("{0} clauses missing")]
    ClausesMissing(usize),
}

impl ParseErrorKind {
    pub(crate) fn expected(expected: &'static str, after: impl Into<String>) -> Self {
        ParseErrorKind::Expected {
            expected,
            after: after.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ParseErrorKind};

    #[test]
    fn parse_error_message() {
        let err = Error::Parse {
            line: 3,
            path: "foo.cnf".into(),
            kind: ParseErrorKind::LiteralOutOfRange { lit: -4, max: 3 },
        };
        assert_eq!(
            err.to_string(),
            "parse error at line 3 in 'foo.cnf': literal '-4' exceeds maximum variable index '3'"
        );
    }

    #[test]
    fn expected_message() {
        let kind = ParseErrorKind::expected("space", "p cnf 7");
        assert_eq!(kind.to_string(), "expected space after 'p cnf 7'");
        assert_eq!(
            ParseErrorKind::ClausesMissing(3).to_string(),
            "3 clauses missing"
        );
    }
}
