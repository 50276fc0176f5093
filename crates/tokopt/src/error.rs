use std::ffi::OsString;

/// Failure of a single [`Parser::next_arg`](crate::Parser::next_arg) call.
///
/// Every variant is terminal: the parser state is not meaningful afterwards
/// and callers should stop pulling.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The token was exactly `-` or `--`.
    #[error("empty argument name: {0}")]
    EmptyArgumentName(String),

    /// No declaration matches the option (or the bare value, when no
    /// positional parameter is declared). Inside a short cluster this names
    /// the offending character only, e.g. `-x`.
    #[error("unknown argument: {0}")]
    UnknownArgument(String),

    /// `--flag=value` was given for a flag that does not take a value.
    #[error("argument does not take a value: {0}")]
    UnexpectedValue(String),

    /// A value-taking option was the last token.
    #[error("missing value for {0}")]
    MissingValue(String),

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Failure reported by a [`TokenSource`](crate::TokenSource).
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// A process argument could not be decoded as UTF-8.
    #[error("argument is not valid unicode: {}", .0.to_string_lossy())]
    NotUnicode(OsString),
}

/// Problem found by [`param::check`](crate::param::check).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeclError {
    #[error("short name -{0} is declared more than once")]
    DuplicateShort(char),

    #[error("long name --{0} is declared more than once")]
    DuplicateLong(String),

    /// The long name can never match: shorter than two characters, starts
    /// with `-`, or contains `=`.
    #[error("invalid long name: {0:?}")]
    InvalidLong(String),
}
