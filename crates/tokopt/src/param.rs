//! Parameter declarations.
//!
//! A [`Param`] describes one accepted option. Declarations are built once
//! before parsing and only read by the parser afterwards.

use std::collections::HashSet;

use crate::error::DeclError;

/// One accepted parameter.
///
/// A declaration with neither a short nor a long name is positional: it
/// matches any raw token that does not start with `-`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param<Id> {
    id: Id,
    short: Option<char>,
    long: Option<String>,
    takes_value: bool,
}

impl<Id> Param<Id> {
    /// Declare by explicit short/long pair.
    pub fn new(id: Id, short: Option<char>, long: Option<&str>) -> Self {
        Self {
            id,
            short,
            long: long.map(str::to_string),
            takes_value: false,
        }
    }

    /// Declare by name: an empty name is positional, a single character is a
    /// short name, anything longer is a long name.
    pub fn named(id: Id, name: &str) -> Self {
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (None, _) => Self::positional(id),
            (Some(c), None) => Self::short(id, c),
            (Some(_), Some(_)) => Self::long(id, name),
        }
    }

    pub fn positional(id: Id) -> Self {
        Self::new(id, None, None)
    }

    pub fn short(id: Id, short: char) -> Self {
        Self::new(id, Some(short), None)
    }

    pub fn long(id: Id, long: &str) -> Self {
        Self::new(id, None, Some(long))
    }

    /// Set whether the parameter consumes a value.
    pub fn takes_value(mut self, takes_value: bool) -> Self {
        self.takes_value = takes_value;
        self
    }

    /// Shorthand for `.takes_value(true)`.
    pub fn with_value(self) -> Self {
        self.takes_value(true)
    }

    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn short_name(&self) -> Option<char> {
        self.short
    }

    pub fn long_name(&self) -> Option<&str> {
        self.long.as_deref()
    }

    pub fn expects_value(&self) -> bool {
        self.takes_value
    }

    pub fn is_positional(&self) -> bool {
        self.short.is_none() && self.long.is_none()
    }

    /// Display form used in messages: `--long`, `-s`, or `<positional>`.
    pub fn flag_name(&self) -> String {
        match (&self.long, self.short) {
            (Some(long), _) => format!("--{long}"),
            (None, Some(short)) => format!("-{short}"),
            (None, None) => "<positional>".to_string(),
        }
    }
}

/// Reject declaration lists the parser would silently resolve by order.
///
/// The parser itself never calls this: duplicate names are legal there and
/// the first declaration wins.
pub fn check<Id>(params: &[Param<Id>]) -> Result<(), DeclError> {
    let mut shorts = HashSet::new();
    let mut longs = HashSet::new();

    for param in params {
        if let Some(short) = param.short {
            if !shorts.insert(short) {
                return Err(DeclError::DuplicateShort(short));
            }
        }
        if let Some(long) = param.long.as_deref() {
            if long.chars().count() < 2 || long.starts_with('-') || long.contains('=') {
                return Err(DeclError::InvalidLong(long.to_string()));
            }
            if !longs.insert(long) {
                return Err(DeclError::DuplicateLong(long.to_string()));
            }
        }
    }
    Ok(())
}
