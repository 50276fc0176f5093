//! Raw token suppliers.
//!
//! The parser pulls raw argument strings through [`TokenSource`]. Where the
//! strings come from (a fixed list, the process arguments) and how they are
//! decoded is entirely the source's concern.

use std::borrow::Cow;
use std::ffi::OsString;

use crate::error::SourceError;

/// A lazy sequence of raw argument strings.
///
/// Tokens may be borrowed for `'a` or owned; the parser slices values out of
/// them without copying borrowed input.
pub trait TokenSource<'a> {
    /// Next raw token, or `None` once the input is exhausted.
    fn next_token(&mut self) -> Result<Option<Cow<'a, str>>, SourceError>;
}

impl<'a, S: TokenSource<'a> + ?Sized> TokenSource<'a> for &mut S {
    fn next_token(&mut self) -> Result<Option<Cow<'a, str>>, SourceError> {
        (**self).next_token()
    }
}

/// Serves tokens borrowed from an in-memory list.
#[derive(Debug, Clone)]
pub struct SliceSource<'a, T> {
    tokens: std::slice::Iter<'a, T>,
}

impl<'a, T: AsRef<str>> SliceSource<'a, T> {
    pub fn new(tokens: &'a [T]) -> Self {
        Self {
            tokens: tokens.iter(),
        }
    }

    /// Tokens not yet handed out.
    pub fn remaining(&self) -> &'a [T] {
        self.tokens.as_slice()
    }
}

impl<'a, T: AsRef<str>> TokenSource<'a> for SliceSource<'a, T> {
    fn next_token(&mut self) -> Result<Option<Cow<'a, str>>, SourceError> {
        Ok(self.tokens.next().map(|t| Cow::Borrowed(t.as_ref())))
    }
}

/// Serves owned tokens, e.g. an argv collected up front.
#[derive(Debug, Clone, Default)]
pub struct VecSource {
    tokens: std::vec::IntoIter<String>,
}

impl VecSource {
    pub fn new(tokens: Vec<String>) -> Self {
        Self {
            tokens: tokens.into_iter(),
        }
    }
}

impl<S: Into<String>> FromIterator<S> for VecSource {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> TokenSource<'a> for VecSource {
    fn next_token(&mut self) -> Result<Option<Cow<'a, str>>, SourceError> {
        Ok(self.tokens.next().map(Cow::Owned))
    }
}

/// Serves process arguments.
///
/// Decoding happens here: an argument that is not valid UTF-8 is reported as
/// [`SourceError::NotUnicode`] when it is reached, not up front.
#[derive(Debug)]
pub struct ArgsSource<I> {
    args: I,
}

impl ArgsSource<std::env::ArgsOs> {
    /// Arguments of the running process, without the program name.
    pub fn from_env() -> Self {
        let mut args = std::env::args_os();
        args.next();
        Self { args }
    }
}

impl<I: Iterator<Item = OsString>> ArgsSource<I> {
    /// Wrap an argument iterator as-is (no program name is skipped).
    pub fn new(args: I) -> Self {
        Self { args }
    }
}

impl<'a, I: Iterator<Item = OsString>> TokenSource<'a> for ArgsSource<I> {
    fn next_token(&mut self) -> Result<Option<Cow<'a, str>>, SourceError> {
        match self.args.next() {
            None => Ok(None),
            Some(arg) => arg
                .into_string()
                .map(|s| Some(Cow::Owned(s)))
                .map_err(SourceError::NotUnicode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain<'a>(mut source: impl TokenSource<'a>) -> Vec<Cow<'a, str>> {
        let mut out = Vec::new();
        while let Some(token) = source.next_token().unwrap() {
            out.push(token);
        }
        out
    }

    #[test]
    fn slice_source_borrows() {
        let argv = vec!["-a".to_string(), "b".to_string()];
        let tokens = drain(SliceSource::new(&argv[..]));
        assert_eq!(tokens, ["-a", "b"]);
        assert!(tokens.iter().all(|t| matches!(t, Cow::Borrowed(_))));
    }

    #[test]
    fn slice_source_tracks_remaining() {
        let argv = ["-a", "b", "c"];
        let mut source = SliceSource::new(&argv);
        source.next_token().unwrap();
        assert_eq!(source.remaining(), &["b", "c"]);
    }

    #[test]
    fn vec_source_owns() {
        let source: VecSource = ["x", "--y"].into_iter().collect();
        let tokens = drain(source);
        assert_eq!(tokens, ["x", "--y"]);
        assert!(tokens.iter().all(|t| matches!(t, Cow::Owned(_))));
    }

    #[test]
    fn args_source_decodes_in_order() {
        let args = vec![OsString::from("--name"), OsString::from("value")];
        let tokens = drain(ArgsSource::new(args.into_iter()));
        assert_eq!(tokens, ["--name", "value"]);
    }

    #[test]
    fn args_source_from_env_skips_program_name() {
        let expected: Vec<OsString> = std::env::args_os().skip(1).collect();
        let mut source = ArgsSource::from_env();
        for arg in &expected {
            // The harness is launched with UTF-8 arguments in practice.
            let Some(arg) = arg.to_str() else { return };
            assert_eq!(source.next_token().unwrap().as_deref(), Some(arg));
        }
        assert!(source.next_token().unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn args_source_rejects_invalid_unicode() {
        use std::os::unix::ffi::OsStringExt;

        let args = vec![OsString::from("ok"), OsString::from_vec(vec![0x66, 0xff])];
        let mut source = ArgsSource::new(args.into_iter());
        assert_eq!(source.next_token().unwrap().as_deref(), Some("ok"));
        let err = source.next_token().unwrap_err();
        assert!(matches!(err, SourceError::NotUnicode(_)));
    }

    #[test]
    fn exhausted_source_stays_exhausted() {
        let argv: [&str; 0] = [];
        let mut source = SliceSource::new(&argv);
        assert!(source.next_token().unwrap().is_none());
        assert!(source.next_token().unwrap().is_none());
    }
}
