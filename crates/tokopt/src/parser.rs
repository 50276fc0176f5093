//! The matching engine.
//!
//! [`Parser`] pulls raw tokens from a [`TokenSource`] and classifies them
//! against a declaration list:
//! - `--name`, `--name=value`, `--name value`
//! - `-a`, `-abc`, `-cvalue`, `-c=value`, `-c value`
//! - anything else is a value for the first positional declaration
//!
//! A short cluster such as `-abc` yields one [`Arg`] per call; the cluster is
//! held in the parser between calls until it is exhausted or a value-taking
//! option absorbs the rest of it.

use std::borrow::Cow;

use crate::error::{DeclError, ParseError};
use crate::matches::Matches;
use crate::param::{self, Param};
use crate::source::TokenSource;

/// One matched argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arg<'a, Id> {
    pub id: Id,
    /// Present iff the declaration takes a value, and always present for
    /// positional declarations.
    pub value: Option<Cow<'a, str>>,
}

impl<'a, Id> Arg<'a, Id> {
    fn flag(id: Id) -> Self {
        Self { id, value: None }
    }

    fn with_value(id: Id, value: Cow<'a, str>) -> Self {
        Self {
            id,
            value: Some(value),
        }
    }

    /// The value as `&str`, if any.
    pub fn value_str(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

#[derive(Debug, Default)]
enum State<'a> {
    #[default]
    Normal,
    /// Inside a short cluster: `param` matched the character just before
    /// `index` and has not been emitted yet.
    Chaining {
        token: Cow<'a, str>,
        index: usize,
        param: usize,
    },
}

/// Stateful tokenizer over a declaration list and a token source.
///
/// Declarations are scanned in order and the first match wins; callers may
/// rely on that order for precedence.
#[derive(Debug)]
pub struct Parser<'p, 'a, Id, S> {
    params: &'p [Param<Id>],
    source: S,
    state: State<'a>,
    done: bool,
}

impl<'p, 'a, Id, S> Parser<'p, 'a, Id, S>
where
    S: TokenSource<'a>,
{
    pub fn new(params: &'p [Param<Id>], source: S) -> Self {
        Self {
            params,
            source,
            state: State::Normal,
            done: false,
        }
    }

    /// Like [`Parser::new`], but first rejects duplicate or unmatchable names
    /// via [`param::check`].
    pub fn checked(params: &'p [Param<Id>], source: S) -> Result<Self, DeclError> {
        param::check(params)?;
        Ok(Self::new(params, source))
    }

    /// Release the parser state and hand the source back.
    ///
    /// A short cluster still in progress is dropped.
    pub fn finish(self) -> S {
        self.source
    }

    fn find_param(&self, pred: impl Fn(&Param<Id>) -> bool) -> Option<usize> {
        self.params.iter().position(pred)
    }

    fn find_short(&self, c: char) -> Option<usize> {
        self.find_param(|p| p.short_name() == Some(c))
    }

    /// Pull the next raw token as the value of `flag`.
    fn pull_value(&mut self, flag: impl FnOnce() -> String) -> Result<Cow<'a, str>, ParseError> {
        match self.source.next_token()? {
            Some(value) => {
                tracing::trace!(value = %value, "pulled option value");
                Ok(value)
            }
            None => Err(ParseError::MissingValue(flag())),
        }
    }
}

impl<'p, 'a, Id, S> Parser<'p, 'a, Id, S>
where
    Id: Clone,
    S: TokenSource<'a>,
{
    /// Produce the next matched argument.
    ///
    /// Returns `Ok(None)` once the source is exhausted. After an error the
    /// parser should not be used further.
    pub fn next_arg(&mut self) -> Result<Option<Arg<'a, Id>>, ParseError> {
        let result = match std::mem::take(&mut self.state) {
            State::Chaining {
                token,
                index,
                param,
            } => self.chain(token, index, param).map(Some),
            State::Normal => self.next_normal(),
        };
        if let Err(err) = &result {
            tracing::debug!(error = %err, "argument parsing failed");
        }
        result
    }

    fn next_normal(&mut self) -> Result<Option<Arg<'a, Id>>, ParseError> {
        let Some(token) = self.source.next_token()? else {
            tracing::trace!("token source exhausted");
            return Ok(None);
        };

        if token.starts_with("--") {
            if token.len() == 2 {
                return Err(ParseError::EmptyArgumentName(token.into_owned()));
            }
            self.long(token).map(Some)
        } else if token.starts_with('-') {
            if token.len() == 1 {
                return Err(ParseError::EmptyArgumentName(token.into_owned()));
            }
            self.short(token).map(Some)
        } else {
            self.value(token).map(Some)
        }
    }

    fn long(&mut self, token: Cow<'a, str>) -> Result<Arg<'a, Id>, ParseError> {
        tracing::trace!(token = %token, "long option");
        let body = &token[2..];
        let (name, attached) = match body.find('=') {
            Some(eq) => (&body[..eq], Some(2 + eq + 1)),
            None => (body, None),
        };

        let params = self.params;
        let Some(idx) = self.find_param(|p| p.long_name() == Some(name)) else {
            return Err(ParseError::UnknownArgument(format!("--{name}")));
        };
        let param = &params[idx];

        match (param.expects_value(), attached) {
            (false, Some(_)) => Err(ParseError::UnexpectedValue(format!("--{name}"))),
            (false, None) => Ok(Arg::flag(param.id().clone())),
            (true, Some(at)) => Ok(Arg::with_value(param.id().clone(), tail(token, at))),
            (true, None) => {
                let flag = format!("--{name}");
                let value = self.pull_value(|| flag)?;
                Ok(Arg::with_value(param.id().clone(), value))
            }
        }
    }

    fn short(&mut self, token: Cow<'a, str>) -> Result<Arg<'a, Id>, ParseError> {
        tracing::trace!(token = %token, "short option");
        let Some(c) = token[1..].chars().next() else {
            return Err(ParseError::EmptyArgumentName(token.into_owned()));
        };
        let Some(idx) = self.find_short(c) else {
            return Err(ParseError::UnknownArgument(format!("-{c}")));
        };
        self.chain(token, 1 + c.len_utf8(), idx)
    }

    fn value(&mut self, token: Cow<'a, str>) -> Result<Arg<'a, Id>, ParseError> {
        tracing::trace!(token = %token, "positional value");
        let Some(idx) = self.find_param(Param::is_positional) else {
            return Err(ParseError::UnknownArgument(token.into_owned()));
        };
        Ok(Arg::with_value(self.params[idx].id().clone(), token))
    }

    /// Resolve `param`, the short option matched just before `index`.
    ///
    /// Either consumes the rest of the cluster (or the next token) as its
    /// value, or emits it as a flag and leaves the next character pending.
    fn chain(
        &mut self,
        token: Cow<'a, str>,
        index: usize,
        param: usize,
    ) -> Result<Arg<'a, Id>, ParseError> {
        let params = self.params;
        let current = &params[param];
        let rest = &token[index..];

        if current.expects_value() {
            let value = if rest.is_empty() {
                self.pull_value(|| current.flag_name())?
            } else if rest.starts_with('=') {
                tail(token, index + 1)
            } else {
                tail(token, index)
            };
            return Ok(Arg::with_value(current.id().clone(), value));
        }

        let Some(next) = rest.chars().next() else {
            return Ok(Arg::flag(current.id().clone()));
        };
        let Some(next_param) = self.find_short(next) else {
            return Err(ParseError::UnknownArgument(cluster_char_name(next, &token)));
        };

        tracing::trace!(flag = %next, "short cluster continues");
        self.state = State::Chaining {
            token,
            index: index + next.len_utf8(),
            param: next_param,
        };
        Ok(Arg::flag(current.id().clone()))
    }
}

impl<'p, 'a, Id, S> Parser<'p, 'a, Id, S>
where
    Id: Clone + PartialEq,
    S: TokenSource<'a>,
{
    /// Drain the parser, stopping at the first error.
    pub fn into_matches(mut self) -> Result<Matches<'a, Id>, ParseError> {
        let mut matches = Matches::default();
        while let Some(arg) = self.next_arg()? {
            matches.push(arg);
        }
        Ok(matches)
    }
}

/// Yields each result of [`Parser::next_arg`]; ends after end-of-input or the
/// first error.
impl<'p, 'a, Id, S> Iterator for Parser<'p, 'a, Id, S>
where
    Id: Clone,
    S: TokenSource<'a>,
{
    type Item = Result<Arg<'a, Id>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_arg() {
            Ok(Some(arg)) => Some(Ok(arg)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl<'p, 'a, Id, S> std::iter::FusedIterator for Parser<'p, 'a, Id, S>
where
    Id: Clone,
    S: TokenSource<'a>,
{
}

/// Name of an unknown character inside a short cluster. A `-` would print
/// as the lone `--` token, so it is quoted along with its cluster.
fn cluster_char_name(c: char, token: &str) -> String {
    if c == '-' {
        format!("'-' in {token}")
    } else {
        format!("-{c}")
    }
}

/// `token[from..]`, without copying borrowed input.
fn tail(token: Cow<'_, str>, from: usize) -> Cow<'_, str> {
    match token {
        Cow::Borrowed(s) => Cow::Borrowed(&s[from..]),
        Cow::Owned(mut s) => {
            s.drain(..from);
            Cow::Owned(s)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ArgsSource, SliceSource, VecSource};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Opt {
        A,
        B,
        C,
        Verbose,
        Output,
        File,
    }

    fn params() -> Vec<Param<Opt>> {
        vec![
            Param::named(Opt::A, "a"),
            Param::named(Opt::B, "b"),
            Param::named(Opt::C, "c").with_value(),
            Param::new(Opt::Verbose, Some('v'), Some("verbose")),
            Param::new(Opt::Output, Some('o'), Some("output")).with_value(),
            Param::named(Opt::File, ""),
        ]
    }

    fn run(params: &[Param<Opt>], argv: &[&str]) -> Result<Vec<(Opt, Option<String>)>, ParseError> {
        let mut parser = Parser::new(params, SliceSource::new(argv));
        let mut out = Vec::new();
        while let Some(arg) = parser.next_arg()? {
            out.push((arg.id, arg.value.map(Cow::into_owned)));
        }
        Ok(out)
    }

    fn ok(argv: &[&str]) -> Vec<(Opt, Option<String>)> {
        run(&params(), argv).unwrap()
    }

    fn err(argv: &[&str]) -> ParseError {
        run(&params(), argv).unwrap_err()
    }

    fn v(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn empty_input_is_end_of_input() {
        let params = params();
        let argv: [&str; 0] = [];
        let mut parser = Parser::new(&params, SliceSource::new(&argv));
        assert!(parser.next_arg().unwrap().is_none());
    }

    #[test]
    fn single_short_flag() {
        assert_eq!(ok(&["-a"]), vec![(Opt::A, None)]);
        assert_eq!(ok(&["-v"]), vec![(Opt::Verbose, None)]);
    }

    #[test]
    fn chained_short_flags_keep_order() {
        assert_eq!(ok(&["-ab"]), vec![(Opt::A, None), (Opt::B, None)]);
        assert_eq!(ok(&["-ba"]), vec![(Opt::B, None), (Opt::A, None)]);
    }

    #[test]
    fn short_value_forms_are_equivalent() {
        let expected = vec![(Opt::C, v("100"))];
        assert_eq!(ok(&["-c100"]), expected);
        assert_eq!(ok(&["-c=100"]), expected);
        assert_eq!(ok(&["-c", "100"]), expected);
    }

    #[test]
    fn long_value_forms_are_equivalent() {
        let expected = vec![(Opt::Output, v("out.txt"))];
        assert_eq!(ok(&["--output=out.txt"]), expected);
        assert_eq!(ok(&["--output", "out.txt"]), expected);
    }

    #[test]
    fn glued_long_value_is_not_accepted() {
        assert!(matches!(err(&["--outputout.txt"]), ParseError::UnknownArgument(name) if name == "--outputout.txt"));
    }

    #[test]
    fn cluster_ending_in_value_option() {
        let expected = vec![(Opt::A, None), (Opt::B, None), (Opt::C, v("100"))];
        assert_eq!(ok(&["-abc100"]), expected);
        assert_eq!(ok(&["-abc=100"]), expected);
        assert_eq!(ok(&["-abc", "100"]), expected);
    }

    #[test]
    fn value_option_absorbs_rest_of_cluster() {
        assert_eq!(ok(&["-cab"]), vec![(Opt::C, v("ab"))]);
        assert_eq!(ok(&["-c=="]), vec![(Opt::C, v("="))]);
        assert_eq!(ok(&["-c="]), vec![(Opt::C, v(""))]);
    }

    #[test]
    fn value_token_may_look_like_an_option() {
        assert_eq!(ok(&["-c", "-a"]), vec![(Opt::C, v("-a"))]);
        assert_eq!(ok(&["--output", "--"]), vec![(Opt::Output, v("--"))]);
    }

    #[test]
    fn long_flag_without_value() {
        assert_eq!(ok(&["--verbose"]), vec![(Opt::Verbose, None)]);
    }

    #[test]
    fn positional_takes_whole_token() {
        assert_eq!(
            ok(&["in.txt", "-a", "out.txt"]),
            vec![(Opt::File, v("in.txt")), (Opt::A, None), (Opt::File, v("out.txt"))]
        );
    }

    #[test]
    fn lone_dashes_are_empty_names() {
        assert!(matches!(err(&["-"]), ParseError::EmptyArgumentName(t) if t == "-"));
        assert!(matches!(err(&["--"]), ParseError::EmptyArgumentName(t) if t == "--"));
    }

    #[test]
    fn unknown_short_flag() {
        assert!(matches!(err(&["-x"]), ParseError::UnknownArgument(t) if t == "-x"));
    }

    #[test]
    fn unknown_character_inside_cluster_is_reported_alone() {
        let params = params();
        let argv = ["-abx"];
        let mut parser = Parser::new(&params, SliceSource::new(&argv));
        let first = parser.next_arg().unwrap().unwrap();
        assert_eq!(first.id, Opt::A);
        // `b` is still pending when the lookahead hits `x`.
        assert!(matches!(parser.next_arg(), Err(ParseError::UnknownArgument(t)) if t == "-x"));

        let argv = ["-ax"];
        let mut parser = Parser::new(&params, SliceSource::new(&argv));
        assert!(matches!(parser.next_arg(), Err(ParseError::UnknownArgument(t)) if t == "-x"));
    }

    #[test]
    fn dash_inside_cluster_is_quoted() {
        assert!(matches!(err(&["-a-"]), ParseError::UnknownArgument(t) if t == "'-' in -a-"));
    }

    #[test]
    fn equals_after_flag_in_cluster_is_unknown() {
        assert!(matches!(run(&params(), &["-a=1"]), Err(ParseError::UnknownArgument(t)) if t == "-="));
    }

    #[test]
    fn unknown_long_flag() {
        assert!(matches!(err(&["--nope"]), ParseError::UnknownArgument(t) if t == "--nope"));
        assert!(matches!(err(&["--nope=1"]), ParseError::UnknownArgument(t) if t == "--nope"));
        assert!(matches!(err(&["--=x"]), ParseError::UnknownArgument(t) if t == "--"));
    }

    #[test]
    fn unexpected_value_for_long_flag() {
        assert!(matches!(err(&["--verbose=yes"]), ParseError::UnexpectedValue(t) if t == "--verbose"));
    }

    #[test]
    fn missing_values() {
        assert!(matches!(err(&["--output"]), ParseError::MissingValue(t) if t == "--output"));
        assert!(matches!(err(&["-o"]), ParseError::MissingValue(t) if t == "--output"));
        assert!(matches!(err(&["-abc"]), ParseError::MissingValue(t) if t == "-c"));
    }

    #[test]
    fn bare_value_without_positional_declaration() {
        let params = [Param::named(Opt::A, "a")];
        let result = run(&params, &["stray"]);
        assert!(matches!(result, Err(ParseError::UnknownArgument(t)) if t == "stray"));
    }

    #[test]
    fn first_declaration_wins() {
        let params = [
            Param::named(Opt::A, "x"),
            Param::named(Opt::B, "x").with_value(),
            Param::named(Opt::File, ""),
            Param::named(Opt::Output, ""),
        ];
        assert_eq!(
            run(&params, &["-x", "value"]).unwrap(),
            vec![(Opt::A, None), (Opt::File, v("value"))]
        );
    }

    #[test]
    fn multibyte_short_names_chain() {
        let params = [
            Param::named(Opt::A, "é"),
            Param::named(Opt::B, "ß"),
            Param::named(Opt::C, "ç").with_value(),
        ];
        assert_eq!(
            run(&params, &["-éßçvalü"]).unwrap(),
            vec![(Opt::A, None), (Opt::B, None), (Opt::C, v("valü"))]
        );
    }

    #[test]
    fn borrowed_tokens_yield_borrowed_values() {
        let params = params();
        let argv = ["-abc100", "--output=x", "file"];
        let args: Vec<_> = Parser::new(&params, SliceSource::new(&argv))
            .collect::<Result<_, _>>()
            .unwrap();
        let values: Vec<&Cow<'_, str>> = args.iter().filter_map(|a| a.value.as_ref()).collect();
        assert_eq!(values.len(), 3);
        assert!(values.iter().all(|v| matches!(v, Cow::Borrowed(_))));
    }

    #[test]
    fn owned_tokens_yield_same_results() {
        let params = params();
        let argv = ["-vabc=7", "--output", "o.txt", "in.txt"];
        let borrowed: Vec<_> = Parser::new(&params, SliceSource::new(&argv))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        let owned: Vec<_> = Parser::new(&params, argv.iter().copied().collect::<VecSource>())
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(borrowed, owned);
        assert_eq!(owned[3].value_str(), Some("7"));
    }

    #[test]
    fn identical_inputs_are_deterministic() {
        let params = params();
        let argv = ["-ab", "--verbose", "-o", "x", "rest"];
        let first: Vec<_> = Parser::new(&params, SliceSource::new(&argv)).collect();
        let second: Vec<_> = Parser::new(&params, SliceSource::new(&argv)).collect();
        assert_eq!(format!("{first:?}"), format!("{second:?}"));
    }

    #[cfg(unix)]
    #[test]
    fn source_failure_while_pulling_cluster_value() {
        use crate::error::SourceError;
        use std::ffi::OsString;
        use std::os::unix::ffi::OsStringExt;

        let params = params();
        let args = vec![OsString::from("-ac"), OsString::from_vec(vec![0xff])];
        let mut parser = Parser::new(&params, ArgsSource::new(args.into_iter()));
        let first = parser.next_arg().unwrap().unwrap();
        assert_eq!((first.id, first.value), (Opt::A, None));
        assert!(matches!(
            parser.next_arg(),
            Err(ParseError::Source(SourceError::NotUnicode(_)))
        ));
    }

    #[test]
    fn args_source_tokens_parse_like_slices() {
        let params = params();
        let args = ["-vo", "x", "in.txt"].map(std::ffi::OsString::from);
        let from_args: Vec<_> = Parser::new(&params, ArgsSource::new(args.into_iter()))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        let from_slice: Vec<_> = Parser::new(&params, SliceSource::new(&["-vo", "x", "in.txt"]))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(from_args, from_slice);
    }

    #[test]
    fn iterator_stops_after_error() {
        let params = params();
        let argv = ["-a", "-x", "-b"];
        let mut parser = Parser::new(&params, SliceSource::new(&argv));
        assert!(matches!(parser.next(), Some(Ok(_))));
        assert!(matches!(parser.next(), Some(Err(ParseError::UnknownArgument(_)))));
        assert!(parser.next().is_none());
        assert!(parser.next().is_none());
    }

    #[test]
    fn finish_returns_source_with_remaining_tokens() {
        let params = params();
        let argv = ["-a", "sub", "--unparsed"];
        let mut parser = Parser::new(&params, SliceSource::new(&argv));
        parser.next_arg().unwrap();
        parser.next_arg().unwrap();
        let source = parser.finish();
        assert_eq!(source.remaining(), &["--unparsed"]);
    }

    #[test]
    fn parser_can_borrow_a_source() {
        let params = params();
        let argv = ["-a", "-b"];
        let mut source = SliceSource::new(&argv);
        {
            let mut parser = Parser::new(&params, &mut source);
            assert_eq!(parser.next_arg().unwrap().map(|a| a.id), Some(Opt::A));
        }
        assert_eq!(source.remaining(), &["-b"]);
    }

    #[test]
    fn checked_rejects_duplicate_names() {
        let params = [Param::named(Opt::A, "a"), Param::named(Opt::B, "a")];
        let argv = ["-a"];
        let err = Parser::checked(&params, SliceSource::new(&argv)).unwrap_err();
        assert_eq!(err, DeclError::DuplicateShort('a'));
    }

    #[test]
    fn into_matches_collects_everything() {
        let params = params();
        let argv = ["-o", "a", "--output=b", "-v", "f"];
        let m = Parser::new(&params, SliceSource::new(&argv))
            .into_matches()
            .unwrap();
        assert_eq!(m.get(&Opt::Output), Some("b"));
        assert_eq!(m.get_all(&Opt::Output).collect::<Vec<_>>(), ["a", "b"]);
        assert!(m.is_present(&Opt::Verbose));
        assert_eq!(m.get(&Opt::File), Some("f"));
    }
}
