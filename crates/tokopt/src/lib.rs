//! POSIX/GNU-style command-line argument tokenizer.
//!
//! The caller declares the accepted parameters up front and then pulls
//! matched arguments one at a time:
//! - `-v`, `-abc` (chained short flags), `-c100`, `-c=100`, `-c 100`
//! - `--verbose`, `--count=100`, `--count 100`
//! - bare values, matched against the first positional declaration
//!
//! ```
//! use tokopt::{Param, Parser, SliceSource};
//!
//! #[derive(Debug, Clone, Copy, PartialEq)]
//! enum Opt {
//!     All,
//!     Brief,
//!     Count,
//!     File,
//! }
//!
//! let params = [
//!     Param::named(Opt::All, "a"),
//!     Param::named(Opt::Brief, "b"),
//!     Param::named(Opt::Count, "c").with_value(),
//!     Param::named(Opt::File, ""),
//! ];
//! let argv = ["-abc100", "notes.txt"];
//!
//! let mut parser = Parser::new(&params, SliceSource::new(&argv));
//! let mut seen = Vec::new();
//! while let Some(arg) = parser.next_arg()? {
//!     seen.push((arg.id, arg.value.map(|v| v.into_owned())));
//! }
//! assert_eq!(
//!     seen,
//!     vec![
//!         (Opt::All, None),
//!         (Opt::Brief, None),
//!         (Opt::Count, Some("100".to_string())),
//!         (Opt::File, Some("notes.txt".to_string())),
//!     ]
//! );
//! # Ok::<(), tokopt::ParseError>(())
//! ```

pub mod error;
pub mod matches;
pub mod param;
pub mod parser;
pub mod source;

pub use error::{DeclError, ParseError, SourceError};
pub use matches::Matches;
pub use param::Param;
pub use parser::{Arg, Parser};
pub use source::{ArgsSource, SliceSource, TokenSource, VecSource};

/// Tokenize a borrowed argument list in one go.
///
/// Stops at the first error; see [`Parser`] for incremental parsing.
pub fn parse<'p, 'a, Id, T>(
    params: &'p [Param<Id>],
    argv: &'a [T],
) -> Result<Matches<'a, Id>, ParseError>
where
    Id: Clone + PartialEq,
    T: AsRef<str>,
{
    Parser::new(params, SliceSource::new(argv)).into_matches()
}
