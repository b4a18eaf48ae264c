//! Error types shared by the lexer and the parser driver.
//!
//! Both components surface their failures as concrete `thiserror` enums and
//! hand them to the caller through `anyhow::Result`, so user-supplied action
//! code can propagate its own errors through the same channel. Recover the
//! concrete variant with [`anyhow::Error::downcast_ref`]:
//!
//! ```rust
//! # use lalrex::LexerError;
//! # use anyhow::anyhow;
//! let err = anyhow!(LexerError::NoMatchingRule { at: 7, line: 2 });
//! match err.downcast_ref::<LexerError>() {
//!     Some(LexerError::NoMatchingRule { at, .. }) => assert_eq!(*at, 7),
//!     None => unreachable!(),
//! }
//! ```

use std::fmt::Debug;
use thiserror::Error;

/// The lexer's sole failure mode: no rule matched at the cursor.
///
/// `at` is the code-point index at which the unmatched run began; `line` is
/// the 1-based line holding that position. When an error sink is supplied to
/// the lexer, one such error is reported per maximal unmatched run; without
/// a sink the first unmatched position fails the scan immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LexerError {
    #[error("no lexer rule matches input at offset {at} (line {line})")]
    NoMatchingRule { at: usize, line: usize },
}

/// Failures raised by the parser driver itself.
///
/// `T` is the terminal payload type and `C` the token-code enum of the
/// generated parser. Errors produced by user reduction code are not wrapped
/// here; they propagate unchanged through `consume`/`end_parsing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParserError<T: Debug, C: Debug> {
    /// The lookahead token is not acceptable in the current state.
    #[error("syntax error on {code:?} token {token:?}")]
    SyntaxError { token: T, code: C },

    /// `end_parsing` was reached while the grammar still expects input.
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,

    /// A push would have exceeded the configured stack limit.
    #[error("parser stack overflow (limit {limit})")]
    StackOverflow { limit: usize },
}
