//! Runtime for Lemon-style LALR(1) parsers.
//!
//! The companion generator turns a grammar into packed action tables and
//! reduction code; this crate is the half that runs at parse time. A
//! generated parser implements [`ParserTables`] (the read-only tables) and
//! [`Parser`] (the semantic hooks); the driving loop — shift, reduce, fused
//! shift-reduce, fallback and wildcard lookahead resolution — is supplied
//! here. Tokens usually come from the bundled rule-ordered [`Lexer`], but
//! any `(token, code)` source will do.

mod error;
mod lexer;
mod parser;
#[cfg(test)]
mod test_grammar_data;

pub use crate::error::{LexerError, ParserError};
pub use crate::lexer::{Lexer, LexerPosition, LexerRule, LexerStats};
pub use crate::parser::{
    Action, LookaheadAction, Parser, ParserCtx, ParserRuleNumber, ParserStateNumber, ParserStats,
    ParserSymbolCode, ParserTables, ParserTokenCode, RuleInfo, StackEntry, StateOrRule,
};
