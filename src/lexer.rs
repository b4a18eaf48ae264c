//! A rule-ordered lexer.
//!
//! Rules are tried in declaration order at the current cursor; the first one
//! that matches wins, so order is priority (put keywords before the
//! identifier rule). Literal rules carry their token data directly; regex
//! rules compute it from the matched text, and either kind may produce no
//! token at all (whitespace, comments).

use crate::error::LexerError;
use anyhow::{Result, bail};
use regex::Regex;
use smartstring::alias::String;

/// One lexer rule. Regex patterns are compiled anchored, so they only ever
/// match at the cursor.
pub enum LexerRule<T> {
    Literal(String, Option<T>),
    Regex(Regex, Box<dyn Fn(&str) -> Option<T>>),
}

impl<T> LexerRule<T> {
    /// A rule matching `text` exactly. `None` data consumes without emitting.
    pub fn literal(text: impl AsRef<str>, data: Option<T>) -> Self {
        LexerRule::Literal(String::from(text.as_ref()), data)
    }

    /// A rule matching `pattern` at the cursor. The handler receives the
    /// matched text and returns the token data, or `None` to emit nothing.
    pub fn regex<F>(pattern: &str, handler: F) -> Self
    where
        F: Fn(&str) -> Option<T> + 'static,
    {
        Self::try_regex(pattern, handler).expect("invalid lexer rule pattern")
    }

    /// Like [`LexerRule::regex`], surfacing pattern compilation errors.
    pub fn try_regex<F>(pattern: &str, handler: F) -> Result<Self, regex::Error>
    where
        F: Fn(&str) -> Option<T> + 'static,
    {
        let anchored = Regex::new(&format!(r"\A(?:{pattern})"))?;
        Ok(LexerRule::Regex(anchored, Box::new(handler)))
    }
}

/// Where the lexer currently stands. All indices are code-point based;
/// `line_number` is 1-based and `line_position` is the index of the first
/// code point of the current line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LexerPosition {
    pub token_position: usize,
    pub line_position: usize,
    pub line_number: usize,
}

impl LexerPosition {
    fn start() -> Self {
        Self {
            token_position: 0,
            line_position: 0,
            line_number: 1,
        }
    }

    /// Column of the cursor within the current line, 0-based.
    pub fn column(&self) -> usize {
        self.token_position - self.line_position
    }
}

#[derive(Debug, Clone, Default)]
pub struct LexerStats {
    /// Tokens handed to the sink (rules with `None` data are not counted).
    pub tokens: usize,
    /// Rule matches, including non-emitting ones.
    pub matches: usize,
    /// Bytes stepped over in error-skip mode.
    pub skipped_bytes: usize,
}

/// The lexer: an ordered rule list plus the cursor. One instance scans one
/// input at a time; `tokenize` resets the cursor, so an instance may be
/// reused for any number of inputs.
pub struct Lexer<T> {
    rules: Vec<LexerRule<T>>,
    position: LexerPosition,
    byte_cursor: usize,
    stats: LexerStats,
}

impl<T: Clone> Lexer<T> {
    pub fn new(rules: Vec<LexerRule<T>>) -> Self {
        Self {
            rules,
            position: LexerPosition::start(),
            byte_cursor: 0,
            stats: LexerStats::default(),
        }
    }

    pub fn position(&self) -> LexerPosition {
        self.position
    }

    pub fn stats(&self) -> LexerStats {
        self.stats.clone()
    }

    /// Scan `input` from the start, emitting each token through `on_token`.
    /// Fails with [`LexerError::NoMatchingRule`] at the first position no
    /// rule matches. Errors returned by the sink abort the scan unchanged.
    pub fn tokenize<F>(&mut self, input: &str, mut on_token: F) -> Result<()>
    where
        F: FnMut(T) -> Result<()>,
    {
        self.scan(input, &mut on_token, None)
    }

    /// Like [`Lexer::tokenize`], but unmatched input does not abort the
    /// scan: the cursor skips forward one code point at a time, and each
    /// maximal unmatched run is reported to `on_error` as a single
    /// [`LexerError::NoMatchingRule`] at the run's start.
    pub fn tokenize_recovering<F, G>(
        &mut self,
        input: &str,
        mut on_token: F,
        mut on_error: G,
    ) -> Result<()>
    where
        F: FnMut(T) -> Result<()>,
        G: FnMut(LexerError) -> Result<()>,
    {
        self.scan(input, &mut on_token, Some(&mut on_error))
    }

    fn scan(
        &mut self,
        input: &str,
        on_token: &mut dyn FnMut(T) -> Result<()>,
        mut on_error: Option<&mut dyn FnMut(LexerError) -> Result<()>>,
    ) -> Result<()> {
        self.position = LexerPosition::start();
        self.byte_cursor = 0;
        self.stats = LexerStats::default();
        // Start of the current unmatched run, if any.
        let mut skip_from: Option<LexerError> = None;

        while self.byte_cursor < input.len() {
            let rest = &input[self.byte_cursor..];
            match self.match_at(rest) {
                Some((len, data)) => {
                    self.stats.matches += 1;
                    log::trace!(
                        "matched {:?} at offset {} (line {})",
                        &rest[..len],
                        self.position.token_position,
                        self.position.line_number
                    );
                    if let Some(error) = skip_from.take() {
                        let sink = on_error.as_mut().expect("skip mode requires an error sink");
                        sink(error)?;
                    }
                    if let Some(token) = data {
                        self.stats.tokens += 1;
                        on_token(token)?;
                    }
                    self.advance(input, len);
                }
                None => {
                    let error = LexerError::NoMatchingRule {
                        at: self.position.token_position,
                        line: self.position.line_number,
                    };
                    if on_error.is_none() {
                        log::trace!("no rule matches at offset {}", self.position.token_position);
                        bail!(error);
                    }
                    skip_from.get_or_insert(error);
                    let step = rest.chars().next().map_or(1, char::len_utf8);
                    self.stats.skipped_bytes += step;
                    self.advance(input, step);
                }
            }
        }

        if let Some(error) = skip_from.take() {
            let sink = on_error.as_mut().expect("skip mode requires an error sink");
            sink(error)?;
        }
        Ok(())
    }

    /// First rule matching at the start of `rest`, with the matched byte
    /// length and its token data. Zero-length matches are skipped: they
    /// would stall the cursor.
    fn match_at(&self, rest: &str) -> Option<(usize, Option<T>)> {
        for rule in &self.rules {
            match rule {
                LexerRule::Literal(text, data) => {
                    if !text.is_empty() && rest.starts_with(text.as_str()) {
                        return Some((text.len(), data.clone()));
                    }
                }
                LexerRule::Regex(pattern, handler) => {
                    if let Some(found) = pattern.find(rest) {
                        debug_assert_eq!(found.start(), 0);
                        if found.end() > 0 {
                            return Some((found.end(), handler(found.as_str())));
                        }
                    }
                }
            }
        }
        None
    }

    fn advance(&mut self, input: &str, len: usize) {
        let consumed = &input[self.byte_cursor..self.byte_cursor + len];
        for ch in consumed.chars() {
            self.position.token_position += 1;
            if ch == '\n' {
                self.position.line_number += 1;
                self.position.line_position = self.position.token_position;
            }
        }
        self.byte_cursor += len;
    }
}
