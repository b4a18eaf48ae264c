//! The LALR(1) table interpreter.
//!
//! A generated parser consists of two pieces: a [`ParserTables`] impl holding
//! the packed tables the generator emitted, and a [`Parser`] impl supplying
//! the semantic hooks (token injection, per-rule reduction code, result
//! projection). The driving algorithm lives entirely in this module as
//! default methods; generated code never reimplements it.

use crate::error::ParserError;
use anyhow::{Result, bail};
use smartstring::alias::String;
use std::fmt::Debug;

/// Width marker for symbol codes. The generator picks the narrowest unsigned
/// integer that fits the symbol count.
pub trait ParserSymbolCode: Copy + Debug + Eq + Into<usize> + Send + Sync + 'static {}
impl ParserSymbolCode for u8 {}
impl ParserSymbolCode for u16 {}
impl ParserSymbolCode for u32 {}
impl ParserSymbolCode for usize {}

/// Width marker for state numbers.
pub trait ParserStateNumber: Copy + Debug + Eq + Into<usize> + 'static {}
impl ParserStateNumber for u8 {}
impl ParserStateNumber for u16 {}
impl ParserStateNumber for u32 {}
impl ParserStateNumber for usize {}

/// Width marker for rule numbers.
pub trait ParserRuleNumber: Copy + Debug + Eq + Into<usize> + 'static {}
impl ParserRuleNumber for u8 {}
impl ParserRuleNumber for u16 {}
impl ParserRuleNumber for u32 {}
impl ParserRuleNumber for usize {}

/// The terminal enumeration of a generated parser. Each variant's raw value
/// is the symbol code of that terminal; code 0 is reserved for end of input.
pub trait ParserTokenCode: Copy + Debug + Eq + Send + Sync + 'static {
    type SymbolCode: ParserSymbolCode;

    fn symbol_code(self) -> Self::SymbolCode;
}

/// One parser action, as stored in the packed tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action<S, R> {
    /// Consume the lookahead and push the given state.
    Shift(S),
    /// Consume the lookahead and immediately reduce by the given rule
    /// (a generator optimization fusing a shift whose only successor is an
    /// unconditional reduce).
    ShiftReduce(R),
    /// Apply the rule; the lookahead is not consumed.
    Reduce(R),
    /// The parse succeeded.
    Accept,
    /// The lookahead is not acceptable in this state.
    Error,
}

/// One entry of the packed action table. `lookahead` records which symbol
/// code the slot was laid out for, so offset collisions are detected by
/// comparison.
#[derive(Clone, Copy, Debug)]
pub struct LookaheadAction<C, S, R> {
    pub lookahead: C,
    pub action: Action<S, R>,
}

/// Per-rule metadata consulted during a reduce.
#[derive(Clone, Copy, Debug)]
pub struct RuleInfo<C> {
    /// Symbol code of the left-hand nonterminal.
    pub lhs: C,
    /// Number of right-hand-side symbols the rule pops.
    pub rhs_len: usize,
}

/// What a stack entry is marked with: a real parser state, or the rule of a
/// deferred shift-reduce whose reduction runs on the next dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateOrRule<S, R> {
    State(S),
    Rule(R),
}

/// The read-only tables and type bindings a generated parser provides.
///
/// All table data is `'static` and immutable; a single impl may back any
/// number of parser instances.
pub trait ParserTables {
    type SymbolCode: ParserSymbolCode;
    type StateNumber: ParserStateNumber;
    type RuleNumber: ParserRuleNumber;
    type TokenCode: ParserTokenCode<SymbolCode = Self::SymbolCode>;
    /// Terminal payload fed into `consume`.
    type Token: Debug + Send + Sync + 'static;
    /// Semantic value of any grammar symbol (the generator knows the shape).
    type Symbol;
    /// Semantic value of the start symbol; what `end_parsing` returns.
    type Output;

    const NUM_SYMBOLS: usize;
    const NUM_STATES: usize;

    /// Smallest and largest real entries of `shift_offset`, and the sentinel
    /// marking "no shift row, use the default action".
    const SHIFT_OFFSET_MIN: isize;
    const SHIFT_OFFSET_MAX: isize;
    const SHIFT_USE_DEFAULT: isize;
    /// Same three values for the nonterminal (goto) rows.
    const REDUCE_OFFSET_MIN: isize;
    const REDUCE_OFFSET_MAX: isize;
    const REDUCE_USE_DEFAULT: isize;

    const HAS_FALLBACK: bool;
    /// Symbol code of the wildcard terminal, if the grammar declared one.
    const WILDCARD: Option<Self::SymbolCode>;

    fn start_state() -> Self::StateNumber;
    fn lookahead_action()
    -> &'static [LookaheadAction<Self::SymbolCode, Self::StateNumber, Self::RuleNumber>];
    fn shift_offset() -> &'static [isize];
    fn reduce_offset() -> &'static [isize];
    fn default_action() -> &'static [Action<Self::StateNumber, Self::RuleNumber>];
    /// `fallback[code] == 0` means the terminal has no fallback. Chains are
    /// single-level: a fallback target must itself have no fallback.
    fn fallback() -> &'static [Self::SymbolCode] {
        &[]
    }
    fn rule_info() -> &'static [RuleInfo<Self::SymbolCode>];
    fn symbol_name() -> &'static [&'static str];
    fn rule_text() -> &'static [&'static str];
}

/// Counters kept by the driver. `max_stack_depth` is the high-water mark of
/// the parse stack, sentinel included, and is at least 1 from construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserStats {
    pub shifts: usize,
    pub reduces: usize,
    pub fallbacks: usize,
    pub max_stack_depth: usize,
}

/// One element of the parse stack. The bottom sentinel carries the start
/// state, symbol code 0, and no semantic value.
pub struct StackEntry<T: ParserTables> {
    pub state_or_rule: StateOrRule<T::StateNumber, T::RuleNumber>,
    pub code: usize,
    pub symbol: Option<T::Symbol>,
}

/// The mutable half of a parser: the stack, the optional depth limit, and
/// the counters. Generated reduction code reaches the right-hand-side
/// semantic values through [`ParserCtx::symbol`] and
/// [`ParserCtx::take_symbol`].
pub struct ParserCtx<T: ParserTables> {
    stack: Vec<StackEntry<T>>,
    max_stack_size: Option<usize>,
    stats: ParserStats,
}

impl<T: ParserTables> ParserCtx<T> {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// A context whose stack may never grow beyond `limit` entries, sentinel
    /// included.
    pub fn with_stack_limit(limit: usize) -> Self {
        Self::build(Some(limit))
    }

    fn build(max_stack_size: Option<usize>) -> Self {
        let mut this = Self {
            stack: Vec::with_capacity(128),
            max_stack_size,
            stats: ParserStats::default(),
        };
        this.stack.push(StackEntry {
            state_or_rule: StateOrRule::State(T::start_state()),
            code: 0,
            symbol: None,
        });
        this.stats.max_stack_depth = 1;
        this
    }

    /// Pop back to the bottom sentinel and clear the counters, restoring the
    /// post-construction state.
    pub fn reset(&mut self) {
        self.stack.truncate(1);
        self.stats = ParserStats::default();
        self.stats.max_stack_depth = 1;
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    pub fn stats(&self) -> ParserStats {
        self.stats.clone()
    }

    /// Semantic value counted from the top of the stack: 0 = topmost,
    /// 1 = second, etc. `None` for the sentinel, an already-taken slot, or
    /// an index past the bottom.
    pub fn symbol(&self, index: usize) -> Option<&T::Symbol> {
        let slot = self.stack.len().checked_sub(1 + index)?;
        self.stack[slot].symbol.as_ref()
    }

    /// Move a semantic value out of the stack, leaving the slot empty.
    /// Reduction code uses this to transfer ownership of the right-hand-side
    /// values it folds into the new left-hand-side value.
    pub fn take_symbol(&mut self, index: usize) -> Option<T::Symbol> {
        let slot = self.stack.len().checked_sub(1 + index)?;
        self.stack[slot].symbol.take()
    }

    fn name(code: usize) -> &'static str {
        T::symbol_name().get(code).copied().unwrap_or("?")
    }

    fn push(&mut self, entry: StackEntry<T>) -> Result<()> {
        if let Some(limit) = self.max_stack_size {
            if self.stack.len() >= limit {
                log::trace!("Stack Overflow!");
                bail!(ParserError::<T::Token, T::TokenCode>::StackOverflow { limit });
            }
        }
        self.stack.push(entry);
        if self.stack.len() > self.stats.max_stack_depth {
            self.stats.max_stack_depth = self.stack.len();
        }
        Ok(())
    }

    /// Push a consumed terminal.
    fn shift(
        &mut self,
        target: StateOrRule<T::StateNumber, T::RuleNumber>,
        code: usize,
        symbol: T::Symbol,
    ) -> Result<()> {
        self.push(StackEntry {
            state_or_rule: target,
            code,
            symbol: Some(symbol),
        })?;
        self.stats.shifts += 1;
        match target {
            StateOrRule::State(state) => {
                log::trace!(
                    "Shift '{}', go to state {}",
                    Self::name(code),
                    Into::<usize>::into(state)
                );
            }
            StateOrRule::Rule(rule) => {
                log::trace!(
                    "Shift '{}', pending reduce {}",
                    Self::name(code),
                    Into::<usize>::into(rule)
                );
            }
        }
        Ok(())
    }

    /// Resolve a terminal lookahead against the packed tables.
    ///
    /// A stack top marked with a deferred rule short-circuits to that
    /// reduction. Otherwise the shift row is probed; on a miss the lookahead
    /// is rewritten through the fallback table (single level), then the
    /// wildcard slot is probed, and finally the state's default action
    /// applies.
    fn find_shift_action(&mut self, lookahead: usize) -> Action<T::StateNumber, T::RuleNumber> {
        let top = self.stack.last().expect("parse stack is empty");
        let state = match top.state_or_rule {
            StateOrRule::Rule(rule) => return Action::Reduce(rule),
            StateOrRule::State(state) => state,
        };
        let state: usize = state.into();
        debug_assert!(state < T::NUM_STATES);
        debug_assert!(lookahead < T::NUM_SYMBOLS);

        let table = T::lookahead_action();
        let mut lookahead = lookahead;
        loop {
            let ofst = T::shift_offset()[state];
            debug_assert!(
                ofst == T::SHIFT_USE_DEFAULT
                    || (T::SHIFT_OFFSET_MIN..=T::SHIFT_OFFSET_MAX).contains(&ofst)
            );
            let i = ofst + lookahead as isize;
            if i >= 0 && (i as usize) < table.len() {
                let entry = &table[i as usize];
                if Into::<usize>::into(entry.lookahead) == lookahead {
                    return entry.action;
                }
            }

            if T::HAS_FALLBACK {
                let fallback = T::fallback();
                if let Some(&code) = fallback.get(lookahead) {
                    let code: usize = code.into();
                    if code != 0 {
                        log::trace!("FALLBACK {} => {}", Self::name(lookahead), Self::name(code));
                        // Fallback chains must terminate after one step.
                        debug_assert!(Into::<usize>::into(fallback[code]) == 0);
                        self.stats.fallbacks += 1;
                        lookahead = code;
                        continue;
                    }
                }
            }

            if let Some(wildcard) = T::WILDCARD {
                let wildcard: usize = wildcard.into();
                let j = i - lookahead as isize + wildcard as isize;
                // End of input never matches the wildcard.
                if j >= 0
                    && (j as usize) < table.len()
                    && Into::<usize>::into(table[j as usize].lookahead) == wildcard
                    && lookahead > 0
                {
                    log::trace!(
                        "WILDCARD {} => {}",
                        Self::name(lookahead),
                        Self::name(wildcard)
                    );
                    return table[j as usize].action;
                }
            }

            return T::default_action()[state];
        }
    }

    /// Resolve a nonterminal (goto) lookup after a reduce. Unlike the shift
    /// path there is no fallback, no wildcard and no default: a missing or
    /// mismatched goto entry means the tables are corrupt.
    fn find_reduce_action(
        state: T::StateNumber,
        lhs: usize,
    ) -> Action<T::StateNumber, T::RuleNumber> {
        let state: usize = state.into();
        let ofst = T::reduce_offset()[state];
        assert!(
            ofst != T::REDUCE_USE_DEFAULT,
            "no goto row for state {state}"
        );
        debug_assert!((T::REDUCE_OFFSET_MIN..=T::REDUCE_OFFSET_MAX).contains(&ofst));
        debug_assert!(lhs < T::NUM_SYMBOLS);
        let i = ofst + lhs as isize;
        let table = T::lookahead_action();
        assert!(
            i >= 0 && (i as usize) < table.len(),
            "goto index {i} out of range for state {state}"
        );
        let entry = &table[i as usize];
        assert!(
            Into::<usize>::into(entry.lookahead) == lhs,
            "goto entry mismatch for state {state}, nonterminal {lhs}"
        );
        entry.action
    }

    fn trace_input(&self, code: usize) {
        match self.stack.last().map(|entry| entry.state_or_rule) {
            Some(StateOrRule::State(state)) => log::trace!(
                "Input '{}' in state {}",
                Self::name(code),
                Into::<usize>::into(state)
            ),
            Some(StateOrRule::Rule(rule)) => log::trace!(
                "Input '{}' with pending reduce {}",
                Self::name(code),
                Into::<usize>::into(rule)
            ),
            None => {}
        }
    }

    fn dump_stack(&self) {
        let mut out = String::new();
        for entry in self.stack.iter().skip(1) {
            out.push_str(Self::name(entry.code));
            out.push(' ');
        }
        log::trace!("Stack=[{}]", out.trim_end());
    }
}

impl<T: ParserTables> Default for ParserCtx<T> {
    fn default() -> Self {
        Self::new()
    }
}

type CodeOf<P> = <<P as Parser>::Tables as ParserTables>::TokenCode;
type TokenOf<P> = <<P as Parser>::Tables as ParserTables>::Token;
type SymbolOf<P> = <<P as Parser>::Tables as ParserTables>::Symbol;
type OutputOf<P> = <<P as Parser>::Tables as ParserTables>::Output;
type RuleOf<P> = <<P as Parser>::Tables as ParserTables>::RuleNumber;

/// A generated parser: tables plus the semantic hooks. The driving loop is
/// supplied as default methods and is not meant to be overridden.
///
/// A parser instance is single-threaded and not reentrant: `consume` and
/// `end_parsing` must not be re-entered from reduction code. Separate
/// instances are fully independent.
pub trait Parser {
    type Tables: ParserTables;

    fn ctx(&self) -> &ParserCtx<Self::Tables>;
    fn ctx_mut(&mut self) -> &mut ParserCtx<Self::Tables>;

    /// Inject a terminal payload into the symbol union.
    fn token_to_symbol(&mut self, token: TokenOf<Self>) -> SymbolOf<Self>;

    /// Run the user code block of the given rule. The right-hand-side values
    /// are still on the stack ([`ParserCtx::take_symbol`], index 0 = last RHS
    /// symbol); the returned value becomes the left-hand side's. Errors
    /// propagate unchanged out of `consume`/`end_parsing`.
    fn apply_rule(&mut self, rule: RuleOf<Self>) -> Result<SymbolOf<Self>>;

    /// Project the start symbol's value into the final output.
    fn unwrap_result(&mut self, symbol: SymbolOf<Self>) -> OutputOf<Self>;

    fn stats(&self) -> ParserStats {
        self.ctx().stats()
    }

    /// Feed one terminal. Reduces as often as the tables demand, then shifts
    /// the token (or fails with [`ParserError::SyntaxError`]).
    fn consume(&mut self, token: TokenOf<Self>, code: CodeOf<Self>) -> Result<()> {
        let raw: usize = code.symbol_code().into();
        if log::log_enabled!(log::Level::Trace) {
            self.ctx().trace_input(raw);
        }
        loop {
            match self.ctx_mut().find_shift_action(raw) {
                Action::Shift(state) => {
                    let symbol = self.token_to_symbol(token);
                    self.ctx_mut().shift(StateOrRule::State(state), raw, symbol)?;
                    break;
                }
                Action::ShiftReduce(rule) => {
                    let symbol = self.token_to_symbol(token);
                    self.ctx_mut().shift(StateOrRule::Rule(rule), raw, symbol)?;
                    break;
                }
                Action::Reduce(rule) => {
                    let accepted = self.reduce(rule)?;
                    // Accept is only legal under the end-of-input lookahead.
                    assert!(accepted.is_none(), "accept action fired before end of input");
                }
                Action::Error => {
                    log::trace!("Syntax Error!");
                    bail!(ParserError::SyntaxError { token, code });
                }
                Action::Accept => {
                    unreachable!("accept action delivered for a terminal lookahead")
                }
            }
        }
        if log::log_enabled!(log::Level::Trace) {
            self.ctx().dump_stack();
        }
        Ok(())
    }

    /// Feed the end-of-input lookahead and drive the remaining reductions to
    /// acceptance. On success the stack is back to the lone sentinel and the
    /// parser may be reused for a fresh input.
    fn end_parsing(&mut self) -> Result<OutputOf<Self>> {
        log::trace!("End of input");
        loop {
            match self.ctx_mut().find_shift_action(0) {
                Action::Reduce(rule) => {
                    if let Some(symbol) = self.reduce(rule)? {
                        log::trace!(
                            "Accept! Max stack depth: {}",
                            self.ctx().stats.max_stack_depth
                        );
                        debug_assert_eq!(self.ctx().stack_depth(), 1);
                        return Ok(self.unwrap_result(symbol));
                    }
                }
                Action::Error => {
                    log::trace!("Syntax Error!");
                    bail!(ParserError::<TokenOf<Self>, CodeOf<Self>>::UnexpectedEndOfInput);
                }
                Action::Shift(_) | Action::ShiftReduce(_) => {
                    unreachable!("cannot shift the end-of-input token")
                }
                Action::Accept => {
                    unreachable!("accept action delivered for a terminal lookahead")
                }
            }
        }
    }

    /// Discard any half-parsed input, restoring the post-construction state.
    fn reset(&mut self) {
        self.ctx_mut().reset();
    }

    /// Apply one rule: run its code block, pop its right-hand side, then
    /// consult the goto row. `Some(symbol)` means the goto reached Accept.
    fn reduce(&mut self, rule: RuleOf<Self>) -> Result<Option<SymbolOf<Self>>> {
        let number: usize = rule.into();
        let info = <Self::Tables as ParserTables>::rule_info()[number];
        let symbol = self.apply_rule(rule)?;
        log::trace!(
            "Reduce {} [{}]",
            number,
            <Self::Tables as ParserTables>::rule_text()
                .get(number)
                .copied()
                .unwrap_or("?")
        );
        let ctx = self.ctx_mut();
        ctx.stats.reduces += 1;
        assert!(
            ctx.stack.len() > info.rhs_len,
            "reduce by rule {number} would pop the stack sentinel"
        );
        let depth = ctx.stack.len() - info.rhs_len;
        ctx.stack.truncate(depth);
        self.perform_reduce(symbol, info.lhs.into())
    }

    /// Push the reduced left-hand side according to the goto row.
    fn perform_reduce(
        &mut self,
        symbol: SymbolOf<Self>,
        lhs: usize,
    ) -> Result<Option<SymbolOf<Self>>> {
        let state = match self
            .ctx()
            .stack
            .last()
            .expect("parse stack is empty")
            .state_or_rule
        {
            StateOrRule::State(state) => state,
            // Nonterminal gotos never land on a deferred shift-reduce entry.
            StateOrRule::Rule(_) => unreachable!("deferred reduce exposed under a goto"),
        };
        match ParserCtx::<Self::Tables>::find_reduce_action(state, lhs) {
            Action::Shift(next) => {
                self.ctx_mut().push(StackEntry {
                    state_or_rule: StateOrRule::State(next),
                    code: lhs,
                    symbol: Some(symbol),
                })?;
                log::trace!(
                    "... then shift '{}', go to state {}",
                    ParserCtx::<Self::Tables>::name(lhs),
                    Into::<usize>::into(next)
                );
                Ok(None)
            }
            Action::Reduce(rule) => {
                self.ctx_mut().push(StackEntry {
                    state_or_rule: StateOrRule::Rule(rule),
                    code: lhs,
                    symbol: Some(symbol),
                })?;
                log::trace!(
                    "... then shift '{}', pending reduce {}",
                    ParserCtx::<Self::Tables>::name(lhs),
                    Into::<usize>::into(rule)
                );
                Ok(None)
            }
            Action::Accept => Ok(Some(symbol)),
            Action::ShiftReduce(_) => unreachable!("shift-reduce on a nonterminal goto"),
            Action::Error => unreachable!("error action after a reduce"),
        }
    }
}
