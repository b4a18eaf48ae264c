//! Hand-laid stand-ins for generator output, used by the driver tests.
//!
//! Every fixture uses the same conventions a generated parser would: symbol
//! code 0 is end of input, terminals come first, nonterminals after, and
//! unused action-table slots carry an impossible lookahead so a probe on
//! them misses and falls through to the state's default action.

use crate::parser::{
    Action, LookaheadAction, Parser, ParserCtx, ParserTables, ParserTokenCode, RuleInfo,
};
use anyhow::Result;

type La = LookaheadAction<u8, u8, u8>;
type Act = Action<u8, u8>;

const NO_CODE: u8 = 0xff;

const fn la(lookahead: u8, action: Act) -> La {
    LookaheadAction { lookahead, action }
}

const HOLE: La = la(NO_CODE, Action::Error);

/// Semantic value used by all fixtures: a shifted terminal, or the number of
/// terminals a reduced subtree consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestSymbol {
    Terminal(char),
    Value(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AbCode {
    A = 1,
    B = 2,
    C = 3,
}

impl ParserTokenCode for AbCode {
    type SymbolCode = u8;

    fn symbol_code(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum KwCode {
    Ident = 1,
    If = 2,
}

impl ParserTokenCode for KwCode {
    type SymbolCode = u8;

    fn symbol_code(self) -> u8 {
        self as u8
    }
}

/// Shared driver for every fixture grammar: terminals inject as
/// `Terminal`, each reduction folds its right-hand side into the number of
/// terminals consumed, and the final output is that count.
pub struct TestParser<T: ParserTables> {
    pub ctx: ParserCtx<T>,
}

impl<T: ParserTables> TestParser<T> {
    pub fn new() -> Self {
        Self {
            ctx: ParserCtx::new(),
        }
    }

    pub fn with_stack_limit(limit: usize) -> Self {
        Self {
            ctx: ParserCtx::with_stack_limit(limit),
        }
    }
}

impl<T> Parser for TestParser<T>
where
    T: ParserTables<Token = char, Symbol = TestSymbol, Output = i32>,
{
    type Tables = T;

    fn ctx(&self) -> &ParserCtx<T> {
        &self.ctx
    }

    fn ctx_mut(&mut self) -> &mut ParserCtx<T> {
        &mut self.ctx
    }

    fn token_to_symbol(&mut self, token: char) -> TestSymbol {
        TestSymbol::Terminal(token)
    }

    fn apply_rule(&mut self, rule: T::RuleNumber) -> Result<TestSymbol> {
        let info = T::rule_info()[Into::<usize>::into(rule)];
        let mut terminals = 0;
        for index in 0..info.rhs_len {
            match self.ctx.take_symbol(index).expect("missing rhs symbol") {
                TestSymbol::Terminal(_) => terminals += 1,
                TestSymbol::Value(count) => terminals += count,
            }
        }
        Ok(TestSymbol::Value(terminals))
    }

    fn unwrap_result(&mut self, symbol: TestSymbol) -> i32 {
        match symbol {
            TestSymbol::Value(count) => count,
            TestSymbol::Terminal(_) => panic!("start symbol must carry a count"),
        }
    }
}

macro_rules! fixture_types {
    () => {
        type SymbolCode = u8;
        type StateNumber = u8;
        type RuleNumber = u8;
        type Token = char;
        type Symbol = TestSymbol;
        type Output = i32;

        fn start_state() -> u8 {
            0
        }
    };
}

/// `S ::= .` — the empty sentence is the only one.
pub struct EmptyGrammar;

const EMPTY_ACTIONS: &[La] = &[
    la(0, Action::Reduce(0)), //  0: state 0, end of input
    HOLE,                     //  1
    la(1, Action::Accept),    //  2: state 0 goto on S
];

impl ParserTables for EmptyGrammar {
    fixture_types!();
    type TokenCode = AbCode;

    const NUM_SYMBOLS: usize = 2;
    const NUM_STATES: usize = 1;
    const SHIFT_OFFSET_MIN: isize = 0;
    const SHIFT_OFFSET_MAX: isize = 0;
    const SHIFT_USE_DEFAULT: isize = -100;
    const REDUCE_OFFSET_MIN: isize = 1;
    const REDUCE_OFFSET_MAX: isize = 1;
    const REDUCE_USE_DEFAULT: isize = -100;
    const HAS_FALLBACK: bool = false;
    const WILDCARD: Option<u8> = None;

    fn lookahead_action() -> &'static [La] {
        EMPTY_ACTIONS
    }
    fn shift_offset() -> &'static [isize] {
        &[0]
    }
    fn reduce_offset() -> &'static [isize] {
        &[1]
    }
    fn default_action() -> &'static [Act] {
        &[Action::Error]
    }
    fn rule_info() -> &'static [RuleInfo<u8>] {
        &[RuleInfo { lhs: 1, rhs_len: 0 }]
    }
    fn symbol_name() -> &'static [&'static str] {
        &["$", "S"]
    }
    fn rule_text() -> &'static [&'static str] {
        &["S ::= ."]
    }
}

/// `S ::= a`.
pub struct SingleGrammar;

const SINGLE_ACTIONS: &[La] = &[
    HOLE,                     //  0
    la(1, Action::Shift(1)),  //  1: state 0 on a
    HOLE,                     //  2
    la(0, Action::Reduce(0)), //  3: state 1, end of input
    HOLE,                     //  4
    HOLE,                     //  5
    la(2, Action::Accept),    //  6: state 0 goto on S
];

impl ParserTables for SingleGrammar {
    fixture_types!();
    type TokenCode = AbCode;

    const NUM_SYMBOLS: usize = 3;
    const NUM_STATES: usize = 2;
    const SHIFT_OFFSET_MIN: isize = 0;
    const SHIFT_OFFSET_MAX: isize = 3;
    const SHIFT_USE_DEFAULT: isize = -100;
    const REDUCE_OFFSET_MIN: isize = 4;
    const REDUCE_OFFSET_MAX: isize = 4;
    const REDUCE_USE_DEFAULT: isize = -100;
    const HAS_FALLBACK: bool = false;
    const WILDCARD: Option<u8> = None;

    fn lookahead_action() -> &'static [La] {
        SINGLE_ACTIONS
    }
    fn shift_offset() -> &'static [isize] {
        &[0, 3]
    }
    fn reduce_offset() -> &'static [isize] {
        &[4, -100]
    }
    fn default_action() -> &'static [Act] {
        &[Action::Error, Action::Error]
    }
    fn rule_info() -> &'static [RuleInfo<u8>] {
        &[RuleInfo { lhs: 2, rhs_len: 1 }]
    }
    fn symbol_name() -> &'static [&'static str] {
        &["$", "a", "S"]
    }
    fn rule_text() -> &'static [&'static str] {
        &["S ::= a"]
    }
}

/// `S ::= a b`, with the `b` shift fused into the reduction (the state after
/// `b` would unconditionally reduce). The unused terminal `c` exists to
/// provoke syntax errors.
pub struct PairGrammar;

const PAIR_ACTIONS: &[La] = &[
    HOLE,                          //  0
    la(1, Action::Shift(1)),       //  1: state 0 on a
    HOLE,                          //  2
    HOLE,                          //  3
    HOLE,                          //  4
    HOLE,                          //  5
    HOLE,                          //  6
    la(2, Action::ShiftReduce(0)), //  7: state 1 on b
    HOLE,                          //  8
    HOLE,                          //  9
    la(4, Action::Accept),         // 10: state 0 goto on S
];

impl ParserTables for PairGrammar {
    fixture_types!();
    type TokenCode = AbCode;

    const NUM_SYMBOLS: usize = 5;
    const NUM_STATES: usize = 2;
    const SHIFT_OFFSET_MIN: isize = 0;
    const SHIFT_OFFSET_MAX: isize = 5;
    const SHIFT_USE_DEFAULT: isize = -100;
    const REDUCE_OFFSET_MIN: isize = 6;
    const REDUCE_OFFSET_MAX: isize = 6;
    const REDUCE_USE_DEFAULT: isize = -100;
    const HAS_FALLBACK: bool = false;
    const WILDCARD: Option<u8> = None;

    fn lookahead_action() -> &'static [La] {
        PAIR_ACTIONS
    }
    fn shift_offset() -> &'static [isize] {
        &[0, 5]
    }
    fn reduce_offset() -> &'static [isize] {
        &[6, -100]
    }
    fn default_action() -> &'static [Act] {
        &[Action::Error, Action::Error]
    }
    fn rule_info() -> &'static [RuleInfo<u8>] {
        &[RuleInfo { lhs: 4, rhs_len: 2 }]
    }
    fn symbol_name() -> &'static [&'static str] {
        &["$", "a", "b", "c", "S"]
    }
    fn rule_text() -> &'static [&'static str] {
        &["S ::= a b"]
    }
}

/// `S ::= ID`, where the contextual keyword `IF` falls back to `ID`.
pub struct FallbackGrammar;

const FALLBACK_ACTIONS: &[La] = &[
    HOLE,                     //  0
    la(1, Action::Shift(1)),  //  1: state 0 on ID
    HOLE,                     //  2: no entry for IF; the fallback kicks in
    HOLE,                     //  3
    la(0, Action::Reduce(0)), //  4: state 1, end of input
    HOLE,                     //  5
    HOLE,                     //  6
    HOLE,                     //  7
    la(3, Action::Accept),    //  8: state 0 goto on S
];

impl ParserTables for FallbackGrammar {
    fixture_types!();
    type TokenCode = KwCode;

    const NUM_SYMBOLS: usize = 4;
    const NUM_STATES: usize = 2;
    const SHIFT_OFFSET_MIN: isize = 0;
    const SHIFT_OFFSET_MAX: isize = 4;
    const SHIFT_USE_DEFAULT: isize = -100;
    const REDUCE_OFFSET_MIN: isize = 5;
    const REDUCE_OFFSET_MAX: isize = 5;
    const REDUCE_USE_DEFAULT: isize = -100;
    const HAS_FALLBACK: bool = true;
    const WILDCARD: Option<u8> = None;

    fn lookahead_action() -> &'static [La] {
        FALLBACK_ACTIONS
    }
    fn shift_offset() -> &'static [isize] {
        &[0, 4]
    }
    fn reduce_offset() -> &'static [isize] {
        &[5, -100]
    }
    fn default_action() -> &'static [Act] {
        &[Action::Error, Action::Error]
    }
    fn fallback() -> &'static [u8] {
        &[0, 0, 1, 0]
    }
    fn rule_info() -> &'static [RuleInfo<u8>] {
        &[RuleInfo { lhs: 3, rhs_len: 1 }]
    }
    fn symbol_name() -> &'static [&'static str] {
        &["$", "ID", "IF", "S"]
    }
    fn rule_text() -> &'static [&'static str] {
        &["S ::= ID"]
    }
}

/// `R ::= a R | a` — right recursion stacks every `a` before the first
/// reduction, which is what the stack-limit tests need.
pub struct RightListGrammar;

const RIGHT_LIST_ACTIONS: &[La] = &[
    HOLE,                     //  0
    la(1, Action::Shift(1)),  //  1: state 0 on a
    HOLE,                     //  2
    la(0, Action::Reduce(1)), //  3: state 1, end of input
    la(1, Action::Shift(1)),  //  4: state 1 on a
    HOLE,                     //  5
    la(0, Action::Reduce(0)), //  6: state 2, end of input
    HOLE,                     //  7
    HOLE,                     //  8
    la(2, Action::Shift(2)),  //  9: state 1 goto on R
    la(2, Action::Accept),    // 10: state 0 goto on R
];

impl ParserTables for RightListGrammar {
    fixture_types!();
    type TokenCode = AbCode;

    const NUM_SYMBOLS: usize = 3;
    const NUM_STATES: usize = 3;
    const SHIFT_OFFSET_MIN: isize = 0;
    const SHIFT_OFFSET_MAX: isize = 6;
    const SHIFT_USE_DEFAULT: isize = -100;
    const REDUCE_OFFSET_MIN: isize = 7;
    const REDUCE_OFFSET_MAX: isize = 8;
    const REDUCE_USE_DEFAULT: isize = -100;
    const HAS_FALLBACK: bool = false;
    const WILDCARD: Option<u8> = None;

    fn lookahead_action() -> &'static [La] {
        RIGHT_LIST_ACTIONS
    }
    fn shift_offset() -> &'static [isize] {
        &[0, 3, 6]
    }
    fn reduce_offset() -> &'static [isize] {
        &[8, 7, -100]
    }
    fn default_action() -> &'static [Act] {
        &[Action::Error, Action::Error, Action::Error]
    }
    fn rule_info() -> &'static [RuleInfo<u8>] {
        &[
            RuleInfo { lhs: 2, rhs_len: 2 },
            RuleInfo { lhs: 2, rhs_len: 1 },
        ]
    }
    fn symbol_name() -> &'static [&'static str] {
        &["$", "a", "R"]
    }
    fn rule_text() -> &'static [&'static str] {
        &["R ::= a R", "R ::= a"]
    }
}

/// `S ::= ANY`, where `ANY` is the wildcard terminal: any nonzero lookahead
/// without an entry of its own matches it.
pub struct WildcardGrammar;

const WILDCARD_ACTIONS: &[La] = &[
    HOLE,                     //  0
    HOLE,                     //  1: no entry for a; the wildcard slot serves
    la(2, Action::Shift(1)),  //  2: state 0 on ANY
    HOLE,                     //  3
    la(0, Action::Reduce(0)), //  4: state 1, end of input
    HOLE,                     //  5
    HOLE,                     //  6
    HOLE,                     //  7
    la(3, Action::Accept),    //  8: state 0 goto on S
];

impl ParserTables for WildcardGrammar {
    fixture_types!();
    type TokenCode = AbCode;

    const NUM_SYMBOLS: usize = 4;
    const NUM_STATES: usize = 2;
    const SHIFT_OFFSET_MIN: isize = 0;
    const SHIFT_OFFSET_MAX: isize = 4;
    const SHIFT_USE_DEFAULT: isize = -100;
    const REDUCE_OFFSET_MIN: isize = 5;
    const REDUCE_OFFSET_MAX: isize = 5;
    const REDUCE_USE_DEFAULT: isize = -100;
    const HAS_FALLBACK: bool = false;
    const WILDCARD: Option<u8> = Some(2);

    fn lookahead_action() -> &'static [La] {
        WILDCARD_ACTIONS
    }
    fn shift_offset() -> &'static [isize] {
        &[0, 4]
    }
    fn reduce_offset() -> &'static [isize] {
        &[5, -100]
    }
    fn default_action() -> &'static [Act] {
        &[Action::Error, Action::Error]
    }
    fn rule_info() -> &'static [RuleInfo<u8>] {
        &[RuleInfo { lhs: 3, rhs_len: 1 }]
    }
    fn symbol_name() -> &'static [&'static str] {
        &["$", "a", "ANY", "S"]
    }
    fn rule_text() -> &'static [&'static str] {
        &["S ::= ANY"]
    }
}
