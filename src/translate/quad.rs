//! Quadruples and the table they are emitted into.
//!
//! A jump's destination is either resolved to a concrete index, or pending.
//! Pending jumps that share the same (unknown) destination form a _chain_:
//! each pending jump holds the index of the next one, and the last holds the empty chain.
//! Once the destination becomes known, [`QuadTable::resolve`] walks the chain and
//! overwrites every member with the destination.

use std::fmt;
use std::num::NonZeroUsize;

use super::{TranslateError, TranslateResult};
use crate::reader::SyntaxClass;

/// Index of a quadruple in a [`QuadTable`]. Indices start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuadIndex(NonZeroUsize);

impl QuadIndex {
    pub const FIRST: QuadIndex = QuadIndex(NonZeroUsize::MIN);

    pub fn new(index: usize) -> Option<Self> {
        NonZeroUsize::new(index).map(QuadIndex)
    }

    pub fn get(self) -> usize {
        self.0.get()
    }

    /// The index of the quadruple stored at the given 0-based position.
    fn from_position(position: usize) -> Self {
        QuadIndex(NonZeroUsize::MIN.saturating_add(position))
    }

    fn position(self) -> usize {
        self.0.get() - 1
    }
}

impl fmt::Display for QuadIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Head of a chain of pending jumps, or the empty chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Chain(Option<QuadIndex>);

impl Chain {
    pub const EMPTY: Chain = Chain(None);

    pub fn head(self) -> Option<QuadIndex> {
        self.0
    }
}

impl From<QuadIndex> for Chain {
    fn from(value: QuadIndex) -> Self {
        Chain(Some(value))
    }
}

/// Where a jump goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Not yet known; links to the next jump waiting on the same destination.
    Pending(Chain),
    Resolved(QuadIndex),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Pending(Chain(None)) => write!(f, "0"),
            Target::Pending(Chain(Some(next))) => write!(f, "{next}"),
            Target::Resolved(target) => write!(f, "{target}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    pub fn from_class(class: SyntaxClass) -> Option<Self> {
        match class {
            SyntaxClass::Plus => Some(ArithOp::Add),
            SyntaxClass::Minus => Some(ArithOp::Sub),
            SyntaxClass::Times => Some(ArithOp::Mul),
            SyntaxClass::Divide => Some(ArithOp::Div),
            _ => None,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
}

impl RelOp {
    pub fn from_class(class: SyntaxClass) -> Option<Self> {
        match class {
            SyntaxClass::Lt => Some(RelOp::Lt),
            SyntaxClass::Le => Some(RelOp::Le),
            SyntaxClass::Eq => Some(RelOp::Eq),
            SyntaxClass::Ne => Some(RelOp::Ne),
            SyntaxClass::Ge => Some(RelOp::Ge),
            SyntaxClass::Gt => Some(RelOp::Gt),
            _ => None,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            RelOp::Lt => "<",
            RelOp::Le => "<=",
            RelOp::Eq => "==",
            RelOp::Ne => "!=",
            RelOp::Ge => ">=",
            RelOp::Gt => ">",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Arith(ArithOp),
    Assign,
    /// Unconditional jump.
    Jump,
    /// Jump if `arg1 <op> arg2`.
    JumpIf(RelOp),
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Arith(op) => write!(f, "{}", op.symbol()),
            Op::Assign => write!(f, "="),
            Op::Jump => write!(f, "j"),
            Op::JumpIf(op) => write!(f, "j{}", op.symbol()),
        }
    }
}

/// The `res` field of a quadruple: a variable / temporary name, or a jump target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dest {
    Name(String),
    Jump(Target),
}

impl fmt::Display for Dest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dest::Name(name) => write!(f, "{name}"),
            Dest::Jump(target) => write!(f, "{target}"),
        }
    }
}

/// A three-address instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quadruple {
    pub op: Op,
    pub arg1: String,
    pub arg2: String,
    pub res: Dest,
}

impl Quadruple {
    pub fn arith(op: ArithOp, arg1: String, arg2: String, res: String) -> Self {
        Quadruple {
            op: Op::Arith(op),
            arg1,
            arg2,
            res: Dest::Name(res),
        }
    }

    pub fn assign(value: String, variable: String) -> Self {
        Quadruple {
            op: Op::Assign,
            arg1: value,
            arg2: String::new(),
            res: Dest::Name(variable),
        }
    }

    /// An unconditional jump to the given target.
    pub fn jump(target: Target) -> Self {
        Quadruple {
            op: Op::Jump,
            arg1: String::new(),
            arg2: String::new(),
            res: Dest::Jump(target),
        }
    }

    /// A conditional jump, pending with an empty chain.
    pub fn jump_if(op: RelOp, arg1: String, arg2: String) -> Self {
        Quadruple {
            op: Op::JumpIf(op),
            arg1,
            arg2,
            res: Dest::Jump(Target::Pending(Chain::EMPTY)),
        }
    }

    pub fn target(&self) -> Option<Target> {
        match self.res {
            Dest::Jump(target) => Some(target),
            Dest::Name(_) => None,
        }
    }

    /// The `res` field in its textual form: a name, or a decimal index.
    pub fn res_text(&self) -> String {
        self.res.to_string()
    }
}

impl fmt::Display for Quadruple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.op, self.arg1, self.arg2, self.res
        )
    }
}

/// Append-only table of quadruples, indexed from 1.
///
/// The table grows on demand unless built with a limit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuadTable {
    quads: Vec<Quadruple>,
    limit: Option<usize>,
}

impl QuadTable {
    pub fn new() -> Self {
        Default::default()
    }

    /// A table that refuses to hold more than `limit` quadruples.
    pub fn with_limit(limit: usize) -> Self {
        QuadTable {
            quads: Vec::new(),
            limit: Some(limit),
        }
    }

    pub fn len(&self) -> usize {
        self.quads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    /// The index the next emitted quadruple will get.
    /// Once translation is complete, this is the exit address.
    pub fn next_index(&self) -> QuadIndex {
        QuadIndex::from_position(self.quads.len())
    }

    pub fn get(&self, index: QuadIndex) -> Option<&Quadruple> {
        self.quads.get(index.position())
    }

    pub fn iter(&self) -> impl Iterator<Item = (QuadIndex, &Quadruple)> + '_ {
        self.quads
            .iter()
            .enumerate()
            .map(|(position, quad)| (QuadIndex::from_position(position), quad))
    }

    pub fn as_slice(&self) -> &[Quadruple] {
        &self.quads
    }

    /// Append a quadruple, returning its index.
    pub fn emit(&mut self, quad: Quadruple) -> TranslateResult<QuadIndex> {
        if let Some(limit) = self.limit {
            if self.quads.len() >= limit {
                return Err(TranslateError::CapacityExceeded { limit });
            }
        }
        let index = self.next_index();
        tracing::trace!("emit {index}: {quad}");
        self.quads.push(quad);
        Ok(index)
    }

    fn target_mut(&mut self, index: QuadIndex) -> TranslateResult<&mut Target> {
        match self.quads.get_mut(index.position()) {
            Some(Quadruple {
                res: Dest::Jump(target),
                ..
            }) => Ok(target),
            _ => Err(TranslateError::BrokenChain { index }),
        }
    }

    /// Point every jump on the chain at `target`.
    /// Resolving the empty chain does nothing.
    pub fn resolve(&mut self, chain: Chain, target: QuadIndex) -> TranslateResult<()> {
        let mut link = chain;
        while let Some(index) = link.head() {
            let slot = self.target_mut(index)?;
            link = match *slot {
                Target::Pending(next) => next,
                Target::Resolved(_) => return Err(TranslateError::BrokenChain { index }),
            };
            *slot = Target::Resolved(target);
        }
        if let Some(head) = chain.head() {
            tracing::debug!("resolved chain at {head} to {target}");
        }
        Ok(())
    }

    /// Join two chains into one, without resolving either.
    ///
    /// The result starts at `second` (if it is non-empty), and continues from its tail into `first`.
    pub fn merge(&mut self, first: Chain, second: Chain) -> TranslateResult<Chain> {
        let Some(mut index) = second.head() else {
            return Ok(first);
        };
        loop {
            let slot = self.target_mut(index)?;
            match *slot {
                Target::Pending(Chain(Some(next))) => index = next,
                Target::Pending(Chain(None)) => {
                    *slot = Target::Pending(first);
                    break;
                }
                Target::Resolved(_) => return Err(TranslateError::BrokenChain { index }),
            }
        }
        tracing::debug!("merged chain {:?} after tail {index}", first.head());
        Ok(second)
    }

    /// The first jump that is still waiting for a target, if any.
    pub fn first_pending(&self) -> Option<QuadIndex> {
        self.iter()
            .find(|(_, quad)| matches!(quad.target(), Some(Target::Pending(_))))
            .map(|(index, _)| index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx(n: usize) -> QuadIndex {
        QuadIndex::new(n).unwrap()
    }

    fn pending_jump(next: Chain) -> Quadruple {
        Quadruple::jump(Target::Pending(next))
    }

    /// Targets of each quadruple, as text.
    fn targets(table: &QuadTable) -> Vec<String> {
        table.iter().map(|(_, quad)| quad.res_text()).collect()
    }

    #[test]
    fn indices_start_at_one() {
        let mut table = QuadTable::new();
        assert_eq!(table.next_index(), QuadIndex::FIRST);
        let first = table
            .emit(Quadruple::assign("1".to_owned(), "x".to_owned()))
            .unwrap();
        let second = table
            .emit(Quadruple::assign("2".to_owned(), "y".to_owned()))
            .unwrap();
        assert_eq!((first.get(), second.get()), (1, 2));
        assert_eq!(table.next_index().get(), 3);
        assert_eq!(table.get(idx(2)).unwrap().res_text(), "y");
        assert!(QuadIndex::new(0).is_none());
    }

    #[test]
    fn resolve_walks_whole_chain() {
        let mut table = QuadTable::new();
        // Chain 3 -> 2 -> 1 -> end.
        table.emit(pending_jump(Chain::EMPTY)).unwrap();
        table.emit(pending_jump(idx(1).into())).unwrap();
        table.emit(pending_jump(idx(2).into())).unwrap();
        assert_eq!(targets(&table), ["0", "1", "2"]);

        table.resolve(idx(3).into(), idx(7)).unwrap();
        assert_eq!(targets(&table), ["7", "7", "7"]);
        assert_eq!(table.first_pending(), None);
    }

    #[test]
    fn resolve_empty_chain_is_noop() {
        let mut table = QuadTable::new();
        table.emit(pending_jump(Chain::EMPTY)).unwrap();
        table.resolve(Chain::EMPTY, idx(1)).unwrap();
        assert_eq!(table.first_pending(), Some(idx(1)));
    }

    #[test]
    fn merge_with_empty_chains() {
        let mut table = QuadTable::new();
        let only = table.emit(pending_jump(Chain::EMPTY)).unwrap();

        assert_eq!(table.merge(only.into(), Chain::EMPTY).unwrap(), Chain::from(only));
        assert_eq!(table.merge(Chain::EMPTY, Chain::EMPTY).unwrap(), Chain::EMPTY);
        // Empty first chain: the second chain keeps its empty tail.
        assert_eq!(table.merge(Chain::EMPTY, only.into()).unwrap(), Chain::from(only));
        assert_eq!(targets(&table), ["0"]);
    }

    #[test]
    fn merge_splices_tail() {
        let mut table = QuadTable::new();
        // First chain: 2 -> 1. Second chain: 4 -> 3.
        table.emit(pending_jump(Chain::EMPTY)).unwrap();
        table.emit(pending_jump(idx(1).into())).unwrap();
        table.emit(pending_jump(Chain::EMPTY)).unwrap();
        table.emit(pending_jump(idx(3).into())).unwrap();

        let merged = table.merge(idx(2).into(), idx(4).into()).unwrap();
        assert_eq!(merged, Chain::from(idx(4)));
        assert_eq!(targets(&table), ["0", "1", "2", "3"]);

        table.resolve(merged, idx(5)).unwrap();
        assert_eq!(targets(&table), ["5", "5", "5", "5"]);
    }

    #[test]
    fn broken_chain_is_an_error() {
        let mut table = QuadTable::new();
        table
            .emit(Quadruple::assign("1".to_owned(), "x".to_owned()))
            .unwrap();
        table.emit(pending_jump(idx(1).into())).unwrap();

        match table.resolve(idx(2).into(), idx(3)) {
            Err(TranslateError::BrokenChain { index }) => assert_eq!(index, idx(1)),
            v => panic!("unexpected result: {v:?}"),
        }
        match table.merge(Chain::EMPTY, idx(9).into()) {
            Err(TranslateError::BrokenChain { index }) => assert_eq!(index, idx(9)),
            v => panic!("unexpected result: {v:?}"),
        }
    }

    #[test]
    fn limit_is_enforced() {
        let mut table = QuadTable::with_limit(1);
        table
            .emit(Quadruple::assign("1".to_owned(), "x".to_owned()))
            .unwrap();
        let err = table
            .emit(Quadruple::assign("2".to_owned(), "y".to_owned()))
            .unwrap_err();
        assert_eq!(err, TranslateError::CapacityExceeded { limit: 1 });
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn display_forms() {
        let quad = Quadruple::jump_if(RelOp::Le, "a".to_owned(), "b".to_owned());
        assert_eq!(quad.to_string(), "(j<=, a, b, 0)");
        let quad = Quadruple::arith(ArithOp::Mul, "2".to_owned(), "3".to_owned(), "T1".to_owned());
        assert_eq!(quad.to_string(), "(*, 2, 3, T1)");
        let quad = Quadruple::jump(Target::Resolved(idx(4)));
        assert_eq!(quad.to_string(), "(j, , , 4)");
    }
}
