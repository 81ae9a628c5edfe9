//! The interleaving heuristic engine.
//!
//! Walks a typed expression AST and decides which symbolic variables must
//! be bit-interleaved when the expression is encoded as a BDD. Two
//! variables end up in the same group when an operation that mixes bits
//! non-disjunctively (arithmetic, comparisons, equality, bitwise and/xor)
//! connects the sub-expressions they flow into. Disjunctive combinations
//! (logical connectives, bitwise or) never couple their operands.
//!
//! The analysis is single-use: one root expression, one partition. Results
//! are memoized per node, which is sound because the arena hash-conses
//! structurally equal sub-expressions to the same node id.

use std::collections::HashMap;

use log::debug;

use crate::error::{Error, Result};
use crate::expr::{Bindings, ExprArena, ExprKind, NodeId};
use crate::result::InterleavingResult;
use crate::unionfind::DisjointSets;
use crate::var::{VarId, VarSet};

/// One-shot interleaving analysis over a single root expression.
pub struct InterleavingHeuristic<'a> {
    arena: &'a ExprArena,
    bindings: &'a Bindings,
    sets: DisjointSets<VarId>,
    cache: HashMap<NodeId, InterleavingResult>,
    unions: usize,
}

impl<'a> InterleavingHeuristic<'a> {
    pub fn new(arena: &'a ExprArena, bindings: &'a Bindings) -> Self {
        InterleavingHeuristic {
            arena,
            bindings,
            sets: DisjointSets::new(),
            cache: HashMap::new(),
            unions: 0,
        }
    }

    /// Computes the interleaving partition for `root`.
    ///
    /// Returns one group per equivalence class of variables reachable from
    /// the root, singletons included. Group and member order are
    /// deterministic for a given input.
    pub fn compute(
        arena: &ExprArena,
        root: NodeId,
        bindings: &Bindings,
    ) -> Result<Vec<Vec<VarId>>> {
        let mut heuristic = InterleavingHeuristic::new(arena, bindings);
        heuristic.evaluate(root)?;
        let groups = heuristic.disjoint_sets();
        debug!(
            "interleaving: {} variables in {} groups after {} unions",
            heuristic.sets.len(),
            groups.len(),
            heuristic.unions
        );
        Ok(groups)
    }

    /// Memoized evaluation of one node to its interleaving result.
    pub fn evaluate(&mut self, id: NodeId) -> Result<InterleavingResult> {
        if let Some(cached) = self.cache.get(&id) {
            return Ok(cached.clone());
        }
        let result = self.eval_node(id)?;
        self.cache.insert(id, result.clone());
        Ok(result)
    }

    /// The current partition, in first-visit order.
    pub fn disjoint_sets(&mut self) -> Vec<Vec<VarId>> {
        self.sets.disjoint_sets()
    }

    /// Number of union operations performed so far.
    pub fn unions_performed(&self) -> usize {
        self.unions
    }

    fn eval_node(&mut self, id: NodeId) -> Result<InterleavingResult> {
        let arena = self.arena;
        let node = arena.node(id);
        match &node.kind {
            ExprKind::Const(_) | ExprKind::ListEmpty | ExprKind::EmptySet => {
                Ok(InterleavingResult::empty_of(&node.ty))
            }

            ExprKind::Arbitrary(var) => {
                self.sets.add(*var);
                Ok(InterleavingResult::Flat(VarSet::singleton(*var)))
            }

            ExprKind::Arg(arg) => {
                let bound = self.bindings.get(*arg).ok_or(Error::MissingArgument(*arg))?;
                self.evaluate(bound)
            }

            ExprKind::Not(operand) | ExprKind::BitNot(operand) | ExprKind::Cast(operand) => {
                self.evaluate(*operand)
            }

            // Logical connectives and bitwise-or are disjunctive: the
            // operands' variables are collected but never coupled.
            ExprKind::And(lhs, rhs) | ExprKind::Or(lhs, rhs) | ExprKind::BitOr(lhs, rhs) => {
                let left = self.evaluate(*lhs)?;
                let right = self.evaluate(*rhs)?;
                left.union(&right)
            }

            ExprKind::Arith(_, lhs, rhs)
            | ExprKind::Cmp(_, lhs, rhs)
            | ExprKind::BitAnd(lhs, rhs)
            | ExprKind::BitXor(lhs, rhs) => {
                let left = self.evaluate(*lhs)?;
                let right = self.evaluate(*rhs)?;
                self.couple(&left, &right);
                left.union(&right)
            }

            ExprKind::Ite(cond, then, otherwise) => {
                // The condition contributes its own couplings but is not
                // joined with the branch results.
                self.evaluate(*cond)?;
                let then = self.evaluate(*then)?;
                let otherwise = self.evaluate(*otherwise)?;
                then.union(&otherwise)
            }

            ExprKind::MakeRecord(fields) => {
                let mut entries = Vec::with_capacity(fields.len());
                for (name, child) in fields {
                    entries.push((name.clone(), self.evaluate(*child)?));
                }
                Ok(InterleavingResult::Record(entries))
            }

            ExprKind::GetField(record, field) => {
                match self.evaluate(*record)? {
                    InterleavingResult::Record(entries) => entries
                        .iter()
                        .find(|(name, _)| name == field)
                        .map(|(_, result)| result.clone())
                        .ok_or_else(|| {
                            Error::ShapeMismatch(format!("record result has no field `{}`", field))
                        }),
                    InterleavingResult::Flat(_) => Err(Error::ShapeMismatch(format!(
                        "field access `{}` on a flat result",
                        field
                    ))),
                }
            }

            ExprKind::WithField { record, field, value } => {
                let updated = self.evaluate(*record)?;
                let value = self.evaluate(*value)?;
                match updated {
                    InterleavingResult::Record(mut entries) => {
                        let slot = entries.iter_mut().find(|(name, _)| name == field).ok_or_else(
                            || {
                                Error::ShapeMismatch(format!(
                                    "record result has no field `{}`",
                                    field
                                ))
                            },
                        )?;
                        slot.1 = value;
                        Ok(InterleavingResult::Record(entries))
                    }
                    InterleavingResult::Flat(_) => Err(Error::ShapeMismatch(format!(
                        "field update `{}` on a flat result",
                        field
                    ))),
                }
            }

            // A sequence-typed result is always flat, so the element result
            // is flattened in (its record structure, if any, dissolves).
            ExprKind::ListCons(head, tail) => {
                let head = self.evaluate(*head)?;
                let tail = self.evaluate(*tail)?;
                let vars = head.all_variables().union(&tail.all_variables());
                Ok(InterleavingResult::Flat(vars))
            }

            // Only the scrutinee and the empty branch are traversed. The
            // cons branch is built over unbound head/tail arguments and has
            // no identity outside the case; any coupling inside it is
            // missed. TODO: revisit once case branches carry stable
            // bindings for head and tail.
            ExprKind::ListCase { list, empty, cons: _ } => {
                self.evaluate(*list)?;
                self.evaluate(*empty)
            }

            ExprKind::EmptyMap
            | ExprKind::MapGet(..)
            | ExprKind::MapSet(..)
            | ExprKind::ConstMapGet(..)
            | ExprKind::SeqConcat(..)
            | ExprKind::RegexMatch(_) => Err(Error::UnsupportedForBddBackend(node.kind.name())),
        }
    }

    /// Declares that the variables of `lhs` and `rhs` must co-habitate.
    ///
    /// Variables of purely boolean operands are exempt (a boolean occupies
    /// a single BDD variable, so there is nothing to interleave), and only
    /// identically-typed pairs are ever merged.
    fn couple(&mut self, lhs: &InterleavingResult, rhs: &InterleavingResult) {
        let arena = self.arena;
        let left = lhs.all_variables();
        let right = rhs.all_variables();
        if left.iter().all(|var| arena.var_type(var).is_bool()) {
            return;
        }
        if right.iter().all(|var| arena.var_type(var).is_bool()) {
            return;
        }
        for a in left.iter() {
            for b in right.iter() {
                if arena.var_type(a) == arena.var_type(b) {
                    debug!("interleave {} with {}", a, b);
                    self.sets.union(&a, &b);
                    self.unions += 1;
                }
            }
        }
    }
}
