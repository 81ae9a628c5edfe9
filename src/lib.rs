//! # interleave-rs: Variable Interleaving Heuristic for BDD Encodings
//!
//! **`interleave-rs`** analyzes typed symbolic expressions and decides which
//! symbolic variables must be **bit-interleaved** when the expression is
//! encoded as a Binary Decision Diagram (BDD).
//!
//! ## Why interleave?
//!
//! BDD size is acutely sensitive to variable order. When two integer-typed
//! variables are compared or combined arithmetically (`x == y`, `x + y`,
//! `x & y`), interleaving their bits routinely turns an exponentially-sized
//! BDD into a polynomially-sized one. Interleaving *unrelated* variables,
//! on the other hand, can make the ordering worse. The heuristic computes a
//! conservative, minimal partition: two variables land in the same group
//! exactly when some non-disjunctive operation connects them.
//!
//! ## Key Features
//!
//! - **Manager-Centric AST**: expressions are built through the
//!   [`ExprArena`][crate::expr::ExprArena], which hash-conses every node.
//!   Structural sharing makes per-node memoization sound.
//! - **Shape-Faithful Analysis**: every sub-expression abstracts to an
//!   [`InterleavingResult`][crate::result::InterleavingResult] shaped like
//!   its type (flat variable sets for primitives, nested results for
//!   records), so coupling stays field-wise where the type says it should.
//! - **Deterministic Output**: the partition is a list of lists in
//!   first-visit order; identical inputs produce identical output, down to
//!   member order.
//! - **Fail-Loud Boundaries**: operators the BDD backend cannot encode
//!   (maps, sequence concatenation, regexes) abort the analysis with an
//!   error naming the operator. No partial partition is ever returned.
//!
//! ## Basic Usage
//!
//! ```rust
//! use interleave_rs::{Bindings, ExprArena, InterleavingHeuristic, Type};
//!
//! let mut arena = ExprArena::new();
//!
//! // Three 32-bit symbolic variables.
//! let a = arena.arbitrary(Type::Int);
//! let b = arena.arbitrary(Type::Int);
//! let c = arena.arbitrary(Type::Int);
//!
//! // a + b == c
//! let sum = arena.add(a, b);
//! let root = arena.eq(sum, c);
//!
//! let groups = InterleavingHeuristic::compute(&arena, root, &Bindings::new()).unwrap();
//!
//! // Addition and equality both couple, so all three variables share a group.
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups[0].len(), 3);
//! ```
//!
//! ## Core Components
//!
//! - **[`types`]**: type descriptors and the [`TypeVisitor`] dispatch
//!   framework shared by every type-directed pass.
//! - **[`expr`]**: the hash-consed expression arena and typed builders.
//! - **[`heuristic`]**: the analysis engine producing the partition.
//! - **[`sort`]**: the companion type-to-sort converter for an SMT backend.

pub mod error;
pub mod expr;
pub mod heuristic;
pub mod result;
pub mod sort;
pub mod types;
pub mod unionfind;
pub mod var;

pub use error::{Error, Result};
pub use expr::{ArgId, ArithOp, Bindings, CmpOp, Constant, ExprArena, ExprKind, NodeId};
pub use heuristic::InterleavingHeuristic;
pub use result::InterleavingResult;
pub use sort::{SolverBackend, SortConverter};
pub use types::{Type, TypeVisitor};
pub use unionfind::DisjointSets;
pub use var::{VarId, VarSet};
