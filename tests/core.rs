//! End-to-end tests for the interleaving heuristic.
//!
//! Each scenario builds a small formula over symbolic variables and checks
//! the resulting partition.

use interleave_rs::{Bindings, Error, ExprArena, InterleavingHeuristic, Type, VarId};

/// Partition as sorted groups of raw indices, order-insensitive per group.
fn groups_of(arena: &ExprArena, root: interleave_rs::NodeId, bindings: &Bindings) -> Vec<Vec<u32>> {
    let groups = InterleavingHeuristic::compute(arena, root, bindings).unwrap();
    let mut groups: Vec<Vec<u32>> = groups
        .iter()
        .map(|group| {
            let mut ids: Vec<u32> = group.iter().map(|v| v.index()).collect();
            ids.sort();
            ids
        })
        .collect();
    groups.sort();
    groups
}

// ─── Coupling scenarios ────────────────────────────────────────────────────────

#[test]
fn arithmetic_and_equality_couple() {
    // a + b == c over int32: one group {a, b, c}.
    let mut arena = ExprArena::new();
    let a = arena.arbitrary(Type::Int);
    let b = arena.arbitrary(Type::Int);
    let c = arena.arbitrary(Type::Int);
    let sum = arena.add(a, b);
    let root = arena.eq(sum, c);

    assert_eq!(groups_of(&arena, root, &Bindings::new()), vec![vec![0, 1, 2]]);
}

#[test]
fn bitwise_or_does_not_couple() {
    // a | b over uint32: two singletons.
    let mut arena = ExprArena::new();
    let a = arena.arbitrary(Type::UInt);
    let b = arena.arbitrary(Type::UInt);
    let root = arena.bit_or(a, b);

    assert_eq!(groups_of(&arena, root, &Bindings::new()), vec![vec![0], vec![1]]);
}

#[test]
fn conjunctions_couple_under_disjunction() {
    // (a & b) | (c & d): {a, b} and {c, d}.
    let mut arena = ExprArena::new();
    let a = arena.arbitrary(Type::UInt);
    let b = arena.arbitrary(Type::UInt);
    let c = arena.arbitrary(Type::UInt);
    let d = arena.arbitrary(Type::UInt);
    let ab = arena.bit_and(a, b);
    let cd = arena.bit_and(c, d);
    let root = arena.bit_or(ab, cd);

    assert_eq!(
        groups_of(&arena, root, &Bindings::new()),
        vec![vec![0, 1], vec![2, 3]]
    );
}

#[test]
fn record_equality_couples_fieldwise() {
    // {src: a, dst: b} == {src: c, dst: d}: {a, c} and {b, d}.
    let mut arena = ExprArena::new();
    let a = arena.arbitrary(Type::UInt);
    let b = arena.arbitrary(Type::UInt);
    let c = arena.arbitrary(Type::UInt);
    let d = arena.arbitrary(Type::UInt);
    let left = arena.record("Packet", vec![("src".to_owned(), a), ("dst".to_owned(), b)]);
    let right = arena.record("Packet", vec![("src".to_owned(), c), ("dst".to_owned(), d)]);
    let root = arena.eq(left, right);

    assert_eq!(
        groups_of(&arena, root, &Bindings::new()),
        vec![vec![0, 2], vec![1, 3]]
    );
}

#[test]
fn condition_does_not_couple_with_branches() {
    // if (p == q) then r + s else r - s: {p, q} and {r, s}.
    let mut arena = ExprArena::new();
    let p = arena.arbitrary(Type::Int);
    let q = arena.arbitrary(Type::Int);
    let r = arena.arbitrary(Type::Int);
    let s = arena.arbitrary(Type::Int);
    let cond = arena.eq(p, q);
    let then = arena.add(r, s);
    let otherwise = arena.sub(r, s);
    let root = arena.ite(cond, then, otherwise);

    assert_eq!(
        groups_of(&arena, root, &Bindings::new()),
        vec![vec![0, 1], vec![2, 3]]
    );
}

#[test]
fn unsupported_operators_abort() {
    let mut arena = ExprArena::new();

    // map-get
    let map = arena.empty_map(Type::Int, Type::Int);
    let key = arena.arbitrary(Type::Int);
    let get = arena.map_get(map, key);
    let other = arena.arbitrary(Type::Int);
    let root = arena.eq(get, other);
    let err = InterleavingHeuristic::compute(&arena, root, &Bindings::new()).unwrap_err();
    assert_eq!(err, Error::UnsupportedForBddBackend("map-get"));

    // seq-concat
    let xs = arena.list_empty(Type::Byte);
    let root = arena.seq_concat(xs, xs);
    let err = InterleavingHeuristic::compute(&arena, root, &Bindings::new()).unwrap_err();
    assert_eq!(err, Error::UnsupportedForBddBackend("seq-concat"));

    // regex-match
    let s = arena.arbitrary(Type::Str);
    let root = arena.regex_match(s);
    let err = InterleavingHeuristic::compute(&arena, root, &Bindings::new()).unwrap_err();
    assert_eq!(err, Error::UnsupportedForBddBackend("regex-match"));
}

// ─── Boundary behaviors ────────────────────────────────────────────────────────

#[test]
fn constant_expression_yields_empty_partition() {
    let mut arena = ExprArena::new();
    let five = arena.lit_int(5);
    let six = arena.lit_int(6);
    let root = arena.add(five, six);

    assert!(groups_of(&arena, root, &Bindings::new()).is_empty());
}

#[test]
fn single_arbitrary_is_a_singleton() {
    let mut arena = ExprArena::new();
    let root = arena.arbitrary(Type::ULong);

    assert_eq!(groups_of(&arena, root, &Bindings::new()), vec![vec![0]]);
}

#[test]
fn boolean_arbitraries_stay_singletons() {
    let mut arena = ExprArena::new();
    let p = arena.arbitrary(Type::Bool);
    let q = arena.arbitrary(Type::Bool);
    let r = arena.arbitrary(Type::Bool);
    let not_q = arena.not(q);
    let pq = arena.and(p, not_q);
    let root = arena.or(pq, r);

    assert_eq!(
        groups_of(&arena, root, &Bindings::new()),
        vec![vec![0], vec![1], vec![2]]
    );
}

#[test]
fn partition_covers_exactly_the_reachable_variables() {
    let mut arena = ExprArena::new();
    let a = arena.arbitrary(Type::Int);
    let b = arena.arbitrary(Type::Int);
    let _unreachable = arena.arbitrary(Type::Int);
    let root = arena.lt(a, b);

    let groups = InterleavingHeuristic::compute(&arena, root, &Bindings::new()).unwrap();
    let mut seen: Vec<VarId> = groups.into_iter().flatten().collect();
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 2, "only reachable variables appear, each once");
}

// ─── Arguments ─────────────────────────────────────────────────────────────────

#[test]
fn coupling_flows_through_argument_bindings() {
    let mut arena = ExprArena::new();
    let a = arena.arbitrary(Type::Int);
    let b = arena.arbitrary(Type::Int);
    let sum = arena.add(a, b);

    let (arg, arg_node) = arena.argument(Type::Int);
    let c = arena.arbitrary(Type::Int);
    let root = arena.eq(arg_node, c);

    let mut bindings = Bindings::new();
    bindings.bind(arg, sum);

    assert_eq!(groups_of(&arena, root, &bindings), vec![vec![0, 1, 2]]);
}

#[test]
fn unbound_argument_is_an_error() {
    let mut arena = ExprArena::new();
    let (arg, arg_node) = arena.argument(Type::Int);
    let c = arena.arbitrary(Type::Int);
    let root = arena.eq(arg_node, c);

    let err = InterleavingHeuristic::compute(&arena, root, &Bindings::new()).unwrap_err();
    assert_eq!(err, Error::MissingArgument(arg));
}

// ─── Determinism and idempotence ───────────────────────────────────────────────

#[test]
fn rerunning_on_the_same_arena_is_stable() {
    let mut arena = ExprArena::new();
    let a = arena.arbitrary(Type::UInt);
    let b = arena.arbitrary(Type::UInt);
    let c = arena.arbitrary(Type::UInt);
    let ab = arena.bit_xor(a, b);
    let cmp = arena.le(ab, c);
    let p = arena.arbitrary(Type::Bool);
    let root = arena.and(cmp, p);

    let bindings = Bindings::new();
    let first = InterleavingHeuristic::compute(&arena, root, &bindings).unwrap();
    let second = InterleavingHeuristic::compute(&arena, root, &bindings).unwrap();
    assert_eq!(first, second, "identical input must give identical output, order included");
}

#[test]
fn shared_subexpressions_are_evaluated_once() {
    let mut arena = ExprArena::new();
    let a = arena.arbitrary(Type::Int);
    let b = arena.arbitrary(Type::Int);
    let sum1 = arena.add(a, b);
    let sum2 = arena.add(a, b);
    assert_eq!(sum1, sum2);

    let root = arena.eq(sum1, sum2);
    assert_eq!(groups_of(&arena, root, &Bindings::new()), vec![vec![0, 1]]);
}
