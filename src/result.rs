//! The interleaving result domain.
//!
//! Every evaluated sub-expression is abstracted to an
//! [`InterleavingResult`]: the set of symbolic variables that may flow into
//! it, shaped like the expression's type. Primitive, sequence, map, and set
//! typed expressions produce a flat set (those values are atomic from the
//! ordering heuristic's perspective); record-typed expressions produce one
//! nested result per field.

use std::fmt;

use crate::error::{Error, Result};
use crate::types::{Type, TypeVisitor};
use crate::var::VarSet;

/// Abstract value describing which variables may influence an expression.
///
/// The shape of a result is a function of the expression's type only:
/// `shape(evaluate(e)) == shape(empty_of(type_of(e)))` for every `e`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterleavingResult {
    /// Variables flowing into a non-record value.
    Flat(VarSet),
    /// Per-field results of a record value, sorted by field name.
    Record(Vec<(String, InterleavingResult)>),
}

impl InterleavingResult {
    /// The shaped empty result for a type: `Flat(∅)` for every non-record
    /// type, a recursively empty record otherwise.
    pub fn empty_of(ty: &Type) -> Self {
        ty.accept(&mut EmptyResult)
    }

    /// Field-wise union. Both results must have the same shape.
    pub fn union(&self, other: &Self) -> Result<Self> {
        match (self, other) {
            (InterleavingResult::Flat(a), InterleavingResult::Flat(b)) => {
                Ok(InterleavingResult::Flat(a.union(b)))
            }
            (InterleavingResult::Record(left), InterleavingResult::Record(right)) => {
                if left.len() != right.len() {
                    return Err(Error::ShapeMismatch(format!(
                        "record union over {} vs {} fields",
                        left.len(),
                        right.len()
                    )));
                }
                let mut fields = Vec::with_capacity(left.len());
                for ((name, a), (other_name, b)) in left.iter().zip(right.iter()) {
                    if name != other_name {
                        return Err(Error::ShapeMismatch(format!(
                            "record union over mismatched fields `{}` vs `{}`",
                            name, other_name
                        )));
                    }
                    fields.push((name.clone(), a.union(b)?));
                }
                Ok(InterleavingResult::Record(fields))
            }
            _ => Err(Error::ShapeMismatch(
                "union of a flat result with a record result".to_owned(),
            )),
        }
    }

    /// Flattens the result to the set of all variables it mentions.
    pub fn all_variables(&self) -> VarSet {
        match self {
            InterleavingResult::Flat(vars) => vars.clone(),
            InterleavingResult::Record(fields) => {
                let mut all = VarSet::empty();
                for (_, result) in fields {
                    all = all.union(&result.all_variables());
                }
                all
            }
        }
    }

    /// Whether no variable occurs anywhere in the result.
    pub fn is_empty(&self) -> bool {
        match self {
            InterleavingResult::Flat(vars) => vars.is_empty(),
            InterleavingResult::Record(fields) => fields.iter().all(|(_, r)| r.is_empty()),
        }
    }
}

impl fmt::Display for InterleavingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterleavingResult::Flat(vars) => write!(f, "{}", vars),
            InterleavingResult::Record(fields) => {
                write!(f, "{{")?;
                for (i, (name, result)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, result)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Type-directed generator of shaped empty results.
struct EmptyResult;

impl EmptyResult {
    fn flat(&self) -> InterleavingResult {
        InterleavingResult::Flat(VarSet::empty())
    }
}

impl TypeVisitor for EmptyResult {
    type Output = InterleavingResult;

    fn visit_bool(&mut self) -> Self::Output {
        self.flat()
    }
    fn visit_byte(&mut self) -> Self::Output {
        self.flat()
    }
    fn visit_char(&mut self) -> Self::Output {
        self.flat()
    }
    fn visit_short(&mut self) -> Self::Output {
        self.flat()
    }
    fn visit_ushort(&mut self) -> Self::Output {
        self.flat()
    }
    fn visit_int(&mut self) -> Self::Output {
        self.flat()
    }
    fn visit_uint(&mut self) -> Self::Output {
        self.flat()
    }
    fn visit_long(&mut self) -> Self::Output {
        self.flat()
    }
    fn visit_ulong(&mut self) -> Self::Output {
        self.flat()
    }
    fn visit_big_int(&mut self) -> Self::Output {
        self.flat()
    }
    fn visit_real(&mut self) -> Self::Output {
        self.flat()
    }
    fn visit_string(&mut self) -> Self::Output {
        self.flat()
    }
    fn visit_fixed(&mut self, _width: u32) -> Self::Output {
        self.flat()
    }
    fn visit_unit(&mut self) -> Self::Output {
        self.flat()
    }

    fn visit_record(&mut self, _name: &str, fields: &[(String, Type)]) -> Self::Output {
        let fields = fields
            .iter()
            .map(|(name, ty)| (name.clone(), ty.accept(self)))
            .collect();
        InterleavingResult::Record(fields)
    }

    // Sequences, maps, and sets are atomic for interleaving purposes: only
    // the variable identity matters, not the value's decomposition.
    fn visit_seq(&mut self, _elem: &Type) -> Self::Output {
        self.flat()
    }
    fn visit_map(&mut self, _key: &Type, _value: &Type) -> Self::Output {
        self.flat()
    }
    fn visit_const_map(&mut self, _key: &Type, _value: &Type) -> Self::Output {
        self.flat()
    }
    fn visit_set(&mut self, _elem: &Type) -> Self::Output {
        self.flat()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::var::VarId;

    fn flat(ids: &[u32]) -> InterleavingResult {
        InterleavingResult::Flat(ids.iter().map(|&i| VarId::new(i)).collect())
    }

    fn packet() -> Type {
        Type::record(
            "Packet",
            vec![("src".to_owned(), Type::UInt), ("dst".to_owned(), Type::UInt)],
        )
    }

    #[test]
    fn test_empty_of_primitive_is_flat() {
        for ty in [Type::Bool, Type::Int, Type::Fixed(5), Type::Str, Type::Real] {
            assert_eq!(InterleavingResult::empty_of(&ty), flat(&[]));
        }
    }

    #[test]
    fn test_empty_of_compound_is_flat() {
        for ty in [
            Type::seq(Type::Int),
            Type::map(Type::Int, Type::Bool),
            Type::set(Type::UInt),
        ] {
            assert_eq!(InterleavingResult::empty_of(&ty), flat(&[]));
        }
    }

    #[test]
    fn test_empty_of_record_is_shaped() {
        let nested = Type::record(
            "Rule",
            vec![("packet".to_owned(), packet()), ("allow".to_owned(), Type::Bool)],
        );
        let empty = InterleavingResult::empty_of(&nested);
        match empty {
            InterleavingResult::Record(fields) => {
                assert_eq!(fields.len(), 2);
                // Fields sorted by name.
                assert_eq!(fields[0].0, "allow");
                assert_eq!(fields[0].1, flat(&[]));
                assert_eq!(fields[1].0, "packet");
                match &fields[1].1 {
                    InterleavingResult::Record(inner) => {
                        assert_eq!(inner[0].0, "dst");
                        assert_eq!(inner[1].0, "src");
                    }
                    _ => panic!("expected a nested record result"),
                }
            }
            _ => panic!("expected a record result"),
        }
    }

    #[test]
    fn test_union_of_empty_is_empty() {
        let empty = InterleavingResult::empty_of(&packet());
        assert_eq!(empty.union(&empty).unwrap(), empty);
    }

    #[test]
    fn test_flat_union() {
        let u = flat(&[1, 2]).union(&flat(&[2, 3])).unwrap();
        assert_eq!(u, flat(&[1, 2, 3]));
    }

    #[test]
    fn test_record_union_is_fieldwise() {
        let a = InterleavingResult::Record(vec![
            ("dst".to_owned(), flat(&[1])),
            ("src".to_owned(), flat(&[2])),
        ]);
        let b = InterleavingResult::Record(vec![
            ("dst".to_owned(), flat(&[3])),
            ("src".to_owned(), flat(&[4])),
        ]);
        let u = a.union(&b).unwrap();
        assert_eq!(
            u,
            InterleavingResult::Record(vec![
                ("dst".to_owned(), flat(&[1, 3])),
                ("src".to_owned(), flat(&[2, 4])),
            ])
        );
    }

    #[test]
    fn test_cross_shape_union_fails() {
        let a = flat(&[1]);
        let b = InterleavingResult::Record(vec![("x".to_owned(), flat(&[2]))]);
        assert!(matches!(a.union(&b), Err(Error::ShapeMismatch(_))));
        assert!(matches!(b.union(&a), Err(Error::ShapeMismatch(_))));
    }

    #[test]
    fn test_mismatched_record_union_fails() {
        let a = InterleavingResult::Record(vec![("x".to_owned(), flat(&[1]))]);
        let b = InterleavingResult::Record(vec![("y".to_owned(), flat(&[2]))]);
        assert!(matches!(a.union(&b), Err(Error::ShapeMismatch(_))));
    }

    #[test]
    fn test_all_variables_flattens() {
        let r = InterleavingResult::Record(vec![
            ("a".to_owned(), flat(&[3])),
            (
                "b".to_owned(),
                InterleavingResult::Record(vec![("c".to_owned(), flat(&[1, 2]))]),
            ),
        ]);
        let ids: Vec<u32> = r.all_variables().iter().map(VarId::index).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
