//! Type-to-sort conversion for an SMT backend.
//!
//! A [`SortConverter`] maps type descriptors to solver-level sorts through
//! the [`SolverBackend`] seam. The converter lives for the lifetime of its
//! solver: every sort is cached per type, and every record type it
//! encounters has its display name registered so decoders can later recover
//! the descriptor from a solver model.

use std::collections::{BTreeMap, HashMap};

use log::debug;

use crate::error::{Error, Result};
use crate::types::{Type, TypeVisitor};

/// Constructors the host solver must provide.
///
/// Implementations wrap a concrete solver handle; the converter never
/// inspects sorts, it only composes them.
pub trait SolverBackend {
    type Sort: Clone;

    fn bool_sort(&mut self) -> Self::Sort;
    fn bitvector_sort(&mut self, width: u32) -> Self::Sort;
    /// Arbitrary-precision integer sort.
    fn int_sort(&mut self) -> Self::Sort;
    fn real_sort(&mut self) -> Self::Sort;
    fn string_sort(&mut self) -> Self::Sort;
    fn seq_sort(&mut self, elem: &Self::Sort) -> Self::Sort;
    fn array_sort(&mut self, key: &Self::Sort, value: &Self::Sort) -> Self::Sort;
    fn option_sort(&mut self, inner: &Self::Sort) -> Self::Sort;
    /// Algebraic datatype with a single `value` constructor.
    fn datatype_sort(&mut self, name: &str, fields: &[(String, Self::Sort)]) -> Self::Sort;
}

/// Caching translator from type descriptors to solver sorts.
pub struct SortConverter<B: SolverBackend> {
    backend: B,
    cache: HashMap<Type, B::Sort>,
    registry: BTreeMap<String, Type>,
}

impl<B: SolverBackend> SortConverter<B> {
    pub fn new(backend: B) -> Self {
        SortConverter {
            backend,
            cache: HashMap::new(),
            registry: BTreeMap::new(),
        }
    }

    /// The sort for a type. Idempotent per type: repeated calls return the
    /// cached sort without touching the backend again.
    pub fn sort_for(&mut self, ty: &Type) -> Result<B::Sort> {
        if let Some(sort) = self.cache.get(ty) {
            return Ok(sort.clone());
        }
        debug!("sort_for {}", ty);
        let sort = ty.accept(self)?;
        self.cache.insert(ty.clone(), sort.clone());
        Ok(sort)
    }

    /// Record descriptors seen so far, keyed by display name, in name order.
    pub fn registered_records(&self) -> impl Iterator<Item = (&str, &Type)> {
        self.registry.iter().map(|(name, ty)| (name.as_str(), ty))
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    fn map_sort(&mut self, key: &Type, value: &Type) -> Result<B::Sort> {
        match value {
            Type::ConstMap(..) => Err(Error::UnsupportedSortComposition(
                "constant maps may not be used as map values",
            )),
            Type::Seq(..) => Err(Error::UnsupportedSortComposition(
                "lists may not be used as map values",
            )),
            // Set-membership maps drop the option wrapper: absence is
            // already expressed by mapping to false.
            Type::Unit => {
                let key = self.sort_for(key)?;
                let value = self.backend.bool_sort();
                Ok(self.backend.array_sort(&key, &value))
            }
            _ => {
                let key = self.sort_for(key)?;
                let value = self.sort_for(value)?;
                let value = self.backend.option_sort(&value);
                Ok(self.backend.array_sort(&key, &value))
            }
        }
    }
}

impl<B: SolverBackend> TypeVisitor for SortConverter<B> {
    type Output = Result<B::Sort>;

    fn visit_bool(&mut self) -> Self::Output {
        Ok(self.backend.bool_sort())
    }
    fn visit_byte(&mut self) -> Self::Output {
        Ok(self.backend.bitvector_sort(8))
    }
    fn visit_char(&mut self) -> Self::Output {
        Ok(self.backend.bitvector_sort(16))
    }
    fn visit_short(&mut self) -> Self::Output {
        Ok(self.backend.bitvector_sort(16))
    }
    fn visit_ushort(&mut self) -> Self::Output {
        Ok(self.backend.bitvector_sort(16))
    }
    fn visit_int(&mut self) -> Self::Output {
        Ok(self.backend.bitvector_sort(32))
    }
    fn visit_uint(&mut self) -> Self::Output {
        Ok(self.backend.bitvector_sort(32))
    }
    fn visit_long(&mut self) -> Self::Output {
        Ok(self.backend.bitvector_sort(64))
    }
    fn visit_ulong(&mut self) -> Self::Output {
        Ok(self.backend.bitvector_sort(64))
    }
    fn visit_big_int(&mut self) -> Self::Output {
        Ok(self.backend.int_sort())
    }
    fn visit_real(&mut self) -> Self::Output {
        Ok(self.backend.real_sort())
    }
    fn visit_string(&mut self) -> Self::Output {
        Ok(self.backend.string_sort())
    }
    fn visit_fixed(&mut self, width: u32) -> Self::Output {
        Ok(self.backend.bitvector_sort(width))
    }
    fn visit_unit(&mut self) -> Self::Output {
        Ok(self.backend.bool_sort())
    }

    fn visit_record(&mut self, name: &str, fields: &[(String, Type)]) -> Self::Output {
        let mut sorts = Vec::with_capacity(fields.len());
        for (field, field_ty) in fields {
            sorts.push((field.clone(), self.sort_for(field_ty)?));
        }
        let sort = self.backend.datatype_sort(name, &sorts);
        self.registry.insert(
            name.to_owned(),
            Type::Record { name: name.to_owned(), fields: fields.to_vec() },
        );
        Ok(sort)
    }

    fn visit_seq(&mut self, elem: &Type) -> Self::Output {
        let elem = self.sort_for(elem)?;
        Ok(self.backend.seq_sort(&elem))
    }

    fn visit_map(&mut self, key: &Type, value: &Type) -> Self::Output {
        self.map_sort(key, value)
    }

    fn visit_const_map(&mut self, key: &Type, value: &Type) -> Self::Output {
        self.map_sort(key, value)
    }

    fn visit_set(&mut self, elem: &Type) -> Self::Output {
        let key = self.sort_for(elem)?;
        let value = self.backend.bool_sort();
        Ok(self.backend.array_sort(&key, &value))
    }
}
