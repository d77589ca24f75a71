//! Field introspection.
//!
//! Turns the flattened declarations of a [`Fields`] type into an ordered,
//! de-duplicated [`FieldSet`]. Results are cached per type for the life of
//! the process: declarations are static, so an entry never goes stale.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::field::{FieldDecl, FieldDescriptor};
use crate::record::Fields;

/// Column name reserved for the primary identifier.
pub const ID_FIELD: &str = "id";

/// Ordered column metadata for one record type.
///
/// Names are unique: when flattening produces the same name twice, the
/// first declaration wins and later ones are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet {
    fields: Vec<FieldDescriptor>,
}

impl FieldSet {
    /// Builds a field set from declarations in declaration order.
    pub fn from_decls(decls: &[FieldDecl]) -> Self {
        let mut seen = HashSet::new();
        let fields = decls
            .iter()
            .filter(|decl| seen.insert(decl.name))
            .map(FieldDescriptor::from_decl)
            .collect();
        Self { fields }
    }

    /// All fields, including `id` when the record declares it.
    pub fn iter(&self) -> std::slice::Iter<'_, FieldDescriptor> {
        self.fields.iter()
    }

    /// All fields except `id`.
    pub fn ordinary(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.name != ID_FIELD)
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<'a> IntoIterator for &'a FieldSet {
    type Item = &'a FieldDescriptor;
    type IntoIter = std::slice::Iter<'a, FieldDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

type DescriptorCache = RwLock<HashMap<TypeId, Arc<FieldSet>>>;

fn cache() -> &'static DescriptorCache {
    static CACHE: OnceLock<DescriptorCache> = OnceLock::new();
    CACHE.get_or_init(Default::default)
}

/// Returns the field set of `T`, computing it on first use.
pub fn describe<T: Fields + 'static>() -> Arc<FieldSet> {
    let key = TypeId::of::<T>();

    if let Some(set) = cache()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&key)
    {
        return Arc::clone(set);
    }

    let mut decls = Vec::new();
    T::declare(&mut decls);
    let set = Arc::new(FieldSet::from_decls(&decls));

    let mut cache = cache().write().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(cache.entry(key).or_insert(set))
}

/// Returns the field set of `record`'s type.
pub fn describe_fields<T: Fields + 'static>(_record: &T) -> Arc<FieldSet> {
    describe::<T>()
}
