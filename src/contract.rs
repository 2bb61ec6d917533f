//! Contract resolution: how a type is shaped on the wire.
//!
//! The schema generator never inspects types itself. It asks a [`ContractResolver`] to
//! classify a [`TypeRef`] and, for objects, to list its members. [`TypeCatalog`] is the
//! in-memory resolver used by the CLI and tests; it is filled from manifests or from Rust
//! sources (see [`crate::source_types`]).

use crate::types::{
    is_unmapped_scalar, EnumDef, ObjectDef, Primitive, TypeDef, TypeRef, TypeShape,
    ANY_TYPE_NAME,
};
use log::{debug, warn};
use std::collections::HashMap;

/// Resolved serialization contract of a type
#[derive(Debug, Clone, PartialEq)]
pub enum Contract {
    /// A scalar; `None` when it has no entry in the format table
    Primitive(Option<Primitive>),
    Enum(EnumDef),
    Array { item: TypeRef },
    Dictionary { key: TypeRef, value: TypeRef },
    Object(ObjectDef),
    /// Nothing is known about the shape
    Any,
}

impl Contract {
    /// Item type of an array, value type of a dictionary
    pub fn element(&self) -> Option<&TypeRef> {
        match self {
            Contract::Array { item } => Some(item),
            Contract::Dictionary { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Contract::Object(_))
    }
}

/// Supplies the contract of a type
pub trait ContractResolver {
    fn resolve_contract(&self, ty: &TypeRef) -> Contract;

    /// The canonical identity of `ty`. Two references naming the same type must
    /// canonicalize to equal values, otherwise they are treated as distinct types.
    fn canonicalize(&self, ty: &TypeRef) -> TypeRef {
        ty.clone()
    }
}

/// In-memory type catalog keyed by type path
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    types: HashMap<String, TypeDef>,
    /// Simple name -> every path registered under it
    by_simple_name: HashMap<String, Vec<String>>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_types(types: impl IntoIterator<Item = TypeDef>) -> Self {
        let mut catalog = Self::new();
        for def in types {
            catalog.insert(def);
        }
        catalog
    }

    /// Register a type definition, replacing any previous definition at the same path
    pub fn insert(&mut self, def: TypeDef) {
        debug!("Registering type {}", def.path);
        let simple = def.simple_name().to_string();
        let paths = self.by_simple_name.entry(simple).or_default();
        if !paths.contains(&def.path) {
            paths.push(def.path.clone());
        }
        self.types.insert(def.path.clone(), def);
    }

    pub fn extend(&mut self, other: TypeCatalog) {
        let mut defs: Vec<TypeDef> = other.types.into_values().collect();
        defs.sort_by(|a, b| a.path.cmp(&b.path));
        for def in defs {
            self.insert(def);
        }
    }

    /// Find a definition by exact path, or by simple name when that name is unambiguous
    pub fn get(&self, path: &str) -> Option<&TypeDef> {
        if let Some(def) = self.types.get(path) {
            return Some(def);
        }

        if path.contains("::") {
            return None;
        }

        match self.by_simple_name.get(path).map(Vec::as_slice) {
            Some([only]) => self.types.get(only),
            Some(candidates) if candidates.len() > 1 => {
                warn!(
                    "Type name {} is ambiguous between {:?}; qualify it with its module path",
                    path, candidates
                );
                None
            }
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn resolve_named(&self, path: &str) -> Contract {
        if let Some(def) = self.get(path) {
            return match &def.shape {
                TypeShape::Object(object) => Contract::Object(object.clone()),
                TypeShape::Enum(enumeration) => Contract::Enum(enumeration.clone()),
                TypeShape::Sequence { item } => Contract::Array {
                    item: self.canonicalize(item),
                },
                TypeShape::Map { key, value } => Contract::Dictionary {
                    key: self.canonicalize(key),
                    value: self.canonicalize(value),
                },
                TypeShape::Any => Contract::Any,
            };
        }

        if let Some(primitive) = Primitive::from_type_name(path) {
            return Contract::Primitive(Some(primitive));
        }

        if is_unmapped_scalar(path) {
            return Contract::Primitive(None);
        }

        let simple = path.rsplit("::").next().unwrap_or(path);
        if path != ANY_TYPE_NAME && simple != "Value" {
            debug!("No contract for type {}, describing it as any", path);
        }
        Contract::Any
    }
}

impl ContractResolver for TypeCatalog {
    fn canonicalize(&self, ty: &TypeRef) -> TypeRef {
        match ty {
            TypeRef::Named(path) => match self.get(path) {
                Some(def) => TypeRef::Named(def.path.clone()),
                None => ty.clone(),
            },
            TypeRef::Sequence(item) => TypeRef::sequence(self.canonicalize(item)),
            TypeRef::Map(key, value) => {
                TypeRef::map(self.canonicalize(key), self.canonicalize(value))
            }
        }
    }

    fn resolve_contract(&self, ty: &TypeRef) -> Contract {
        match ty {
            TypeRef::Named(path) => self.resolve_named(path),
            TypeRef::Sequence(item) => match item.as_ref() {
                TypeRef::Named(name)
                    if matches!(
                        Primitive::from_type_name(name),
                        Some(Primitive::Byte) | Some(Primitive::SByte)
                    ) && self.get(name).is_none() =>
                {
                    Contract::Primitive(Some(Primitive::Bytes))
                }
                _ => Contract::Array {
                    item: self.canonicalize(item),
                },
            },
            TypeRef::Map(key, value) => Contract::Dictionary {
                key: self.canonicalize(key),
                value: self.canonicalize(value),
            },
        }
    }
}
