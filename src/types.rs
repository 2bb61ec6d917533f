//! Host type-system model.
//!
//! A [`TypeRef`] is the identity of a data type as seen by the generator: a named type
//! (addressed by its path, e.g. `shop::models::Item` or `i32`), a sequence of another type,
//! or a keyed map. Named types are described by [`TypeDef`]s, which a
//! [`ContractResolver`](crate::contract::ContractResolver) hands to the schema generator.
//!
//! Type references are written as Rust type expressions and parsed with `syn`:
//!
//! ```
//! use swagger_gen::types::TypeRef;
//!
//! let ty = TypeRef::parse("Option<Vec<shop::Item>>").unwrap();
//! assert_eq!(ty, TypeRef::sequence(TypeRef::named("shop::Item")));
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Name under which the catch-all "any" type is addressed.
pub const ANY_TYPE_NAME: &str = "object";

/// Identity of a data type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeRef {
    /// A type addressed by its path
    Named(String),
    /// A sequence whose elements are of the inner type
    Sequence(Box<TypeRef>),
    /// A keyed map (key type, value type)
    Map(Box<TypeRef>, Box<TypeRef>),
}

impl TypeRef {
    pub fn named(path: impl Into<String>) -> Self {
        TypeRef::Named(path.into())
    }

    pub fn sequence(item: TypeRef) -> Self {
        TypeRef::Sequence(Box::new(item))
    }

    pub fn map(key: TypeRef, value: TypeRef) -> Self {
        TypeRef::Map(Box::new(key), Box::new(value))
    }

    /// The catch-all type, translated to an empty object schema
    pub fn any() -> Self {
        TypeRef::Named(ANY_TYPE_NAME.to_string())
    }

    /// Parse a Rust type expression.
    ///
    /// `Option`, `Box`, `Rc`, `Arc` and `Cow` are transparent, references are dereferenced,
    /// std collections become sequences or maps. The unit type `()` is rejected because it
    /// carries no data.
    pub fn parse(expr: &str) -> Result<Self> {
        let ty: syn::Type = syn::parse_str(expr).map_err(|e| Error::InvalidType {
            expr: expr.to_string(),
            message: e.to_string(),
        })?;

        Self::from_syn(&ty).ok_or_else(|| Error::InvalidType {
            expr: expr.to_string(),
            message: "the unit type has no schema".to_string(),
        })
    }

    /// Convert a parsed `syn::Type`; `None` for the unit type.
    pub fn from_syn(ty: &syn::Type) -> Option<Self> {
        match ty {
            syn::Type::Path(type_path) => {
                let segment = type_path.path.segments.last()?;
                let ident = segment.ident.to_string();
                let args = type_arguments(&segment.arguments);

                match (ident.as_str(), args.as_slice()) {
                    ("Option" | "Box" | "Rc" | "Arc" | "Cow", [inner]) => Self::from_syn(inner),
                    (
                        "Vec" | "VecDeque" | "LinkedList" | "HashSet" | "BTreeSet" | "IndexSet",
                        [inner],
                    ) => Some(TypeRef::sequence(Self::from_syn(inner)?)),
                    ("HashMap" | "BTreeMap" | "IndexMap", [key, value]) => Some(TypeRef::map(
                        Self::from_syn(key)?,
                        Self::from_syn(value)?,
                    )),
                    _ => {
                        let path = type_path
                            .path
                            .segments
                            .iter()
                            .map(|s| s.ident.to_string())
                            .filter(|s| !matches!(s.as_str(), "crate" | "self" | "super"))
                            .collect::<Vec<_>>()
                            .join("::");
                        Some(TypeRef::Named(path))
                    }
                }
            }
            syn::Type::Reference(reference) => Self::from_syn(&reference.elem),
            syn::Type::Slice(slice) => Some(TypeRef::sequence(Self::from_syn(&slice.elem)?)),
            syn::Type::Array(array) => Some(TypeRef::sequence(Self::from_syn(&array.elem)?)),
            syn::Type::Paren(paren) => Self::from_syn(&paren.elem),
            syn::Type::Group(group) => Self::from_syn(&group.elem),
            syn::Type::Tuple(tuple) if tuple.elems.is_empty() => None,
            _ => Some(TypeRef::any()),
        }
    }

    /// Last path segment for named types, a composed name otherwise
    pub fn simple_name(&self) -> String {
        match self {
            TypeRef::Named(path) => path.rsplit("::").next().unwrap_or(path).to_string(),
            TypeRef::Sequence(item) => format!("ArrayOf{}", item.simple_name()),
            TypeRef::Map(key, value) => {
                format!("MapOf{}To{}", key.simple_name(), value.simple_name())
            }
        }
    }

    /// Path-qualified name with `::` replaced by `.`
    pub fn full_name(&self) -> String {
        match self {
            TypeRef::Named(path) => path.replace("::", "."),
            TypeRef::Sequence(item) => format!("ArrayOf{}", item.full_name()),
            TypeRef::Map(key, value) => {
                format!("MapOf{}To{}", key.full_name(), value.full_name())
            }
        }
    }

    pub fn is_named(&self) -> bool {
        matches!(self, TypeRef::Named(_))
    }
}

fn type_arguments(arguments: &syn::PathArguments) -> Vec<&syn::Type> {
    match arguments {
        syn::PathArguments::AngleBracketed(args) => args
            .args
            .iter()
            .filter_map(|arg| match arg {
                syn::GenericArgument::Type(ty) => Some(ty),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TypeRef::Named(path) => write!(f, "{}", path),
            TypeRef::Sequence(item) => write!(f, "Vec<{}>", item),
            TypeRef::Map(key, value) => write!(f, "HashMap<{}, {}>", key, value),
        }
    }
}

impl std::str::FromStr for TypeRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TypeRef::parse(s)
    }
}

impl TryFrom<String> for TypeRef {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        TypeRef::parse(&value)
    }
}

impl From<TypeRef> for String {
    fn from(ty: TypeRef) -> Self {
        ty.to_string()
    }
}

/// Primitive categories with a fixed schema representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    Decimal,
    Byte,
    SByte,
    Bytes,
    Bool,
    DateTime,
    DateTimeOffset,
    Guid,
    String,
}

/// Simple type names recognized as primitives.
static PRIMITIVE_NAMES: &[(&str, Primitive)] = &[
    ("i16", Primitive::Int16),
    ("short", Primitive::Int16),
    ("u16", Primitive::UInt16),
    ("ushort", Primitive::UInt16),
    ("i32", Primitive::Int32),
    ("int", Primitive::Int32),
    ("u32", Primitive::UInt32),
    ("uint", Primitive::UInt32),
    ("i64", Primitive::Int64),
    ("isize", Primitive::Int64),
    ("long", Primitive::Int64),
    ("u64", Primitive::UInt64),
    ("usize", Primitive::UInt64),
    ("ulong", Primitive::UInt64),
    ("f32", Primitive::Float),
    ("float", Primitive::Float),
    ("f64", Primitive::Double),
    ("double", Primitive::Double),
    ("Decimal", Primitive::Decimal),
    ("decimal", Primitive::Decimal),
    ("u8", Primitive::Byte),
    ("byte", Primitive::Byte),
    ("i8", Primitive::SByte),
    ("sbyte", Primitive::SByte),
    ("Bytes", Primitive::Bytes),
    ("ByteBuf", Primitive::Bytes),
    ("bytes", Primitive::Bytes),
    ("bool", Primitive::Bool),
    ("DateTime", Primitive::DateTime),
    ("NaiveDateTime", Primitive::DateTime),
    ("SystemTime", Primitive::DateTime),
    ("DateTimeOffset", Primitive::DateTimeOffset),
    ("OffsetDateTime", Primitive::DateTimeOffset),
    ("Uuid", Primitive::Guid),
    ("Guid", Primitive::Guid),
    ("String", Primitive::String),
    ("str", Primitive::String),
    ("string", Primitive::String),
    ("char", Primitive::String),
];

/// Scalars with no entry in the format table; they are described as plain strings.
static UNMAPPED_SCALAR_NAMES: &[&str] = &[
    "i128", "u128", "NaiveDate", "NaiveTime", "Date", "Time", "Duration", "Url", "PathBuf",
    "IpAddr",
];

impl Primitive {
    /// Look a primitive up by the simple (last segment) name of a type
    pub fn from_type_name(name: &str) -> Option<Primitive> {
        let simple = name.rsplit("::").next().unwrap_or(name);
        PRIMITIVE_NAMES
            .iter()
            .find(|(candidate, _)| *candidate == simple)
            .map(|(_, primitive)| *primitive)
    }

    /// Schema `(type, format)` pair
    pub fn type_and_format(self) -> (&'static str, Option<&'static str>) {
        match self {
            Primitive::Int16 | Primitive::UInt16 | Primitive::Int32 | Primitive::UInt32 => {
                ("integer", Some("int32"))
            }
            Primitive::Int64 | Primitive::UInt64 => ("integer", Some("int64")),
            Primitive::Float => ("number", Some("float")),
            Primitive::Double | Primitive::Decimal => ("number", Some("double")),
            Primitive::Byte | Primitive::SByte | Primitive::Bytes => ("string", Some("byte")),
            Primitive::Bool => ("boolean", None),
            Primitive::DateTime | Primitive::DateTimeOffset => ("string", Some("date-time")),
            Primitive::Guid => ("string", Some("uuid")),
            Primitive::String => ("string", None),
        }
    }
}

/// True for scalar type names that have no fixed format
pub fn is_unmapped_scalar(name: &str) -> bool {
    let simple = name.rsplit("::").next().unwrap_or(name);
    UNMAPPED_SCALAR_NAMES.contains(&simple)
}

/// Definition of a named type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDef {
    /// Path identifying the type, e.g. `shop::models::Item`
    pub path: String,
    #[serde(flatten)]
    pub shape: TypeShape,
}

impl TypeDef {
    pub fn new(path: impl Into<String>, shape: TypeShape) -> Self {
        Self {
            path: path.into(),
            shape,
        }
    }

    pub fn object(path: impl Into<String>, members: Vec<MemberDef>) -> Self {
        Self::new(path, TypeShape::Object(ObjectDef { members }))
    }

    pub fn enumeration(path: impl Into<String>, variants: &[&str]) -> Self {
        Self::new(
            path,
            TypeShape::Enum(EnumDef {
                variants: variants
                    .iter()
                    .map(|name| EnumVariant {
                        name: name.to_string(),
                        value: None,
                    })
                    .collect(),
                string_naming: None,
            }),
        )
    }

    pub fn type_ref(&self) -> TypeRef {
        TypeRef::Named(self.path.clone())
    }

    pub fn simple_name(&self) -> &str {
        self.path.rsplit("::").next().unwrap_or(&self.path)
    }
}

/// Structural classification of a named type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeShape {
    Object(ObjectDef),
    Enum(EnumDef),
    Sequence { item: TypeRef },
    Map { key: TypeRef, value: TypeRef },
    Any,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectDef {
    #[serde(default)]
    pub members: Vec<MemberDef>,
}

/// A data member of an object type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberDef {
    /// Name on the wire
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub required: bool,
    /// Excluded from serialization entirely
    #[serde(default)]
    pub ignored: bool,
    #[serde(default)]
    pub obsolete: bool,
    #[serde(default)]
    pub constraints: Constraints,
}

impl MemberDef {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            required: false,
            ignored: false,
            obsolete: false,
            constraints: Constraints::default(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    pub fn obsolete(mut self) -> Self {
        self.obsolete = true;
        self
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }
}

/// Validation metadata attached to a member
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constraints {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
    pub default: Option<Value>,
    pub allowed_values: Option<Vec<Value>>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        *self == Constraints::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumDef {
    pub variants: Vec<EnumVariant>,
    /// When set, the type itself is serialized by variant name
    #[serde(default)]
    pub string_naming: Option<EnumNaming>,
}

impl EnumDef {
    pub fn names(&self) -> Vec<String> {
        self.variants.iter().map(|v| v.name.clone()).collect()
    }

    /// Underlying values; variants without an explicit value continue from the previous one
    pub fn values(&self) -> Vec<i64> {
        let mut next = 0;
        self.variants
            .iter()
            .map(|variant| {
                let value = variant.value.unwrap_or(next);
                next = value.wrapping_add(1);
                value
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumVariant {
    pub name: String,
    #[serde(default)]
    pub value: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumNaming {
    AsDeclared,
    CamelCase,
}

/// Lower-case the leading run of upper-case characters, keeping the last one of a run
/// that is followed by a lower-case character (`URLValue` -> `urlValue`).
pub fn to_camel_case(s: &str) -> String {
    let mut chars: Vec<char> = s.chars().collect();
    if chars.first().map_or(true, |c| !c.is_uppercase()) {
        return s.to_string();
    }

    for i in 0..chars.len() {
        if i == 1 && !chars[i].is_uppercase() {
            break;
        }
        let has_next = i + 1 < chars.len();
        if i > 0 && has_next && !chars[i + 1].is_uppercase() {
            break;
        }
        chars[i] = chars[i].to_lowercase().next().unwrap_or(chars[i]);
    }

    chars.into_iter().collect()
}
