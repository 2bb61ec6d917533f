//! Type and doc-comment harvesting from Rust sources.
//!
//! Walks a source tree, parses every `.rs` file with `syn` and registers:
//!
//! - structs with named fields as object types, honoring serde `rename`, `rename_all`,
//!   `skip` and `default`, `Option<T>` fields as optional, `#[deprecated]` as obsolete;
//! - enums with unit variants only as enum types (`#[repr(..)]` or `serde_repr` enums are
//!   described by value, others by variant name);
//! - type aliases of collections as sequence or map types;
//! - `///` comments on types, fields and functions as [`DocComments`].
//!
//! Type paths follow the module tree: `src/shop/models.rs` defines `shop::models::*`.

use crate::contract::TypeCatalog;
use crate::doc_comments::{DocComments, OperationComments, TypeComments};
use crate::error::{Error, Result};
use crate::types::{EnumDef, EnumNaming, EnumVariant, MemberDef, TypeDef, TypeRef, TypeShape};
use log::{debug, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Everything harvested from a source tree
#[derive(Debug, Default)]
pub struct SourceHarvest {
    pub catalog: TypeCatalog,
    pub comments: DocComments,
    /// Files or entries that could not be read or parsed
    pub warnings: Vec<String>,
}

/// Harvests types from the Rust files below a root directory
pub struct SourceScanner {
    root_path: PathBuf,
}

impl SourceScanner {
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Scan the tree. Unreadable or unparsable files are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the root is not a directory.
    pub fn scan(&self) -> Result<SourceHarvest> {
        if !self.root_path.is_dir() {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a directory", self.root_path.display()),
            )));
        }

        let mut harvest = SourceHarvest::default();
        for path in self.rust_files(&mut harvest.warnings) {
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    let warning = format!("Failed to read {}: {}", path.display(), e);
                    warn!("{}", warning);
                    harvest.warnings.push(warning);
                    continue;
                }
            };

            match syn::parse_file(&content) {
                Ok(file) => {
                    let module = module_path(&self.root_path, &path);
                    debug!("Harvesting {} as module {:?}", path.display(), module);
                    harvest_items(&module, &file.items, &mut harvest);
                }
                Err(e) => {
                    let warning = format!("Failed to parse {}: {}", path.display(), e);
                    warn!("{}", warning);
                    harvest.warnings.push(warning);
                }
            }
        }

        debug!(
            "Harvested {} types from {}",
            harvest.catalog.len(),
            self.root_path.display()
        );
        Ok(harvest)
    }

    /// `.rs` files below the root, skipping `target` and hidden directories
    fn rust_files(&self, warnings: &mut Vec<String>) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                if e.path() == self.root_path {
                    return true;
                }
                let file_name = e.file_name().to_string_lossy();
                !file_name.starts_with('.') && file_name != "target"
            })
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("rs") {
                        files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        files
    }
}

/// Module path of a file relative to the scanned root
fn module_path(root: &Path, file: &Path) -> Vec<String> {
    let relative = file.strip_prefix(root).unwrap_or(file);
    let mut module: Vec<String> = relative
        .with_extension("")
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();

    if module.first().map(String::as_str) == Some("src") {
        module.remove(0);
    }
    if matches!(
        module.last().map(String::as_str),
        Some("lib") | Some("main") | Some("mod")
    ) {
        module.pop();
    }
    module
}

fn qualify(module: &[String], ident: &syn::Ident) -> String {
    let mut segments = module.to_vec();
    segments.push(ident.to_string());
    segments.join("::")
}

fn harvest_items(module: &[String], items: &[syn::Item], harvest: &mut SourceHarvest) {
    for item in items {
        match item {
            syn::Item::Struct(item_struct) => harvest_struct(module, item_struct, harvest),
            syn::Item::Enum(item_enum) => harvest_enum(module, item_enum, harvest),
            syn::Item::Type(item_type) => harvest_alias(module, item_type, harvest),
            syn::Item::Fn(item_fn) => harvest_fn_comments(&item_fn.sig.ident, &item_fn.attrs, harvest),
            syn::Item::Impl(item_impl) => {
                for impl_item in &item_impl.items {
                    if let syn::ImplItem::Fn(method) = impl_item {
                        harvest_fn_comments(&method.sig.ident, &method.attrs, harvest);
                    }
                }
            }
            syn::Item::Mod(item_mod) => {
                if let Some((_, items)) = &item_mod.content {
                    let mut nested = module.to_vec();
                    nested.push(item_mod.ident.to_string());
                    harvest_items(&nested, items, harvest);
                }
            }
            _ => {}
        }
    }
}

fn harvest_struct(module: &[String], item_struct: &syn::ItemStruct, harvest: &mut SourceHarvest) {
    let syn::Fields::Named(fields) = &item_struct.fields else {
        debug!("Skipping struct {} without named fields", item_struct.ident);
        return;
    };

    let path = qualify(module, &item_struct.ident);
    let container = SerdeAttributes::parse(&item_struct.attrs);
    let mut comments = TypeComments {
        summary: doc_text(&item_struct.attrs),
        ..Default::default()
    };

    let mut members = Vec::new();
    for field in &fields.named {
        let Some(ident) = &field.ident else {
            continue;
        };
        let attrs = SerdeAttributes::parse(&field.attrs);
        let rust_name = ident.to_string();
        let rust_name = rust_name.trim_start_matches("r#");
        let name = match (&attrs.rename, &container.rename_all) {
            (Some(rename), _) => rename.clone(),
            (None, Some(rule)) => rename_field(rust_name, rule),
            (None, None) => rust_name.to_string(),
        };

        if attrs.flatten {
            warn!("Flattened field {}.{} is not described", path, rust_name);
            continue;
        }

        let Some(ty) = TypeRef::from_syn(&field.ty) else {
            continue;
        };

        let mut member = MemberDef::new(name.clone(), ty);
        member.required = !is_option(&field.ty) && !attrs.default && !container.default;
        member.ignored = attrs.skip;
        member.obsolete = is_deprecated(&field.attrs);

        if let Some(doc) = doc_text(&field.attrs) {
            comments.members.insert(name, doc);
        }
        members.push(member);
    }

    if comments.summary.is_some() || !comments.members.is_empty() {
        harvest.comments.types.insert(path.clone(), comments);
    }
    harvest.catalog.insert(TypeDef::object(path, members));
}

fn harvest_enum(module: &[String], item_enum: &syn::ItemEnum, harvest: &mut SourceHarvest) {
    let path = qualify(module, &item_enum.ident);

    if let Some(doc) = doc_text(&item_enum.attrs) {
        harvest.comments.types.insert(
            path.clone(),
            TypeComments {
                summary: Some(doc),
                ..Default::default()
            },
        );
    }

    if item_enum
        .variants
        .iter()
        .any(|variant| !matches!(variant.fields, syn::Fields::Unit))
    {
        debug!("Enum {} carries data; describing it as any", path);
        harvest.catalog.insert(TypeDef::new(path, TypeShape::Any));
        return;
    }

    let container = SerdeAttributes::parse(&item_enum.attrs);
    let by_value = has_repr(&item_enum.attrs) || derives_serde_repr(&item_enum.attrs);

    let variants = item_enum
        .variants
        .iter()
        .map(|variant| {
            let attrs = SerdeAttributes::parse(&variant.attrs);
            let name = match (&attrs.rename, &container.rename_all) {
                (Some(rename), _) => rename.clone(),
                (None, Some(rule)) => rename_variant(&variant.ident.to_string(), rule),
                (None, None) => variant.ident.to_string(),
            };
            EnumVariant {
                name,
                value: variant
                    .discriminant
                    .as_ref()
                    .and_then(|(_, expr)| discriminant_value(expr)),
            }
        })
        .collect();

    harvest.catalog.insert(TypeDef::new(
        path,
        TypeShape::Enum(EnumDef {
            variants,
            string_naming: if by_value {
                None
            } else {
                Some(EnumNaming::AsDeclared)
            },
        }),
    ));
}

fn harvest_alias(module: &[String], item_type: &syn::ItemType, harvest: &mut SourceHarvest) {
    let path = qualify(module, &item_type.ident);
    let shape = match TypeRef::from_syn(&item_type.ty) {
        Some(TypeRef::Sequence(item)) => TypeShape::Sequence { item: *item },
        Some(TypeRef::Map(key, value)) => TypeShape::Map {
            key: *key,
            value: *value,
        },
        _ => return,
    };
    harvest.catalog.insert(TypeDef::new(path, shape));
}

fn harvest_fn_comments(ident: &syn::Ident, attrs: &[syn::Attribute], harvest: &mut SourceHarvest) {
    let Some(doc) = doc_text(attrs) else {
        return;
    };

    let (summary, remarks) = match doc.split_once("\n\n") {
        Some((summary, remarks)) => (summary.to_string(), Some(remarks.trim().to_string())),
        None => (doc, None),
    };
    harvest.comments.operations.insert(
        ident.to_string(),
        OperationComments {
            summary: Some(summary),
            remarks,
            ..Default::default()
        },
    );
}

/// Serde attributes relevant to the wire shape
#[derive(Debug, Default)]
struct SerdeAttributes {
    rename: Option<String>,
    rename_all: Option<String>,
    skip: bool,
    default: bool,
    flatten: bool,
}

impl SerdeAttributes {
    fn parse(attrs: &[syn::Attribute]) -> Self {
        let mut parsed = Self::default();

        for attr in attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
            let result = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    if let Some(value) = string_value(&meta)? {
                        parsed.rename = Some(value);
                    }
                } else if meta.path.is_ident("rename_all") {
                    if let Some(value) = string_value(&meta)? {
                        parsed.rename_all = Some(value);
                    }
                } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
                    parsed.skip = true;
                } else if meta.path.is_ident("default") {
                    parsed.default = true;
                    skip_value(&meta)?;
                } else if meta.path.is_ident("flatten") {
                    parsed.flatten = true;
                } else {
                    skip_value(&meta)?;
                }
                Ok(())
            });

            if let Err(e) = result {
                debug!("Ignoring unreadable serde attribute: {}", e);
            }
        }

        parsed
    }
}

/// `= "value"`; `None` for the `rename(serialize = ..)` form
fn string_value(meta: &syn::meta::ParseNestedMeta) -> syn::Result<Option<String>> {
    if meta.input.peek(syn::Token![=]) {
        let value: syn::LitStr = meta.value()?.parse()?;
        return Ok(Some(value.value()));
    }
    skip_value(meta)?;
    Ok(None)
}

fn skip_value(meta: &syn::meta::ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(syn::Token![=]) {
        let _: syn::Expr = meta.value()?.parse()?;
    } else if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(|nested| skip_value(&nested))?;
    }
    Ok(())
}

fn is_option(ty: &syn::Type) -> bool {
    match ty {
        syn::Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map_or(false, |segment| segment.ident == "Option"),
        _ => false,
    }
}

fn is_deprecated(attrs: &[syn::Attribute]) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident("deprecated"))
}

fn has_repr(attrs: &[syn::Attribute]) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident("repr"))
}

fn derives_serde_repr(attrs: &[syn::Attribute]) -> bool {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("derive"))
        .any(|attr| {
            let mut found = false;
            let _ = attr.parse_nested_meta(|meta| {
                if let Some(ident) = meta.path.segments.last() {
                    if ident.ident == "Serialize_repr" {
                        found = true;
                    }
                }
                Ok(())
            });
            found
        })
}

fn discriminant_value(expr: &syn::Expr) -> Option<i64> {
    match expr {
        syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Int(int),
            ..
        }) => int.base10_parse().ok(),
        syn::Expr::Unary(syn::ExprUnary {
            op: syn::UnOp::Neg(_),
            expr,
            ..
        }) => discriminant_value(expr).map(|value| -value),
        _ => None,
    }
}

/// Joined `///` lines, trimmed; `None` when there are none
fn doc_text(attrs: &[syn::Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            syn::Meta::NameValue(syn::MetaNameValue {
                value:
                    syn::Expr::Lit(syn::ExprLit {
                        lit: syn::Lit::Str(text),
                        ..
                    }),
                ..
            }) => Some(text.value().trim().to_string()),
            _ => None,
        })
        .collect();

    let text = lines
        .split(|line| line.is_empty())
        .filter(|paragraph| !paragraph.is_empty())
        .map(|paragraph| paragraph.join(" "))
        .collect::<Vec<_>>()
        .join("\n\n");

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Apply a serde `rename_all` rule to a snake_case field name
fn rename_field(name: &str, rule: &str) -> String {
    match rule {
        "UPPERCASE" => name.to_ascii_uppercase(),
        "PascalCase" => name.split('_').map(capitalize).collect(),
        "camelCase" => {
            let pascal: String = name.split('_').map(capitalize).collect();
            lowercase_first(&pascal)
        }
        "SCREAMING_SNAKE_CASE" => name.to_ascii_uppercase(),
        "kebab-case" => name.replace('_', "-"),
        "SCREAMING-KEBAB-CASE" => name.replace('_', "-").to_ascii_uppercase(),
        _ => name.to_string(),
    }
}

/// Apply a serde `rename_all` rule to a PascalCase variant name
fn rename_variant(name: &str, rule: &str) -> String {
    match rule {
        "lowercase" => name.to_ascii_lowercase(),
        "UPPERCASE" => name.to_ascii_uppercase(),
        "camelCase" => lowercase_first(name),
        "snake_case" => snake_case(name),
        "SCREAMING_SNAKE_CASE" => snake_case(name).to_ascii_uppercase(),
        "kebab-case" => snake_case(name).replace('_', "-"),
        "SCREAMING-KEBAB-CASE" => snake_case(name).replace('_', "-").to_ascii_uppercase(),
        _ => name.to_string(),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn lowercase_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn snake_case(name: &str) -> String {
    let mut snake = String::new();
    for (i, ch) in name.char_indices() {
        if i > 0 && ch.is_uppercase() {
            snake.push('_');
        }
        snake.extend(ch.to_lowercase());
    }
    snake
}
