//! API manifest: the CLI's description of a service.
//!
//! A manifest lists the documents to publish, generator options, security definitions,
//! custom type mappings, the types the operations use, and the operations themselves.
//! Types may also be harvested from Rust source directories, and doc comments loaded from a
//! comments file. Relative paths are resolved against the manifest's directory.
//!
//! ```yaml
//! documents:
//!   v1:
//!     title: Shop API
//!     version: "1.0"
//! options:
//!   describe_all_enums_as_strings: true
//! types:
//!   - path: shop::Product
//!     kind: object
//!     members:
//!       - { name: id, type: i64, required: true }
//! operations:
//!   - method: GET
//!     path: api/products/{id}
//!     parameters:
//!       - { name: id, source: path, type: i64 }
//!     responses:
//!       - { status_code: 200, type: shop::Product }
//! ```

use crate::contract::TypeCatalog;
use crate::descriptor::OperationDescriptor;
use crate::doc_comments::DocComments;
use crate::error::{Error, Result};
use crate::options::SwaggerGenOptions;
use crate::schema::Schema;
use crate::source_types::SourceScanner;
use crate::swagger::{Info, SecurityScheme};
use crate::types::{TypeDef, TypeRef};
use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiManifest {
    /// Document name -> metadata
    pub documents: IndexMap<String, Info>,
    pub options: ManifestOptions,
    pub security_definitions: IndexMap<String, SecurityScheme>,
    /// Type expression -> schema used verbatim for it
    pub type_mappings: IndexMap<String, Schema>,
    /// Rust source directories to harvest types and doc comments from
    pub types_dirs: Vec<PathBuf>,
    /// Doc-comments file (YAML or JSON)
    pub comments: Option<PathBuf>,
    pub types: Vec<TypeDef>,
    pub operations: Vec<OperationDescriptor>,
    /// Directory relative paths are resolved against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestOptions {
    pub describe_all_enums_as_strings: bool,
    pub describe_string_enums_in_camel_case: bool,
    pub describe_all_parameters_in_camel_case: bool,
    pub ignore_obsolete_actions: bool,
    pub ignore_obsolete_properties: bool,
    pub schema_ids: SchemaIdStyle,
}

/// How schema ids are derived from types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaIdStyle {
    /// `shop::Product` -> `Product`
    #[default]
    SimpleName,
    /// `shop::Product` -> `shop.Product`
    FullName,
}

/// Everything needed to create a provider
pub struct GeneratorInputs {
    pub options: SwaggerGenOptions,
    pub operations: Vec<OperationDescriptor>,
    pub catalog: TypeCatalog,
}

impl ApiManifest {
    /// Load a manifest from a `.json` file, or YAML for any other extension
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading manifest from {}", path.display());
        let content = fs::read_to_string(path)?;

        let is_json = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
        let mut manifest: ApiManifest = if is_json {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        manifest.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        manifest.validate(path)?;
        Ok(manifest)
    }

    fn validate(&self, file: &Path) -> Result<()> {
        let invalid = |message: String| Error::Manifest {
            file: file.to_path_buf(),
            message,
        };

        if self.documents.is_empty() {
            return Err(invalid("no documents are declared".to_string()));
        }

        for def in &self.types {
            if def.path.trim().is_empty() {
                return Err(invalid("a type is declared without a path".to_string()));
            }
        }

        for operation in &self.operations {
            if let Some(group) = &operation.group_name {
                if !self.documents.contains_key(group) {
                    warn!(
                        "Operation {} belongs to undeclared document {}",
                        operation.display_name(),
                        group
                    );
                }
            }
        }

        for expr in self.type_mappings.keys() {
            TypeRef::parse(expr).map_err(|e| invalid(e.to_string()))?;
        }

        Ok(())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Harvest source directories, then assemble options, descriptors and the type catalog.
    ///
    /// Types declared in the manifest replace harvested types at the same path. Comments
    /// from the comments file win over harvested `///` comments.
    pub fn into_inputs(self) -> Result<GeneratorInputs> {
        let mut catalog = TypeCatalog::new();
        let mut harvested_comments = DocComments::default();

        for dir in &self.types_dirs {
            let dir = self.resolve(dir);
            let harvest = SourceScanner::new(dir.clone()).scan()?;
            info!(
                "Harvested {} types from {} ({} warnings)",
                harvest.catalog.len(),
                dir.display(),
                harvest.warnings.len()
            );
            catalog.extend(harvest.catalog);
            harvested_comments.merge(harvest.comments);
        }

        for def in &self.types {
            catalog.insert(def.clone());
        }

        let mut options = SwaggerGenOptions::new();
        for (name, info) in &self.documents {
            options.swagger_doc(name.clone(), info.clone());
        }
        for (name, scheme) in &self.security_definitions {
            options.add_security_definition(name.clone(), scheme.clone());
        }
        for (expr, schema) in &self.type_mappings {
            let schema = schema.clone();
            options.map_type(TypeRef::parse(expr)?, move || schema.clone());
        }

        let settings = &self.options;
        if settings.describe_all_enums_as_strings {
            options.describe_all_enums_as_strings();
        }
        if settings.describe_string_enums_in_camel_case {
            options.describe_string_enums_in_camel_case();
        }
        if settings.describe_all_parameters_in_camel_case {
            options.describe_all_parameters_in_camel_case();
        }
        if settings.ignore_obsolete_actions {
            options.ignore_obsolete_actions();
        }
        if settings.ignore_obsolete_properties {
            options.ignore_obsolete_properties();
        }
        if settings.schema_ids == SchemaIdStyle::FullName {
            options.custom_schema_ids(|ty| ty.full_name());
        }

        if !harvested_comments.is_empty() {
            debug!(
                "Using harvested doc comments for {} types and {} operations",
                harvested_comments.types.len(),
                harvested_comments.operations.len()
            );
            options.include_doc_comments(move || Ok(harvested_comments.clone()));
        }
        if let Some(comments) = &self.comments {
            options.include_doc_comments_file(self.resolve(comments));
        }

        Ok(GeneratorInputs {
            options,
            operations: self.operations,
            catalog,
        })
    }
}
