//! Swagger Generator - Swagger 2.0 documents from operation descriptors and type contracts.
//!
//! The generator consumes two inputs supplied by the host: a list of
//! [`OperationDescriptor`]s (route, verb, parameters, declared responses) and a
//! [`ContractResolver`] that classifies every data type. From these it assembles a
//! [`SwaggerDocument`] per registered document name, translating types into JSON-schema
//! fragments and collecting named object types under `definitions`.
//!
//! # Architecture
//!
//! 1. [`types`] and [`contract`] - the host type-system model and contract resolution
//! 2. [`schema_generator`] - translates types into schemas; referenced types are queued and
//!    drained, so recursive and mutually-recursive types terminate
//! 3. [`swagger_generator`] - assembles operations and documents
//! 4. [`filters`], [`annotations`], [`doc_comments`] - post-processing pipelines
//! 5. [`options`] - construction-time configuration
//! 6. [`manifest`], [`source_types`], [`serializer`], [`cli`] - the command-line front end
//!
//! # Example Usage
//!
//! ```
//! use swagger_gen::{
//!     descriptor::{BindingSource, OperationDescriptor, ParameterDescriptor},
//!     options::SwaggerGenOptions,
//!     swagger::Info,
//!     swagger_generator::SwaggerProvider,
//!     types::{MemberDef, TypeDef, TypeRef},
//!     TypeCatalog,
//! };
//!
//! let catalog = TypeCatalog::with_types(vec![TypeDef::object(
//!     "shop::Item",
//!     vec![MemberDef::new("name", TypeRef::named("String")).required()],
//! )]);
//!
//! let operations = vec![OperationDescriptor::new(Some("GET"), "items/{id}")
//!     .with_parameter(ParameterDescriptor::new(
//!         "id",
//!         BindingSource::Path,
//!         Some(TypeRef::named("i32")),
//!     ))
//!     .with_response(200, Some(TypeRef::named("shop::Item")))];
//!
//! let mut options = SwaggerGenOptions::new();
//! options.swagger_doc("v1", Info::new("Shop", "1.0"));
//!
//! let provider = options.create_swagger_provider(operations, catalog).unwrap();
//! let document = provider.get_swagger("v1", None, None, None).unwrap();
//!
//! assert!(document.paths.contains_key("/items/{id}"));
//! assert!(document.definitions.contains_key("Item"));
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod annotations;
pub mod cli;
pub mod contract;
pub mod descriptor;
pub mod doc_comments;
pub mod error;
pub mod filters;
pub mod manifest;
pub mod options;
pub mod schema;
pub mod schema_generator;
pub mod serializer;
pub mod source_types;
pub mod swagger;
pub mod swagger_generator;
pub mod types;

pub use contract::{Contract, ContractResolver, TypeCatalog};
pub use descriptor::{ApiDescriptionProvider, OperationDescriptor};
pub use error::{Error, Result};
pub use options::SwaggerGenOptions;
pub use schema::{Definitions, Schema};
pub use swagger::SwaggerDocument;
pub use swagger_generator::{SwaggerGenerator, SwaggerProvider};
pub use types::TypeRef;
