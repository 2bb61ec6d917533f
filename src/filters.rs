//! Post-processing hooks.
//!
//! Three ordered chains run during generation: schema filters (once per inline schema),
//! operation filters (once per operation) and document filters (once, at the end). Each
//! filter mutates its target in place. Filters that need more schemas go through the
//! [`SchemaRegistry`] in their context rather than the generator directly, so that
//! translation triggered from inside a translation joins the pending queue instead of
//! starting a nested one.

use crate::contract::Contract;
use crate::descriptor::OperationDescriptor;
use crate::error::Result;
use crate::schema::{Definitions, Schema};
use crate::schema_generator::{SchemaGenerator, TypeQueue};
use crate::swagger::{Operation, SwaggerDocument};
use crate::types::TypeRef;
use indexmap::IndexMap;

/// Thin view over a generator and the definitions of the document being built
pub struct SchemaRegistry<'a> {
    generator: &'a SchemaGenerator,
    definitions: &'a mut Definitions,
    active_queue: Option<&'a mut TypeQueue>,
}

impl<'a> SchemaRegistry<'a> {
    pub fn new(generator: &'a SchemaGenerator, definitions: &'a mut Definitions) -> Self {
        Self {
            generator,
            definitions,
            active_queue: None,
        }
    }

    /// A view used while a translation is draining its queue
    pub(crate) fn within_translation(
        generator: &'a SchemaGenerator,
        definitions: &'a mut Definitions,
        queue: &'a mut TypeQueue,
    ) -> Self {
        Self {
            generator,
            definitions,
            active_queue: Some(queue),
        }
    }

    /// Schema (usually a reference) for `ty`, registering its definition if needed.
    ///
    /// Inside a translation the definition body is produced by the outer drain, before the
    /// outer call returns.
    pub fn get_or_register(&mut self, ty: &TypeRef) -> Result<Schema> {
        match self.active_queue.as_deref_mut() {
            Some(queue) => self.generator.create_schema(ty, self.definitions, queue),
            None => self.generator.get_schema(ty, self.definitions),
        }
    }

    pub fn definitions(&self) -> &Definitions {
        &*self.definitions
    }

    pub fn definitions_mut(&mut self) -> &mut Definitions {
        &mut *self.definitions
    }
}

pub struct SchemaFilterContext<'a> {
    /// The type the schema was generated for
    pub system_type: &'a TypeRef,
    pub contract: &'a Contract,
    pub schema_registry: SchemaRegistry<'a>,
}

/// Rewrites an inline schema after it has been generated
pub trait SchemaFilter {
    fn apply(&self, schema: &mut Schema, context: &mut SchemaFilterContext<'_>) -> Result<()>;
}

pub struct OperationFilterContext<'a> {
    pub api_description: &'a OperationDescriptor,
    pub schema_registry: SchemaRegistry<'a>,
}

/// Rewrites an operation after it has been assembled
pub trait OperationFilter {
    fn apply(
        &self,
        operation: &mut Operation,
        context: &mut OperationFilterContext<'_>,
    ) -> Result<()>;
}

pub struct DocumentFilterContext<'a> {
    /// Included descriptors grouped by normalized path, in document order
    pub api_description_groups: &'a IndexMap<String, Vec<&'a OperationDescriptor>>,
    pub schema_generator: &'a SchemaGenerator,
}

impl<'a> DocumentFilterContext<'a> {
    /// Registry over the document's own definitions
    pub fn schema_registry<'b>(&'b self, definitions: &'b mut Definitions) -> SchemaRegistry<'b> {
        SchemaRegistry::new(self.schema_generator, definitions)
    }

    pub fn api_descriptions(&self) -> impl Iterator<Item = &'a OperationDescriptor> + '_ {
        self.api_description_groups.values().flatten().copied()
    }
}

/// Rewrites the finished document
pub trait DocumentFilter {
    fn apply(
        &self,
        document: &mut SwaggerDocument,
        context: &DocumentFilterContext<'_>,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::TypeCatalog;
    use crate::schema_generator::SchemaGeneratorSettings;
    use crate::types::{MemberDef, TypeDef};

    fn generator() -> SchemaGenerator {
        SchemaGenerator::new(
            TypeCatalog::with_types(vec![
                TypeDef::object("Node", vec![MemberDef::new("next", TypeRef::named("Node"))]),
            ]),
            SchemaGeneratorSettings::default(),
        )
    }

    #[test]
    fn test_standalone_registry_generates_definitions_immediately() {
        let generator = generator();
        let mut definitions = Definitions::new();
        let mut registry = SchemaRegistry::new(&generator, &mut definitions);

        let schema = registry.get_or_register(&TypeRef::named("Node")).unwrap();

        assert_eq!(schema.referenced_id(), Some("Node"));
        assert!(registry.definitions().contains_key("Node"));
    }

    #[test]
    fn test_registry_returns_inline_schemas_for_primitives() {
        let generator = generator();
        let mut definitions = Definitions::new();
        let mut registry = SchemaRegistry::new(&generator, &mut definitions);

        let schema = registry.get_or_register(&TypeRef::named("i64")).unwrap();

        assert_eq!(schema.format.as_deref(), Some("int64"));
        assert!(registry.definitions().is_empty());
    }
}
