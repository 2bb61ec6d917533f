use crate::contract::{Contract, ContractResolver};
use crate::error::{Error, Result};
use crate::filters::{SchemaFilter, SchemaFilterContext, SchemaRegistry};
use crate::schema::{Definitions, Schema};
use crate::types::{to_camel_case, Constraints, EnumDef, EnumNaming, ObjectDef, Primitive, TypeRef};
use indexmap::IndexMap;
use log::debug;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

/// Produces the schema used for a custom-mapped type
pub type SchemaFactory = Rc<dyn Fn() -> Schema>;

/// Chooses the schema id of a referenced type
pub type SchemaIdSelector = Rc<dyn Fn(&TypeRef) -> String>;

/// Settings consumed by [`SchemaGenerator`]
pub struct SchemaGeneratorSettings {
    /// Types described by a fixed schema instead of their contract
    pub custom_type_mappings: HashMap<TypeRef, SchemaFactory>,
    pub describe_all_enums_as_strings: bool,
    pub describe_string_enums_in_camel_case: bool,
    pub schema_id_selector: SchemaIdSelector,
    pub ignore_obsolete_properties: bool,
    /// Applied, in order, to every inline schema
    pub schema_filters: Vec<Box<dyn SchemaFilter>>,
}

impl Default for SchemaGeneratorSettings {
    fn default() -> Self {
        Self {
            custom_type_mappings: HashMap::new(),
            describe_all_enums_as_strings: false,
            describe_string_enums_in_camel_case: false,
            schema_id_selector: Rc::new(|ty: &TypeRef| ty.simple_name()),
            ignore_obsolete_properties: false,
            schema_filters: Vec::new(),
        }
    }
}

/// Types waiting for their definition body, in first-seen order
#[derive(Debug, Default)]
pub(crate) struct TypeQueue {
    pending: VecDeque<TypeRef>,
}

impl TypeQueue {
    /// Queue `ty` unless it is already waiting
    fn enqueue(&mut self, ty: &TypeRef) {
        if !self.pending.contains(ty) {
            self.pending.push_back(ty.clone());
        }
    }

    fn front(&self) -> Option<&TypeRef> {
        self.pending.front()
    }

    fn dequeue(&mut self) {
        self.pending.pop_front();
    }
}

/// Schema ids handed out by one generator
#[derive(Debug, Default)]
struct SchemaIds {
    by_type: HashMap<TypeRef, String>,
    by_id: HashMap<String, TypeRef>,
}

/// Schema generator - translates types into schemas, registering referenced definitions.
///
/// Objects and self-referencing collections are emitted as references; their bodies are
/// produced after the requested schema by draining a queue, so cyclic type graphs never
/// recurse. Schema ids stay assigned for the lifetime of the generator, which keeps them
/// stable across calls but means one instance must not serve overlapping calls.
pub struct SchemaGenerator {
    resolver: Box<dyn ContractResolver>,
    settings: SchemaGeneratorSettings,
    schema_ids: RefCell<SchemaIds>,
}

impl SchemaGenerator {
    /// Create a new SchemaGenerator over a contract resolver
    pub fn new(resolver: impl ContractResolver + 'static, settings: SchemaGeneratorSettings) -> Self {
        let mut settings = settings;
        settings.custom_type_mappings = settings
            .custom_type_mappings
            .into_iter()
            .map(|(ty, factory)| (resolver.canonicalize(&ty), factory))
            .collect();

        debug!(
            "Initializing SchemaGenerator with {} custom mappings and {} schema filters",
            settings.custom_type_mappings.len(),
            settings.schema_filters.len()
        );

        Self {
            resolver: Box::new(resolver),
            settings,
            schema_ids: RefCell::new(SchemaIds::default()),
        }
    }

    pub fn resolver(&self) -> &dyn ContractResolver {
        self.resolver.as_ref()
    }

    /// Generate the schema of `ty`, adding every definition it depends on to `definitions`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaIdConflict`] when two distinct types are given the same id.
    pub fn get_schema(&self, ty: &TypeRef, definitions: &mut Definitions) -> Result<Schema> {
        debug!("Generating schema for type: {}", ty);

        let mut queue = TypeQueue::default();
        let schema = self.create_schema(ty, definitions, &mut queue)?;
        self.drain(definitions, &mut queue)?;

        Ok(schema)
    }

    /// Generate definition bodies until no referenced type is left waiting
    fn drain(&self, definitions: &mut Definitions, queue: &mut TypeQueue) -> Result<()> {
        while let Some(referenced) = queue.front().cloned() {
            let schema_id = self.assign_schema_id(&referenced)?;

            if !definitions.contains_key(&schema_id) {
                debug!("Generating definition {} for {}", schema_id, referenced);
                let schema = self.create_inline_schema(&referenced, definitions, queue)?;
                definitions.insert(schema_id, schema);
            }

            queue.dequeue();
        }

        Ok(())
    }

    /// Reference or inline schema for `ty`; referenced types are queued, not generated
    pub(crate) fn create_schema(
        &self,
        ty: &TypeRef,
        definitions: &mut Definitions,
        queue: &mut TypeQueue,
    ) -> Result<Schema> {
        let ty = self.resolver.canonicalize(ty);

        if self.settings.custom_type_mappings.contains_key(&ty) {
            return self.create_inline_schema(&ty, definitions, queue);
        }

        let contract = self.resolver.resolve_contract(&ty);
        if contract.is_object() || (ty.is_named() && self.reaches_itself(&ty, &contract)) {
            self.create_reference_schema(&ty, queue)
        } else {
            self.create_inline_schema(&ty, definitions, queue)
        }
    }

    /// True when `ty` is reachable from its own contract through array items and
    /// dictionary values, directly or via other collection types.
    fn reaches_itself(&self, ty: &TypeRef, contract: &Contract) -> bool {
        let mut visited = HashSet::new();
        let mut pending: Vec<TypeRef> = contract
            .element()
            .map(|element| self.resolver.canonicalize(element))
            .into_iter()
            .collect();

        while let Some(next) = pending.pop() {
            if &next == ty {
                return true;
            }
            if self.settings.custom_type_mappings.contains_key(&next) || !visited.insert(next.clone())
            {
                continue;
            }
            if let Some(element) = self.resolver.resolve_contract(&next).element() {
                pending.push(self.resolver.canonicalize(element));
            }
        }

        false
    }

    fn create_reference_schema(&self, ty: &TypeRef, queue: &mut TypeQueue) -> Result<Schema> {
        let schema_id = self.assign_schema_id(ty)?;
        queue.enqueue(ty);
        Ok(Schema::reference(&schema_id))
    }

    fn assign_schema_id(&self, ty: &TypeRef) -> Result<String> {
        if let Some(schema_id) = self.schema_ids.borrow().by_type.get(ty) {
            return Ok(schema_id.clone());
        }

        let schema_id = (self.settings.schema_id_selector)(ty);
        let mut ids = self.schema_ids.borrow_mut();

        if let Some(existing) = ids.by_id.get(&schema_id) {
            return Err(Error::SchemaIdConflict {
                schema_id,
                first: ty.to_string(),
                second: existing.to_string(),
            });
        }

        debug!("Assigned schema id {} to {}", schema_id, ty);
        ids.by_type.insert(ty.clone(), schema_id.clone());
        ids.by_id.insert(schema_id.clone(), ty.clone());
        Ok(schema_id)
    }

    fn create_inline_schema(
        &self,
        ty: &TypeRef,
        definitions: &mut Definitions,
        queue: &mut TypeQueue,
    ) -> Result<Schema> {
        let contract = self.resolver.resolve_contract(ty);

        let mut schema = match self.settings.custom_type_mappings.get(ty) {
            Some(factory) => factory(),
            None => match &contract {
                Contract::Primitive(primitive) => Self::create_primitive_schema(*primitive),
                Contract::Enum(enumeration) => self.create_enum_schema(enumeration),
                Contract::Dictionary { key, value } => {
                    self.create_dictionary_schema(key, value, definitions, queue)?
                }
                Contract::Array { item } => Schema {
                    items: Some(Box::new(self.create_schema(item, definitions, queue)?)),
                    ..Schema::of_type("array")
                },
                Contract::Object(object) => {
                    self.create_object_schema(ty, object, definitions, queue)?
                }
                Contract::Any => Schema::of_type("object"),
            },
        };

        let mut context = SchemaFilterContext {
            system_type: ty,
            contract: &contract,
            schema_registry: SchemaRegistry::within_translation(self, definitions, queue),
        };
        for filter in &self.settings.schema_filters {
            filter.apply(&mut schema, &mut context)?;
        }

        Ok(schema)
    }

    fn create_primitive_schema(primitive: Option<Primitive>) -> Schema {
        match primitive {
            Some(primitive) => {
                let (schema_type, format) = primitive.type_and_format();
                Schema::of_type(schema_type).with_format(format)
            }
            None => Schema::of_type("string"),
        }
    }

    fn create_enum_schema(&self, enumeration: &EnumDef) -> Schema {
        if self.settings.describe_all_enums_as_strings || enumeration.string_naming.is_some() {
            let camel_case = self.settings.describe_string_enums_in_camel_case
                || enumeration.string_naming == Some(EnumNaming::CamelCase);

            let names = enumeration
                .names()
                .into_iter()
                .map(|name| if camel_case { to_camel_case(&name) } else { name })
                .map(Value::String)
                .collect();

            return Schema {
                enum_values: Some(names),
                ..Schema::of_type("string")
            };
        }

        Schema {
            enum_values: Some(enumeration.values().into_iter().map(Value::from).collect()),
            ..Schema::of_type("integer").with_format(Some("int32"))
        }
    }

    fn create_dictionary_schema(
        &self,
        key: &TypeRef,
        value: &TypeRef,
        definitions: &mut Definitions,
        queue: &mut TypeQueue,
    ) -> Result<Schema> {
        if let Contract::Enum(key_enum) = self.resolver.resolve_contract(key) {
            let mut properties = IndexMap::new();
            for name in key_enum.names() {
                properties.insert(name, self.create_schema(value, definitions, queue)?);
            }

            return Ok(Schema {
                properties: Some(properties),
                ..Schema::of_type("object")
            });
        }

        Ok(Schema {
            additional_properties: Some(Box::new(self.create_schema(value, definitions, queue)?)),
            ..Schema::of_type("object")
        })
    }

    fn create_object_schema(
        &self,
        ty: &TypeRef,
        object: &ObjectDef,
        definitions: &mut Definitions,
        queue: &mut TypeQueue,
    ) -> Result<Schema> {
        let mut properties = IndexMap::new();
        let mut required = Vec::new();

        for member in &object.members {
            if member.ignored {
                continue;
            }
            if self.settings.ignore_obsolete_properties && member.obsolete {
                debug!("Skipping obsolete member {} of {}", member.name, ty);
                continue;
            }

            let mut property = self.create_schema(&member.ty, definitions, queue)?;
            assign_validation_properties(&mut property, &member.constraints);

            if member.required {
                required.push(member.name.clone());
            }
            properties.insert(member.name.clone(), property);
        }

        Ok(Schema {
            title: Some(ty.simple_name()),
            properties: Some(properties),
            required: if required.is_empty() {
                None
            } else {
                Some(required)
            },
            ..Schema::of_type("object")
        })
    }
}

/// Copy a member's constraints onto its schema. References stay bare.
fn assign_validation_properties(schema: &mut Schema, constraints: &Constraints) {
    if schema.is_reference() || constraints.is_empty() {
        return;
    }

    if constraints.minimum.is_some() {
        schema.minimum = constraints.minimum;
    }
    if constraints.maximum.is_some() {
        schema.maximum = constraints.maximum;
    }
    if constraints.min_length.is_some() {
        schema.min_length = constraints.min_length;
    }
    if constraints.max_length.is_some() {
        schema.max_length = constraints.max_length;
    }
    if constraints.pattern.is_some() {
        schema.pattern = constraints.pattern.clone();
    }
    if constraints.default.is_some() {
        schema.default = constraints.default.clone();
    }
    if constraints.allowed_values.is_some() {
        schema.enum_values = constraints.allowed_values.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::TypeCatalog;
    use crate::types::{EnumVariant, MemberDef, TypeDef, TypeShape};
    use serde_json::json;

    fn t(expr: &str) -> TypeRef {
        TypeRef::parse(expr).unwrap()
    }

    fn complex_type() -> TypeDef {
        TypeDef::object(
            "fixtures::ComplexType",
            vec![
                MemberDef::new("Property1", t("bool")),
                MemberDef::new("Property2", t("DateTime")),
                MemberDef::new("Property3", t("DateTimeOffset")),
                MemberDef::new("Property4", t("String")),
                MemberDef::new("Property5", t("String")),
            ],
        )
    }

    fn an_enum() -> TypeDef {
        TypeDef::new(
            "fixtures::AnEnum",
            TypeShape::Enum(EnumDef {
                variants: vec![
                    EnumVariant { name: "Value1".to_string(), value: Some(2) },
                    EnumVariant { name: "Value2".to_string(), value: Some(4) },
                    EnumVariant { name: "X".to_string(), value: Some(8) },
                ],
                string_naming: None,
            }),
        )
    }

    fn fixtures() -> TypeCatalog {
        TypeCatalog::with_types(vec![
            complex_type(),
            an_enum(),
            TypeDef::object(
                "fixtures::CompositeType",
                vec![
                    MemberDef::new("Property1", t("ComplexType")),
                    MemberDef::new("Property2", t("Vec<ComplexType>")),
                ],
            ),
            TypeDef::object(
                "fixtures::SelfReferencingType",
                vec![MemberDef::new("Another", t("SelfReferencingType"))],
            ),
            TypeDef::new(
                "fixtures::ListOfSelf",
                TypeShape::Sequence { item: t("ListOfSelf") },
            ),
            TypeDef::new(
                "fixtures::DictionaryOfSelf",
                TypeShape::Map {
                    key: t("String"),
                    value: t("DictionaryOfSelf"),
                },
            ),
            TypeDef::object(
                "fixtures::Parent",
                vec![MemberDef::new("Children", t("Vec<Child>"))],
            ),
            TypeDef::object(
                "fixtures::Child",
                vec![MemberDef::new("Parent", t("Parent"))],
            ),
            TypeDef::object(
                "namespace1::ConflictingType",
                vec![MemberDef::new("Property1", t("String"))],
            ),
            TypeDef::object(
                "namespace2::ConflictingType",
                vec![MemberDef::new("Property2", t("String"))],
            ),
        ])
    }

    fn subject(settings: SchemaGeneratorSettings) -> SchemaGenerator {
        SchemaGenerator::new(fixtures(), settings)
    }

    struct VendorExtensionsSchemaFilter;

    impl SchemaFilter for VendorExtensionsSchemaFilter {
        fn apply(&self, schema: &mut Schema, _context: &mut SchemaFilterContext<'_>) -> Result<()> {
            schema
                .extensions
                .insert("X-property1".to_string(), json!("value"));
            Ok(())
        }
    }

    struct RecursiveCallSchemaFilter;

    impl SchemaFilter for RecursiveCallSchemaFilter {
        fn apply(&self, schema: &mut Schema, context: &mut SchemaFilterContext<'_>) -> Result<()> {
            let extra = context
                .schema_registry
                .get_or_register(&t("ComplexType"))?;
            schema
                .properties
                .get_or_insert_with(IndexMap::new)
                .insert("ExtraProperty".to_string(), extra);
            Ok(())
        }
    }

    #[test]
    fn test_primitive_type_table() {
        let cases = [
            ("i16", "integer", Some("int32")),
            ("u16", "integer", Some("int32")),
            ("i32", "integer", Some("int32")),
            ("u32", "integer", Some("int32")),
            ("i64", "integer", Some("int64")),
            ("u64", "integer", Some("int64")),
            ("f32", "number", Some("float")),
            ("f64", "number", Some("double")),
            ("Decimal", "number", Some("double")),
            ("u8", "string", Some("byte")),
            ("i8", "string", Some("byte")),
            ("Vec<u8>", "string", Some("byte")),
            ("bool", "boolean", None),
            ("DateTime", "string", Some("date-time")),
            ("DateTimeOffset", "string", Some("date-time")),
            ("Uuid", "string", Some("uuid")),
            ("String", "string", None),
        ];

        for (expr, expected_type, expected_format) in cases {
            let mut definitions = Definitions::new();
            let schema = subject(SchemaGeneratorSettings::default())
                .get_schema(&t(expr), &mut definitions)
                .unwrap();

            assert_eq!(schema.schema_type.as_deref(), Some(expected_type), "{}", expr);
            assert_eq!(schema.format.as_deref(), expected_format, "{}", expr);
            assert!(definitions.is_empty());
        }
    }

    #[test]
    fn test_unmapped_scalar_is_plain_string() {
        let mut definitions = Definitions::new();
        let schema = subject(SchemaGeneratorSettings::default())
            .get_schema(&t("chrono::NaiveDate"), &mut definitions)
            .unwrap();

        assert_eq!(schema.schema_type.as_deref(), Some("string"));
        assert!(schema.format.is_none());
    }

    #[test]
    fn test_enum_described_by_values() {
        let mut definitions = Definitions::new();
        let schema = subject(SchemaGeneratorSettings::default())
            .get_schema(&t("AnEnum"), &mut definitions)
            .unwrap();

        assert_eq!(schema.schema_type.as_deref(), Some("integer"));
        assert_eq!(schema.format.as_deref(), Some("int32"));
        assert_eq!(schema.enum_values, Some(vec![json!(2), json!(4), json!(8)]));
    }

    #[test]
    fn test_enum_described_as_strings() {
        let mut definitions = Definitions::new();
        let schema = subject(SchemaGeneratorSettings {
            describe_all_enums_as_strings: true,
            ..Default::default()
        })
        .get_schema(&t("AnEnum"), &mut definitions)
        .unwrap();

        assert_eq!(schema.schema_type.as_deref(), Some("string"));
        assert_eq!(
            schema.enum_values,
            Some(vec![json!("Value1"), json!("Value2"), json!("X")])
        );
    }

    #[test]
    fn test_enum_described_as_camel_case_strings() {
        let mut definitions = Definitions::new();
        let schema = subject(SchemaGeneratorSettings {
            describe_all_enums_as_strings: true,
            describe_string_enums_in_camel_case: true,
            ..Default::default()
        })
        .get_schema(&t("AnEnum"), &mut definitions)
        .unwrap();

        assert_eq!(
            schema.enum_values,
            Some(vec![json!("value1"), json!("value2"), json!("x")])
        );
    }

    #[test]
    fn test_enum_with_its_own_string_naming() {
        let mut enumeration = an_enum();
        if let TypeShape::Enum(def) = &mut enumeration.shape {
            def.string_naming = Some(EnumNaming::CamelCase);
        }
        let generator = SchemaGenerator::new(
            TypeCatalog::with_types(vec![enumeration]),
            SchemaGeneratorSettings::default(),
        );

        let mut definitions = Definitions::new();
        let schema = generator.get_schema(&t("AnEnum"), &mut definitions).unwrap();

        assert_eq!(schema.schema_type.as_deref(), Some("string"));
        assert_eq!(
            schema.enum_values,
            Some(vec![json!("value1"), json!("value2"), json!("x")])
        );
    }

    #[test]
    fn test_array_schemas() {
        let generator = subject(SchemaGeneratorSettings::default());
        let mut definitions = Definitions::new();

        let ints = generator.get_schema(&t("Vec<i32>"), &mut definitions).unwrap();
        assert_eq!(ints.schema_type.as_deref(), Some("array"));
        let items = ints.items.unwrap();
        assert_eq!(items.schema_type.as_deref(), Some("integer"));
        assert_eq!(items.format.as_deref(), Some("int32"));

        let anything = generator.get_schema(&t("Vec<object>"), &mut definitions).unwrap();
        assert_eq!(
            anything.items.unwrap().schema_type.as_deref(),
            Some("object")
        );
    }

    #[test]
    fn test_multi_dimensional_arrays() {
        let mut definitions = Definitions::new();
        let schema = subject(SchemaGeneratorSettings::default())
            .get_schema(&t("Vec<Vec<i32>>"), &mut definitions)
            .unwrap();

        assert_eq!(schema.schema_type.as_deref(), Some("array"));
        let inner = schema.items.unwrap();
        assert_eq!(inner.schema_type.as_deref(), Some("array"));
        let leaf = inner.items.unwrap();
        assert_eq!(leaf.schema_type.as_deref(), Some("integer"));
        assert_eq!(leaf.format.as_deref(), Some("int32"));
    }

    #[test]
    fn test_map_schema() {
        let mut definitions = Definitions::new();
        let schema = subject(SchemaGeneratorSettings::default())
            .get_schema(&t("HashMap<String, String>"), &mut definitions)
            .unwrap();

        assert_eq!(schema.schema_type.as_deref(), Some("object"));
        assert_eq!(
            schema.additional_properties.unwrap().schema_type.as_deref(),
            Some("string")
        );
    }

    #[test]
    fn test_map_with_enum_keys_lists_every_variant() {
        let mut definitions = Definitions::new();
        let schema = subject(SchemaGeneratorSettings::default())
            .get_schema(&t("HashMap<AnEnum, String>"), &mut definitions)
            .unwrap();

        assert_eq!(schema.schema_type.as_deref(), Some("object"));
        assert!(schema.additional_properties.is_none());
        let properties = schema.properties.unwrap();
        assert_eq!(
            properties.keys().collect::<Vec<_>>(),
            vec!["Value1", "Value2", "X"]
        );
        assert_eq!(properties["X"].schema_type.as_deref(), Some("string"));
    }

    #[test]
    fn test_ambiguous_types_are_empty_objects() {
        let generator = subject(SchemaGeneratorSettings::default());
        for expr in ["object", "serde_json::Value", "NotInTheCatalog"] {
            let mut definitions = Definitions::new();
            let schema = generator.get_schema(&t(expr), &mut definitions).unwrap();

            assert_eq!(schema.schema_type.as_deref(), Some("object"));
            assert!(schema.properties.is_none());
            assert!(schema.reference.is_none());
        }
    }

    #[test]
    fn test_object_is_referenced_and_defined() {
        let mut definitions = Definitions::new();
        let reference = subject(SchemaGeneratorSettings::default())
            .get_schema(&t("ComplexType"), &mut definitions)
            .unwrap();

        assert_eq!(
            reference.reference.as_deref(),
            Some("#/definitions/ComplexType")
        );
        let schema = &definitions["ComplexType"];
        assert_eq!(schema.schema_type.as_deref(), Some("object"));
        assert_eq!(schema.title.as_deref(), Some("ComplexType"));

        let properties = schema.properties.as_ref().unwrap();
        assert_eq!(properties["Property1"].schema_type.as_deref(), Some("boolean"));
        assert!(properties["Property1"].format.is_none());
        assert_eq!(properties["Property2"].format.as_deref(), Some("date-time"));
        assert_eq!(properties["Property3"].format.as_deref(), Some("date-time"));
        assert_eq!(properties["Property4"].schema_type.as_deref(), Some("string"));
        assert!(properties["Property5"].format.is_none());
        assert!(schema.required.is_none());
    }

    #[test]
    fn test_second_translation_reuses_the_definition() {
        let generator = subject(SchemaGeneratorSettings::default());
        let mut definitions = Definitions::new();

        let first = generator.get_schema(&t("ComplexType"), &mut definitions).unwrap();
        let second = generator
            .get_schema(&t("fixtures::ComplexType"), &mut definitions)
            .unwrap();

        assert_eq!(first, second);
        assert!(second.is_reference());
        assert_eq!(definitions.len(), 1);
    }

    #[test]
    fn test_composite_types_reference_their_components() {
        let mut definitions = Definitions::new();
        subject(SchemaGeneratorSettings::default())
            .get_schema(&t("CompositeType"), &mut definitions)
            .unwrap();

        let root = &definitions["CompositeType"];
        let properties = root.properties.as_ref().unwrap();
        assert_eq!(
            properties["Property1"].reference.as_deref(),
            Some("#/definitions/ComplexType")
        );
        assert_eq!(properties["Property2"].schema_type.as_deref(), Some("array"));
        assert_eq!(
            properties["Property2"].items.as_ref().unwrap().reference.as_deref(),
            Some("#/definitions/ComplexType")
        );
        assert_eq!(
            definitions["ComplexType"].properties.as_ref().unwrap().len(),
            5
        );
    }

    #[test]
    fn test_self_referencing_types_terminate() {
        for (expr, expected_id) in [
            ("SelfReferencingType", "SelfReferencingType"),
            ("ListOfSelf", "ListOfSelf"),
            ("DictionaryOfSelf", "DictionaryOfSelf"),
        ] {
            let mut definitions = Definitions::new();
            let schema = subject(SchemaGeneratorSettings::default())
                .get_schema(&t(expr), &mut definitions)
                .unwrap();

            assert_eq!(schema.referenced_id(), Some(expected_id));
            assert!(definitions.contains_key(expected_id));
        }
    }

    #[test]
    fn test_self_reference_through_nested_collection_terminates() {
        let catalog = TypeCatalog::with_types(vec![TypeDef::new(
            "maps::Grid",
            TypeShape::Sequence { item: t("Vec<Grid>") },
        )]);
        let generator = SchemaGenerator::new(catalog, SchemaGeneratorSettings::default());

        let mut definitions = Definitions::new();
        let schema = generator.get_schema(&t("Grid"), &mut definitions).unwrap();

        assert_eq!(schema.referenced_id(), Some("Grid"));
        assert_eq!(definitions.keys().collect::<Vec<_>>(), vec!["Grid"]);
        assert_eq!(
            serde_json::to_value(&definitions["Grid"]).unwrap(),
            json!({
                "type": "array",
                "items": { "type": "array", "items": { "$ref": "#/definitions/Grid" } }
            })
        );
    }

    #[test]
    fn test_collections_referencing_each_other_terminate() {
        let catalog = TypeCatalog::with_types(vec![
            TypeDef::new("graph::A", TypeShape::Sequence { item: t("B") }),
            TypeDef::new("graph::B", TypeShape::Sequence { item: t("A") }),
        ]);
        let generator = SchemaGenerator::new(catalog, SchemaGeneratorSettings::default());

        let mut definitions = Definitions::new();
        let schema = generator.get_schema(&t("A"), &mut definitions).unwrap();

        assert_eq!(schema.referenced_id(), Some("A"));
        assert_eq!(definitions.keys().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(
            serde_json::to_value(&definitions["A"]).unwrap(),
            json!({ "type": "array", "items": { "$ref": "#/definitions/B" } })
        );
        assert_eq!(
            serde_json::to_value(&definitions["B"]).unwrap(),
            json!({ "type": "array", "items": { "$ref": "#/definitions/A" } })
        );
    }

    #[test]
    fn test_collection_of_recursive_collection_stays_inline() {
        let catalog = TypeCatalog::with_types(vec![
            TypeDef::new("maps::Grid", TypeShape::Sequence { item: t("Vec<Grid>") }),
            TypeDef::new("maps::Atlas", TypeShape::Sequence { item: t("Grid") }),
        ]);
        let generator = SchemaGenerator::new(catalog, SchemaGeneratorSettings::default());

        let mut definitions = Definitions::new();
        let schema = generator.get_schema(&t("Atlas"), &mut definitions).unwrap();

        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({ "type": "array", "items": { "$ref": "#/definitions/Grid" } })
        );
        assert_eq!(definitions.keys().collect::<Vec<_>>(), vec!["Grid"]);
    }

    #[test]
    fn test_mutually_recursive_types_leave_no_dangling_references() {
        let mut definitions = Definitions::new();
        subject(SchemaGeneratorSettings::default())
            .get_schema(&t("Parent"), &mut definitions)
            .unwrap();

        let mut referenced = Vec::new();
        for schema in definitions.values() {
            schema.collect_references(&mut referenced);
        }
        assert!(!referenced.is_empty());
        for id in referenced {
            assert!(definitions.contains_key(id), "dangling reference {}", id);
        }
        assert_eq!(
            definitions.keys().collect::<Vec<_>>(),
            vec!["Parent", "Child"]
        );
    }

    #[test]
    fn test_conflicting_schema_ids_fail() {
        let generator = subject(SchemaGeneratorSettings::default());
        let mut definitions = Definitions::new();

        generator
            .get_schema(&t("namespace1::ConflictingType"), &mut definitions)
            .unwrap();
        let err = generator
            .get_schema(&t("namespace2::ConflictingType"), &mut definitions)
            .unwrap_err();

        match err {
            Error::SchemaIdConflict { schema_id, first, second } => {
                assert_eq!(schema_id, "ConflictingType");
                assert_eq!(first, "namespace2::ConflictingType");
                assert_eq!(second, "namespace1::ConflictingType");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_custom_schema_ids_avoid_conflicts() {
        let generator = subject(SchemaGeneratorSettings {
            schema_id_selector: Rc::new(|ty: &TypeRef| ty.full_name()),
            ..Default::default()
        });
        let mut definitions = Definitions::new();

        let first = generator
            .get_schema(&t("namespace1::ConflictingType"), &mut definitions)
            .unwrap();
        let second = generator
            .get_schema(&t("namespace2::ConflictingType"), &mut definitions)
            .unwrap();

        assert_eq!(
            first.reference.as_deref(),
            Some("#/definitions/namespace1.ConflictingType")
        );
        assert_eq!(
            second.reference.as_deref(),
            Some("#/definitions/namespace2.ConflictingType")
        );
    }

    #[test]
    fn test_custom_type_mapping_bypasses_contract() {
        let mut mappings: HashMap<TypeRef, SchemaFactory> = HashMap::new();
        mappings.insert(t("ComplexType"), Rc::new(|| Schema::of_type("string")));
        let generator = subject(SchemaGeneratorSettings {
            custom_type_mappings: mappings,
            ..Default::default()
        });

        let mut definitions = Definitions::new();
        let schema = generator
            .get_schema(&t("fixtures::ComplexType"), &mut definitions)
            .unwrap();

        assert_eq!(schema.schema_type.as_deref(), Some("string"));
        assert!(schema.properties.is_none());
        assert!(definitions.is_empty());
    }

    #[test]
    fn test_schema_filters_post_modify_every_shape() {
        for expr in ["i32", "HashMap<String, String>", "Vec<i32>", "ComplexType", "object"] {
            let generator = subject(SchemaGeneratorSettings {
                schema_filters: vec![Box::new(VendorExtensionsSchemaFilter)],
                ..Default::default()
            });
            let mut definitions = Definitions::new();
            let schema_or_ref = generator.get_schema(&t(expr), &mut definitions).unwrap();

            let schema = match schema_or_ref.referenced_id() {
                Some(id) => definitions[id].clone(),
                None => schema_or_ref,
            };
            assert!(schema.extensions.contains_key("X-property1"), "{}", expr);
        }
    }

    #[test]
    fn test_filter_may_translate_again() {
        let generator = subject(SchemaGeneratorSettings {
            schema_filters: vec![Box::new(RecursiveCallSchemaFilter)],
            ..Default::default()
        });
        let mut definitions = Definitions::new();

        let schema = generator.get_schema(&t("object"), &mut definitions).unwrap();

        assert_eq!(
            schema.properties.unwrap()["ExtraProperty"].reference.as_deref(),
            Some("#/definitions/ComplexType")
        );
        let complex = &definitions["ComplexType"];
        assert!(complex.properties.as_ref().unwrap().contains_key("ExtraProperty"));
    }

    #[test]
    fn test_ignored_and_obsolete_members() {
        let catalog = TypeCatalog::with_types(vec![TypeDef::object(
            "ObsoletePropertiesType",
            vec![
                MemberDef::new("Current", t("String")).required(),
                MemberDef::new("ObsoleteProperty", t("String")).obsolete(),
                MemberDef::new("Secret", t("String")).ignored().required(),
            ],
        )]);

        let mut definitions = Definitions::new();
        SchemaGenerator::new(catalog.clone(), SchemaGeneratorSettings::default())
            .get_schema(&t("ObsoletePropertiesType"), &mut definitions)
            .unwrap();
        let schema = &definitions["ObsoletePropertiesType"];
        let properties = schema.properties.as_ref().unwrap();
        assert!(properties.contains_key("ObsoleteProperty"));
        assert!(!properties.contains_key("Secret"));
        assert_eq!(schema.required, Some(vec!["Current".to_string()]));

        let mut definitions = Definitions::new();
        SchemaGenerator::new(
            catalog,
            SchemaGeneratorSettings {
                ignore_obsolete_properties: true,
                ..Default::default()
            },
        )
        .get_schema(&t("ObsoletePropertiesType"), &mut definitions)
        .unwrap();
        let properties = definitions["ObsoletePropertiesType"].properties.clone().unwrap();
        assert!(!properties.contains_key("ObsoleteProperty"));
    }

    #[test]
    fn test_member_constraints_decorate_inline_properties() {
        let catalog = TypeCatalog::with_types(vec![
            TypeDef::object(
                "DataAnnotatedType",
                vec![
                    MemberDef::new("RangeProperty", t("i32"))
                        .required()
                        .with_constraints(Constraints {
                            minimum: Some(1.0),
                            maximum: Some(12.0),
                            ..Default::default()
                        }),
                    MemberDef::new("PatternProperty", t("String"))
                        .required()
                        .with_constraints(Constraints {
                            pattern: Some("^[3-6]?\\d{12,15}$".to_string()),
                            ..Default::default()
                        }),
                    MemberDef::new("StringProperty1", t("String")).with_constraints(
                        Constraints {
                            min_length: Some(5),
                            max_length: Some(10),
                            ..Default::default()
                        },
                    ),
                    MemberDef::new("DefaultValueProperty", t("String")).with_constraints(
                        Constraints {
                            default: Some(json!("DefaultValue")),
                            ..Default::default()
                        },
                    ),
                    MemberDef::new("Nested", t("Other")).with_constraints(Constraints {
                        default: Some(json!({})),
                        ..Default::default()
                    }),
                ],
            ),
            TypeDef::object("Other", vec![]),
        ]);

        let mut definitions = Definitions::new();
        SchemaGenerator::new(catalog, SchemaGeneratorSettings::default())
            .get_schema(&t("DataAnnotatedType"), &mut definitions)
            .unwrap();

        let schema = &definitions["DataAnnotatedType"];
        let properties = schema.properties.as_ref().unwrap();
        assert_eq!(properties["RangeProperty"].minimum, Some(1.0));
        assert_eq!(properties["RangeProperty"].maximum, Some(12.0));
        assert_eq!(
            properties["PatternProperty"].pattern.as_deref(),
            Some("^[3-6]?\\d{12,15}$")
        );
        assert_eq!(properties["StringProperty1"].min_length, Some(5));
        assert_eq!(properties["StringProperty1"].max_length, Some(10));
        assert_eq!(
            properties["DefaultValueProperty"].default,
            Some(json!("DefaultValue"))
        );
        assert_eq!(properties["Nested"], Schema::reference("Other"));
        assert_eq!(
            schema.required,
            Some(vec!["RangeProperty".to_string(), "PatternProperty".to_string()])
        );
    }
}
