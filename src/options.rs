//! Construction-time configuration.
//!
//! [`SwaggerGenOptions`] collects every setting and filter registration, then
//! [`SwaggerGenOptions::create_swagger_provider`] builds a ready [`SwaggerGenerator`].
//! Filters are registered as factories and only instantiated at that point.

use crate::annotations::{OperationAnnotationsFilter, ResponseAnnotationsFilter};
use crate::contract::ContractResolver;
use crate::descriptor::{ApiDescriptionProvider, OperationDescriptor};
use crate::doc_comments::{DocComments, DocCommentsOperationFilter, DocCommentsSchemaFilter};
use crate::error::Result;
use crate::filters::{DocumentFilter, OperationFilter, SchemaFilter};
use crate::schema::Schema;
use crate::schema_generator::{SchemaGenerator, SchemaGeneratorSettings};
use crate::swagger::{Info, SecurityScheme};
use crate::swagger_generator::{SortKeySelector, SwaggerGenerator, SwaggerGeneratorSettings};
use crate::types::TypeRef;
use log::debug;
use std::path::PathBuf;
use std::rc::Rc;

type Factory<T> = Box<dyn Fn() -> Box<T>>;
type DocCommentsSource = Box<dyn Fn() -> Result<DocComments>>;

pub struct SwaggerGenOptions {
    generator_settings: SwaggerGeneratorSettings,
    schema_settings: SchemaGeneratorSettings,
    sort_key_selector: Option<SortKeySelector>,
    operation_filters: Vec<Factory<dyn OperationFilter>>,
    document_filters: Vec<Factory<dyn DocumentFilter>>,
    schema_filters: Vec<Factory<dyn SchemaFilter>>,
    doc_comment_sources: Vec<DocCommentsSource>,
}

impl Default for SwaggerGenOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl SwaggerGenOptions {
    /// Options with the annotation filters registered
    pub fn new() -> Self {
        let mut options = Self {
            generator_settings: SwaggerGeneratorSettings::default(),
            schema_settings: SchemaGeneratorSettings::default(),
            sort_key_selector: None,
            operation_filters: Vec::new(),
            document_filters: Vec::new(),
            schema_filters: Vec::new(),
            doc_comment_sources: Vec::new(),
        };
        options.operation_filter(|| OperationAnnotationsFilter);
        options.operation_filter(|| ResponseAnnotationsFilter);
        options
    }

    /// Register a named document
    pub fn swagger_doc(&mut self, name: impl Into<String>, info: Info) -> &mut Self {
        self.generator_settings.swagger_docs.insert(name.into(), info);
        self
    }

    pub fn doc_inclusion_predicate(
        &mut self,
        predicate: impl Fn(&str, &OperationDescriptor) -> bool + 'static,
    ) -> &mut Self {
        self.generator_settings.doc_inclusion_predicate = Rc::new(predicate);
        self
    }

    pub fn ignore_obsolete_actions(&mut self) -> &mut Self {
        self.generator_settings.ignore_obsolete_actions = true;
        self
    }

    /// Tag selector; also the sort key unless [`Self::order_actions_by`] is used
    pub fn tag_actions_by(
        &mut self,
        selector: impl Fn(&OperationDescriptor) -> String + 'static,
    ) -> &mut Self {
        self.generator_settings.tag_selector = Rc::new(selector);
        self
    }

    pub fn order_actions_by(
        &mut self,
        selector: impl Fn(&OperationDescriptor) -> String + 'static,
    ) -> &mut Self {
        self.sort_key_selector = Some(Rc::new(selector));
        self
    }

    pub fn describe_all_parameters_in_camel_case(&mut self) -> &mut Self {
        self.generator_settings.describe_all_parameters_in_camel_case = true;
        self
    }

    pub fn add_security_definition(
        &mut self,
        name: impl Into<String>,
        scheme: SecurityScheme,
    ) -> &mut Self {
        self.generator_settings
            .security_definitions
            .insert(name.into(), scheme);
        self
    }

    /// Describe `ty` with a fixed schema
    pub fn map_type(&mut self, ty: TypeRef, factory: impl Fn() -> Schema + 'static) -> &mut Self {
        self.schema_settings
            .custom_type_mappings
            .insert(ty, Rc::new(factory));
        self
    }

    pub fn describe_all_enums_as_strings(&mut self) -> &mut Self {
        self.schema_settings.describe_all_enums_as_strings = true;
        self
    }

    pub fn describe_string_enums_in_camel_case(&mut self) -> &mut Self {
        self.schema_settings.describe_string_enums_in_camel_case = true;
        self
    }

    pub fn custom_schema_ids(&mut self, selector: impl Fn(&TypeRef) -> String + 'static) -> &mut Self {
        self.schema_settings.schema_id_selector = Rc::new(selector);
        self
    }

    pub fn ignore_obsolete_properties(&mut self) -> &mut Self {
        self.schema_settings.ignore_obsolete_properties = true;
        self
    }

    pub fn operation_filter<F, C>(&mut self, factory: C) -> &mut Self
    where
        F: OperationFilter + 'static,
        C: Fn() -> F + 'static,
    {
        self.operation_filters
            .push(Box::new(move || Box::new(factory()) as Box<dyn OperationFilter>));
        self
    }

    pub fn document_filter<F, C>(&mut self, factory: C) -> &mut Self
    where
        F: DocumentFilter + 'static,
        C: Fn() -> F + 'static,
    {
        self.document_filters
            .push(Box::new(move || Box::new(factory()) as Box<dyn DocumentFilter>));
        self
    }

    pub fn schema_filter<F, C>(&mut self, factory: C) -> &mut Self
    where
        F: SchemaFilter + 'static,
        C: Fn() -> F + 'static,
    {
        self.schema_filters
            .push(Box::new(move || Box::new(factory()) as Box<dyn SchemaFilter>));
        self
    }

    /// Add a doc-comment source, loaded when the provider is created
    pub fn include_doc_comments(
        &mut self,
        source: impl Fn() -> Result<DocComments> + 'static,
    ) -> &mut Self {
        self.doc_comment_sources.push(Box::new(source));
        self
    }

    pub fn include_doc_comments_file(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        let path = path.into();
        self.include_doc_comments(move || DocComments::load(&path))
    }

    /// Build the generator.
    ///
    /// Doc-comment sources are loaded and merged here; their filters run before every
    /// registered filter, annotation filters included.
    pub fn create_swagger_provider(
        self,
        api_descriptions: impl ApiDescriptionProvider + 'static,
        resolver: impl ContractResolver + 'static,
    ) -> Result<SwaggerGenerator> {
        let mut generator_settings = self.generator_settings;
        let mut schema_settings = self.schema_settings;

        generator_settings.sort_key_selector = match self.sort_key_selector {
            Some(selector) => selector,
            None => generator_settings.tag_selector.clone(),
        };

        let mut comments = DocComments::default();
        for source in &self.doc_comment_sources {
            comments.merge(source()?);
        }
        if !comments.is_empty() {
            debug!(
                "Applying doc comments for {} types and {} operations",
                comments.types.len(),
                comments.operations.len()
            );
            let comments = Rc::new(comments);
            schema_settings
                .schema_filters
                .push(Box::new(DocCommentsSchemaFilter::new(comments.clone())));
            generator_settings
                .operation_filters
                .push(Box::new(DocCommentsOperationFilter::new(comments)));
        }

        schema_settings
            .schema_filters
            .extend(self.schema_filters.iter().map(|factory| factory()));
        generator_settings
            .operation_filters
            .extend(self.operation_filters.iter().map(|factory| factory()));
        generator_settings
            .document_filters
            .extend(self.document_filters.iter().map(|factory| factory()));

        let schema_generator = SchemaGenerator::new(resolver, schema_settings);
        Ok(SwaggerGenerator::new(
            api_descriptions,
            schema_generator,
            generator_settings,
        ))
    }
}
