//! Document and operation assembly.
//!
//! [`SwaggerGenerator`] turns the operation descriptors of one named document into a
//! [`SwaggerDocument`]: descriptors are filtered, sorted, grouped by path and then by
//! method, each operation is assembled with its parameter and response schemas, and the
//! registered operation and document filters run over the result.

use crate::descriptor::{ApiDescriptionProvider, BindingSource, OperationDescriptor, ParameterDescriptor};
use crate::error::{Error, Result};
use crate::filters::{DocumentFilter, DocumentFilterContext, OperationFilter, OperationFilterContext, SchemaRegistry};
use crate::schema::Definitions;
use crate::schema_generator::SchemaGenerator;
use crate::swagger::{
    BodyParameter, HttpMethod, Info, NonBodyParameter, Operation, Parameter, PathItem, Response,
    SecurityScheme, SwaggerDocument, SWAGGER_VERSION,
};
use crate::types::{to_camel_case, TypeRef};
use indexmap::IndexMap;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::rc::Rc;

/// Maps a descriptor to its tag
pub type TagSelector = Rc<dyn Fn(&OperationDescriptor) -> String>;

/// Maps a descriptor to the key operations are ordered by
pub type SortKeySelector = Rc<dyn Fn(&OperationDescriptor) -> String>;

/// Decides whether a descriptor belongs to the named document
pub type DocInclusionPredicate = Rc<dyn Fn(&str, &OperationDescriptor) -> bool>;

/// Status code patterns and their default response descriptions, first match wins
static RESPONSE_DESCRIPTIONS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"^1\d{2}$", "Information"),
        (r"^2\d{2}$", "Success"),
        (r"^3\d{2}$", "Redirect"),
        (r"^400$", "Bad Request"),
        (r"^401$", "Unauthorized"),
        (r"^403$", "Forbidden"),
        (r"^404$", "Not Found"),
        (r"^405$", "Method Not Allowed"),
        (r"^406$", "Not Acceptable"),
        (r"^408$", "Request Timeout"),
        (r"^409$", "Conflict"),
        (r"^4\d{2}$", "Client Error"),
        (r"^5\d{2}$", "Server Error"),
    ]
    .into_iter()
    .filter_map(|(pattern, description)| {
        Regex::new(pattern)
            .ok()
            .map(|regex| (regex, description))
    })
    .collect()
});

/// Default description of a response with the given status code
pub fn response_description(status_code: &str) -> String {
    RESPONSE_DESCRIPTIONS
        .iter()
        .find(|(pattern, _)| pattern.is_match(status_code))
        .map(|(_, description)| description.to_string())
        .unwrap_or_else(|| status_code.to_string())
}

/// Operation id derived from the route and method: `api/products/{id}` + GET gives
/// `ApiProductsByIdGet`
pub fn operation_id(relative_path: &str, http_method: &str) -> String {
    let route = format!("{}/{}", relative_path, http_method.to_lowercase());

    route
        .split('/')
        .map(|segment| {
            let trimmed = segment.trim_matches(|c| c == '{' || c == '}');
            let prefix = if segment.starts_with('{') { "By" } else { "" };
            format!("{}{}", prefix, title_case(trimmed))
        })
        .collect()
}

fn title_case(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Wire location of a parameter. Unknown sources go to the query string.
pub fn parameter_location(source: BindingSource) -> &'static str {
    match source {
        BindingSource::Form => "formData",
        BindingSource::Body => "body",
        BindingSource::Header => "header",
        BindingSource::Path => "path",
        BindingSource::Query => "query",
        _ => "query",
    }
}

/// Settings consumed by [`SwaggerGenerator`]
pub struct SwaggerGeneratorSettings {
    /// Document name -> metadata
    pub swagger_docs: IndexMap<String, Info>,
    pub doc_inclusion_predicate: DocInclusionPredicate,
    pub ignore_obsolete_actions: bool,
    pub tag_selector: TagSelector,
    pub sort_key_selector: SortKeySelector,
    pub describe_all_parameters_in_camel_case: bool,
    pub security_definitions: IndexMap<String, SecurityScheme>,
    pub operation_filters: Vec<Box<dyn OperationFilter>>,
    pub document_filters: Vec<Box<dyn DocumentFilter>>,
}

impl Default for SwaggerGeneratorSettings {
    fn default() -> Self {
        Self {
            swagger_docs: IndexMap::new(),
            doc_inclusion_predicate: Rc::new(|document_name: &str, descriptor: &OperationDescriptor| {
                descriptor
                    .group_name
                    .as_deref()
                    .map_or(true, |group| group == document_name)
            }),
            ignore_obsolete_actions: false,
            tag_selector: Rc::new(|descriptor: &OperationDescriptor| descriptor.controller_name()),
            sort_key_selector: Rc::new(|descriptor: &OperationDescriptor| {
                descriptor.controller_name()
            }),
            describe_all_parameters_in_camel_case: false,
            security_definitions: IndexMap::new(),
            operation_filters: Vec::new(),
            document_filters: Vec::new(),
        }
    }
}

/// Produces named Swagger documents
pub trait SwaggerProvider {
    fn get_swagger(
        &self,
        document_name: &str,
        host: Option<&str>,
        base_path: Option<&str>,
        schemes: Option<&[String]>,
    ) -> Result<SwaggerDocument>;
}

/// Swagger generator - assembles documents from operation descriptors
pub struct SwaggerGenerator {
    api_descriptions: Box<dyn ApiDescriptionProvider>,
    schema_generator: SchemaGenerator,
    settings: SwaggerGeneratorSettings,
}

impl SwaggerGenerator {
    pub fn new(
        api_descriptions: impl ApiDescriptionProvider + 'static,
        schema_generator: SchemaGenerator,
        settings: SwaggerGeneratorSettings,
    ) -> Self {
        debug!(
            "Initializing SwaggerGenerator with {} documents",
            settings.swagger_docs.len()
        );

        Self {
            api_descriptions: Box::new(api_descriptions),
            schema_generator,
            settings,
        }
    }

    /// Names of the registered documents
    pub fn document_names(&self) -> impl Iterator<Item = &str> {
        self.settings.swagger_docs.keys().map(String::as_str)
    }

    pub fn schema_generator(&self) -> &SchemaGenerator {
        &self.schema_generator
    }

    fn create_path_item(
        &self,
        path: &str,
        descriptors: &[&OperationDescriptor],
        definitions: &mut Definitions,
    ) -> Result<PathItem> {
        let mut by_method: IndexMap<Option<String>, Vec<&OperationDescriptor>> = IndexMap::new();
        for &descriptor in descriptors {
            let method = descriptor
                .http_method
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_ascii_uppercase);
            by_method.entry(method).or_default().push(descriptor);
        }

        let mut path_item = PathItem::default();
        for (method, group) in by_method {
            let Some(method) = method else {
                return Err(Error::AmbiguousHttpMethod {
                    action: group[0].display_name(),
                });
            };

            if group.len() > 1 {
                return Err(Error::ConflictingActions {
                    method,
                    path: path.to_string(),
                    actions: group.iter().map(|d| d.display_name()).collect(),
                });
            }

            let descriptor = group[0];
            match HttpMethod::parse(&method) {
                Some(slot) => {
                    let operation = self.create_operation(descriptor, &method, definitions)?;
                    path_item.set(slot, operation);
                }
                None => warn!(
                    "Skipping {} - HTTP method {} has no place in a Swagger path item",
                    descriptor.display_name(),
                    method
                ),
            }
        }

        Ok(path_item)
    }

    fn create_operation(
        &self,
        descriptor: &OperationDescriptor,
        method: &str,
        definitions: &mut Definitions,
    ) -> Result<Operation> {
        debug!("Creating operation {}", descriptor.display_name());

        let parameters = descriptor
            .parameters
            .iter()
            .filter(|parameter| parameter.source.is_from_request())
            .map(|parameter| self.create_parameter(parameter, definitions))
            .collect::<Result<Vec<_>>>()?;

        let mut responses = IndexMap::new();
        if descriptor.supported_response_types.is_empty() {
            responses.insert("200".to_string(), self.create_response("200", None, definitions)?);
        }
        for response_type in &descriptor.supported_response_types {
            let status_code = response_type.status_code.to_string();
            if responses.contains_key(&status_code) {
                warn!(
                    "{} declares response {} more than once; keeping the first",
                    descriptor.display_name(),
                    status_code
                );
                continue;
            }
            let response =
                self.create_response(&status_code, response_type.ty.as_ref(), definitions)?;
            responses.insert(status_code, response);
        }

        let tag = (self.settings.tag_selector)(descriptor);
        let mut operation = Operation {
            tags: if tag.is_empty() { Vec::new() } else { vec![tag] },
            operation_id: Some(operation_id(descriptor.path_without_query(), method)),
            consumes: descriptor.request_media_types.clone(),
            produces: descriptor.response_media_types.clone(),
            parameters: if parameters.is_empty() {
                None
            } else {
                Some(parameters)
            },
            responses,
            deprecated: descriptor.obsolete.then_some(true),
            ..Default::default()
        };

        let mut context = OperationFilterContext {
            api_description: descriptor,
            schema_registry: SchemaRegistry::new(&self.schema_generator, definitions),
        };
        for filter in &self.settings.operation_filters {
            filter.apply(&mut operation, &mut context)?;
        }

        Ok(operation)
    }

    fn create_parameter(
        &self,
        descriptor: &ParameterDescriptor,
        definitions: &mut Definitions,
    ) -> Result<Parameter> {
        let location = parameter_location(descriptor.source);

        let name = if self.settings.describe_all_parameters_in_camel_case {
            to_camel_case(&descriptor.name)
        } else {
            descriptor.name.clone()
        };

        let schema = match &descriptor.ty {
            Some(ty) => Some(self.schema_generator.get_schema(ty, definitions)?),
            None => None,
        };

        if location == "body" {
            return Ok(Parameter::Body(BodyParameter::new(name, schema)));
        }

        let mut parameter = NonBodyParameter::new(name, location, location == "path");
        match &schema {
            Some(schema) => parameter.populate_from(schema),
            None => parameter.param_type = Some("string".to_string()),
        }
        if parameter.param_type.as_deref() == Some("array") {
            parameter.collection_format = Some("multi".to_string());
        }

        Ok(Parameter::NonBody(parameter))
    }

    fn create_response(
        &self,
        status_code: &str,
        ty: Option<&TypeRef>,
        definitions: &mut Definitions,
    ) -> Result<Response> {
        let schema = match ty {
            Some(ty) => Some(self.schema_generator.get_schema(ty, definitions)?),
            None => None,
        };

        Ok(Response {
            description: response_description(status_code),
            schema,
            ..Default::default()
        })
    }
}

impl SwaggerProvider for SwaggerGenerator {
    fn get_swagger(
        &self,
        document_name: &str,
        host: Option<&str>,
        base_path: Option<&str>,
        schemes: Option<&[String]>,
    ) -> Result<SwaggerDocument> {
        let info = self
            .settings
            .swagger_docs
            .get(document_name)
            .ok_or_else(|| Error::UnknownDocument(document_name.to_string()))?;

        info!("Generating Swagger document {}", document_name);

        let all_descriptions = self.api_descriptions.api_descriptions();
        let mut descriptions: Vec<&OperationDescriptor> = all_descriptions
            .iter()
            .filter(|&descriptor| (self.settings.doc_inclusion_predicate)(document_name, descriptor))
            .filter(|descriptor| !(self.settings.ignore_obsolete_actions && descriptor.obsolete))
            .collect();
        descriptions.sort_by_cached_key(|&descriptor| (self.settings.sort_key_selector)(descriptor));

        debug!(
            "{} of {} operations belong to {}",
            descriptions.len(),
            all_descriptions.len(),
            document_name
        );

        let mut groups: IndexMap<String, Vec<&OperationDescriptor>> = IndexMap::new();
        for descriptor in descriptions {
            groups
                .entry(descriptor.path_without_query().to_string())
                .or_default()
                .push(descriptor);
        }

        let mut definitions = Definitions::new();
        let mut paths = IndexMap::new();
        for (path, group) in &groups {
            let path_item = self.create_path_item(path, group, &mut definitions)?;
            paths.insert(format!("/{}", path), path_item);
        }

        let mut document = SwaggerDocument {
            swagger: SWAGGER_VERSION.to_string(),
            info: info.clone(),
            host: host.map(str::to_string),
            base_path: base_path.map(str::to_string),
            schemes: schemes.map(<[String]>::to_vec),
            paths,
            definitions,
            security_definitions: self.settings.security_definitions.clone(),
            extensions: IndexMap::new(),
        };

        let context = DocumentFilterContext {
            api_description_groups: &groups,
            schema_generator: &self.schema_generator,
        };
        for filter in &self.settings.document_filters {
            filter.apply(&mut document, &context)?;
        }

        info!(
            "Generated document {} with {} paths and {} definitions",
            document_name,
            document.paths.len(),
            document.definitions.len()
        );

        Ok(document)
    }
}
