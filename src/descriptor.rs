//! Operation descriptors: the route/action metadata the generator consumes.
//!
//! Discovery of these descriptors belongs to the host framework. The CLI reads them from a
//! manifest; library users implement [`ApiDescriptionProvider`] or hand over a `Vec`.

use crate::annotations::OperationAnnotations;
use crate::types::TypeRef;
use serde::{Deserialize, Serialize};

/// Where the value of a parameter is bound from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingSource {
    Body,
    Form,
    Header,
    Path,
    Query,
    /// Bound by the framework's general model binding; the concrete location is unknown
    #[default]
    ModelBinding,
    /// Injected from the service container
    Services,
    /// Supplied by the framework itself, e.g. a cancellation token
    Special,
}

impl BindingSource {
    /// True when the value comes from the HTTP request
    pub fn is_from_request(self) -> bool {
        !matches!(self, BindingSource::Services | BindingSource::Special)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    #[serde(default)]
    pub source: BindingSource,
    #[serde(rename = "type", default)]
    pub ty: Option<TypeRef>,
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<String>, source: BindingSource, ty: Option<TypeRef>) -> Self {
        Self {
            name: name.into(),
            source,
            ty,
        }
    }
}

/// A response the action declares it can produce
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseDescriptor {
    pub status_code: u16,
    /// Body type; `None` for responses without content
    #[serde(rename = "type", default)]
    pub ty: Option<TypeRef>,
}

/// One route + verb + contract triple
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OperationDescriptor {
    /// HTTP verb; `None` when the action has no method binding
    #[serde(rename = "method", default)]
    pub http_method: Option<String>,
    /// Route template relative to the base path, e.g. `api/products/{id}`. May carry a
    /// query string, which is not part of the path key.
    #[serde(rename = "path")]
    pub relative_path: String,
    /// Document this action is restricted to
    #[serde(rename = "group", default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub controller: Option<String>,
    /// Name used in diagnostics
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterDescriptor>,
    #[serde(rename = "responses", default)]
    pub supported_response_types: Vec<ResponseDescriptor>,
    #[serde(rename = "consumes", default)]
    pub request_media_types: Vec<String>,
    #[serde(rename = "produces", default)]
    pub response_media_types: Vec<String>,
    #[serde(default)]
    pub obsolete: bool,
    #[serde(default)]
    pub annotations: OperationAnnotations,
}

impl OperationDescriptor {
    pub fn new(http_method: Option<&str>, relative_path: impl Into<String>) -> Self {
        Self {
            http_method: http_method.map(str::to_string),
            relative_path: relative_path.into(),
            ..Default::default()
        }
    }

    pub fn with_parameter(mut self, parameter: ParameterDescriptor) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_response(mut self, status_code: u16, ty: Option<TypeRef>) -> Self {
        self.supported_response_types
            .push(ResponseDescriptor { status_code, ty });
        self
    }

    pub fn with_controller(mut self, controller: impl Into<String>) -> Self {
        self.controller = Some(controller.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Route template with any query string removed
    pub fn path_without_query(&self) -> &str {
        self.relative_path
            .split('?')
            .next()
            .unwrap_or(&self.relative_path)
            .trim_start_matches('/')
    }

    /// The controller, or the first literal path segment when none is set
    pub fn controller_name(&self) -> String {
        if let Some(controller) = &self.controller {
            return controller.clone();
        }

        self.path_without_query()
            .split('/')
            .find(|segment| !segment.is_empty() && !segment.starts_with('{'))
            .unwrap_or_default()
            .to_string()
    }

    pub fn display_name(&self) -> String {
        match &self.action {
            Some(action) => action.clone(),
            None => format!(
                "{} {}",
                self.http_method.as_deref().unwrap_or("<any>"),
                self.relative_path
            ),
        }
    }
}

/// Supplies the operation descriptors of a service
pub trait ApiDescriptionProvider {
    fn api_descriptions(&self) -> Vec<OperationDescriptor>;
}

impl ApiDescriptionProvider for Vec<OperationDescriptor> {
    fn api_descriptions(&self) -> Vec<OperationDescriptor> {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_without_query_strips_query_and_leading_slash() {
        let descriptor = OperationDescriptor::new(Some("GET"), "/api/products?page={page}");
        assert_eq!(descriptor.path_without_query(), "api/products");
    }

    #[test]
    fn test_controller_name_falls_back_to_first_literal_segment() {
        let descriptor = OperationDescriptor::new(Some("GET"), "{tenant}/orders/{id}");
        assert_eq!(descriptor.controller_name(), "orders");

        let descriptor = descriptor.with_controller("Orders");
        assert_eq!(descriptor.controller_name(), "Orders");
    }

    #[test]
    fn test_framework_injected_parameters_are_not_from_request() {
        assert!(BindingSource::ModelBinding.is_from_request());
        assert!(BindingSource::Body.is_from_request());
        assert!(!BindingSource::Services.is_from_request());
        assert!(!BindingSource::Special.is_from_request());
    }

    #[test]
    fn test_descriptor_deserializes_with_defaults() {
        let yaml = r#"
method: POST
path: api/products
parameters:
  - name: product
    source: body
    type: shop::Product
  - name: token
    source: special
responses:
  - status_code: 201
    type: shop::Product
"#;
        let descriptor: OperationDescriptor = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(descriptor.http_method.as_deref(), Some("POST"));
        assert_eq!(descriptor.parameters[0].source, BindingSource::Body);
        assert!(descriptor.parameters[1].ty.is_none());
        assert_eq!(descriptor.supported_response_types[0].status_code, 201);
        assert!(!descriptor.obsolete);
        assert_eq!(descriptor.display_name(), "POST api/products");
    }
}
