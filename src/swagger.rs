//! Swagger 2.0 document model.

use crate::schema::{Definitions, Schema};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub const SWAGGER_VERSION: &str = "2.0";

/// Complete Swagger document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwaggerDocument {
    pub swagger: String,
    pub info: Info,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schemes: Option<Vec<String>>,
    /// `"/" + path` -> operations on that path
    pub paths: IndexMap<String, PathItem>,
    pub definitions: Definitions,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub security_definitions: IndexMap<String, SecurityScheme>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

/// Document metadata
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
}

impl Info {
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: version.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct License {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// HTTP methods a path item has a slot for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
}

impl HttpMethod {
    /// Case-insensitive lookup; `None` for methods without a slot
    pub fn parse(method: &str) -> Option<Self> {
        match method.to_ascii_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "PUT" => Some(HttpMethod::Put),
            "POST" => Some(HttpMethod::Post),
            "DELETE" => Some(HttpMethod::Delete),
            "OPTIONS" => Some(HttpMethod::Options),
            "HEAD" => Some(HttpMethod::Head),
            "PATCH" => Some(HttpMethod::Patch),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Put => "put",
            HttpMethod::Post => "post",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Patch => "patch",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All operations for a single path
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
}

impl PathItem {
    fn slot_mut(&mut self, method: HttpMethod) -> &mut Option<Operation> {
        match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Delete => &mut self.delete,
            HttpMethod::Options => &mut self.options,
            HttpMethod::Head => &mut self.head,
            HttpMethod::Patch => &mut self.patch,
        }
    }

    pub fn set(&mut self, method: HttpMethod, operation: Operation) {
        *self.slot_mut(method) = Some(operation);
    }

    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Options => self.options.as_ref(),
            HttpMethod::Head => self.head.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
        }
    }

    pub fn operations_mut(&mut self) -> impl Iterator<Item = &mut Operation> {
        [
            &mut self.get,
            &mut self.put,
            &mut self.post,
            &mut self.delete,
            &mut self.options,
            &mut self.head,
            &mut self.patch,
        ]
        .into_iter()
        .filter_map(Option::as_mut)
    }
}

/// A single API operation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(default)]
    pub consumes: Vec<String>,
    #[serde(default)]
    pub produces: Vec<String>,
    /// Never an empty list: absent when the operation takes no parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<Parameter>>,
    /// Status code -> response
    pub responses: IndexMap<String, Response>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<IndexMap<String, Vec<String>>>>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

impl Operation {
    pub fn parameter_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.parameters
            .as_mut()?
            .iter_mut()
            .find(|parameter| parameter.name() == name)
    }
}

/// Operation parameter: the request body, or a value bound from elsewhere in the request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Parameter {
    NonBody(NonBodyParameter),
    Body(BodyParameter),
}

impl Parameter {
    pub fn name(&self) -> &str {
        match self {
            Parameter::Body(body) => &body.name,
            Parameter::NonBody(non_body) => &non_body.name,
        }
    }

    pub fn location(&self) -> &str {
        match self {
            Parameter::Body(_) => "body",
            Parameter::NonBody(non_body) => &non_body.location,
        }
    }

    pub fn set_description(&mut self, description: String) {
        match self {
            Parameter::Body(body) => body.description = Some(description),
            Parameter::NonBody(non_body) => non_body.description = Some(description),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyParameter {
    pub name: String,
    /// Always `body`
    #[serde(rename = "in")]
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

impl BodyParameter {
    pub fn new(name: impl Into<String>, schema: Option<Schema>) -> Self {
        Self {
            name: name.into(),
            location: "body".to_string(),
            description: None,
            required: None,
            schema,
            extensions: IndexMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NonBodyParameter {
    pub name: String,
    /// `query`, `header`, `path` or `formData`
    #[serde(rename = "in")]
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub param_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

impl NonBodyParameter {
    pub fn new(name: impl Into<String>, location: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            required,
            ..Default::default()
        }
    }

    /// Copy the primitive description out of an inline schema.
    ///
    /// References carry no primitive type, so they leave the parameter as a string.
    pub fn populate_from(&mut self, schema: &Schema) {
        if schema.is_reference() {
            self.param_type = Some("string".to_string());
            return;
        }

        self.param_type = Some(
            schema
                .schema_type
                .clone()
                .unwrap_or_else(|| "string".to_string()),
        );
        self.format = schema.format.clone();
        self.items = schema.items.clone();
        self.default = schema.default.clone();
        self.maximum = schema.maximum;
        self.minimum = schema.minimum;
        self.max_length = schema.max_length;
        self.min_length = schema.min_length;
        self.pattern = schema.pattern.clone();
        self.enum_values = schema.enum_values.clone();
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Response {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

/// Security scheme registered under `securityDefinitions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SecurityScheme {
    #[serde(rename = "basic")]
    Basic {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    #[serde(rename = "apiKey")]
    ApiKey {
        name: String,
        /// `query` or `header`
        #[serde(rename = "in")]
        location: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    #[serde(rename = "oauth2", rename_all = "camelCase")]
    OAuth2 {
        /// `implicit`, `password`, `application` or `accessCode`
        flow: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        authorization_url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token_url: Option<String>,
        #[serde(default)]
        scopes: IndexMap<String, String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_http_method_parse_is_case_insensitive() {
        assert_eq!(HttpMethod::parse("get"), Some(HttpMethod::Get));
        assert_eq!(HttpMethod::parse("PATCH"), Some(HttpMethod::Patch));
        assert_eq!(HttpMethod::parse("TRACE"), None);
    }

    #[test]
    fn test_operation_omits_empty_parameters_and_false_deprecation() {
        let mut operation = Operation {
            tags: vec!["Products".to_string()],
            operation_id: Some("ApiProductsGet".to_string()),
            ..Default::default()
        };
        operation.responses.insert(
            "200".to_string(),
            Response {
                description: "Success".to_string(),
                ..Default::default()
            },
        );

        let value = serde_json::to_value(&operation).unwrap();
        assert_eq!(
            value,
            json!({
                "tags": ["Products"],
                "operationId": "ApiProductsGet",
                "consumes": [],
                "produces": [],
                "responses": { "200": { "description": "Success" } }
            })
        );
    }

    #[test]
    fn test_parameters_serialize_by_location() {
        let body = Parameter::Body(BodyParameter::new("product", Some(Schema::reference("Product"))));
        let mut query = NonBodyParameter::new("ids", "query", false);
        query.populate_from(&Schema {
            items: Some(Box::new(Schema::of_type("integer").with_format(Some("int32")))),
            ..Schema::of_type("array")
        });
        query.collection_format = Some("multi".to_string());

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "name": "product", "in": "body", "schema": { "$ref": "#/definitions/Product" } })
        );
        assert_eq!(
            serde_json::to_value(Parameter::NonBody(query)).unwrap(),
            json!({
                "name": "ids",
                "in": "query",
                "required": false,
                "type": "array",
                "items": { "type": "integer", "format": "int32" },
                "collectionFormat": "multi"
            })
        );
    }

    #[test]
    fn test_security_schemes_are_tagged_by_type() {
        let mut scopes = IndexMap::new();
        scopes.insert("read".to_string(), "Read access".to_string());
        let oauth2 = SecurityScheme::OAuth2 {
            flow: "implicit".to_string(),
            authorization_url: Some("https://example.com/auth".to_string()),
            token_url: None,
            scopes,
            description: None,
        };

        assert_eq!(
            serde_json::to_value(&oauth2).unwrap(),
            json!({
                "type": "oauth2",
                "flow": "implicit",
                "authorizationUrl": "https://example.com/auth",
                "scopes": { "read": "Read access" }
            })
        );

        let api_key: SecurityScheme =
            serde_yaml::from_str("type: apiKey\nname: X-Api-Key\nin: header\n").unwrap();
        assert_eq!(
            api_key,
            SecurityScheme::ApiKey {
                name: "X-Api-Key".to_string(),
                location: "header".to_string(),
                description: None,
            }
        );
    }

    #[test]
    fn test_path_item_slots() {
        let mut item = PathItem::default();
        item.set(HttpMethod::Delete, Operation::default());

        assert!(item.operation(HttpMethod::Delete).is_some());
        assert!(item.operation(HttpMethod::Get).is_none());
        assert_eq!(item.operations_mut().count(), 1);
    }
}
