//! Per-action annotations and the operation filters that apply them.
//!
//! Annotations travel on the [`OperationDescriptor`] and override what the generator
//! derives on its own: summary, description, operation id, tags, and the declared
//! responses.

use crate::error::Result;
use crate::filters::{OperationFilter, OperationFilterContext};
use crate::swagger::{Operation, Response};
use crate::swagger_generator::response_description;
use crate::types::TypeRef;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationAnnotations {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub operation_id: Option<String>,
    /// Replaces the selected tag when not empty
    pub tags: Vec<String>,
    pub responses: Vec<ResponseAnnotation>,
    /// Drop every response the generator produced before applying `responses`
    pub remove_default_responses: bool,
    /// Vendor extensions added to the operation
    pub extensions: IndexMap<String, Value>,
}

impl OperationAnnotations {
    pub fn is_empty(&self) -> bool {
        *self == OperationAnnotations::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseAnnotation {
    pub status_code: u16,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub ty: Option<TypeRef>,
}

impl ResponseAnnotation {
    pub fn new(status_code: u16, description: Option<&str>, ty: Option<TypeRef>) -> Self {
        Self {
            status_code,
            description: description.map(str::to_string),
            ty,
        }
    }
}

/// Applies summary, description, operation id, tags and extensions
pub struct OperationAnnotationsFilter;

impl OperationFilter for OperationAnnotationsFilter {
    fn apply(
        &self,
        operation: &mut Operation,
        context: &mut OperationFilterContext<'_>,
    ) -> Result<()> {
        let annotations = &context.api_description.annotations;

        if let Some(summary) = &annotations.summary {
            operation.summary = Some(summary.clone());
        }
        if let Some(description) = &annotations.description {
            operation.description = Some(description.clone());
        }
        if let Some(operation_id) = &annotations.operation_id {
            operation.operation_id = Some(operation_id.clone());
        }
        if !annotations.tags.is_empty() {
            operation.tags = annotations.tags.clone();
        }
        for (key, value) in &annotations.extensions {
            operation.extensions.insert(key.clone(), value.clone());
        }

        Ok(())
    }
}

/// Applies declared responses
pub struct ResponseAnnotationsFilter;

impl OperationFilter for ResponseAnnotationsFilter {
    fn apply(
        &self,
        operation: &mut Operation,
        context: &mut OperationFilterContext<'_>,
    ) -> Result<()> {
        let annotations = &context.api_description.annotations;

        if annotations.remove_default_responses {
            debug!(
                "Removing default responses of {}",
                context.api_description.display_name()
            );
            operation.responses.clear();
        }

        for annotation in &annotations.responses {
            let status_code = annotation.status_code.to_string();
            let schema = match &annotation.ty {
                Some(ty) => Some(context.schema_registry.get_or_register(ty)?),
                None => None,
            };
            let description = annotation
                .description
                .clone()
                .unwrap_or_else(|| response_description(&status_code));

            operation.responses.insert(
                status_code,
                Response {
                    description,
                    schema,
                    ..Default::default()
                },
            );
        }

        Ok(())
    }
}
