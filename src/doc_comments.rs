//! Documentation comments for types, members and operations.
//!
//! Comments come from a YAML/JSON file or are harvested from `///` comments in Rust
//! sources. Two filters apply them; they always run ahead of any registered filter.

use crate::error::Result;
use crate::filters::{
    OperationFilter, OperationFilterContext, SchemaFilter, SchemaFilterContext,
};
use crate::schema::Schema;
use crate::swagger::{Operation, Response};
use crate::types::{to_camel_case, TypeRef};
use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocComments {
    /// Type path -> comments
    pub types: IndexMap<String, TypeComments>,
    /// Action name -> comments
    pub operations: IndexMap<String, OperationComments>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeComments {
    pub summary: Option<String>,
    /// Member wire name -> summary
    pub members: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationComments {
    pub summary: Option<String>,
    pub remarks: Option<String>,
    /// Parameter name -> description
    pub parameters: IndexMap<String, String>,
    /// Status code -> description
    pub responses: IndexMap<String, String>,
}

impl DocComments {
    /// Load comments from a `.json` file, or YAML for any other extension
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading doc comments from {}", path.display());
        let content = fs::read_to_string(path)?;

        let is_json = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(serde_yaml::from_str(&content)?)
        }
    }

    /// Merge `other` into `self`; entries of `other` win
    pub fn merge(&mut self, other: DocComments) {
        for (path, comments) in other.types {
            let entry = self.types.entry(path).or_default();
            if comments.summary.is_some() {
                entry.summary = comments.summary;
            }
            entry.members.extend(comments.members);
        }
        for (action, comments) in other.operations {
            let entry = self.operations.entry(action).or_default();
            if comments.summary.is_some() {
                entry.summary = comments.summary;
            }
            if comments.remarks.is_some() {
                entry.remarks = comments.remarks;
            }
            entry.parameters.extend(comments.parameters);
            entry.responses.extend(comments.responses);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.operations.is_empty()
    }

    /// Comments of a named type, looked up by path and then by simple name when
    /// exactly one documented type carries it
    pub fn type_comments(&self, ty: &TypeRef) -> Option<&TypeComments> {
        let TypeRef::Named(path) = ty else {
            return None;
        };

        if let Some(comments) = self.types.get(path) {
            return Some(comments);
        }

        let simple = ty.simple_name();
        let mut matches = self
            .types
            .iter()
            .filter(|(key, _)| key.rsplit("::").next() == Some(simple.as_str()));
        match (matches.next(), matches.next()) {
            (Some((_, comments)), None) => Some(comments),
            (Some((first, _)), Some((second, _))) => {
                warn!(
                    "Comments for {} are ambiguous between {} and {}; qualify the type path",
                    path, first, second
                );
                None
            }
            _ => None,
        }
    }

    /// Comments of an action, looked up by full name and then by its last segment
    pub fn operation_comments(&self, action: &str) -> Option<&OperationComments> {
        self.operations.get(action).or_else(|| {
            let last = action.rsplit(|c| c == '.' || c == ':').next()?;
            self.operations.get(last)
        })
    }
}

/// Describes schemas and their properties from type comments
pub struct DocCommentsSchemaFilter {
    comments: Rc<DocComments>,
}

impl DocCommentsSchemaFilter {
    pub fn new(comments: Rc<DocComments>) -> Self {
        Self { comments }
    }
}

impl SchemaFilter for DocCommentsSchemaFilter {
    fn apply(&self, schema: &mut Schema, context: &mut SchemaFilterContext<'_>) -> Result<()> {
        let Some(comments) = self.comments.type_comments(context.system_type) else {
            return Ok(());
        };

        if let Some(summary) = &comments.summary {
            schema.description = Some(summary.clone());
        }

        if let Some(properties) = schema.properties.as_mut() {
            for (name, property) in properties.iter_mut() {
                // A reference cannot carry sibling keys
                if property.is_reference() {
                    continue;
                }
                if let Some(summary) = comments.members.get(name) {
                    property.description = Some(summary.clone());
                }
            }
        }

        Ok(())
    }
}

/// Describes operations, their parameters and responses from action comments
pub struct DocCommentsOperationFilter {
    comments: Rc<DocComments>,
}

impl DocCommentsOperationFilter {
    pub fn new(comments: Rc<DocComments>) -> Self {
        Self { comments }
    }
}

impl OperationFilter for DocCommentsOperationFilter {
    fn apply(
        &self,
        operation: &mut Operation,
        context: &mut OperationFilterContext<'_>,
    ) -> Result<()> {
        let action = context.api_description.display_name();
        let Some(comments) = self.comments.operation_comments(&action) else {
            return Ok(());
        };

        if let Some(summary) = &comments.summary {
            operation.summary = Some(summary.clone());
        }
        if let Some(remarks) = &comments.remarks {
            operation.description = Some(remarks.clone());
        }

        for (name, description) in &comments.parameters {
            let key = if operation.parameter_mut(name).is_some() {
                name.clone()
            } else {
                to_camel_case(name)
            };
            if let Some(parameter) = operation.parameter_mut(&key) {
                parameter.set_description(description.clone());
            }
        }

        for (status_code, description) in &comments.responses {
            operation
                .responses
                .entry(status_code.clone())
                .or_insert_with(Response::default)
                .description = description.clone();
        }

        Ok(())
    }
}
