use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a document-generation call or an input-loading step
#[derive(Debug, Error)]
pub enum Error {
    /// The requested document name was never registered
    #[error("Unknown Swagger document - {0}")]
    UnknownDocument(String),

    /// Two distinct types were assigned the same schema id
    #[error(
        "Conflicting schemaIds: Identical schemaIds detected for types {first} and {second}. \
         See config settings - \"CustomSchemaIds\" for a workaround"
    )]
    SchemaIdConflict {
        schema_id: String,
        first: String,
        second: String,
    },

    /// An operation has no HTTP method bound to it
    #[error(
        "Ambiguous HTTP method for action - {action}. \
         Actions require an explicit HttpMethod binding for Swagger"
    )]
    AmbiguousHttpMethod { action: String },

    /// More than one operation shares a method/path combination
    #[error(
        "HTTP method \"{method}\" & path \"{path}\" overloaded by actions - {}. \
         Actions require unique method/path combination for Swagger",
        .actions.join(",")
    )]
    ConflictingActions {
        method: String,
        path: String,
        actions: Vec<String>,
    },

    /// A type expression could not be parsed
    #[error("Invalid type expression `{expr}`: {message}")]
    InvalidType { expr: String, message: String },

    /// The API manifest is structurally valid but semantically wrong
    #[error("Invalid manifest {}: {message}", .file.display())]
    Manifest { file: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(format!("JSON: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(format!("YAML: {}", err))
    }
}

impl From<syn::Error> for Error {
    fn from(err: syn::Error) -> Self {
        Error::InvalidType {
            expr: "<unknown>".to_string(),
            message: err.to_string(),
        }
    }
}
