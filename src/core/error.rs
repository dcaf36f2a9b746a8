//! Error taxonomy shared by the resolver, dispatcher, adapters and CLI.

use thiserror::Error;

/// Everything that can go wrong while loading, dispatching or recording a stack.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Unknown resource type: {0}")]
    UnknownResourceKind(String),

    #[error("{provider} adapter for {component} is not implemented")]
    NotImplemented { provider: String, component: String },

    #[error("resource '{resource}' references unresolved output '{path}'")]
    UnresolvedReference { resource: String, path: String },

    #[error("invalid arguments for {kind} '{resource}': {reason}")]
    InvalidArguments {
        resource: String,
        kind: String,
        reason: String,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{0} validation error(s)")]
    Validation(usize),

    #[error("state error: {0}")]
    State(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Adapter-side argument rejection.
    pub fn invalid_args(resource: &str, kind: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            resource: resource.to_string(),
            kind: kind.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_provider_message() {
        let e = Error::UnknownProvider("digitalocean".into());
        assert_eq!(e.to_string(), "Unknown provider: digitalocean");
    }

    #[test]
    fn test_not_implemented_message_names_component() {
        let e = Error::NotImplemented {
            provider: "azure".into(),
            component: "network".into(),
        };
        assert_eq!(e.to_string(), "azure adapter for network is not implemented");
    }

    #[test]
    fn test_invalid_args_helper() {
        let e = Error::invalid_args("db", "database", "storageGb must be positive");
        assert!(e.to_string().contains("database 'db'"));
        assert!(e.to_string().contains("storageGb"));
    }

    #[test]
    fn test_io_from() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let e: Error = io.into();
        assert!(matches!(e, Error::Io(_)));
    }
}
