//! Typed errors and GraphQL error mapping.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("malformed resource configuration in \"{}\": {message}", .path.display())]
    MalformedConfiguration { path: PathBuf, message: String },
    #[error("unresolved parameter \"{name}\" in \"{}\"", .path.display())]
    UnresolvedParameter { name: String, path: PathBuf },
    #[error("cannot read \"{}\": {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExtractError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ExtractError::MalformedConfiguration {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("{0}")]
    InvalidStageResult(String),
    #[error("access denied: {0}")]
    AccessDenied(String),
    #[error("Cannot use {collaborator} for subscriptions when it is not configured. {hint}")]
    MissingCollaborator {
        collaborator: &'static str,
        hint: &'static str,
    },
    #[error("stage: {0}")]
    Stage(String),
    #[error("metadata: {0}")]
    Metadata(String),
}

impl ResolverError {
    /// Machine-readable code placed in the GraphQL error extensions.
    pub fn code(&self) -> &'static str {
        match self {
            ResolverError::InvalidStageResult(_) => "invalid_stage_result",
            ResolverError::AccessDenied(_) => "access_denied",
            ResolverError::MissingCollaborator { .. } => "missing_collaborator",
            ResolverError::Stage(_) => "stage_error",
            ResolverError::Metadata(_) => "metadata_error",
        }
    }

    pub fn to_error_body(&self) -> ErrorBody {
        ErrorBody {
            errors: vec![ErrorDetail {
                message: self.to_string(),
                extensions: ErrorExtensions {
                    code: self.code().to_string(),
                },
            }],
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Resolver(#[from] ResolverError),
    #[error("settings: {0}")]
    Settings(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    pub extensions: ErrorExtensions,
}

#[derive(Debug, Serialize)]
pub struct ErrorExtensions {
    pub code: String,
}
