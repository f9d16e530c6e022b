use thiserror::Error;

use crate::{
    config::LoadError, domain::error::DomainError, infra::error::InfraError,
    presentation::views::TemplateRenderError,
};

/// Failures reported by a [`ContentStore`](super::collaborators::ContentStore).
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("content store error: {0}")]
    Persistence(String),
    #[error("stored element tree is unusable: {0}")]
    Corrupt(#[from] DomainError),
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Failures resolving or rendering a single element. These never abort a
/// render pass; the element is skipped.
#[derive(Debug, Error)]
pub enum ElementError {
    #[error("unknown element type `{element_type}`")]
    UnknownType { element_type: String },
    #[error("element `{element_type}` has invalid settings: {message}")]
    InvalidSettings {
        element_type: String,
        message: String,
    },
    #[error(transparent)]
    Template(#[from] TemplateRenderError),
}

impl ElementError {
    pub fn invalid_settings(element_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSettings {
            element_type: element_type.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CssError {
    #[error("stylesheet for {scope} is unavailable: {message}")]
    Unavailable { scope: String, message: String },
}

impl CssError {
    pub fn unavailable(scope: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            scope: scope.into(),
            message: message.into(),
        }
    }
}

/// Internal failures of the render pipeline. Callers of the public render
/// operations never see these; they are logged and degrade to empty output.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Store(#[from] RepoError),
    #[error(transparent)]
    Template(#[from] TemplateRenderError),
}

/// Startup failures (configuration and telemetry).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
}
