//! Frontend render pipeline for page-builder element trees.
//!
//! The crate turns a stored tree of element descriptors into page markup,
//! keeps stylesheet and script registration idempotent across render passes,
//! batches webfont requests, and switches the "currently rendering entity"
//! safely when one entity embeds another.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;

use std::path::Path;

use application::error::AppError;

/// Load settings and install the tracing subscriber.
pub fn bootstrap(config_file: Option<&Path>) -> Result<config::Settings, AppError> {
    let settings = config::load(config_file)?;
    infra::telemetry::init(&settings.logging)?;
    Ok(settings)
}
