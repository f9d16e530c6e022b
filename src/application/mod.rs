//! Application services: the render pipeline and the components it drives.

pub mod assets;
pub mod collaborators;
pub mod context;
pub mod css;
pub mod elements;
pub mod error;
pub mod fonts;
pub mod frontend;
pub mod hooks;
