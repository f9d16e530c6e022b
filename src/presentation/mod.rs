//! Markup fragments rendered through askama templates.

pub mod views;
