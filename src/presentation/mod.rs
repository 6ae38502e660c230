//! HTML output: templates, script-literal escaping, URL rewriting.

pub mod absolutize;
pub mod escape;
pub mod views;
