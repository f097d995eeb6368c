//! Prompt Builder
//!
//! Instruction texts for the three completion jobs (planning, repair,
//! enrichment) plus the loader that lets deployments override them from
//! files without rebuilding.

pub mod embedded;
mod loader;

pub use loader::{PromptError, PromptLoader};
