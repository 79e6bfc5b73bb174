//! Core datamodel types, merge engine and renderer for schema mixing.
//!
//! This crate defines the in-memory representation of Prisma schema
//! fragments and the pure parts of the mixing pipeline:
//!
//! - [`Fragment`] — one parsed and enriched input file (models, enums, data
//!   sources, generators).
//! - [`Model`] / [`Field`] — record types and their fields, including the
//!   storage annotations recovered from raw text.
//! - [`merge_fragments`] — left-to-right fold of fragments into one
//!   [`Schema`], merging same-named models field by field.
//! - [`select_datasources`], [`select_generators`], [`select_enums`] — the
//!   named "which declaration wins" policies.
//! - [`render_schema`] — deterministic schema text output.
//!
//! # Example
//!
//! ```
//! use schema_mixer_core::*;
//!
//! let users = Fragment::new("users.prisma")
//!     .with_model(Model::new("User").with_field(Field::scalar("id", "Int").id()));
//! let profiles = Fragment::new("profiles.prisma").with_model(
//!     Model::new("User").with_field(Field::scalar("bio", "String").optional()),
//! );
//!
//! let schema = merge_fragments(&[users, profiles]);
//! let text = render_schema(&schema).unwrap();
//! assert!(text.contains("model User {\n  id Int @id\n  bio String?\n}"));
//! ```

mod merge;
mod render;
mod select;
mod types;

pub use merge::{MergeOptions, fold_model, merge_fragments, merge_fragments_with, merge_model};
pub use render::{
    GENERATED_BANNER, RenderError, quote, render_datasource, render_default, render_enum,
    render_field, render_generator, render_model, render_relation, render_schema,
};
pub use select::{DatasourceSelection, select_datasources, select_enums, select_generators};
pub use types::*;
