//! Fragment merging with deterministic conflict resolution.
//!
//! Fragments are folded strictly left to right. Models are keyed by name and
//! merged field by field; enums, data sources and generators are chosen by the
//! named policies in [`select`](crate::select).
//!
//! # Example
//!
//! ```
//! use schema_mixer_core::*;
//!
//! let base = Fragment::new("base.prisma").with_model(
//!     Model::new("User").with_field(Field::scalar("id", "Int").id()),
//! );
//! let feature = Fragment::new("posts.prisma").with_model(
//!     Model::new("User").with_field(Field::scalar("handle", "String").unique()),
//! );
//!
//! let merged = merge_fragments(&[base, feature]);
//! assert_eq!(merged.models.len(), 1);
//! assert_eq!(merged.models[0].field_names(), vec!["id", "handle"]);
//! ```

use tracing::debug;

use crate::select::{DatasourceSelection, select_datasources, select_enums, select_generators};
use crate::{Field, Fragment, Model, Schema};

/// Knobs for [`merge_fragments_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOptions {
    /// Which usable data-source list wins.
    pub datasource_selection: DatasourceSelection,
}

/// Merges fragments with the default [`MergeOptions`].
pub fn merge_fragments(fragments: &[Fragment]) -> Schema {
    merge_fragments_with(fragments, MergeOptions::default())
}

/// Merges fragments, in order, into one consolidated [`Schema`].
///
/// Model order is first-seen order; field order is insertion order.
pub fn merge_fragments_with(fragments: &[Fragment], options: MergeOptions) -> Schema {
    let models = fragments
        .iter()
        .flat_map(|fragment| fragment.models.iter())
        .fold(Vec::new(), fold_model);

    Schema {
        models,
        enums: select_enums(fragments),
        datasources: select_datasources(fragments, options.datasource_selection),
        generators: select_generators(fragments),
    }
}

/// One step of the model fold: returns the accumulated models with
/// `incoming` merged in.
///
/// # Examples
///
/// ```
/// use schema_mixer_core::{Field, Model, fold_model};
///
/// let a = Model::new("Post").with_field(Field::scalar("id", "Int").id());
/// let b = Model::new("Tag").with_field(Field::scalar("id", "Int").id());
///
/// let models = [a, b].iter().fold(Vec::new(), fold_model);
/// assert_eq!(models.len(), 2);
/// ```
pub fn fold_model(mut acc: Vec<Model>, incoming: &Model) -> Vec<Model> {
    match acc.iter().position(|m| m.name == incoming.name) {
        Some(index) => {
            let existing = std::mem::take(&mut acc[index]);
            acc[index] = merge_model(existing, incoming);
        }
        None => acc.push(incoming.clone()),
    }
    acc
}

/// Merges a later declaration of a model into an earlier one.
pub fn merge_model(existing: Model, incoming: &Model) -> Model {
    debug!(model = %incoming.name, "merging model declaration");

    let mut merged = existing;

    for field in &incoming.fields {
        match merged.fields.iter().position(|f| f.name == field.name) {
            Some(index) => {
                merged.fields[index] = merge_field(&merged.fields[index], field);
            }
            None => merged.fields.push(field.clone()),
        }
    }

    if merged.db_name.as_deref().is_none_or(str::is_empty) {
        if let Some(db_name) = incoming.db_name.as_deref().filter(|n| !n.is_empty()) {
            merged.db_name = Some(db_name.to_string());
        }
    }

    merged
        .secondary_indexes
        .extend(incoming.secondary_indexes.iter().cloned());

    for index in &incoming.unique_indexes {
        if merged.unique_indexes.contains(index) {
            debug!(
                model = %merged.name,
                fields = ?index.fields,
                "unique index already present, skipping"
            );
            continue;
        }
        debug!(model = %merged.name, fields = ?index.fields, "adding unique index");
        merged.unique_indexes.push(index.clone());
        merged.unique_fields.push(index.fields.clone());
    }

    merged
}

/// The later field wins wholesale, except that it inherits the earlier
/// column mapping and default when it declares none.
fn merge_field(previous: &Field, incoming: &Field) -> Field {
    let mut merged = incoming.clone();
    if merged.column_name.is_none() {
        merged.column_name = previous.column_name.clone();
    }
    if merged.default.is_none() {
        merged.default = previous.default.clone();
    }
    merged
}
