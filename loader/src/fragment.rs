//! Loading one schema file into an enriched [`Fragment`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use schema_mixer_core::{Fragment, Model};
use thiserror::Error;
use tracing::{debug, error};

use crate::attributes::{ModelAttributes, extract_attributes};
use crate::parser::{ParseError, SchemaParser};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: ParseError,
    },
}

/// Parses schema text and overlays the annotations recovered from the raw
/// text.
///
/// # Errors
///
/// Returns [`LoadError::Parse`] when the parser rejects the text.
///
/// # Examples
///
/// ```
/// use schema_mixer_loader::load_fragment_source;
/// use schema_mixer_loader::parser::PslParser;
///
/// let source = "model User {\n  id Int @id\n  createdAt DateTime @map(\"created_at\")\n}\n";
/// let fragment = load_fragment_source("user.prisma", source, &PslParser).unwrap();
///
/// let created = fragment.models[0].find_field("createdAt").unwrap();
/// assert_eq!(created.column_name.as_deref(), Some("created_at"));
/// ```
pub fn load_fragment_source(
    origin: &str,
    source: &str,
    parser: &dyn SchemaParser,
) -> Result<Fragment, LoadError> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let parsed = parser.parse(source).map_err(|source| LoadError::Parse {
        origin: origin.to_string(),
        source,
    })?;

    let mut models = parsed.models;
    apply_attributes(&mut models, &extract_attributes(source));
    debug!(
        origin,
        models = models.len(),
        enums = parsed.enums.len(),
        "loaded fragment"
    );

    Ok(Fragment {
        origin: origin.to_string(),
        models,
        enums: parsed.enums,
        datasources: parsed.datasources,
        generators: parsed.generators,
    })
}

/// Reads and loads one schema file.
///
/// A file that cannot be read or parsed is reported with `error!` and
/// dropped (`None`), so one bad fragment does not stop the others.
pub fn load_fragment(path: &Path, parser: &dyn SchemaParser) -> Option<Fragment> {
    match try_load_fragment(path, parser) {
        Ok(fragment) => Some(fragment),
        Err(err) => {
            error!(path = %path.display(), error = %err, "skipping schema fragment");
            None
        }
    }
}

fn try_load_fragment(path: &Path, parser: &dyn SchemaParser) -> Result<Fragment, LoadError> {
    let source = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_fragment_source(&path.display().to_string(), &source, parser)
}

/// Fills storage annotations the parser left empty. Relation arguments are
/// only applied to fields that carry a relation.
pub fn apply_attributes(models: &mut [Model], attributes: &HashMap<String, ModelAttributes>) {
    for model in models {
        let Some(recovered) = attributes.get(&model.name) else {
            continue;
        };

        for field in &mut model.fields {
            let Some(attrs) = recovered.fields.get(&field.name) else {
                continue;
            };
            if field.column_name.is_none() {
                field.column_name = attrs.column_name.clone();
            }
            if field.native_type.is_none() {
                field.native_type = attrs.native_type.clone();
            }
            if let Some(relation) = field.relation.as_mut() {
                if relation.on_update.is_none() {
                    relation.on_update = attrs.on_update;
                }
                if relation.map.is_none() {
                    relation.map = attrs.relation_map.clone();
                }
            }
        }

        model.secondary_indexes = recovered.secondary_indexes.clone();
    }
}
