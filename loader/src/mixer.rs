//! Running mixers: discover, load, merge, render, write.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use schema_mixer_core::{Fragment, RenderError, Schema, merge_fragments_with, render_schema};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::MixerConfig;
use crate::discover::{DiscoverError, resolve_inputs};
use crate::fragment::load_fragment;
use crate::parser::SchemaParser;

#[derive(Debug, Error)]
pub enum MixError {
    #[error(transparent)]
    Discover(#[from] DiscoverError),

    #[error("mixer `{mixer}` cannot render its schema: {source}")]
    Render {
        mixer: String,
        #[source]
        source: RenderError,
    },

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result of one mixer run.
#[derive(Debug, Clone)]
pub struct MixOutcome {
    pub name: String,
    /// Output path, resolved against the project root.
    pub output: PathBuf,
    /// Input files in merge order, including ones that failed to load.
    pub inputs: Vec<PathBuf>,
    /// Number of fragments that loaded and took part in the merge.
    pub fragments: usize,
    pub schema: Schema,
    pub rendered: String,
}

/// Whether [`run_all`] writes the rendered schemas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MixMode {
    #[default]
    Write,
    /// Render only; the output files are left untouched.
    DryRun,
}

/// Loads schema files in parallel, keeping input order and dropping files
/// that fail to load.
pub fn load_fragments(paths: &[PathBuf], parser: &dyn SchemaParser) -> Vec<Fragment> {
    let loaded: Vec<Option<Fragment>> = paths
        .par_iter()
        .map(|path| load_fragment(path, parser))
        .collect();
    loaded.into_iter().flatten().collect()
}

/// Runs one mixer without writing its output.
///
/// # Errors
///
/// Returns [`MixError::Discover`] for a bad input pattern and
/// [`MixError::Render`] when the merged schema cannot be rendered.
pub fn mix_schema(
    mixer: &MixerConfig,
    root: &Path,
    parser: &dyn SchemaParser,
) -> Result<MixOutcome, MixError> {
    let output = root.join(&mixer.output);
    let inputs = resolve_inputs(&mixer.input, root, &[PathBuf::from(&mixer.output)])?;
    if inputs.is_empty() {
        warn!(mixer = mixer.label(), "no input files found");
    }

    let fragments = load_fragments(&inputs, parser);
    let schema = merge_fragments_with(&fragments, mixer.merge_options());
    let rendered = render_schema(&schema).map_err(|source| MixError::Render {
        mixer: mixer.label().to_string(),
        source,
    })?;

    Ok(MixOutcome {
        name: mixer.label().to_string(),
        output,
        inputs,
        fragments: fragments.len(),
        schema,
        rendered,
    })
}

/// Runs one mixer and writes the rendered schema, creating parent
/// directories as needed. Nothing is written when rendering fails.
pub fn run_mixer(
    mixer: &MixerConfig,
    root: &Path,
    parser: &dyn SchemaParser,
) -> Result<MixOutcome, MixError> {
    let outcome = mix_schema(mixer, root, parser)?;

    let io_error = |source| MixError::Io {
        path: outcome.output.clone(),
        source,
    };
    if let Some(parent) = outcome.output.parent() {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    std::fs::write(&outcome.output, &outcome.rendered).map_err(io_error)?;

    info!(
        mixer = %outcome.name,
        fragments = outcome.fragments,
        models = outcome.schema.models.len(),
        output = %outcome.output.display(),
        "wrote schema"
    );
    Ok(outcome)
}

/// Runs mixers one after another. A failing mixer is logged and does not
/// stop the others.
///
/// Use [`MixerFile::select`](crate::MixerFile::select) to pick the mixers.
pub fn run_all(
    mixers: &[&MixerConfig],
    root: &Path,
    parser: &dyn SchemaParser,
    mode: MixMode,
) -> Vec<(String, Result<MixOutcome, MixError>)> {
    mixers
        .iter()
        .map(|mixer| {
            let result = match mode {
                MixMode::Write => run_mixer(mixer, root, parser),
                MixMode::DryRun => mix_schema(mixer, root, parser),
            };
            if let Err(err) = &result {
                warn!(mixer = mixer.label(), error = %err, "mixer failed");
            }
            (mixer.label().to_string(), result)
        })
        .collect()
}
