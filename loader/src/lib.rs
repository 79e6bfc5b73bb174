//! Loading side of schema mixing: parsing schema files, recovering storage
//! annotations, discovering inputs and running configured mixers.
//!
//! The pipeline for one mixer is:
//!
//! 1. [`resolve_inputs`] expands the configured patterns into files.
//! 2. [`load_fragment`] parses each file with a [`parser::SchemaParser`]
//!    and overlays what [`extract_attributes`] recovers from the raw text.
//! 3. The fragments are merged and rendered by `schema_mixer_core`.
//!
//! [`run_mixer`] runs all three and writes the result; [`run_all`] does so
//! for a selection of configured mixers.

mod attributes;
mod config;
mod discover;
mod fragment;
mod mixer;
pub mod parser;

pub use attributes::{
    FieldAttributes, LineAttributes, ModelAttributes, classify_line, extract_attributes,
};
pub use config::{CONFIG_FILE_NAMES, ConfigError, MixerConfig, MixerFile};
pub use discover::{
    DiscoverError, ENTRY_FILE_NAME, IGNORED_SUFFIX, SCHEMA_EXTENSION, is_schema_file,
    resolve_inputs, scan_directory,
};
pub use fragment::{LoadError, apply_attributes, load_fragment, load_fragment_source};
pub use mixer::{MixError, MixMode, MixOutcome, load_fragments, mix_schema, run_all, run_mixer};
pub use parser::{ParseError, ParsedSchema, PslParser, SchemaParser};
