//! Structured schema parser.
//!
//! Parsing runs in three stages: [`lexer`] turns text into line-tagged tokens,
//! [`grammar`] builds a syntax tree of blocks, and [`resolve`] checks type
//! references and produces the core datamodel.
//!
//! The loader only depends on the [`SchemaParser`] trait, so another parser
//! can be swapped in without touching the merge pipeline.
//!
//! # Example
//!
//! ```
//! use schema_mixer_loader::parser::{PslParser, SchemaParser};
//!
//! let parsed = PslParser
//!     .parse("model User {\n  id Int @id\n  email String @unique\n}\n")
//!     .unwrap();
//! assert_eq!(parsed.models[0].field_names(), vec!["id", "email"]);
//! ```

pub mod ast;
pub mod grammar;
pub mod lexer;
pub mod resolve;

use schema_mixer_core::{DataSource, GeneratorConfig, Model, SchemaEnum};
use thiserror::Error;

pub use lexer::{Lexer, Token, TokenKind};

/// Datamodel and configuration blocks of one schema text, in declaration
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSchema {
    pub models: Vec<Model>,
    pub enums: Vec<SchemaEnum>,
    pub datasources: Vec<DataSource>,
    pub generators: Vec<GeneratorConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("line {line}: unsupported block type `{keyword}`")]
    UnsupportedBlock { keyword: String, line: usize },

    /// A field references a type that is neither built in nor declared in
    /// the same text.
    #[error("line {line}: type `{type_name}` of field {model}.{field} is not declared")]
    UnknownType {
        model: String,
        field: String,
        type_name: String,
        line: usize,
    },

    #[error("line {line}: {kind} `{name}` is declared more than once")]
    Duplicate {
        kind: &'static str,
        name: String,
        line: usize,
    },

    #[error("line {line}: {block} `{name}` has no `{property}`")]
    MissingProperty {
        block: &'static str,
        name: String,
        property: &'static str,
        line: usize,
    },
}

/// Turns schema text into a [`ParsedSchema`].
pub trait SchemaParser: Send + Sync {
    fn parse(&self, source: &str) -> Result<ParsedSchema, ParseError>;
}

/// The built-in parser for the Prisma schema language.
#[derive(Debug, Clone, Copy, Default)]
pub struct PslParser;

impl SchemaParser for PslParser {
    fn parse(&self, source: &str) -> Result<ParsedSchema, ParseError> {
        let tokens = Lexer::tokenize(source)?;
        let blocks = grammar::parse_blocks(&tokens)?;
        resolve::resolve(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_source() {
        let parsed = PslParser.parse("// nothing here\n\n").unwrap();
        assert_eq!(parsed, ParsedSchema::default());
    }

    #[test]
    fn test_parser_is_object_safe() {
        let parser: Box<dyn SchemaParser> = Box::new(PslParser);
        let parsed = parser.parse("enum Role {\n  USER\n}").unwrap();
        assert_eq!(parsed.enums[0].name, "Role");
    }

    #[test]
    fn test_parse_error_messages_include_line() {
        let err = PslParser.parse("model A {\n  b Missing\n}").unwrap_err();
        assert_eq!(
            err.to_string(),
            "line 2: type `Missing` of field A.b is not declared"
        );
    }
}
