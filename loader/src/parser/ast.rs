//! Syntax tree produced by the block parser.
//!
//! The tree mirrors the source closely: attribute arguments are kept as
//! unevaluated expressions and resolved later against the declared names.

use std::fmt;

use schema_mixer_core::quote;

/// An attribute argument or config value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Str(String),
    Number(String),
    Ident(String),
    Call { name: String, args: Vec<Argument> },
    Array(Vec<Expr>),
}

impl Expr {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the variable name of an `env("VAR")` call.
    pub fn as_env(&self) -> Option<&str> {
        match self {
            Self::Call { name, args } if name == "env" => match args.as_slice() {
                [Argument { name: None, value }] => value.as_str(),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(value) => f.write_str(&quote(value)),
            Self::Number(value) | Self::Ident(value) => f.write_str(value),
            Self::Call { name, args } => {
                let args: Vec<String> = args.iter().map(ToString::to_string).collect();
                write!(f, "{name}({})", args.join(", "))
            }
            Self::Array(items) => {
                let items: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", items.join(", "))
            }
        }
    }
}

/// A positional (`name: None`) or named argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub name: Option<String>,
    pub value: Expr,
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name}: {}", self.value),
            None => write!(f, "{}", self.value),
        }
    }
}

/// `@name(args)` on a field or `@@name(args)` on a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub args: Vec<Argument>,
    pub line: usize,
}

impl Attribute {
    /// First positional argument.
    pub fn positional(&self) -> Option<&Expr> {
        self.args
            .iter()
            .find(|arg| arg.name.is_none())
            .map(|arg| &arg.value)
    }

    pub fn named(&self, name: &str) -> Option<&Expr> {
        self.args
            .iter()
            .find(|arg| arg.name.as_deref() == Some(name))
            .map(|arg| &arg.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Required,
    Optional,
    List,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Named(String),
    /// `Unsupported("...")`, holding the database type text.
    Unsupported(String),
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Unsupported(db_type) => write!(f, "Unsupported({})", quote(db_type)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: String,
    pub field_type: FieldType,
    pub arity: Arity,
    pub attributes: Vec<Attribute>,
    pub documentation: Option<String>,
    pub line: usize,
}

impl FieldDecl {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| attr.name == name)
    }
}

/// A `model` or `view` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelBlock {
    pub name: String,
    pub is_view: bool,
    pub fields: Vec<FieldDecl>,
    pub attributes: Vec<Attribute>,
    pub documentation: Option<String>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValueDecl {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumBlock {
    pub name: String,
    pub values: Vec<EnumValueDecl>,
    pub attributes: Vec<Attribute>,
    pub documentation: Option<String>,
    pub line: usize,
}

/// `key = value` inside a `datasource` or `generator` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigProperty {
    pub key: String,
    pub value: Expr,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigBlock {
    pub name: String,
    pub properties: Vec<ConfigProperty>,
    pub line: usize,
}

impl ConfigBlock {
    pub fn property(&self, key: &str) -> Option<&ConfigProperty> {
        self.properties.iter().find(|p| p.key == key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Model(ModelBlock),
    Enum(EnumBlock),
    Datasource(ConfigBlock),
    Generator(ConfigBlock),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expr_display_reproduces_source_form() {
        let expr = Expr::Call {
            name: "dbgenerated".into(),
            args: vec![Argument {
                name: None,
                value: Expr::Str("gen_random_uuid()".into()),
            }],
        };
        assert_eq!(expr.to_string(), r#"dbgenerated("gen_random_uuid()")"#);

        let array = Expr::Array(vec![Expr::Ident("a".into()), Expr::Number("1".into())]);
        assert_eq!(array.to_string(), "[a, 1]");
    }

    #[test]
    fn test_expr_as_env() {
        let env = Expr::Call {
            name: "env".into(),
            args: vec![Argument {
                name: None,
                value: Expr::Str("DATABASE_URL".into()),
            }],
        };
        assert_eq!(env.as_env(), Some("DATABASE_URL"));
        assert_eq!(Expr::Str("DATABASE_URL".into()).as_env(), None);
    }

    #[test]
    fn test_attribute_argument_lookup() {
        let attr = Attribute {
            name: "relation".into(),
            args: vec![
                Argument {
                    name: None,
                    value: Expr::Str("PostToAuthor".into()),
                },
                Argument {
                    name: Some("fields".into()),
                    value: Expr::Array(vec![Expr::Ident("authorId".into())]),
                },
            ],
            line: 1,
        };
        assert_eq!(attr.positional(), Some(&Expr::Str("PostToAuthor".into())));
        assert!(attr.named("fields").is_some());
        assert!(attr.named("references").is_none());
    }
}
