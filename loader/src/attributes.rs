//! Raw-text recovery of storage annotations.
//!
//! The structured parser does not surface column mappings, native database
//! types, relation update behavior, relation constraint names or secondary
//! indexes. They are recovered here by scanning each model block line by
//! line with a fixed pattern table.
//!
//! Extraction never fails: text it cannot place is skipped.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use schema_mixer_core::ReferentialAction;
use tracing::debug;

/// Annotations recovered for one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldAttributes {
    /// `@map("...")`.
    pub column_name: Option<String>,
    /// Full `@db.Type(args)` text.
    pub native_type: Option<String>,
    /// `onUpdate:` inside `@relation(...)`.
    pub on_update: Option<ReferentialAction>,
    /// `map:` inside `@relation(...)`.
    pub relation_map: Option<String>,
}

impl FieldAttributes {
    pub fn is_empty(&self) -> bool {
        self.column_name.is_none()
            && self.native_type.is_none()
            && self.on_update.is_none()
            && self.relation_map.is_none()
    }
}

/// Annotations recovered for one model, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelAttributes {
    pub fields: HashMap<String, FieldAttributes>,
    /// `@@index(...)` lines, verbatim, in source order.
    pub secondary_indexes: Vec<String>,
}

/// What a single model-body line contributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineAttributes {
    Field {
        name: String,
        attributes: FieldAttributes,
    },
    SecondaryIndex(String),
}

static PATTERNS: LazyLock<AttributePatterns> = LazyLock::new(AttributePatterns::new);

struct AttributePatterns {
    block_header: Regex,
    column_map: Regex,
    native_type: Regex,
    on_update: Regex,
    relation_map: Regex,
    secondary_index: Regex,
}

impl AttributePatterns {
    fn new() -> Self {
        Self {
            block_header: Regex::new(r"^\s*(?:model|view)\s+(?<name>\w+)\s*\{")
                .expect("static regex must compile"),
            // `[^@]` keeps `@@map` out.
            column_map: Regex::new(r#"[^@]@map\("(?<name>[^"]*)"\)"#)
                .expect("static regex must compile"),
            native_type: Regex::new(r"@db\.[^\s()]+(?:\([^)]+\))?")
                .expect("static regex must compile"),
            on_update: Regex::new(r"onUpdate:\s*(?<action>Cascade|NoAction|Restrict|SetDefault|SetNull)")
                .expect("static regex must compile"),
            relation_map: Regex::new(r#"\bmap:\s*"(?<name>[^"]*)""#)
                .expect("static regex must compile"),
            secondary_index: Regex::new(r"(@@index\(.*\))").expect("static regex must compile"),
        }
    }
}

/// Scans schema text and returns the annotations of every model and view,
/// keyed by model name.
///
/// # Examples
///
/// ```
/// use schema_mixer_loader::extract_attributes;
///
/// let source = "model User {\n  email String @map(\"email_address\") @db.VarChar(255)\n  @@index([email])\n}\n";
/// let attributes = extract_attributes(source);
///
/// let user = &attributes["User"];
/// let email = &user.fields["email"];
/// assert_eq!(email.column_name.as_deref(), Some("email_address"));
/// assert_eq!(email.native_type.as_deref(), Some("@db.VarChar(255)"));
/// assert_eq!(user.secondary_indexes, vec!["@@index([email])"]);
/// ```
pub fn extract_attributes(source: &str) -> HashMap<String, ModelAttributes> {
    let mut models: HashMap<String, ModelAttributes> = HashMap::new();

    for chunk in source.split("\n}") {
        let mut lines = chunk.lines();
        let Some(name) = lines.by_ref().find_map(block_name) else {
            if !chunk.trim().is_empty() {
                debug!("no model declaration in block, skipping");
            }
            continue;
        };

        let model = models.entry(name).or_default();
        for line in lines {
            match classify_line(line) {
                Some(LineAttributes::Field { name, attributes }) => {
                    model.fields.insert(name, attributes);
                }
                Some(LineAttributes::SecondaryIndex(index)) => {
                    model.secondary_indexes.push(index);
                }
                None => {}
            }
        }
    }

    models
}

fn block_name(line: &str) -> Option<String> {
    PATTERNS
        .block_header
        .captures(line)
        .map(|caps| caps["name"].to_string())
}

/// Classifies one line of a model body.
///
/// Returns `None` for blank lines, comments, lines without any recognized
/// annotation and block attributes other than `@@index`.
///
/// # Examples
///
/// ```
/// use schema_mixer_loader::{LineAttributes, classify_line};
///
/// let line = r#"  author User @relation(fields: [authorId], references: [id], onUpdate: Cascade, map: "fk_author")"#;
/// let Some(LineAttributes::Field { name, attributes }) = classify_line(line) else {
///     panic!("expected field attributes");
/// };
/// assert_eq!(name, "author");
/// assert_eq!(attributes.relation_map.as_deref(), Some("fk_author"));
///
/// assert_eq!(classify_line("  id Int @id"), None);
/// ```
pub fn classify_line(line: &str) -> Option<LineAttributes> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with("//") {
        return None;
    }

    if trimmed.starts_with("@@") {
        return PATTERNS
            .secondary_index
            .captures(trimmed)
            .map(|caps| LineAttributes::SecondaryIndex(caps[1].to_string()));
    }

    let name = trimmed.split_whitespace().next()?.to_string();
    // Relation arguments are only looked for inside `@relation(...)`.
    let relation = trimmed
        .find("@relation(")
        .map(|start| &trimmed[start..])
        .unwrap_or_default();

    let attributes = FieldAttributes {
        column_name: PATTERNS
            .column_map
            .captures(line)
            .map(|caps| caps["name"].to_string()),
        native_type: PATTERNS
            .native_type
            .find(trimmed)
            .map(|m| m.as_str().to_string()),
        on_update: PATTERNS
            .on_update
            .captures(relation)
            .and_then(|caps| caps["action"].parse().ok()),
        relation_map: PATTERNS
            .relation_map
            .captures(relation)
            .map(|caps| caps["name"].to_string()),
    };

    if attributes.is_empty() {
        None
    } else {
        Some(LineAttributes::Field { name, attributes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(line: &str) -> FieldAttributes {
        match classify_line(line) {
            Some(LineAttributes::Field { attributes, .. }) => attributes,
            other => panic!("expected field attributes, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_column_map_ignores_block_map() {
        assert_eq!(
            field(r#"  createdAt DateTime @map("created_at")"#).column_name.as_deref(),
            Some("created_at")
        );
        assert_eq!(classify_line(r#"  @@map("users")"#), None);
    }

    #[test]
    fn test_classify_column_map_stops_at_closing_quote() {
        let attrs = field(r#"  role String @map("role_name") @default("user")"#);
        assert_eq!(attrs.column_name.as_deref(), Some("role_name"));
    }

    #[test]
    fn test_classify_native_types() {
        assert_eq!(
            field("  price Decimal @db.Decimal(10, 2)").native_type.as_deref(),
            Some("@db.Decimal(10, 2)")
        );
        assert_eq!(
            field("  body String @db.Text").native_type.as_deref(),
            Some("@db.Text")
        );
    }

    #[test]
    fn test_classify_relation_arguments() {
        let attrs = field(
            r#"  author User @relation(fields: [authorId], references: [id], onDelete: Cascade, onUpdate: SetNull, map: "fk_post_author")"#,
        );
        assert_eq!(attrs.on_update, Some(ReferentialAction::SetNull));
        assert_eq!(attrs.relation_map.as_deref(), Some("fk_post_author"));
        assert_eq!(attrs.column_name, None);
    }

    #[test]
    fn test_classify_map_argument_outside_relation_is_ignored() {
        assert_eq!(
            classify_line(r#"  createdAt DateTime @default(now(), map: "df_created")"#),
            None
        );
    }

    #[test]
    fn test_classify_secondary_index() {
        assert_eq!(
            classify_line("  @@index([title, authorId], map: \"idx_title\")"),
            Some(LineAttributes::SecondaryIndex(
                "@@index([title, authorId], map: \"idx_title\")".to_string()
            ))
        );
        assert_eq!(classify_line("  @@unique([slug], map: \"uq_slug\")"), None);
    }

    #[test]
    fn test_classify_skips_comments_and_blank_lines() {
        assert_eq!(classify_line(""), None);
        assert_eq!(classify_line("   "), None);
        assert_eq!(classify_line(r#"  /// stored as @map("x")"#), None);
    }

    #[test]
    fn test_extract_attributes_per_model() {
        let source = r#"datasource db {
  provider = "postgresql"
  url      = env("DATABASE_URL")
}

model User {
  id    Int    @id
  email String @map("email_address")
  @@index([email])
}

view UserStats {
  userId Int @unique @map("user_id")
}

enum Role {
  USER @map("user")
}
"#;
        let attributes = extract_attributes(source);
        assert_eq!(attributes.len(), 2);
        assert_eq!(
            attributes["User"].fields["email"].column_name.as_deref(),
            Some("email_address")
        );
        assert!(!attributes["User"].fields.contains_key("id"));
        assert_eq!(attributes["User"].secondary_indexes, vec!["@@index([email])"]);
        assert_eq!(
            attributes["UserStats"].fields["userId"].column_name.as_deref(),
            Some("user_id")
        );
    }

    #[test]
    fn test_extract_attributes_on_text_without_models() {
        assert!(extract_attributes("// only a comment\n").is_empty());
        assert!(extract_attributes("").is_empty());
    }
}
