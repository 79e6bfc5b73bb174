//! Schema text rendering.
//!
//! Turns a merged [`Schema`] back into schema-language source. Output is a
//! pure function of the input: blocks appear in schema order, fields in
//! insertion order, and every optional fragment is either fully present or
//! omitted.
//!
//! # Example
//!
//! ```
//! use schema_mixer_core::*;
//!
//! let schema = Schema {
//!     models: vec![Model::new("User").with_field(Field::scalar("id", "Int").id())],
//!     ..Default::default()
//! };
//!
//! let text = render_schema(&schema).unwrap();
//! assert!(text.starts_with(GENERATED_BANNER));
//! assert!(text.contains("model User {\n  id Int @id\n}"));
//! ```

use thiserror::Error;

use crate::{
    BIG_INT_TYPE, ConfigEntry, ConfigValue, DataSource, DefaultValue, EnvValue, Field, FieldKind,
    GeneratorConfig, Literal, Model, Relation, Schema, SchemaEnum,
};

/// First line of every rendered document.
pub const GENERATED_BANNER: &str = "// *** GENERATED BY SCHEMA MIXER :: DO NOT EDIT ***";

const INDENT: &str = "  ";

/// Failures that make a schema impossible to re-render faithfully.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The field kind has no textual form the mixer can reproduce.
    #[error("unsupported field kind \"{kind}\" on {model}.{field}")]
    UnsupportedFieldKind {
        model: String,
        field: String,
        kind: FieldKind,
    },
    /// The default value shape could not be classified at load time.
    #[error("unsupported default value `{raw}` on {model}.{field}")]
    UnsupportedDefault {
        model: String,
        field: String,
        raw: String,
    },
}

/// Renders a complete schema document.
///
/// Sections appear in the order data sources, generators, models, enums,
/// after the [`GENERATED_BANNER`]. Blocks are separated by one blank line and
/// empty sections are omitted.
///
/// # Errors
///
/// Returns a [`RenderError`] as soon as a field cannot be rendered; no
/// partial output is produced.
pub fn render_schema(schema: &Schema) -> Result<String, RenderError> {
    let mut blocks = vec![GENERATED_BANNER.to_string()];
    blocks.extend(schema.datasources.iter().map(render_datasource));
    blocks.extend(schema.generators.iter().map(render_generator));
    for model in &schema.models {
        blocks.push(render_model(model)?);
    }
    blocks.extend(schema.enums.iter().map(render_enum));

    let mut out = blocks.join("\n\n");
    out.push('\n');
    Ok(out)
}

/// Renders one `model` (or `view`) block.
pub fn render_model(model: &Model) -> Result<String, RenderError> {
    let mut lines = Vec::new();

    for field in &model.fields {
        lines.extend(documentation_lines(field.documentation.as_deref()));
        lines.push(render_field(&model.name, field)?);
    }

    lines.extend(model.unique_indexes.iter().map(|index| {
        let mut args = vec![field_list(&index.fields)];
        if let Some(name) = &index.name {
            args.push(format!("name: {}", quote(name)));
        }
        format!("@@unique({})", args.join(", "))
    }));
    lines.extend(model.secondary_indexes.iter().cloned());
    if let Some(db_name) = model.db_name.as_deref().filter(|n| !n.is_empty()) {
        lines.push(format!("@@map({})", quote(db_name)));
    }
    if let Some(primary_key) = model.primary_key.as_ref().filter(|pk| !pk.fields.is_empty()) {
        let mut args = vec![field_list(&primary_key.fields)];
        if let Some(name) = &primary_key.name {
            args.push(format!("name: {}", quote(name)));
        }
        lines.push(format!("@@id({})", args.join(", ")));
    }

    let keyword = if model.is_view() { "view" } else { "model" };
    Ok(render_block(
        keyword,
        &model.name,
        lines,
        model.documentation.as_deref(),
    ))
}

/// Renders a single field line, without its documentation.
///
/// # Examples
///
/// ```
/// use schema_mixer_core::{Field, Relation, render_field};
///
/// let id = Field::scalar("id", "Int").id();
/// assert_eq!(render_field("Post", &id).unwrap(), "id Int @id");
///
/// let author = Field::object(
///     "author",
///     "Author",
///     Relation::named("PostToAuthor").with_link(["authorId"], ["id"]),
/// );
/// assert_eq!(
///     render_field("Post", &author).unwrap(),
///     r#"author Author @relation(name: "PostToAuthor", fields: [authorId], references: [id])"#
/// );
/// ```
pub fn render_field(model: &str, field: &Field) -> Result<String, RenderError> {
    if field.kind == FieldKind::Unsupported {
        return Err(RenderError::UnsupportedFieldKind {
            model: model.to_string(),
            field: field.name.clone(),
            kind: field.kind,
        });
    }

    let modifier = if field.is_list {
        "[]"
    } else if field.is_required {
        ""
    } else {
        "?"
    };

    let default = match &field.default {
        Some(default) => render_default(model, field, default)?,
        None => String::new(),
    };

    let attributes = [
        flag(field.is_id, "@id"),
        flag(field.is_unique, "@unique"),
        flag(field.is_updated_at, "@updatedAt"),
        field
            .column_name
            .as_deref()
            .map(|column| format!("@map({})", quote(column)))
            .unwrap_or_default(),
        default,
        field.native_type.clone().unwrap_or_default(),
        field
            .relation
            .as_ref()
            .map(render_relation)
            .unwrap_or_default(),
    ]
    .into_iter()
    .filter(|attr| !attr.is_empty())
    .collect::<Vec<_>>();

    let mut line = format!("{} {}{}", field.name, field.field_type, modifier);
    if !attributes.is_empty() {
        line.push(' ');
        line.push_str(&attributes.join(" "));
    }
    Ok(line)
}

fn flag(set: bool, attribute: &str) -> String {
    if set {
        attribute.to_string()
    } else {
        String::new()
    }
}

/// Renders the `@default(...)` attribute of a field.
///
/// String literals are quoted on scalar fields, except on `BigInt` fields.
/// `dbgenerated` always receives a quoted argument.
///
/// # Examples
///
/// ```
/// use schema_mixer_core::{DefaultValue, Field, render_default};
///
/// let field = Field::scalar("id", "BigInt");
/// let default = DefaultValue::function("dbgenerated", ["next_id()"]);
/// assert_eq!(
///     render_default("Post", &field, &default).unwrap(),
///     r#"@default(dbgenerated("next_id()"))"#
/// );
/// ```
pub fn render_default(
    model: &str,
    field: &Field,
    default: &DefaultValue,
) -> Result<String, RenderError> {
    let value = match default {
        DefaultValue::Literal {
            value: Literal::String(text),
        } => {
            if field.kind == FieldKind::Scalar && field.field_type != BIG_INT_TYPE {
                quote(text)
            } else {
                text.clone()
            }
        }
        DefaultValue::Literal {
            value: Literal::Number(number),
        } => number.clone(),
        DefaultValue::Literal {
            value: Literal::Boolean(value),
        } => value.to_string(),
        DefaultValue::EnumValue { value } => value.clone(),
        DefaultValue::Function { name, args } if name == "dbgenerated" => {
            format!("{name}({})", quote(&args.join(", ")))
        }
        DefaultValue::Function { name, args } => format!("{name}({})", args.join(", ")),
        DefaultValue::Unrecognized { raw } => {
            return Err(RenderError::UnsupportedDefault {
                model: model.to_string(),
                field: field.name.clone(),
                raw: raw.clone(),
            });
        }
    };
    Ok(format!("@default({value})"))
}

/// Renders a relation attribute. The inverse side (no link fields) only
/// carries the relation name.
pub fn render_relation(relation: &Relation) -> String {
    if relation.from_fields.is_empty() {
        if relation.name.is_empty() {
            return String::new();
        }
        return format!("@relation(name: {})", quote(&relation.name));
    }

    let mut args = vec![
        format!("name: {}", quote(&relation.name)),
        format!("fields: {}", field_list(&relation.from_fields)),
        format!("references: {}", field_list(&relation.to_fields)),
    ];
    if let Some(action) = relation.on_delete {
        args.push(format!("onDelete: {action}"));
    }
    if let Some(action) = relation.on_update {
        args.push(format!("onUpdate: {action}"));
    }
    if let Some(map) = &relation.map {
        args.push(format!("map: {}", quote(map)));
    }
    format!("@relation({})", args.join(", "))
}

/// Renders one `enum` block.
pub fn render_enum(schema_enum: &SchemaEnum) -> String {
    let mut lines: Vec<String> = schema_enum
        .values
        .iter()
        .map(|value| match value.db_name.as_deref() {
            Some(db_name) if db_name != value.name => {
                format!("{} @map({})", value.name, quote(db_name))
            }
            _ => value.name.clone(),
        })
        .collect();
    if let Some(db_name) = schema_enum.db_name.as_deref().filter(|n| !n.is_empty()) {
        lines.push(format!("@@map({})", quote(db_name)));
    }
    render_block(
        "enum",
        &schema_enum.name,
        lines,
        schema_enum.documentation.as_deref(),
    )
}

/// Renders one `datasource` block.
pub fn render_datasource(datasource: &DataSource) -> String {
    let mut lines = vec![format!("provider = {}", quote(&datasource.provider))];
    if let Some(url) = &datasource.url {
        lines.push(format!("url = {}", render_env_value(url)));
    }
    lines.extend(datasource.config.iter().map(render_config_entry));
    render_block("datasource", &datasource.name, lines, None)
}

/// Renders one `generator` block.
pub fn render_generator(generator: &GeneratorConfig) -> String {
    let mut lines = vec![format!(
        "provider = {}",
        render_env_value(&generator.provider)
    )];
    if let Some(output) = &generator.output {
        lines.push(format!("output = {}", render_env_value(output)));
    }
    lines.extend(generator.config.iter().map(render_config_entry));
    if !generator.binary_targets.is_empty() {
        lines.push(format!(
            "binaryTargets = {}",
            string_list(&generator.binary_targets)
        ));
    }
    if !generator.preview_features.is_empty() {
        lines.push(format!(
            "previewFeatures = {}",
            string_list(&generator.preview_features)
        ));
    }
    render_block("generator", &generator.name, lines, None)
}

fn render_env_value(value: &EnvValue) -> String {
    match value {
        EnvValue::Env(var) => format!("env({})", quote(var)),
        EnvValue::Value(value) => quote(value),
    }
}

fn render_config_entry(entry: &ConfigEntry) -> String {
    let value = match &entry.value {
        ConfigValue::String(value) => quote(value),
        ConfigValue::Env(var) => format!("env({})", quote(var)),
        ConfigValue::List(values) => string_list(values),
        ConfigValue::Raw(raw) => raw.clone(),
    };
    format!("{} = {value}", entry.key)
}

fn render_block(keyword: &str, name: &str, lines: Vec<String>, documentation: Option<&str>) -> String {
    let mut out = String::new();
    for doc in documentation_lines(documentation) {
        out.push_str(&doc);
        out.push('\n');
    }
    out.push_str(&format!("{keyword} {name} {{\n"));
    for line in lines.iter().filter(|line| !line.trim().is_empty()) {
        out.push_str(INDENT);
        out.push_str(line);
        out.push('\n');
    }
    out.push('}');
    out
}

fn documentation_lines(documentation: Option<&str>) -> Vec<String> {
    let Some(documentation) = documentation else {
        return Vec::new();
    };
    documentation
        .split('\n')
        .map(|line| {
            if line.is_empty() {
                "///".to_string()
            } else {
                format!("/// {line}")
            }
        })
        .collect()
}

fn field_list(fields: &[String]) -> String {
    format!("[{}]", fields.join(", "))
}

fn string_list(values: &[String]) -> String {
    let quoted: Vec<String> = values.iter().map(|v| quote(v)).collect();
    format!("[{}]", quoted.join(", "))
}

/// Wraps a value in double quotes, escaping backslashes, quotes and line
/// breaks.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}
