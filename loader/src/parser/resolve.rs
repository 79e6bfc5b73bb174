//! Resolves parsed blocks into core datamodel types.
//!
//! Resolution checks every field type against the built-in scalars and the
//! models and enums declared in the same text. Only the attributes the
//! datamodel carries are surfaced; storage annotations are left to the
//! attribute extractor.

use std::collections::HashMap;

use schema_mixer_core::{
    ConfigEntry, ConfigValue, DataSource, DefaultValue, EnumMember, EnvValue, Field, FieldKind,
    GeneratorConfig, Model, PrimaryKey, ReferentialAction, Relation, SCALAR_TYPES,
    SchemaEnum, UniqueIndex,
};
use tracing::debug;

use super::ast::{
    Arity, Attribute, Block, ConfigBlock, EnumBlock, Expr, FieldDecl, FieldType, ModelBlock,
};
use super::{ParseError, ParsedSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Declared {
    Model,
    Enum,
}

/// Resolves blocks into a [`ParsedSchema`].
pub fn resolve(blocks: Vec<Block>) -> Result<ParsedSchema, ParseError> {
    let declared = declared_types(&blocks)?;
    let mut parsed = ParsedSchema::default();

    for block in &blocks {
        match block {
            Block::Model(model) => parsed.models.push(resolve_model(model, &declared)?),
            Block::Enum(schema_enum) => parsed.enums.push(resolve_enum(schema_enum)),
            Block::Datasource(config) => parsed.datasources.push(resolve_datasource(config)?),
            Block::Generator(config) => parsed.generators.push(resolve_generator(config)?),
        }
    }

    Ok(parsed)
}

fn declared_types(blocks: &[Block]) -> Result<HashMap<&str, Declared>, ParseError> {
    let mut declared = HashMap::new();
    for block in blocks {
        let (name, kind, label, line) = match block {
            Block::Model(model) => (model.name.as_str(), Declared::Model, "model", model.line),
            Block::Enum(e) => (e.name.as_str(), Declared::Enum, "enum", e.line),
            Block::Datasource(_) | Block::Generator(_) => continue,
        };
        if declared.insert(name, kind).is_some() {
            return Err(ParseError::Duplicate {
                kind: label,
                name: name.to_string(),
                line,
            });
        }
    }
    Ok(declared)
}

fn resolve_model(
    block: &ModelBlock,
    declared: &HashMap<&str, Declared>,
) -> Result<Model, ParseError> {
    let mut model = Model::new(&block.name);
    model.documentation = block.documentation.clone();
    if block.is_view && !model.is_view() {
        debug!(name = %block.name, "view name lacks \"view\", it will be rendered as a model");
    }

    for decl in &block.fields {
        model.fields.push(resolve_field(block, decl, declared)?);
    }

    for attr in &block.attributes {
        match attr.name.as_str() {
            "map" => {
                model.db_name = attr.positional().and_then(Expr::as_str).map(str::to_string);
            }
            "unique" => {
                let fields = attr
                    .named("fields")
                    .or_else(|| attr.positional())
                    .map(field_names)
                    .unwrap_or_default();
                let mut index = UniqueIndex::new(fields);
                index.name = attr.named("name").and_then(Expr::as_str).map(str::to_string);
                model = model.with_unique_index(index);
            }
            "id" => {
                model.primary_key = Some(PrimaryKey {
                    name: attr.named("name").and_then(Expr::as_str).map(str::to_string),
                    fields: attr
                        .named("fields")
                        .or_else(|| attr.positional())
                        .map(field_names)
                        .unwrap_or_default(),
                });
            }
            _ => {}
        }
    }

    Ok(model)
}

fn resolve_field(
    block: &ModelBlock,
    decl: &FieldDecl,
    declared: &HashMap<&str, Declared>,
) -> Result<Field, ParseError> {
    let (kind, type_name) = match &decl.field_type {
        FieldType::Unsupported(_) => (FieldKind::Unsupported, decl.field_type.to_string()),
        FieldType::Named(name) if SCALAR_TYPES.contains(&name.as_str()) => {
            (FieldKind::Scalar, name.clone())
        }
        FieldType::Named(name) => match declared.get(name.as_str()) {
            Some(Declared::Model) => (FieldKind::Object, name.clone()),
            Some(Declared::Enum) => (FieldKind::Enum, name.clone()),
            None => {
                return Err(ParseError::UnknownType {
                    model: block.name.clone(),
                    field: decl.name.clone(),
                    type_name: name.clone(),
                    line: decl.line,
                });
            }
        },
    };

    let mut field = Field {
        name: decl.name.clone(),
        kind,
        field_type: type_name,
        is_list: decl.arity == Arity::List,
        is_required: decl.arity == Arity::Required,
        documentation: decl.documentation.clone(),
        ..Field::scalar(&decl.name, "")
    };

    for attr in &decl.attributes {
        match attr.name.as_str() {
            "id" => field.is_id = true,
            "unique" => field.is_unique = true,
            "updatedAt" => field.is_updated_at = true,
            "default" => {
                if let Some(value) = attr.positional() {
                    field.default = Some(resolve_default(value, kind));
                }
            }
            _ => {}
        }
    }

    if kind == FieldKind::Object {
        field.relation = Some(resolve_relation(
            &block.name,
            &field.field_type,
            decl.attribute("relation"),
        )?);
    }

    Ok(field)
}

/// Builds the relation descriptor of an object field. Without an explicit
/// name the relation is named after both models, sorted, joined by `To`.
fn resolve_relation(
    model: &str,
    target: &str,
    attr: Option<&Attribute>,
) -> Result<Relation, ParseError> {
    let explicit = attr.and_then(|attr| {
        attr.named("name")
            .or_else(|| attr.positional())
            .and_then(Expr::as_str)
    });
    let name = match explicit {
        Some(name) => name.to_string(),
        None => {
            let mut pair = [model, target];
            pair.sort_unstable();
            format!("{}To{}", pair[0], pair[1])
        }
    };

    let mut relation = Relation::named(name);
    let Some(attr) = attr else {
        return Ok(relation);
    };

    relation.from_fields = attr.named("fields").map(field_names).unwrap_or_default();
    relation.to_fields = attr.named("references").map(field_names).unwrap_or_default();
    if let Some(action) = attr.named("onDelete") {
        let parsed = action
            .to_string()
            .parse::<ReferentialAction>()
            .map_err(|err| ParseError::Syntax {
                line: attr.line,
                message: err.to_string(),
            })?;
        relation.on_delete = Some(parsed);
    }

    Ok(relation)
}

fn resolve_default(value: &Expr, kind: FieldKind) -> DefaultValue {
    match value {
        Expr::Str(text) => DefaultValue::string(text.clone()),
        Expr::Number(number) => DefaultValue::number(number.clone()),
        Expr::Ident(flag) if flag == "true" || flag == "false" => {
            DefaultValue::boolean(flag == "true")
        }
        Expr::Ident(name) if kind == FieldKind::Enum => DefaultValue::enum_value(name.clone()),
        Expr::Call { name, args } => DefaultValue::Function {
            name: name.clone(),
            args: args
                .iter()
                .map(|arg| match (&arg.name, &arg.value) {
                    (None, Expr::Str(text)) => text.clone(),
                    _ => arg.to_string(),
                })
                .collect(),
        },
        other => DefaultValue::Unrecognized {
            raw: other.to_string(),
        },
    }
}

fn resolve_enum(block: &EnumBlock) -> SchemaEnum {
    let values = block
        .values
        .iter()
        .map(|decl| {
            let mut member = EnumMember::new(&decl.name);
            member.db_name = map_argument(&decl.attributes);
            member
        })
        .collect();

    SchemaEnum {
        name: block.name.clone(),
        values,
        db_name: map_argument(&block.attributes),
        documentation: block.documentation.clone(),
    }
}

fn map_argument(attributes: &[Attribute]) -> Option<String> {
    attributes
        .iter()
        .find(|attr| attr.name == "map")
        .and_then(Attribute::positional)
        .and_then(Expr::as_str)
        .map(str::to_string)
}

fn resolve_datasource(block: &ConfigBlock) -> Result<DataSource, ParseError> {
    let provider = required_property(block, "datasource", "provider")?;
    let provider = match provider.as_str() {
        Some(provider) => provider.to_string(),
        None => {
            return Err(ParseError::Syntax {
                line: block.line,
                message: format!("datasource `{}` provider must be a string", block.name),
            });
        }
    };
    let url = block
        .property("url")
        .map(|p| env_value(&p.value, p.line))
        .transpose()?;

    Ok(DataSource {
        name: block.name.clone(),
        provider,
        url,
        config: config_entries(block, &["provider", "url"]),
    })
}

fn resolve_generator(block: &ConfigBlock) -> Result<GeneratorConfig, ParseError> {
    let provider = required_property(block, "generator", "provider")?;
    let provider = env_value(provider, block.line)?;
    let output = block
        .property("output")
        .map(|p| env_value(&p.value, p.line))
        .transpose()?;

    Ok(GeneratorConfig {
        name: block.name.clone(),
        provider,
        output,
        preview_features: string_list(block, "previewFeatures"),
        binary_targets: string_list(block, "binaryTargets"),
        config: config_entries(
            block,
            &["provider", "output", "previewFeatures", "binaryTargets"],
        ),
    })
}

fn required_property<'a>(
    block: &'a ConfigBlock,
    kind: &'static str,
    key: &'static str,
) -> Result<&'a Expr, ParseError> {
    block
        .property(key)
        .map(|p| &p.value)
        .ok_or_else(|| ParseError::MissingProperty {
            block: kind,
            name: block.name.clone(),
            property: key,
            line: block.line,
        })
}

fn env_value(value: &Expr, line: usize) -> Result<EnvValue, ParseError> {
    if let Some(var) = value.as_env() {
        return Ok(EnvValue::Env(var.to_string()));
    }
    match value.as_str() {
        Some(text) => Ok(EnvValue::Value(text.to_string())),
        None => Err(ParseError::Syntax {
            line,
            message: format!("expected a string or env(\"...\"), found {value}"),
        }),
    }
}

fn string_list(block: &ConfigBlock, key: &str) -> Vec<String> {
    match block.property(key).map(|p| &p.value) {
        Some(Expr::Array(items)) => items
            .iter()
            .map(|item| match item {
                Expr::Str(text) => text.clone(),
                other => other.to_string(),
            })
            .collect(),
        Some(Expr::Str(text)) => vec![text.clone()],
        _ => Vec::new(),
    }
}

fn config_entries(block: &ConfigBlock, known: &[&str]) -> Vec<ConfigEntry> {
    block
        .properties
        .iter()
        .filter(|p| !known.contains(&p.key.as_str()))
        .map(|p| ConfigEntry {
            key: p.key.clone(),
            value: config_value(&p.value),
        })
        .collect()
}

fn config_value(value: &Expr) -> ConfigValue {
    if let Some(var) = value.as_env() {
        return ConfigValue::Env(var.to_string());
    }
    match value {
        Expr::Str(text) => ConfigValue::String(text.clone()),
        Expr::Array(items) if items.iter().all(|item| item.as_str().is_some()) => {
            ConfigValue::List(items.iter().filter_map(Expr::as_str).map(str::to_string).collect())
        }
        other => ConfigValue::Raw(other.to_string()),
    }
}

/// Field names from a `[a, b(sort: Desc)]` list.
fn field_names(expr: &Expr) -> Vec<String> {
    match expr {
        Expr::Array(items) => items
            .iter()
            .map(|item| match item {
                Expr::Ident(name) | Expr::Call { name, .. } => name.clone(),
                other => other.to_string(),
            })
            .collect(),
        Expr::Ident(name) => vec![name.clone()],
        _ => Vec::new(),
    }
}
