//! Datamodel type definitions for schema fragments and merged schemas.
//!
//! These types mirror the structured description a Prisma schema parser
//! produces (models, fields, enums, data sources, generators), extended with
//! the storage annotations recovered from raw text: column mappings, native
//! column types, relation update behavior, relation mappings and secondary
//! indexes. All types serialize with [`serde`] so a merged schema can be
//! dumped as JSON or YAML.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Built-in scalar type names of the schema language.
pub const SCALAR_TYPES: &[&str] = &[
    "String", "Boolean", "Int", "BigInt", "Float", "Decimal", "DateTime", "Json", "Bytes",
];

/// The unbounded-integer scalar type. String defaults on fields of this type
/// render unquoted.
pub const BIG_INT_TYPE: &str = "BigInt";

/// Kind of a model field.
///
/// # Examples
///
/// ```
/// use schema_mixer_core::FieldKind;
///
/// assert_eq!(FieldKind::default(), FieldKind::Scalar);
/// assert_eq!(FieldKind::Object.as_str(), "object");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Built-in scalar (`String`, `Int`, ...).
    #[default]
    Scalar,
    /// Reference to another model.
    Object,
    /// Reference to an enum.
    Enum,
    /// `Unsupported("...")` database type. Cannot be re-rendered.
    Unsupported,
}

impl FieldKind {
    /// Returns the lowercase label used in diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Object => "object",
            Self::Enum => "enum",
            Self::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Behavior of a relation when the referenced row is deleted or updated.
///
/// # Examples
///
/// ```
/// use schema_mixer_core::ReferentialAction;
///
/// let action: ReferentialAction = "SetNull".parse().unwrap();
/// assert_eq!(action, ReferentialAction::SetNull);
/// assert_eq!(action.to_string(), "SetNull");
/// assert!("Explode".parse::<ReferentialAction>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferentialAction {
    Cascade,
    Restrict,
    NoAction,
    SetNull,
    SetDefault,
}

impl ReferentialAction {
    /// All actions, in the order the schema language documents them.
    pub const ALL: [ReferentialAction; 5] = [
        Self::Cascade,
        Self::Restrict,
        Self::NoAction,
        Self::SetNull,
        Self::SetDefault,
    ];

    /// Returns the keyword as written in schema text.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cascade => "Cascade",
            Self::Restrict => "Restrict",
            Self::NoAction => "NoAction",
            Self::SetNull => "SetNull",
            Self::SetDefault => "SetDefault",
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a [`ReferentialAction`] keyword.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown referential action: {0}")]
pub struct UnknownReferentialAction(pub String);

impl FromStr for ReferentialAction {
    type Err = UnknownReferentialAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| UnknownReferentialAction(s.to_string()))
    }
}

/// Scalar literal used as a default value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Literal {
    /// String literal, stored unescaped.
    String(String),
    /// Numeric literal, stored as written.
    Number(String),
    Boolean(bool),
}

/// Default value of a field, classified once at load time.
///
/// # Examples
///
/// ```
/// use schema_mixer_core::DefaultValue;
///
/// let default = DefaultValue::function("dbgenerated", ["next_id()"]);
/// assert!(matches!(default, DefaultValue::Function { ref name, .. } if name == "dbgenerated"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DefaultValue {
    /// A string, number or boolean literal.
    Literal { value: Literal },
    /// An enum member name.
    EnumValue { value: String },
    /// A function call such as `autoincrement()` or `dbgenerated("...")`.
    /// String arguments are stored without their quotes.
    Function { name: String, args: Vec<String> },
    /// Any shape the loader could not classify (for example list defaults).
    Unrecognized { raw: String },
}

impl DefaultValue {
    /// Shorthand for a string literal default.
    pub fn string(value: impl Into<String>) -> Self {
        Self::Literal {
            value: Literal::String(value.into()),
        }
    }

    /// Shorthand for a numeric literal default.
    pub fn number(value: impl Into<String>) -> Self {
        Self::Literal {
            value: Literal::Number(value.into()),
        }
    }

    /// Shorthand for a boolean literal default.
    pub fn boolean(value: bool) -> Self {
        Self::Literal {
            value: Literal::Boolean(value),
        }
    }

    /// Shorthand for an enum member default.
    pub fn enum_value(value: impl Into<String>) -> Self {
        Self::EnumValue {
            value: value.into(),
        }
    }

    /// Shorthand for a function-call default.
    pub fn function<I, S>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Function {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// Relation descriptor of an object field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// Relation name (explicit or derived from the two model names).
    pub name: String,
    /// Local fields holding the foreign key. Empty on the inverse side.
    pub from_fields: Vec<String>,
    /// Referenced fields on the related model.
    pub to_fields: Vec<String>,
    pub on_delete: Option<ReferentialAction>,
    /// Recovered from raw text; the structured parser does not surface it.
    pub on_update: Option<ReferentialAction>,
    /// Foreign key constraint name, recovered from raw text.
    pub map: Option<String>,
}

impl Relation {
    /// Creates a named relation without link fields (the inverse side).
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets the local and referenced link fields.
    pub fn with_link<A, B>(mut self, from_fields: A, to_fields: B) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        B: IntoIterator,
        B::Item: Into<String>,
    {
        self.from_fields = from_fields.into_iter().map(Into::into).collect();
        self.to_fields = to_fields.into_iter().map(Into::into).collect();
        self
    }
}

/// A field of a model.
///
/// Use the kind constructors [`scalar`](Field::scalar),
/// [`enum_ref`](Field::enum_ref) and [`object`](Field::object), then chain
/// builder methods.
///
/// # Examples
///
/// ```
/// use schema_mixer_core::{DefaultValue, Field, FieldKind};
///
/// let id = Field::scalar("id", "Int")
///     .id()
///     .with_default(DefaultValue::function("autoincrement", Vec::<String>::new()));
/// assert_eq!(id.kind, FieldKind::Scalar);
/// assert!(id.is_id);
/// assert!(id.has_default_value());
///
/// let bio = Field::scalar("bio", "String").optional();
/// assert!(!bio.is_required);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    /// Declared type name (`Int`, `User`, `Role`, ...).
    pub field_type: String,
    pub is_list: bool,
    pub is_required: bool,
    pub default: Option<DefaultValue>,
    pub is_unique: bool,
    pub is_id: bool,
    pub is_updated_at: bool,
    /// Storage column name (`@map`).
    pub column_name: Option<String>,
    /// Native column type annotation, as written (`@db.VarChar(255)`).
    pub native_type: Option<String>,
    pub relation: Option<Relation>,
    pub documentation: Option<String>,
}

impl Field {
    fn new(name: &str, kind: FieldKind, field_type: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            field_type: field_type.to_string(),
            is_list: false,
            is_required: true,
            default: None,
            is_unique: false,
            is_id: false,
            is_updated_at: false,
            column_name: None,
            native_type: None,
            relation: None,
            documentation: None,
        }
    }

    /// Creates a required scalar field.
    pub fn scalar(name: &str, field_type: &str) -> Self {
        Self::new(name, FieldKind::Scalar, field_type)
    }

    /// Creates a required enum field.
    pub fn enum_ref(name: &str, enum_name: &str) -> Self {
        Self::new(name, FieldKind::Enum, enum_name)
    }

    /// Creates a required object (relation) field.
    pub fn object(name: &str, model: &str, relation: Relation) -> Self {
        let mut field = Self::new(name, FieldKind::Object, model);
        field.relation = Some(relation);
        field
    }

    /// Marks the field optional (`Type?`).
    pub fn optional(mut self) -> Self {
        self.is_required = false;
        self
    }

    /// Marks the field as a list (`Type[]`).
    pub fn list(mut self) -> Self {
        self.is_list = true;
        self
    }

    /// Marks the field as the model identity (`@id`).
    pub fn id(mut self) -> Self {
        self.is_id = true;
        self
    }

    /// Marks the field unique (`@unique`).
    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    /// Marks the field as an auto-update timestamp (`@updatedAt`).
    pub fn updated_at(mut self) -> Self {
        self.is_updated_at = true;
        self
    }

    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_column_name(mut self, column: &str) -> Self {
        self.column_name = Some(column.to_string());
        self
    }

    pub fn with_native_type(mut self, native_type: &str) -> Self {
        self.native_type = Some(native_type.to_string());
        self
    }

    pub fn with_documentation(mut self, doc: &str) -> Self {
        self.documentation = Some(doc.to_string());
        self
    }

    /// Returns `true` when the field declares a default value.
    pub fn has_default_value(&self) -> bool {
        self.default.is_some()
    }
}

/// A `@@unique` declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueIndex {
    pub name: Option<String>,
    pub fields: Vec<String>,
}

impl UniqueIndex {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: None,
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }
}

/// A composite `@@id` declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKey {
    pub name: Option<String>,
    pub fields: Vec<String>,
}

/// A named record type (`model` or `view` block).
///
/// # Examples
///
/// ```
/// use schema_mixer_core::{Field, Model};
///
/// let user = Model::new("User")
///     .with_field(Field::scalar("id", "Int").id())
///     .with_field(Field::scalar("email", "String").unique());
///
/// assert_eq!(user.field_names(), vec!["id", "email"]);
/// assert!(user.find_field("email").is_some());
/// assert!(!user.is_view());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    pub fields: Vec<Field>,
    /// Storage table name (`@@map`).
    pub db_name: Option<String>,
    pub unique_indexes: Vec<UniqueIndex>,
    /// Field lists of the unique indexes, kept alongside them.
    pub unique_fields: Vec<Vec<String>>,
    /// Raw `@@index(...)` declarations recovered from source text.
    pub secondary_indexes: Vec<String>,
    pub primary_key: Option<PrimaryKey>,
    pub documentation: Option<String>,
}

impl Model {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Appends a field.
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Appends a unique index and its field list.
    pub fn with_unique_index(mut self, index: UniqueIndex) -> Self {
        self.unique_fields.push(index.fields.clone());
        self.unique_indexes.push(index);
        self
    }

    pub fn with_db_name(mut self, db_name: &str) -> Self {
        self.db_name = Some(db_name.to_string());
        self
    }

    /// Finds a field by exact name.
    pub fn find_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns field names in declaration order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Returns `true` when the model renders as a `view` block.
    ///
    /// The check is a literal, case-sensitive substring match on `"view"`, so
    /// `"userview"` is a view while `"UserView"` and `"Viewer"` are models.
    pub fn is_view(&self) -> bool {
        self.name.contains("view")
    }
}

/// A member of an enum.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumMember {
    pub name: String,
    /// Storage value (`@map`).
    pub db_name: Option<String>,
}

impl EnumMember {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            db_name: None,
        }
    }
}

/// An `enum` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaEnum {
    pub name: String,
    pub values: Vec<EnumMember>,
    pub db_name: Option<String>,
    pub documentation: Option<String>,
}

impl SchemaEnum {
    /// Creates an enum with plain (unmapped) members.
    ///
    /// # Examples
    ///
    /// ```
    /// use schema_mixer_core::SchemaEnum;
    ///
    /// let role = SchemaEnum::new("Role", ["USER", "ADMIN"]);
    /// assert_eq!(role.values.len(), 2);
    /// assert_eq!(role.values[1].name, "ADMIN");
    /// ```
    pub fn new<I, S>(name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: name.to_string(),
            values: values
                .into_iter()
                .map(|v| EnumMember::new(v.as_ref()))
                .collect(),
            db_name: None,
            documentation: None,
        }
    }
}

/// A configuration value that is either read from the environment or given
/// literally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvValue {
    /// `env("VAR")`
    Env(String),
    /// `"literal"`
    Value(String),
}

impl EnvValue {
    /// Returns `true` when the value points somewhere: a non-empty literal or
    /// a named environment variable.
    ///
    /// # Examples
    ///
    /// ```
    /// use schema_mixer_core::EnvValue;
    ///
    /// assert!(EnvValue::Env("DATABASE_URL".into()).is_resolvable());
    /// assert!(EnvValue::Value("file:./dev.db".into()).is_resolvable());
    /// assert!(!EnvValue::Value(String::new()).is_resolvable());
    /// ```
    pub fn is_resolvable(&self) -> bool {
        match self {
            Self::Env(var) => !var.trim().is_empty(),
            Self::Value(value) => !value.is_empty(),
        }
    }
}

/// Value of a free-form configuration key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigValue {
    String(String),
    Env(String),
    List(Vec<String>),
    /// Any other expression, kept as written.
    Raw(String),
}

/// A `key = value` line of a data source or generator block that has no
/// dedicated field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: ConfigValue,
}

/// A `datasource` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSource {
    pub name: String,
    pub provider: String,
    pub url: Option<EnvValue>,
    pub config: Vec<ConfigEntry>,
}

impl DataSource {
    pub fn new(name: &str, provider: &str, url: EnvValue) -> Self {
        Self {
            name: name.to_string(),
            provider: provider.to_string(),
            url: Some(url),
            config: Vec::new(),
        }
    }

    /// Returns `true` when the data source has a resolvable connection URL.
    pub fn is_usable(&self) -> bool {
        self.url.as_ref().is_some_and(EnvValue::is_resolvable)
    }
}

/// A `generator` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub name: String,
    pub provider: EnvValue,
    pub output: Option<EnvValue>,
    pub preview_features: Vec<String>,
    pub binary_targets: Vec<String>,
    pub config: Vec<ConfigEntry>,
}

impl GeneratorConfig {
    pub fn new(name: &str, provider: &str) -> Self {
        Self {
            name: name.to_string(),
            provider: EnvValue::Value(provider.to_string()),
            output: None,
            preview_features: Vec::new(),
            binary_targets: Vec::new(),
            config: Vec::new(),
        }
    }
}

/// One parsed and enriched input unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    /// Where the fragment came from (usually a file path), for diagnostics.
    pub origin: String,
    pub models: Vec<Model>,
    pub enums: Vec<SchemaEnum>,
    pub datasources: Vec<DataSource>,
    pub generators: Vec<GeneratorConfig>,
}

impl Fragment {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: Model) -> Self {
        self.models.push(model);
        self
    }

    pub fn with_enum(mut self, schema_enum: SchemaEnum) -> Self {
        self.enums.push(schema_enum);
        self
    }

    pub fn with_datasource(mut self, datasource: DataSource) -> Self {
        self.datasources.push(datasource);
        self
    }

    pub fn with_generator(mut self, generator: GeneratorConfig) -> Self {
        self.generators.push(generator);
        self
    }
}

/// The consolidated result of merging fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub models: Vec<Model>,
    pub enums: Vec<SchemaEnum>,
    pub datasources: Vec<DataSource>,
    pub generators: Vec<GeneratorConfig>,
}

impl Schema {
    /// Finds a model by exact name.
    pub fn find_model(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.name == name)
    }

    /// Finds an enum by exact name.
    pub fn find_enum(&self, name: &str) -> Option<&SchemaEnum> {
        self.enums.iter().find(|e| e.name == name)
    }

    /// Returns `true` when nothing would be rendered besides the banner.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
            && self.enums.is_empty()
            && self.datasources.is_empty()
            && self.generators.is_empty()
    }
}
