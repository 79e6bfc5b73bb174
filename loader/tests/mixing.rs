use std::fs;
use std::path::{Path, PathBuf};

use schema_mixer_core::{
    DataSource, DatasourceSelection, EnvValue, Field, Fragment, Model, Relation, merge_fragments,
    render_field, render_schema,
};
use schema_mixer_loader::{
    MixMode, MixerConfig, MixerFile, PslParser, load_fragment, load_fragment_source,
    mix_schema, run_all, scan_directory,
};

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn mixer(input: &[&str], output: &str) -> MixerConfig {
    MixerConfig {
        name: None,
        input: input.iter().map(|s| s.to_string()).collect(),
        output: output.to_string(),
        datasource: DatasourceSelection::Last,
    }
}

#[test]
fn test_directory_scan_skips_entry_and_ignored_files() {
    let found: Vec<String> = scan_directory(&fixtures().join("mixed"))
        .iter()
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
        .collect();
    assert_eq!(found, vec!["base.prisma", "posts.prisma", "profiles.prisma"]);
}

#[test]
fn test_mixing_fixture_directory_matches_expected_output() {
    let outcome = mix_schema(&mixer(&["mixed"], "mixed/schema.prisma"), &fixtures(), &PslParser)
        .expect("mix fixtures");
    let expected = fs::read_to_string(fixtures().join("expected.prisma")).unwrap();

    assert_eq!(outcome.fragments, 3);
    assert_eq!(outcome.rendered, expected);
}

#[test]
fn test_rendered_output_is_stable_when_reloaded() {
    let outcome = mix_schema(&mixer(&["mixed"], "mixed/schema.prisma"), &fixtures(), &PslParser)
        .expect("mix fixtures");

    let reloaded = load_fragment_source("rendered.prisma", &outcome.rendered, &PslParser)
        .expect("rendered output must parse");
    let rerendered = render_schema(&merge_fragments(&[reloaded])).expect("render");

    assert_eq!(rerendered, outcome.rendered);
}

#[test]
fn test_later_fragments_keep_earlier_mapping_and_default() {
    let outcome = mix_schema(&mixer(&["mixed"], "mixed/schema.prisma"), &fixtures(), &PslParser)
        .expect("mix fixtures");
    let user = outcome.schema.find_model("User").unwrap();

    // `posts.prisma` redeclares `id` without its default.
    let id = user.find_field("id").unwrap();
    assert!(id.has_default_value());
    assert_eq!(
        user.field_names(),
        vec!["id", "email", "role", "createdAt", "posts", "name", "bio"]
    );
    assert_eq!(user.db_name.as_deref(), Some("users"));
}

#[test]
fn test_usable_datasource_wins_over_later_unusable_one() {
    let outcome = mix_schema(&mixer(&["mixed"], "mixed/schema.prisma"), &fixtures(), &PslParser)
        .expect("mix fixtures");

    assert_eq!(outcome.schema.datasources.len(), 1);
    assert_eq!(outcome.schema.datasources[0].provider, "postgresql");
    assert!(
        outcome
            .rendered
            .contains("datasource db {\n  provider = \"postgresql\"\n  url = env(\"DATABASE_URL\")\n}")
    );
}

#[test]
fn test_datasource_selection_renders_exact_url_form() {
    let literal = Fragment::new("a").with_datasource(DataSource::new(
        "db",
        "sqlite",
        EnvValue::Value("file:./dev.db".into()),
    ));
    let schema = merge_fragments(&[literal, Fragment::new("b")]);
    let text = render_schema(&schema).unwrap();
    assert!(text.contains("  url = \"file:./dev.db\"\n"));
}

#[test]
fn test_relation_line_matches_documented_form() {
    let author = Field::object(
        "author",
        "Author",
        Relation::named("PostToAuthor").with_link(["authorId"], ["id"]),
    );
    assert_eq!(
        render_field("Post", &author).unwrap(),
        r#"author Author @relation(name: "PostToAuthor", fields: [authorId], references: [id])"#
    );
}

#[test]
fn test_fragment_with_missing_alias_model_is_dropped() {
    assert!(load_fragment(&fixtures().join("broken_alias.prisma"), &PslParser).is_none());

    let outcome = mix_schema(
        &mixer(&["mixed/base.prisma", "broken_alias.prisma"], "out.prisma"),
        &fixtures(),
        &PslParser,
    )
    .expect("mix");
    assert_eq!(outcome.inputs.len(), 2);
    assert_eq!(outcome.fragments, 1);
    assert!(outcome.schema.find_model("Comment").is_none());
}

#[test]
fn test_enum_first_definition_wins_across_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("a.prisma"),
        "enum Status {\n  DRAFT\n  PUBLISHED\n}\n",
    )
    .unwrap();
    fs::write(dir.path().join("b.prisma"), "enum Status {\n  ARCHIVED\n}\n").unwrap();

    let outcome = mix_schema(&mixer(&["*.prisma"], "schema.prisma"), dir.path(), &PslParser)
        .expect("mix");
    assert!(outcome.rendered.contains("enum Status {\n  DRAFT\n  PUBLISHED\n}"));
    assert!(!outcome.rendered.contains("ARCHIVED"));
}

#[test]
fn test_config_file_drives_all_mixers() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("prisma/features")).unwrap();
    fs::write(
        root.join("prisma/base.prisma"),
        "model User {\n  id Int @id\n}\n",
    )
    .unwrap();
    fs::write(
        root.join("prisma/features/tags.prisma"),
        "model Tag {\n  id Int @id\n  label String @unique\n}\n",
    )
    .unwrap();
    fs::write(
        root.join("schema-mixer.yml"),
        "mixers:\n  - name: app\n    input:\n      - prisma/base.prisma\n      - prisma/features/*.prisma\n    output: prisma/schema.prisma\n",
    )
    .unwrap();

    let config_path = MixerFile::find_default(root).expect("config present");
    let config = MixerFile::load(config_path).unwrap();
    let mixers = config.select(&[]).unwrap();
    let results = run_all(&mixers, root, &PslParser, MixMode::Write);

    assert_eq!(results.len(), 1);
    assert!(results[0].1.is_ok());
    let written = fs::read_to_string(root.join("prisma/schema.prisma")).unwrap();
    assert!(written.contains("model User {\n  id Int @id\n}"));
    assert!(written.contains("model Tag {\n  id Int @id\n  label String @unique\n}"));
}

#[test]
fn test_unique_index_is_not_duplicated_by_repeated_declarations() {
    let source = "model Post {\n  slug String\n  @@unique([slug])\n}\n";
    let a = load_fragment_source("a.prisma", source, &PslParser).unwrap();
    let b = load_fragment_source("b.prisma", source, &PslParser).unwrap();

    let schema = merge_fragments(&[a, b]);
    let post: &Model = schema.find_model("Post").unwrap();
    assert_eq!(post.unique_indexes.len(), 1);
    assert_eq!(render_schema(&schema).unwrap().matches("@@unique").count(), 1);
}

#[test]
fn test_unicode_escape_in_default_keeps_its_value() {
    let source = "model Greeting {\n  id Int @id\n  text String @default(\"caf\\u00e9\\r\")\n}\n";
    let fragment = load_fragment_source("greeting.prisma", source, &PslParser).unwrap();

    let text = render_schema(&merge_fragments(&[fragment])).unwrap();
    assert!(text.contains("  text String @default(\"caf\u{e9}\\r\")\n"), "{text}");
}
