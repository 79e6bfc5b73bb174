use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn schema_mixer(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_schema-mixer"))
        .arg("--cwd")
        .arg(cwd)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run schema-mixer")
}

fn write(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("failed to create fixture dir");
    }
    fs::write(path, contents).expect("failed to write fixture");
}

/// A small project: two fragments and a config with one mixer.
fn write_project(dir: &Path) {
    write(
        dir,
        "prisma/base.prisma",
        r#"datasource db {
  provider = "postgresql"
  url      = env("DATABASE_URL")
}

model User {
  id    Int    @id @default(autoincrement())
  email String @unique
}
"#,
    );
    write(
        dir,
        "prisma/features/posts.prisma",
        r#"model User {
  id    Int    @id
  posts Post[]
}

model Post {
  id       Int  @id
  author   User @relation(fields: [authorId], references: [id])
  authorId Int  @map("author_id")
}
"#,
    );
    write(
        dir,
        "schema-mixer.yml",
        "mixers:\n  - name: app\n    input:\n      - prisma/base.prisma\n      - prisma/features\n    output: prisma/schema.prisma\n",
    );
}

// ---------------------------------------------------------------------------
// mix
// ---------------------------------------------------------------------------

#[test]
fn test_mix_writes_configured_output() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());

    let output = schema_mixer(dir.path(), &["mix"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let written = fs::read_to_string(dir.path().join("prisma/schema.prisma")).unwrap();
    assert!(written.starts_with("// *** GENERATED BY SCHEMA MIXER :: DO NOT EDIT ***\n"));
    assert!(written.contains(
        "model User {\n  id Int @id @default(autoincrement())\n  email String @unique\n  posts Post[] @relation(name: \"PostToUser\")\n}"
    ));
    assert!(written.contains("  authorId Int @map(\"author_id\")\n"));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("app: merged 2 of 2 file(s)"), "stdout: {stdout}");
}

#[test]
fn test_mix_is_repeatable() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());

    assert!(schema_mixer(dir.path(), &["mix"]).status.success());
    let first = fs::read_to_string(dir.path().join("prisma/schema.prisma")).unwrap();
    assert!(schema_mixer(dir.path(), &["mix"]).status.success());
    let second = fs::read_to_string(dir.path().join("prisma/schema.prisma")).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_mix_stdout_does_not_write_output() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());

    let output = schema_mixer(dir.path(), &["mix", "--stdout"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("model Post {"));
    assert!(!dir.path().join("prisma/schema.prisma").exists());
}

#[test]
fn test_mix_with_explicit_json_config() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());
    write(
        dir.path(),
        "mixers.json",
        r#"{"mixers": [{"name": "users", "input": ["prisma/base.prisma"], "output": "out/users.prisma"}]}"#,
    );

    let output = schema_mixer(dir.path(), &["--config", "mixers.json", "mix"]);
    assert!(output.status.success());
    let written = fs::read_to_string(dir.path().join("out/users.prisma")).unwrap();
    assert!(!written.contains("model Post"));
}

#[test]
fn test_mix_fails_on_unknown_mixer() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());

    let output = schema_mixer(dir.path(), &["mix", "--mixer", "nope"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown mixer `nope`"));
}

#[test]
fn test_mix_fails_without_config() {
    let dir = tempfile::tempdir().unwrap();

    let output = schema_mixer(dir.path(), &["mix"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("error: no schema-mixer.yml"));
}

#[test]
fn test_mix_render_failure_exits_nonzero_and_keeps_other_mixers() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "geo.prisma",
        "model Place {\n  id Int @id\n  point Unsupported(\"point\")\n}\n",
    );
    write(dir.path(), "user.prisma", "model User {\n  id Int @id\n}\n");
    write(
        dir.path(),
        "schema-mixer.yml",
        "mixers:\n  - name: geo\n    input: [geo.prisma]\n    output: geo.out.prisma\n  - name: users\n    input: [user.prisma]\n    output: users.out.prisma\n",
    );

    let output = schema_mixer(dir.path(), &["mix"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(!dir.path().join("geo.out.prisma").exists());
    assert!(dir.path().join("users.out.prisma").exists());
    assert!(String::from_utf8_lossy(&output.stderr).contains("1 mixer(s) failed: geo"));
}

// ---------------------------------------------------------------------------
// scan / inspect
// ---------------------------------------------------------------------------

#[test]
fn test_scan_lists_discovered_files() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());
    write(dir.path(), "prisma/schema.prisma", "");
    write(dir.path(), "prisma/old.ignore.prisma", "");

    let output = schema_mixer(dir.path(), &["scan", "prisma"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout).replace('\\', "/");
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["prisma/base.prisma", "prisma/features/posts.prisma"]);
}

#[test]
fn test_inspect_prints_json() {
    let dir = tempfile::tempdir().unwrap();
    write_project(dir.path());

    let output = schema_mixer(
        dir.path(),
        &[
            "inspect",
            "prisma/base.prisma",
            "prisma/features/posts.prisma",
            "--format",
            "json",
        ],
    );
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    let models = value["models"].as_array().unwrap();
    assert_eq!(models.len(), 2);
    assert_eq!(models[0]["name"], "User");
    assert_eq!(value["datasources"][0]["provider"], "postgresql");
}

#[test]
fn test_inspect_fails_when_nothing_loads() {
    let dir = tempfile::tempdir().unwrap();

    let output = schema_mixer(dir.path(), &["inspect", "missing.prisma"]);
    assert_eq!(output.status.code(), Some(1));
}
