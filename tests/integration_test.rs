//! End-to-end runs of the codegenex pipeline against temporary directories

use std::fs;
use std::path::Path;

use codegenex::codegen::go_source::GoFile;
use codegenex::codegen::templates::{self, TemplateSet};
use codegenex::codegen::ArtifactKind;
use codegenex::{CodegenError, Config, Manager};
use tempfile::TempDir;

fn setup() -> (TempDir, Config) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config {
        model_dir: temp_dir.path().join("models"),
        migration_dir: temp_dir.path().join("migrations"),
        ..Config::default()
    };
    (temp_dir, config)
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

/// `Name Type` of every attribute of `model`.
fn attributes(config: &Config, model: &str) -> Vec<String> {
    let file = GoFile::parse(&read(&config.model_path(model))).unwrap();
    file.struct_decl(model)
        .unwrap()
        .fields()
        .map(|f| format!("{} {}", f.names.join(", "), f.ty))
        .collect()
}

#[test]
fn test_create_post_with_author() {
    let (_temp_dir, config) = setup();
    Manager::new(&config)
        .with_timestamp("20240101000000")
        .run("author", "create", &["name:string"])
        .unwrap();

    let report = Manager::new(&config)
        .with_timestamp("20240101000100")
        .run(
            "post",
            "create",
            &["title:string", "author_id:int:ref", "published:bool:default=false"],
        )
        .unwrap();

    let migration = config.migration_dir.join("20240101000100_create_post.sql");
    assert_eq!(
        read(&migration),
        "\
-- Migration: create posts

CREATE TABLE posts (
    id SERIAL PRIMARY KEY,
    title VARCHAR(255) NOT NULL,
    author_id INTEGER NOT NULL,
    published BOOLEAN DEFAULT false NOT NULL,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP NOT NULL,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP NOT NULL,
    FOREIGN KEY (author_id) REFERENCES authors(id) ON DELETE CASCADE
);
"
    );

    assert_eq!(
        attributes(&config, "Post"),
        vec![
            "ID int64",
            "Title string",
            "AuthorID int64",
            "Published bool",
            "CreatedAt time.Time",
            "UpdatedAt time.Time",
        ]
    );
    assert_eq!(
        attributes(&config, "Author"),
        vec![
            "ID int64",
            "Name string",
            "CreatedAt time.Time",
            "UpdatedAt time.Time",
            "Posts []*Post",
        ]
    );

    assert!(report.contains(ArtifactKind::Written, &migration));
    assert!(report.contains(ArtifactKind::Written, &config.model_path("Post")));
    assert!(report.contains(ArtifactKind::Updated, &config.model_path("Author")));
    assert!(report.warnings.is_empty());

    let lines: Vec<String> = report.artifacts.iter().map(|a| a.to_string()).collect();
    assert_eq!(lines[0], format!("✓ Generated {}", migration.display()));
}

#[test]
fn test_forward_reference_is_tolerated() {
    let (_temp_dir, config) = setup();
    let manager = Manager::new(&config).with_timestamp("20240101000000");

    let report = manager
        .run("comment", "create", &["body:string", "post_id:int:ref"])
        .unwrap();
    assert!(config.model_path("Comment").exists());
    assert!(config
        .migration_dir
        .join("20240101000000_create_comment.sql")
        .exists());
    assert!(!config.model_path("Post").exists());
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].path, config.model_path("Post"));

    // Creating the referenced model later picks the relation up.
    let report = manager.run("post", "create", &["title:string"]).unwrap();
    assert!(report.warnings.is_empty());
    assert_eq!(
        attributes(&config, "Post").last().map(String::as_str),
        Some("Comments []*Comment")
    );
}

#[test]
fn test_add_fields_twice_is_idempotent() {
    let (_temp_dir, config) = setup();
    Manager::new(&config)
        .with_timestamp("20240101000000")
        .run("post", "create", &["title:string"])
        .unwrap();

    let tokens = ["views:int:default=0", "state:enum[draft,live]", "tags:string[]:null"];
    Manager::new(&config)
        .with_timestamp("20240102000000")
        .run("post", "add_fields", &tokens)
        .unwrap();
    let model_once = read(&config.model_path("Post"));

    let report = Manager::new(&config)
        .with_timestamp("20240103000000")
        .run("post", "add_fields", &tokens)
        .unwrap();
    assert_eq!(read(&config.model_path("Post")), model_once);
    assert!(!report.contains(ArtifactKind::Updated, &config.model_path("Post")));

    assert_eq!(
        attributes(&config, "Post"),
        vec![
            "ID int64",
            "Title string",
            "Views int64",
            "State PostStateType",
            "Tags []string",
            "CreatedAt time.Time",
            "UpdatedAt time.Time",
        ]
    );

    let migration = read(&config.migration_dir.join("20240102000000_add_fields_post.sql"));
    assert!(migration.starts_with("-- Migration: add fields to posts\n\nCREATE TYPE posts_states AS ENUM ('draft', 'live');\n"));
    assert!(migration.contains("ALTER TABLE posts ADD COLUMN views INTEGER DEFAULT 0 NOT NULL;\n"));
    assert!(migration.contains("ALTER TABLE posts ADD COLUMN tags VARCHAR(255)[];\n"));
}

#[test]
fn test_remove_fields_keeps_reciprocal_relation() {
    let (_temp_dir, config) = setup();
    let manager = Manager::new(&config).with_timestamp("20240101000000");
    manager.run("author", "create", &["name:string"]).unwrap();
    manager
        .run("post", "create", &["title:string", "author_id:int:ref"])
        .unwrap();

    let manager = Manager::new(&config).with_timestamp("20240102000000");
    let report = manager.run("post", "remove_fields", &["author_id"]).unwrap();

    assert!(!attributes(&config, "Post").contains(&"AuthorID int64".to_string()));
    assert!(attributes(&config, "Author").contains(&"Posts []*Post".to_string()));
    assert!(report.contains(ArtifactKind::Updated, &config.model_path("Post")));
    assert_eq!(
        read(&config.migration_dir.join("20240102000000_remove_fields_post.sql")),
        "-- Migration: remove fields from posts\n\nALTER TABLE posts DROP COLUMN IF EXISTS author_id;\n"
    );
}

#[test]
fn test_remove_fields_requires_existing_model() {
    let (_temp_dir, config) = setup();
    let err = Manager::new(&config)
        .with_timestamp("20240101000000")
        .run("ghost", "remove_fields", &["name"])
        .unwrap_err();

    match err {
        CodegenError::MissingArtifact { kind, path } => {
            assert_eq!(kind, "model");
            assert_eq!(path, config.model_path("Ghost"));
        }
        other => panic!("unexpected error: {}", other),
    }
    // The run is not transactional: the migration is already written.
    assert!(config
        .migration_dir
        .join("20240101000000_remove_fields_ghost.sql")
        .exists());
}

#[test]
fn test_missing_render_target() {
    let (_temp_dir, config) = setup();
    let mut template_set = TemplateSet::builtin();
    template_set.remove(templates::MIGRATION_CREATE);

    let err = Manager::new(&config)
        .with_templates(template_set)
        .run("post", "create", &["title"])
        .unwrap_err();
    assert!(err.to_string().contains("migration/create"));
    assert!(!config.model_path("Post").exists());
}

#[test]
fn test_belongs_to_accessor() {
    let (_temp_dir, mut config) = setup();
    config.belongs_to_accessor = true;
    let manager = Manager::new(&config).with_timestamp("20240101000000");

    manager.run("user", "create", &["email:string:unique"]).unwrap();
    manager
        .run("post", "create", &["owner_id:int:ref=users.id"])
        .unwrap();
    manager
        .run("post", "add_fields", &["editor_id:int:ref=users.id:null"])
        .unwrap();

    let post = attributes(&config, "Post");
    assert!(post.contains(&"Owner *User".to_string()));
    assert!(post.contains(&"Editor *User".to_string()));
    assert_eq!(
        attributes(&config, "User")
            .iter()
            .filter(|a| a.as_str() == "Posts []*Post")
            .count(),
        1
    );
}

#[test]
fn test_drop_removes_model() {
    let (_temp_dir, config) = setup();
    let manager = Manager::new(&config).with_timestamp("20240101000000");
    manager.run("post", "create", &["title"]).unwrap();

    let report = manager.run::<&str>("post", "drop", &[]).unwrap();
    assert!(!config.model_path("Post").exists());
    assert!(report.contains(ArtifactKind::Removed, &config.model_path("Post")));

    let report = manager.run::<&str>("post", "drop", &[]).unwrap();
    assert_eq!(report.warnings.len(), 1);
}

#[test]
fn test_config_file_drives_layout() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("codegenex.json");
    let root = temp_dir.path().display().to_string().replace('\\', "/");
    fs::write(
        &config_path,
        format!(
            r#"{{"model_dir": "{root}/internal/entities", "migration_dir": "{root}/db", "package_name": ""}}"#
        ),
    )
    .unwrap();

    let config = Config::load(&config_path);
    assert_eq!(config.package_name, "myapp");
    Manager::new(&config)
        .with_timestamp("20240101000000")
        .run("blog_post", "create", &["title"])
        .unwrap();

    let model = read(&temp_dir.path().join("internal/entities/blog_post.go"));
    assert!(model.contains("package entities\n"));
    assert!(model.contains("type BlogPost struct {\n"));
    assert!(temp_dir
        .path()
        .join("db/20240101000000_create_blog_post.sql")
        .exists());
}
