//! Repository generation alongside models

use std::fs;

use codegenex::codegen::go_source::GoFile;
use codegenex::codegen::ArtifactKind;
use codegenex::{Config, Manager};
use tempfile::TempDir;

fn setup() -> (TempDir, Config) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config {
        model_dir: temp_dir.path().join("models"),
        migration_dir: temp_dir.path().join("migrations"),
        repository_dir: Some(temp_dir.path().join("repositories")),
        ..Config::default()
    };
    (temp_dir, config)
}

fn repository_path(config: &Config, model: &str) -> std::path::PathBuf {
    config.repository_path(model).unwrap()
}

#[test]
fn test_repository_lifecycle() {
    let (_temp_dir, config) = setup();
    let manager = Manager::new(&config).with_timestamp("20240101000000");

    manager.run("author", "create", &["name:string"]).unwrap();
    let author_repo = repository_path(&config, "Author");
    assert!(author_repo.exists());

    let report = manager
        .run("post", "create", &["title:string", "author_id:int:ref"])
        .unwrap();
    let post_repo = repository_path(&config, "Post");
    assert!(report.contains(ArtifactKind::Written, &post_repo));
    assert!(report.contains(ArtifactKind::Updated, &author_repo));
    assert!(report.warnings.is_empty());

    let source = fs::read_to_string(&post_repo).unwrap();
    assert!(source.starts_with("// Code generated by codegenex.\npackage repositories\n"));
    assert!(source.contains("\"myapp/models\""));
    let file = GoFile::parse(&source).unwrap();
    for method in ["Create", "GetByID", "Update", "Delete", "List", "GetByAuthor", "GetAuthor"] {
        assert!(file.has_func(Some("postRepository"), method), "missing {}", method);
    }
    assert!(file.has_func(None, "NewPostRepository"));

    let author = GoFile::parse(&fs::read_to_string(&author_repo).unwrap()).unwrap();
    assert!(author.has_func(Some("authorRepository"), "GetPosts"));

    // add_fields regenerates the repository from the evolved model
    let manager = Manager::new(&config).with_timestamp("20240102000000");
    let report = manager.run("post", "add_fields", &["views:int"]).unwrap();
    assert!(report.contains(ArtifactKind::Updated, &post_repo));
    let source = fs::read_to_string(&post_repo).unwrap();
    assert!(source.contains("views"));
    assert!(source.contains("func (r *postRepository) GetAuthor("));

    let report = manager.run::<&str>("post", "drop", &[]).unwrap();
    assert!(report.contains(ArtifactKind::Removed, &post_repo));
    assert!(!post_repo.exists());
    assert!(!config.model_path("Post").exists());
}

#[test]
fn test_has_many_helper_added_once() {
    let (_temp_dir, config) = setup();
    let manager = Manager::new(&config).with_timestamp("20240101000000");
    manager.run("author", "create", &["name:string"]).unwrap();
    manager
        .run("post", "create", &["title:string", "author_id:int:ref"])
        .unwrap();

    let author_repo = repository_path(&config, "Author");
    let once = fs::read_to_string(&author_repo).unwrap();

    let manager = Manager::new(&config).with_timestamp("20240102000000");
    manager.run("post", "add_fields", &["author_id:int:ref"]).unwrap();
    let twice = fs::read_to_string(&author_repo).unwrap();

    assert_eq!(once, twice);
    assert_eq!(twice.matches("GetPosts(").count(), 2);
}

#[test]
fn test_missing_parent_repository_is_a_warning() {
    let (_temp_dir, config) = setup();
    let manager = Manager::new(&config).with_timestamp("20240101000000");

    let report = manager
        .run("comment", "create", &["body:string", "post_id:int:ref"])
        .unwrap();
    assert!(repository_path(&config, "Comment").exists());
    assert!(!repository_path(&config, "Post").exists());
    assert!(!report.warnings.is_empty());
    assert!(report
        .warnings
        .iter()
        .any(|w| w.message.contains("Post repository not found")));
}

#[test]
fn test_relations_link_ve_and_ie_nouns() {
    let (_temp_dir, config) = setup();
    let manager = Manager::new(&config).with_timestamp("20240101000000");
    manager.run("drive", "create", &["label:string"]).unwrap();
    manager.run("cookie", "create", &["flavor:string"]).unwrap();

    let report = manager
        .run("file", "create", &["name:string", "drive_id:int:ref", "cookie_id:int:ref=cookies.id"])
        .unwrap();
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);

    let file = GoFile::parse(&fs::read_to_string(repository_path(&config, "File")).unwrap()).unwrap();
    assert!(file.has_func(Some("fileRepository"), "GetDrive"));
    assert!(file.has_func(Some("fileRepository"), "GetCookie"));

    let drive = GoFile::parse(&fs::read_to_string(repository_path(&config, "Drive")).unwrap()).unwrap();
    assert!(drive.has_func(Some("driveRepository"), "GetFiles"));

    let model = GoFile::parse(&fs::read_to_string(config.model_path("Cookie")).unwrap()).unwrap();
    let files = model
        .struct_decl("Cookie")
        .unwrap()
        .fields()
        .find(|f| f.has_name("Files"))
        .map(|f| f.ty.clone());
    assert_eq!(files.as_deref(), Some("[]*File"));
}
