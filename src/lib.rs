//! # codegenex: incremental scaffolding for Go + PostgreSQL
//!
//! codegenex turns an entity name, an action and a list of `name:type:option`
//! field tokens into three artifacts:
//!
//! - a timestamped SQL migration,
//! - a Go model struct,
//! - a Go repository over `database/sql` (when `repository_dir` is set).
//!
//! Later runs evolve what earlier runs wrote. Model files are parsed, edited
//! and re-rendered, and reference fields keep the models on both sides of a
//! relation in step.
//!
//! ## Example
//!
//! ```rust,no_run
//! use codegenex::{Config, Manager};
//!
//! let config = Config::load("codegenex.json");
//! let report = Manager::new(&config)
//!     .run("post", "create", &["title:string", "author_id:int:ref"])?;
//! for artifact in &report.artifacts {
//!     println!("{}", artifact);
//! }
//! # Ok::<(), codegenex::CodegenError>(())
//! ```

pub mod codegen;
pub mod error;

pub use codegen::{Action, Config, Field, Manager, Report, TemplateSet};
pub use error::{CodegenError, Result};
