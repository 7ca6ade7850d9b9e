//! Resolved settings for one invocation.
//!
//! [`Settings::resolve`] turns the global CLI options (already merged with
//! their `TASKGATE_*` environment fallbacks by clap) into concrete paths and
//! a plan slug, then [`Settings::open_store`] builds the configured backend.

use std::fmt;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use tracing::{debug, warn};

use crate::cli::GlobalArgs;
use crate::context::ServiceContext;
use crate::delegate::slugify;
use crate::errors::{Error, Result};
use crate::store::{FileBackend, SqliteBackend, StatusBackend, StatusStore};

/// Spec file looked up beside the plan when `--spec` is not given.
pub const DEFAULT_SPEC_FILE: &str = "SPEC.md";

/// Which status backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BackendKind {
    /// `status.json` guarded by a lock file.
    #[default]
    File,
    /// `status.db` with a `status.json` export.
    Sqlite,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::File => "file",
            Self::Sqlite => "sqlite",
        })
    }
}

/// Where everything lives for this invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Spec document consulted for excerpts.
    pub spec_path: PathBuf,
    /// Plan identity under the state directory.
    pub slug: String,
    /// `<state_dir>/<slug>`.
    pub plan_dir: PathBuf,
    /// Selected backend.
    pub backend: BackendKind,
    /// Explicit import document, if any.
    pub import: Option<PathBuf>,
}

impl Settings {
    /// Resolves paths and the slug for a plan named `project`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when an explicit `--slug` has no usable
    /// characters.
    pub fn resolve(ctx: &ServiceContext, args: &GlobalArgs, project: &str) -> Result<Self> {
        let slug = match &args.slug {
            Some(explicit) => {
                let slug = sanitize_slug(explicit);
                if slug.is_empty() {
                    return Err(Error::Config(format!("slug '{explicit}' has no usable characters")));
                }
                slug
            }
            None => derive_slug(ctx, project),
        };

        let spec_path = args.spec.clone().unwrap_or_else(|| {
            args.plan.parent().unwrap_or_else(|| Path::new("")).join(DEFAULT_SPEC_FILE)
        });

        let settings = Self {
            spec_path,
            plan_dir: args.state_dir.join(&slug),
            slug,
            backend: args.backend,
            import: args.import.clone(),
        };
        debug!(
            slug = %settings.slug,
            backend = %settings.backend,
            dir = %settings.plan_dir.display(),
            "settings resolved"
        );
        Ok(settings)
    }

    /// Exported snapshot path.
    #[must_use]
    pub fn status_path(&self) -> PathBuf {
        self.plan_dir.join("status.json")
    }

    /// SQLite database path.
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.plan_dir.join("status.db")
    }

    /// Builds the configured store.
    ///
    /// The SQLite backend seeds itself from an existing `status.json` when no
    /// explicit import is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the SQLite database cannot be opened.
    pub fn open_store<'c>(&self, ctx: &'c ServiceContext) -> Result<StatusStore<'c>> {
        let backend: Box<dyn StatusBackend + 'c> = match self.backend {
            BackendKind::File => Box::new(FileBackend::new(ctx, &self.plan_dir)),
            BackendKind::Sqlite => {
                Box::new(SqliteBackend::open(ctx, &self.db_path(), &self.status_path())?)
            }
        };
        let store = StatusStore::new(ctx, backend);
        Ok(match (&self.import, self.backend) {
            (Some(path), _) => store.import_from(path.clone()),
            (None, BackendKind::Sqlite) => store.import_if_present(self.status_path()),
            (None, BackendKind::File) => store,
        })
    }

    /// Reads the spec document, if there is one.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file exists but cannot be read.
    pub fn read_spec(&self, ctx: &ServiceContext) -> Result<Option<String>> {
        if !ctx.fs.exists(&self.spec_path) {
            return Ok(None);
        }
        ctx.fs.read_to_string(&self.spec_path).map(Some).map_err(|e| Error::io(&self.spec_path, e))
    }
}

/// Reduces a branch or user-supplied name to a directory-safe slug.
#[must_use]
pub fn sanitize_slug(raw: &str) -> String {
    slugify(&raw.replace(['/', '\\', '.'], "-"))
}

fn derive_slug(ctx: &ServiceContext, project: &str) -> String {
    let branch = match ctx.git.current_branch() {
        Ok(branch) => branch,
        Err(e) => {
            warn!(error = %e, "could not query git branch; using project name as slug");
            None
        }
    };
    branch
        .map(|b| sanitize_slug(&b))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| {
            let slug = sanitize_slug(project);
            if slug.is_empty() { "default".to_string() } else { slug }
        })
}
