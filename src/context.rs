//! Desk home resolution for quotedesk.
//!
//! Every command locates its state through a [`DeskContext`]. The home
//! directory is chosen in this order:
//!
//! 1. `--home <DIR>` (or `QUOTEDESK_HOME`, which clap folds into the flag)
//! 2. `./.quotedesk` under the current working directory
//!
//! # Layout
//!
//! ```text
//! <home>/
//!   config.yaml
//!   catalog.yaml
//!   sequence
//!   quotes/<number>.yaml
//!   carts/<customer>.yaml
//!   events/events.ndjson
//! ```

use crate::error::{QuoteError, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Default home directory name, relative to the working directory.
pub const DEFAULT_HOME_DIR: &str = ".quotedesk";

/// Resolved paths for a quotedesk home. All paths are absolute.
#[derive(Debug, Clone)]
pub struct DeskContext {
    pub home: PathBuf,
}

impl DeskContext {
    /// Resolve the home from an explicit directory or the working directory.
    pub fn resolve(home: Option<&Path>) -> Result<Self> {
        let cwd = env::current_dir().map_err(|e| {
            QuoteError::UserError(format!("failed to get current working directory: {}", e))
        })?;

        let home = match home {
            Some(dir) if dir.is_absolute() => dir.to_path_buf(),
            Some(dir) => cwd.join(dir),
            None => cwd.join(DEFAULT_HOME_DIR),
        };
        Ok(Self { home })
    }

    /// Context rooted at `home` as given.
    pub fn at<P: AsRef<Path>>(home: P) -> Self {
        Self {
            home: home.as_ref().to_path_buf(),
        }
    }

    /// Whether `init` has run here.
    pub fn exists(&self) -> bool {
        self.config_path().is_file() && self.quotes_dir().is_dir()
    }

    /// Ensure the desk is initialized, returning an error if not.
    ///
    /// Called by every command except `init`.
    pub fn ensure_initialized(&self) -> Result<()> {
        if !self.exists() {
            return Err(QuoteError::UserError(format!(
                "quotedesk not initialized.\n\
                 Expected config at: {}\n\n\
                 Run `quotedesk init` (or pass --home) to create a desk.",
                self.config_path().display()
            )));
        }
        Ok(())
    }

    pub fn config_path(&self) -> PathBuf {
        self.home.join("config.yaml")
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.home.join("catalog.yaml")
    }

    pub fn sequence_path(&self) -> PathBuf {
        self.home.join("sequence")
    }

    pub fn quotes_dir(&self) -> PathBuf {
        self.home.join("quotes")
    }

    pub fn carts_dir(&self) -> PathBuf {
        self.home.join("carts")
    }

    pub fn events_dir(&self) -> PathBuf {
        self.home.join("events")
    }

    pub fn events_file(&self) -> PathBuf {
        self.events_dir().join("events.ndjson")
    }
}

/// Resolve the desk and ensure it is initialized.
pub fn require_initialized(home: Option<&Path>) -> Result<DeskContext> {
    let ctx = DeskContext::resolve(home)?;
    ctx.ensure_initialized()?;
    Ok(ctx)
}
