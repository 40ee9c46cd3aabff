use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

/// Variables reported in [`EnvInfo::vars`] when present after loading.
pub const KNOWN_VARS: [&str; 4] = ["ELFA_API_KEY", "ELFA_HEADER", "ELFA_AUTH_TYPE", "ELFA_BASE"];

/// Snapshot of the last `.env` discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnvInfo {
    pub loaded: bool,
    pub from: Vec<PathBuf>,
    pub vars: Vec<String>,
}

/// Searches a fixed list of locations for `.env` files.
///
/// Every file found is loaded in order. Variables already present in the
/// process environment are never overridden, so earlier files take
/// precedence over later ones.
#[derive(Debug, Clone)]
pub struct EnvLoader {
    candidates: Vec<PathBuf>,
}

impl EnvLoader {
    pub fn new(candidates: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut unique: Vec<PathBuf> = Vec::new();
        for path in candidates {
            if !unique.contains(&path) {
                unique.push(path);
            }
        }
        Self { candidates: unique }
    }

    /// `<cwd>/.env`, then `.env` next to the executable and one and two
    /// directories above it.
    pub fn from_process() -> Self {
        let mut candidates = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            candidates.push(cwd.join(".env"));
        }
        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .as_deref()
            .and_then(Path::parent)
        {
            for dir in exe_dir.ancestors().take(3) {
                candidates.push(dir.join(".env"));
            }
        }
        Self::new(candidates)
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    pub fn load(&self) -> EnvInfo {
        let mut info = EnvInfo::default();

        for path in &self.candidates {
            if !path.is_file() {
                continue;
            }
            match dotenv::from_path(path) {
                Ok(()) => {
                    info.loaded = true;
                    info.from.push(path.clone());
                }
                Err(e) => warn!(path = %path.display(), error = %e, "failed to load .env file"),
            }
        }

        info.vars = KNOWN_VARS
            .iter()
            .filter(|name| std::env::var_os(name).is_some())
            .map(|name| name.to_string())
            .collect();

        info!(loaded = info.loaded, from = ?info.from, vars = ?info.vars, "dotenv");
        info
    }
}
