//! Finding and loading the config files consulted by an invocation.
//!
//! Sources are returned highest precedence first:
//!
//! 1. files given with `--config` (the last flag wins),
//! 2. `.qs.cfg` in the working directory,
//! 3. `.qs.cfg` in the source root (nearest ancestor holding a `.git` directory),
//! 4. `$XDG_CONFIG_HOME/qs/default.cfg`, falling back to `$HOME/.config/qs/default.cfg`.

use std::collections::HashSet;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use thiserror::Error;

use crate::config_file::{ConfigEntry, ConfigError, EntryKind, parse_entries};

/// Name of the per-directory config file
pub const CONFIG_FILENAME: &str = ".qs.cfg";

/// Directory marking a source root
pub const DEFAULT_ROOT_MARKER: &str = ".git";

/// The filesystem operations needed to locate and read config files.
pub trait FileSystem {
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;

    /// # Errors
    ///
    /// Returns an error if the path does not exist or cannot be resolved.
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        path.canonicalize()
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

/// Why a config file is part of the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Explicit,
    WorkingDirectory,
    SourceRoot,
    GlobalDefault,
}

/// A loaded config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    pub path: PathBuf,
    pub origin: Origin,
    /// Position in the search, 0 being the highest precedence.
    pub rank: usize,
    pub entries: Vec<ConfigEntry>,
}

impl ConfigSource {
    /// The directory actions from this file run in.
    #[must_use]
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    pub fn actions(&self) -> impl Iterator<Item = &ConfigEntry> {
        self.entries.iter().filter(|e| e.kind == EntryKind::Action)
    }

    pub fn defaults(&self) -> impl Iterator<Item = &ConfigEntry> {
        self.entries
            .iter()
            .filter(|e| e.kind == EntryKind::VariableDefault)
    }

    /// Action entries that repeat a name already defined earlier in the same file.
    #[must_use]
    pub fn duplicate_actions(&self) -> Vec<&ConfigEntry> {
        let mut seen = HashSet::new();
        self.actions()
            .filter(|entry| !seen.insert(entry.key.as_str()))
            .collect()
    }
}

/// A non-fatal problem found while resolving sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    UnreadableConfig(PathBuf),
    DuplicateAction { name: String, path: PathBuf },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnreadableConfig(path) => write!(
                f,
                "Warning: could not read the config file '{}'. Ignoring.",
                path.display()
            ),
            Warning::DuplicateAction { name, path } => write!(
                f,
                "Warning: duplicate action name: {name} (in {})",
                path.display()
            ),
        }
    }
}

/// Everything the resolver needs to know about the invocation's surroundings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPaths {
    /// `--config` paths in the order they were given.
    pub config_files: Vec<PathBuf>,
    pub cwd: PathBuf,
    pub xdg_config_home: Option<PathBuf>,
    pub home: Option<PathBuf>,
    /// Directory name identifying a source root.
    pub root_marker: String,
}

impl SearchPaths {
    #[must_use]
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        SearchPaths {
            config_files: Vec::new(),
            cwd: cwd.into(),
            xdg_config_home: None,
            home: None,
            root_marker: DEFAULT_ROOT_MARKER.to_string(),
        }
    }

    #[must_use]
    pub fn with_config_files(mut self, config_files: Vec<PathBuf>) -> Self {
        self.config_files = config_files;
        self
    }

    #[must_use]
    pub fn with_environment(mut self, xdg_config_home: Option<PathBuf>, home: Option<PathBuf>) -> Self {
        self.xdg_config_home = xdg_config_home;
        self.home = home;
        self
    }
}

/// The loaded sources, highest precedence first, and any warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub sources: Vec<ConfigSource>,
    pub warnings: Vec<Warning>,
}

/// A config file failed to parse. Carries the warnings raised before it.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct ResolveError {
    #[source]
    pub error: ConfigError,
    pub warnings: Vec<Warning>,
}

/// Find the nearest ancestor of `start` (inclusive) containing a `marker` directory.
pub fn find_source_root(start: &Path, marker: &str, fs: &impl FileSystem) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| fs.is_dir(&dir.join(marker)))
        .map(Path::to_path_buf)
}

fn global_default(search: &SearchPaths, fs: &impl FileSystem) -> Option<PathBuf> {
    let non_empty = |dir: &Option<PathBuf>| dir.clone().filter(|d| !d.as_os_str().is_empty());
    let xdg = non_empty(&search.xdg_config_home).map(|dir| dir.join("qs").join("default.cfg"));
    let home = non_empty(&search.home).map(|dir| dir.join(".config").join("qs").join("default.cfg"));

    [xdg, home].into_iter().flatten().find_map(|candidate| {
        fs.canonicalize(&candidate)
            .ok()
            .filter(|path| fs.is_file(path))
    })
}

/// Canonicalize `--config` paths in the order given. Paths that do not name a
/// file are dropped with a warning.
pub fn explicit_files(config_files: &[PathBuf], fs: &impl FileSystem) -> (Vec<PathBuf>, Vec<Warning>) {
    let mut files = Vec::new();
    let mut warnings = Vec::new();
    for path in config_files {
        match fs.canonicalize(path) {
            Ok(resolved) if fs.is_file(&resolved) => files.push(resolved),
            _ => warnings.push(Warning::UnreadableConfig(path.clone())),
        }
    }
    (files, warnings)
}

/// Work out which config files to consult, without reading them.
pub fn locate(search: &SearchPaths, fs: &impl FileSystem) -> (Vec<(PathBuf, Origin)>, Vec<Warning>) {
    let mut candidates: Vec<(PathBuf, Origin)> = Vec::new();
    let mut push = |path: PathBuf, origin: Origin| {
        if !candidates.iter().any(|(seen, _)| *seen == path) {
            candidates.push((path, origin));
        }
    };

    let (explicit, warnings) = explicit_files(&search.config_files, fs);
    for path in explicit.into_iter().rev() {
        push(path, Origin::Explicit);
    }

    let cwd = fs
        .canonicalize(&search.cwd)
        .unwrap_or_else(|_| search.cwd.clone());
    debug!("Searching for config files from {}", cwd.display());

    let local = cwd.join(CONFIG_FILENAME);
    if fs.is_file(&local) {
        push(local, Origin::WorkingDirectory);
    }

    if let Some(root) = find_source_root(&cwd, &search.root_marker, fs)
        && root != cwd
    {
        debug!("Found source root at {}", root.display());
        let root_config = root.join(CONFIG_FILENAME);
        if fs.is_file(&root_config) {
            push(root_config, Origin::SourceRoot);
        }
    }

    if let Some(global) = global_default(search, fs) {
        push(global, Origin::GlobalDefault);
    }

    (candidates, warnings)
}

/// Locate, read and parse every config file for the invocation.
///
/// # Errors
///
/// Returns a `ResolveError` for the first bad line in any file; later files
/// are not read.
pub fn resolve(search: &SearchPaths, fs: &impl FileSystem) -> Result<Resolution, ResolveError> {
    let (candidates, mut warnings) = locate(search, fs);
    let mut sources = Vec::new();

    for (path, origin) in candidates {
        let bytes = match fs.read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("Unable to read {}: {e}", path.display());
                warnings.push(Warning::UnreadableConfig(path));
                continue;
            }
        };
        let contents = String::from_utf8_lossy(&bytes);
        let entries = match parse_entries(&path, &contents) {
            Ok(entries) => entries,
            Err(error) => return Err(ResolveError { error, warnings }),
        };
        info!("Using config file: {} ({origin:?})", path.display());

        let source = ConfigSource {
            path,
            origin,
            rank: sources.len(),
            entries,
        };
        warnings.extend(
            source
                .duplicate_actions()
                .into_iter()
                .map(|entry| Warning::DuplicateAction {
                    name: entry.key.clone(),
                    path: source.path.clone(),
                }),
        );
        sources.push(source);
    }

    Ok(Resolution { sources, warnings })
}
