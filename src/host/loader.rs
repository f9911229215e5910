//! Filesystem unit loader
//!
//! Units are recognised by extension only: `.dll` and `.exe` files are units,
//! `.netmodule` files are module containers, anything else is a bad image.

use log::trace;
use std::env;
use std::path::{Path, PathBuf};

use crate::driver::backend::{LoadError, ResolvedUnit, UnitLoader};

/// Overrides the runtime library directory
pub const LIB_DIR_ENV: &str = "SHARPC_LIB_DIR";

#[derive(Debug, Clone)]
pub struct FileUnitLoader {
    system_dir: PathBuf,
}

impl FileUnitLoader {
    pub fn new(system_dir: impl Into<PathBuf>) -> Self {
        FileUnitLoader {
            system_dir: system_dir.into(),
        }
    }

    /// `$SHARPC_LIB_DIR`, else the directory holding the executable
    pub fn from_env() -> Self {
        let system_dir = env::var_os(LIB_DIR_ENV)
            .map(PathBuf::from)
            .or_else(|| env::current_exe().ok()?.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(system_dir)
    }
}

pub(crate) fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Unit description derived from the file name: `System.Xml.dll` exports
/// the root identifier `System`
pub(crate) fn describe(path: &Path, is_module: bool) -> ResolvedUnit {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let root = name.split('.').next().unwrap_or_default().to_string();
    ResolvedUnit {
        name,
        path: path.to_path_buf(),
        identifiers: vec![root],
        is_module,
    }
}

impl UnitLoader for FileUnitLoader {
    fn load_from(&mut self, path: &Path) -> Result<ResolvedUnit, LoadError> {
        trace!("probing {}", path.display());
        if !path.is_file() {
            return Err(LoadError::NotFound {
                path: path.to_path_buf(),
                log: format!("  probed {}\n", path.display()),
            });
        }

        match extension_of(path).as_str() {
            "dll" | "exe" => Ok(describe(path, false)),
            "netmodule" => Err(LoadError::BadImage {
                path: path.to_path_buf(),
                log: String::new(),
            }),
            other => Err(LoadError::BadImage {
                path: path.to_path_buf(),
                log: format!("  unknown image type `{}'\n", other),
            }),
        }
    }

    fn load_by_name(&mut self, name: &str) -> Result<ResolvedUnit, LoadError> {
        // there is no global unit cache; the link path search does the work
        Err(LoadError::NotFound {
            path: PathBuf::from(name),
            log: String::new(),
        })
    }

    fn probe_module(&mut self, path: &Path) -> bool {
        path.is_file() && extension_of(path) == "netmodule"
    }

    fn system_dir(&self) -> PathBuf {
        self.system_dir.clone()
    }
}
