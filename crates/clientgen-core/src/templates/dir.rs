//! Resolution of user template directories

use std::io;
use std::path::{Path, PathBuf};

use super::ENTRY_TEMPLATE;

/// Environment variable naming a template directory
pub const TEMPLATE_DIR_ENV: &str = "CLIENTGEN_TEMPLATE_DIR";

/// A directory holding a custom `client.rs.tera` and any templates it includes
#[derive(Debug, Clone)]
pub struct TemplateDir {
    template_path: PathBuf,
}

impl TemplateDir {
    pub fn new(template_path: PathBuf) -> Self {
        Self { template_path }
    }

    /// Returns a displayable version of the template path
    pub fn display(&self) -> std::path::Display<'_> {
        self.template_path.display()
    }

    /// Resolve the template directory from an explicit path or the standard
    /// locations, in order:
    /// 1. `custom_dir`
    /// 2. `CLIENTGEN_TEMPLATE_DIR`
    /// 3. `./templates`
    /// 4. `~/.clientgen/templates`
    ///
    /// The chosen directory must contain the entry template.
    pub fn discover(custom_dir: Option<&Path>) -> io::Result<Self> {
        let template_path = match custom_dir {
            Some(dir) => {
                if !dir.exists() {
                    return Err(io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("Template directory not found: {}", dir.display()),
                    ));
                }
                dir.to_path_buf()
            }
            None => Self::find_template_dir().ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    "Could not find template directory in any standard location",
                )
            })?,
        };

        let dir = Self::new(template_path);
        if !dir.has_entry_template() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found in {}", ENTRY_TEMPLATE, dir.display()),
            ));
        }
        log::debug!("Using template directory: {}", dir.display());
        Ok(dir)
    }

    fn find_template_dir() -> Option<PathBuf> {
        if let Ok(dir) = std::env::var(TEMPLATE_DIR_ENV) {
            let path = PathBuf::from(dir);
            if path.exists() {
                return Some(path);
            }
        }

        let current = PathBuf::from("templates");
        if current.join(ENTRY_TEMPLATE).exists() {
            return Some(current);
        }

        let home = dirs::home_dir()?.join(".clientgen").join("templates");
        home.exists().then_some(home)
    }

    /// Get the path to the template directory
    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    pub fn has_entry_template(&self) -> bool {
        self.template_path.join(ENTRY_TEMPLATE).is_file()
    }
}
