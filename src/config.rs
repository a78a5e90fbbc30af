use std::path::{Path, PathBuf};

pub const DEFAULT_CHAT_ENDPOINT: &str = "https://314159265.nchlsschfr.workers.dev";
pub const DEFAULT_CATALOG_FILE: &str = "products.json";
pub const DESCRIPTION_PREVIEW_CHARS: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisorConfig {
    pub chat_endpoint: String,
    pub catalog_path: PathBuf,
    /// Directory that product image references are relative to.
    pub image_root: PathBuf,
    pub description_preview_chars: usize,
}

impl AdvisorConfig {
    /// Hardcoded endpoint, catalog resolved against `workspace`.
    pub fn for_workspace(workspace: &Path) -> Self {
        Self {
            chat_endpoint: DEFAULT_CHAT_ENDPOINT.to_string(),
            catalog_path: workspace.join(DEFAULT_CATALOG_FILE),
            image_root: workspace.to_path_buf(),
            description_preview_chars: DESCRIPTION_PREVIEW_CHARS,
        }
    }
}
