//! Loading of parser output: a JSON array of modules, or a single module.

use crate::error::CommonError;
use crate::filesystem::FileSystem;
use crate::result::CommonResult;
use paperclip_model::Module;
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum ModuleFile {
    Many(Vec<Module>),
    One(Module),
}

/// Decode modules from JSON text
pub fn parse_modules(content: &str) -> CommonResult<Vec<Module>> {
    let modules = match serde_json::from_str::<ModuleFile>(content)? {
        ModuleFile::Many(modules) => modules,
        ModuleFile::One(module) => vec![module],
    };

    if modules.is_empty() {
        return Err(CommonError::Generic("document contains no modules".to_string()));
    }

    Ok(modules)
}

/// Read and decode a module file
pub fn load_modules(fs: &dyn FileSystem, path: &Path) -> CommonResult<Vec<Module>> {
    if !fs.exists(path) {
        return Err(CommonError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs.read_to_string(path)?;
    parse_modules(&content)
}
