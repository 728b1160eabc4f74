use crudsql::CompilerConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG: &str = "crudsql.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub compiler: CompilerConfig,
}

impl ConfigFile {
    pub fn load(config_path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(config_path).map_err(|e| {
            anyhow::anyhow!(
                "failed to read config file {}: {e}",
                config_path.display()
            )
        })?;

        let file: ConfigFile = toml::from_str(&raw).map_err(|e| {
            anyhow::anyhow!(
                "failed to parse config file {}: {e}",
                config_path.display()
            )
        })?;

        file.validate()?;
        Ok(file)
    }

    /// An explicit path must exist; the default one is optional.
    pub fn resolve(explicit: Option<&Path>) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG);
                if path.is_file() {
                    Self::load(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        let compiler = &self.compiler;
        if let Err(e) = crudsql::Ident::simple(&compiler.identifier_key) {
            anyhow::bail!("compiler.identifier_key: {e}");
        }
        if compiler.max_increment <= 0 {
            anyhow::bail!("compiler.max_increment must be positive");
        }
        Ok(())
    }
}
