use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use directories::BaseDirs;
use serde::Deserialize;

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_NAME: &str = "pinbook";

#[derive(Debug, Clone)]
pub struct Config {
    pub config_path: PathBuf,
    pub vdir: PathBuf,
    pub strip_tone_marks: bool,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    vdir: Option<PathBuf>,
    strip_tone_marks: Option<bool>,
}

/// Expand ~ to home directory in paths
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = home::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

fn config_root() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine base directories")?;
    let dir = base.config_dir().join(APP_NAME);
    Ok(dir)
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_root()?.join(CONFIG_FILE_NAME))
}

/// Write a starter configuration file. Fails if one already exists.
pub fn init(path: &Path, vdir: &Path) -> Result<()> {
    if path.exists() {
        bail!("configuration file already exists at {}", path.display());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config dir: {}", parent.display()))?;
    }
    let contents = format!(
        "# pinbook configuration\n\
         \n\
         # Directory containing .vcf contact files\n\
         vdir = {}\n\
         \n\
         # Remove tone diacritics from computed phonetic names\n\
         strip_tone_marks = false\n",
        toml::Value::String(vdir.display().to_string()),
    );
    fs::write(path, contents)
        .with_context(|| format!("failed to write configuration to {}", path.display()))
}

pub fn load(override_path: Option<&Path>) -> Result<Config> {
    let path = match override_path {
        Some(path) => path.to_path_buf(),
        None => default_config_path()?,
    };
    if !path.exists() {
        bail!(
            "configuration file not found at {}. Run `pinbook init <VDIR>` first.",
            path.display()
        );
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read configuration file at {}", path.display()))?;

    let value: toml::Value = toml::from_str(&raw)
        .with_context(|| format!("failed to parse {} as TOML", path.display()))?;

    warn_unknown_keys(&value);

    let cfg_file: ConfigFile = value
        .try_into()
        .with_context(|| format!("failed to deserialize config from {}", path.display()))?;

    let vdir = cfg_file
        .vdir
        .ok_or_else(|| anyhow!("`vdir` must be specified in configuration"))?;
    let vdir = expand_tilde(&vdir);

    if !vdir.exists() {
        bail!("configured vdir does not exist: {}", vdir.display());
    }

    Ok(Config {
        config_path: path,
        vdir,
        strip_tone_marks: cfg_file.strip_tone_marks.unwrap_or(false),
    })
}

fn warn_unknown_keys(value: &toml::Value) {
    let Some(table) = value.as_table() else {
        return;
    };

    let known = HashSet::from(["vdir", "strip_tone_marks"]);

    for key in table.keys() {
        if !known.contains(key.as_str()) {
            eprintln!("warning: unknown configuration key `{}`", key);
        }
    }
}
