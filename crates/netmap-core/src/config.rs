//! Configuration management for netmap services.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (`NETMAP__SECTION__KEY`)
//! 2. Config file (`netmap.toml`, or the prefix given on the command line)
//! 3. Defaults

use std::path::PathBuf;

use serde::de::DeserializeOwned;

use crate::error::Result;

pub const ENV_PREFIX: &str = "NETMAP";

/// Directory name used under the platform data directory.
pub const APP_DIR_NAME: &str = "netmap";

/// Load one `[section]` of the configuration, falling back to the
/// section type's defaults when it is absent everywhere.
pub fn load_section<T>(file_prefix: &str, section: &str) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    match cfg.get::<T>(section) {
        Ok(value) => Ok(value),
        Err(config::ConfigError::NotFound(_)) => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}

/// Application-support directory for persisted history.
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::data_dir)
        .map(|base| base.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(".netmap"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Section {
        #[serde(default)]
        value: u32,
    }

    #[test]
    fn missing_section_uses_defaults() {
        let section: Section =
            load_section("netmap-test-config-that-does-not-exist", "nothing_here").unwrap();
        assert_eq!(section, Section::default());
    }

    #[test]
    fn data_dir_is_app_scoped() {
        let dir = default_data_dir();
        assert!(dir.ends_with(APP_DIR_NAME) || dir.ends_with(".netmap"));
    }
}
