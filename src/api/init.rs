//! Initialization functions override the global config, from a manual config, a yaml file
//! or env variables, and then initialize the global logger.

use crate::config::{self, ConfigEntity};
use crate::Result;

/// `init_default` initializes the global config from the system environment and the default value.
#[inline]
pub fn init_default() -> Result<()> {
    init_resilience(&mut String::new())
}

/// `init_with_config` installs the given config.
#[inline]
pub fn init_with_config(config_entity: ConfigEntity) -> Result<()> {
    config_entity.check()?;
    config::reset_global_config(config_entity);
    config::override_config_from_env_and_init_log()
}

/// `init_with_config_file` loads the general configuration from the given YAML file.
/// A blank path falls back to the `RESILIENCE_CONFIG_FILE_PATH` env variable, then to the defaults.
#[inline]
pub fn init_with_config_file(config_path: &mut String) -> Result<()> {
    init_resilience(config_path)
}

#[inline]
fn init_resilience(config_path: &mut String) -> Result<()> {
    config::init_config_with_yaml(config_path)
}
