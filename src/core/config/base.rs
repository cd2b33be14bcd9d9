use super::{constant::*, ConfigEntity};
use crate::circuitbreaker::BreakerConfig;
use crate::retry::RetryConfig;
use crate::{logging, utils, Error, Result};
use lazy_static::lazy_static;
use std::env;
use std::fs;
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

lazy_static! {
    static ref GLOBAL_CONFIG: RwLock<ConfigEntity> = RwLock::new(ConfigEntity::new());
}

fn global_config() -> RwLockReadGuard<'static, ConfigEntity> {
    GLOBAL_CONFIG
        .read()
        .unwrap_or_else(PoisonError::into_inner)
}

pub fn reset_global_config(entity: ConfigEntity) {
    let mut cfg = GLOBAL_CONFIG
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    *cfg = entity;
}

// init_config_with_yaml loads general configuration from the YAML file under provided path.
pub fn init_config_with_yaml(config_path: &mut String) -> Result<()> {
    apply_yaml_config_file(config_path)?;
    override_config_from_env_and_init_log()?;
    Ok(())
}

// apply_yaml_config_file loads general configuration from the given YAML file.
fn apply_yaml_config_file(config_path: &mut String) -> Result<()> {
    // Priority: system environment > YAML file > default config
    if utils::is_blank(config_path) {
        // If the config file path is absent, try to resolve it from the system env.
        *config_path = env::var(CONF_FILE_PATH_ENV_KEY).unwrap_or_else(|_| CONFIG_FILENAME.into());
    }
    load_global_config_from_yaml_file(config_path)
}

fn load_global_config_from_yaml_file(path_str: &str) -> Result<()> {
    if path_str == CONFIG_FILENAME {
        // use the default global config
        return Ok(());
    }
    let path = Path::new(path_str);
    if !path.exists() {
        return Err(Error::msg(format!(
            "YAML configuration file {} does not exist",
            path_str
        )));
    }
    let content = fs::read_to_string(path)?;
    let entity: ConfigEntity = serde_yaml::from_str(&content)?;
    entity.check()?;
    logging::info!("[Config] Resolving config from file, file {}", path_str);
    reset_global_config(entity);
    Ok(())
}

pub fn override_config_from_env_and_init_log() -> Result<()> {
    // The value in system env overrides the value in config file.
    override_items_from_system_env()?;
    init_log();
    Ok(())
}

fn override_items_from_system_env() -> Result<()> {
    let app_name = match env::var(APP_NAME_ENV_KEY) {
        Ok(app_name) if !utils::is_blank(&app_name) => app_name,
        _ => return Ok(()),
    };
    let mut cfg = GLOBAL_CONFIG
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    let mut overridden = cfg.clone();
    overridden.config.app.app_name = app_name;
    overridden.check()?;
    *cfg = overridden;
    Ok(())
}

pub fn init_log() {
    logging::logger_init(log_config_file());
    logging::info!("[Config] App name resolved, appName {}", app_name());
    logging::info!(
        "[Config] Print effective global config, globalConfig {}",
        *global_config()
    );
}

#[inline]
pub fn log_config_file() -> Option<String> {
    let file = global_config().config.log.config_file.clone();
    if utils::is_blank(&file) {
        None
    } else {
        Some(file)
    }
}

#[inline]
pub fn app_name() -> String {
    global_config().config.app.app_name.clone()
}

#[inline]
pub fn breaker_config() -> BreakerConfig {
    global_config().config.breaker.clone()
}

#[inline]
pub fn retry_config() -> RetryConfig {
    global_config().config.retry.clone()
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Mutex;

    lazy_static! {
        // the global config and the env vars are process wide
        static ref SERIAL: Mutex<()> = Mutex::new(());
    }

    fn yaml_file(name: &str, content: &str) -> String {
        let path = env::temp_dir().join(format!(
            "resilience-{}-{}.yaml",
            name,
            std::process::id()
        ));
        fs::write(&path, content).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn load_from_yaml() {
        let _guard = SERIAL.lock().unwrap_or_else(PoisonError::into_inner);
        let mut path = yaml_file(
            "load",
            "version: v1\nconfig:\n  app:\n    app_name: orders\n  breaker:\n    cooldown_ms: 2500\n  retry:\n    max_attempts: 4\n",
        );
        init_config_with_yaml(&mut path).unwrap();
        assert_eq!(app_name(), "orders");
        assert_eq!(breaker_config().cooldown_ms, 2500);
        assert_eq!(retry_config().max_attempts, 4);
        reset_global_config(ConfigEntity::new());
        assert_eq!(app_name(), DEFAULT_APP_NAME);
    }

    #[test]
    fn missing_file() {
        let _guard = SERIAL.lock().unwrap_or_else(PoisonError::into_inner);
        let mut path = String::from("/definitely/not/here.yaml");
        assert!(init_config_with_yaml(&mut path).is_err());
    }

    #[test]
    fn invalid_file_is_not_installed() {
        let _guard = SERIAL.lock().unwrap_or_else(PoisonError::into_inner);
        reset_global_config(ConfigEntity::new());
        let mut path = yaml_file(
            "invalid",
            "config:\n  app:\n    app_name: broken\n  breaker:\n    failure_ratio: 2.0\n",
        );
        assert!(init_config_with_yaml(&mut path).is_err());
        assert_eq!(app_name(), DEFAULT_APP_NAME);
    }

    #[test]
    fn oversized_window_is_not_installed() {
        let _guard = SERIAL.lock().unwrap_or_else(PoisonError::into_inner);
        reset_global_config(ConfigEntity::new());
        let mut path = yaml_file(
            "oversized",
            "config:\n  breaker:\n    window_ms: 18446744073709551615\n",
        );
        assert!(init_config_with_yaml(&mut path).is_err());
        assert_eq!(breaker_config().window_ms, DEFAULT_WINDOW_MS);
    }

    #[test]
    fn blank_path_uses_defaults() {
        let _guard = SERIAL.lock().unwrap_or_else(PoisonError::into_inner);
        reset_global_config(ConfigEntity::new());
        env::remove_var(CONF_FILE_PATH_ENV_KEY);
        let mut path = String::new();
        init_config_with_yaml(&mut path).unwrap();
        assert_eq!(path, CONFIG_FILENAME);
        assert_eq!(breaker_config(), BreakerConfig::default());
    }

    #[test]
    fn app_name_from_env() {
        let _guard = SERIAL.lock().unwrap_or_else(PoisonError::into_inner);
        reset_global_config(ConfigEntity::new());
        env::set_var(APP_NAME_ENV_KEY, "from-env");
        override_config_from_env_and_init_log().unwrap();
        env::remove_var(APP_NAME_ENV_KEY);
        assert_eq!(app_name(), "from-env");
        reset_global_config(ConfigEntity::new());
    }
}
