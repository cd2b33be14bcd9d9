//! mod `api` provides the topmost APIs of the crate.
//! The global config is optional, breakers and retry transports can be built by hand.
//! When it is used, there are three ways to perform initialization:
//!
//!  1. `init_default()`, using the system environment and the default config.
//!  2. `init_with_config(config_entity: ConfigEntity)`, using a customized `ConfigEntity`.
//!  3. `init_with_config_file(config_path: &mut String)`, using a YAML file.
//!
//! Then `circuit_breaker()`, `breaker_transport()`, `breaker_handler()` and `retry_transport()`
//! build the components from the effective global config.

mod build;
mod init;

pub use build::*;
pub use init::*;
