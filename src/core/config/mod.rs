//! Global configuration of the crate: the app name, the defaults of circuit breakers and
//! retry transports built from the config, and the logging backend.
//! Priority: system environment > YAML file > default config.

mod base;
mod constant;
mod entity;

pub use base::*;
pub use constant::*;
pub use entity::*;
