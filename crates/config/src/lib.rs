//! Configuration loading for the tably gateway.
//!
//! Discovery order: `./tably.{toml,yaml,yml,json}` (project-local), then
//! `~/.config/tably/`. String values support `${ENV_VAR}` substitution.
//! Missing file → defaults (bind 127.0.0.1, port 3000).

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{clear_config_dir, config_dir, discover_and_load, load_config, set_config_dir},
    schema::{GatewayConfig, TablyConfig},
};
