use kvdns_domain::{CliOverrides, Config};

/// Loads the file/env/CLI layered configuration and rejects invalid settings
/// before anything is bound.
pub fn load_config(path: Option<&str>, overrides: CliOverrides) -> anyhow::Result<Config> {
    let config = Config::load(path, overrides)?;
    config.validate()?;
    Ok(config)
}
