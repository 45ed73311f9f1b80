//! Config command handlers.

use anyhow::{Context, Result, bail};
use parley_core::config;

pub fn path() {
    println!("{}", config::paths::config_path().display());
}

pub fn init() -> Result<()> {
    let config_path = config::paths::config_path();
    let created = config::Config::init_at(&config_path)
        .with_context(|| format!("init config at {}", config_path.display()))?;
    if !created {
        bail!("Config already exists at {}", config_path.display());
    }
    println!("Created config at {}", config_path.display());
    Ok(())
}
