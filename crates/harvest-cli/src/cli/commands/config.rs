//! `harvest config` – show where the config lives and what is in effect.

use anyhow::Result;
use harvest_core::config::{self, HarvestConfig};

pub fn run_config(cfg: &HarvestConfig) -> Result<()> {
    println!("# {}", config::config_path()?.display());
    print!("{}", cfg.to_toml_string()?);
    let policy = cfg.reconnect_policy();
    if policy.is_enabled() {
        println!(
            "# reconnect: up to {} attempts, backoff {:?}..{:?}",
            policy.max_attempts, policy.base_delay, policy.max_delay
        );
    } else {
        println!("# reconnect: off");
    }
    Ok(())
}
