use crate::config::GateConfig;
use crate::rate_limiter::RateLimiter;
use crate::registry::TriggerRegistry;
use crate::service_resolver::ServiceKeyResolver;
use anyhow::{anyhow, Context, Result};
use std::env;
use std::fs;
use std::sync::Arc;

/// Application entrypoint. Loads the trigger document named on the command
/// line, compiles it into a registry, and reports what was registered.
pub fn run() -> Result<()> {
    let mut args = env::args().skip(1);
    let config_path = args
        .next()
        .ok_or_else(|| anyhow!("usage: eventgate <trigger-config.json>"))?;
    let raw = fs::read_to_string(&config_path)
        .with_context(|| format!("unable to read {config_path}"))?;
    let config = GateConfig::from_json(&raw)
        .with_context(|| format!("invalid trigger config {config_path}"))?;

    let limiter = Arc::new(RateLimiter::new());
    let resolver = Arc::new(ServiceKeyResolver::new());
    let registry = TriggerRegistry::from_config(&config, limiter, resolver)
        .context("unable to build trigger registry")?;

    println!("registered {} trigger rule(s)", registry.len());
    for name in registry.rule_names() {
        println!("  {name}");
    }
    Ok(())
}
