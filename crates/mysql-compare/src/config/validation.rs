//! Configuration validation.

use super::{Config, InstanceConfig, SSL_MODES};
use crate::error::{CompareError, Result};

fn validate_instance(name: &str, instance: &InstanceConfig, database: &str) -> Result<()> {
    if instance.host.is_empty() {
        return Err(CompareError::Config(format!("{}.host is required", name)));
    }
    if instance.user.is_empty() {
        return Err(CompareError::Config(format!("{}.user is required", name)));
    }
    if database.is_empty() {
        return Err(CompareError::Config(format!(
            "database is required for {}",
            name
        )));
    }
    if !SSL_MODES.contains(&instance.ssl_mode.to_lowercase().as_str()) {
        return Err(CompareError::Config(format!(
            "{}.ssl_mode must be one of {}, got '{}'",
            name,
            SSL_MODES.join(", "),
            instance.ssl_mode
        )));
    }
    Ok(())
}

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    validate_instance("instance1", &config.instance1, config.database1())?;
    validate_instance("instance2", &config.instance2, config.database2())?;

    // Comparing an instance against itself finds nothing
    if config.instance1.host == config.instance2.host
        && config.instance1.port == config.instance2.port
        && config.database1() == config.database2()
    {
        return Err(CompareError::Config(
            "instance1 and instance2 cannot be the same database".into(),
        ));
    }

    if config.comparison.workers == 0 {
        return Err(CompareError::Config(
            "comparison.workers must be at least 1".into(),
        ));
    }
    if config.comparison.max_connections == 0 {
        return Err(CompareError::Config(
            "comparison.max_connections must be at least 1".into(),
        ));
    }
    if config.report.directory_prefix.is_empty() {
        return Err(CompareError::Config(
            "report.directory_prefix must not be empty".into(),
        ));
    }

    Ok(())
}
