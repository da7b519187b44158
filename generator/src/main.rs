mod cli;

use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use xsd2sql::{
    config::{self, ConfigError, DomainConfig},
    detect,
    loader::{self, LoadOptions},
    ConfiguredPolicy, DomainPolicy, GenericPolicy,
};
use xsd2sql_xsd::Schema;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = cli::Cli::parse();

    let options = LoadOptions {
        allow_dtd: cli.allow_dtd,
        follow_includes: !cli.no_follow_includes,
    };
    let loaded = loader::load_schemas(&cli.input, &cli.type_files, options)
        .with_context(|| format!("failed to load {}", cli.input.display()))?;

    let policy = select_policy(&cli, &loaded.main)?;
    let conversion = xsd2sql::convert(&loaded.table, &loaded.main, policy.as_ref())
        .with_context(|| format!("failed to convert {}", cli.input.display()))?;

    match &cli.output {
        Some(path) => fs::write(path, &conversion.ddl)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{}", conversion.ddl),
    }

    let warnings = conversion.diagnostics.count(|d| d.is_warning());
    info!(
        "{} tables, {} foreign keys, {} choice groups, {} warnings",
        conversion.graph.tables().len(),
        conversion.graph.foreign_keys().len(),
        conversion.graph.choice_groups().count(),
        warnings
    );
    if let Some(path) = &cli.output {
        info!("DDL written to {}", path.display());
    }
    Ok(())
}

/// `--config`, else the config named by `--domain`, else the detected one, else `generic`.
fn select_policy(cli: &cli::Cli, main: &Schema) -> Result<Box<dyn DomainPolicy>> {
    if let Some(path) = &cli.config {
        let config = DomainConfig::from_yaml_file(path)?;
        info!("using domain `{}` from {}", config.domain, path.display());
        return Ok(Box::new(ConfiguredPolicy::new(config)));
    }

    let configs = config::load_config_dir(&cli.config_dir).unwrap_or_else(|error| {
        warn!("{error}; falling back to the generic policy");
        Vec::new()
    });
    let by_name = |name: &str| configs.iter().find(|c| c.domain == name).cloned();

    let config = match &cli.domain {
        Some(domain) => match by_name(domain) {
            Some(config) => Some(config),
            None if domain == "generic" => None,
            None => return Err(ConfigError::UnknownDomain(domain.clone()).into()),
        },
        None => detect::detect_domain(main, &configs)
            .cloned()
            .or_else(|| by_name("generic")),
    };

    Ok(match config {
        Some(config) => {
            info!("using domain `{}`", config.domain);
            Box::new(ConfiguredPolicy::new(config))
        }
        None => {
            info!("using the built-in generic policy");
            Box::new(GenericPolicy)
        }
    })
}
