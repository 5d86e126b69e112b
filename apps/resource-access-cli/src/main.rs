//! `rac`: see how the resource access layer interprets hrefs, filters and requests.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use resource_access::{
    ApiRequest, FilterCompiler, ResourceAccessConfig, ResourceAccessService, ResourceLocator,
    StaticPermissions, StaticSchema,
};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = ResourceAccessConfig::load(cli.config.as_deref())
        .context("failed to load configuration")?;
    tracing::debug!(
        collections = config.collections.len(),
        types = config.types.len(),
        "configuration loaded"
    );

    let output = run(cli.command, &config)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(command: Command, config: &ResourceAccessConfig) -> Result<Value> {
    match command {
        Command::Locate { href } => {
            let locator = ResourceLocator::with_default_decoder(&config.api_prefix);
            let address = locator.parse(&href);
            Ok(json!({
                "address": address,
                "href": locator.href(&address),
                "shape": address.shape(),
            }))
        }
        Command::Filter { type_name, clauses } => {
            let schema = StaticSchema::new(config.types.clone());
            let expression = FilterCompiler::new(&schema)
                .with_priority(config.filter_priority)
                .compile(&type_name, &clauses)?;
            Ok(expression.to_wire())
        }
        Command::Resolve {
            verb,
            path,
            body,
            filters,
            attributes,
            grants,
        } => {
            let service = ResourceAccessService::from_config(config)
                .context("invalid collection registry")?;
            let mut request = ApiRequest::new(verb, path).with_attributes(attributes);
            request.filters = filters;
            if let Some(body) = body {
                request.body =
                    Some(serde_json::from_str(&body).context("--body is not valid JSON")?);
            }
            let descriptor = service
                .prepare(&request, &StaticPermissions::new(grants))
                .map_err(|e| anyhow::anyhow!("{e} (HTTP {})", e.status().as_u16()))?;
            Ok(serde_json::to_value(&descriptor)?)
        }
    }
}
