//! Configuration management commands.

use std::fs;

use anyhow::{bail, Context as _, Result};
use dialoguer::Confirm;

use super::{ConfigArgs, ConfigCommand};
use crate::config::{generate_default_config, CONFIG_FILE_NAMES};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Path => show_path(ctx),
        ConfigCommand::Init { force } => init_config(force, ctx),
        ConfigCommand::Validate => validate_config(ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.debug(&format!("Loaded from {}", path.display())),
        None => ctx.output.debug("No config file found, using defaults"),
    }
    println!("{}", ctx.config.to_toml()?);
    Ok(())
}

fn show_path(ctx: &Context) -> Result<()> {
    match &ctx.config_path {
        Some(path) if ctx.output.is_json() => {
            ctx.output.json(&serde_json::json!({ "path": path }));
        }
        Some(path) => println!("{}", path.display()),
        None => bail!(
            "No config file found. Looked for {} in {} and its parents.",
            CONFIG_FILE_NAMES.join(", "),
            ctx.cwd.display()
        ),
    }
    Ok(())
}

fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let path = ctx.resolve_path(CONFIG_FILE_NAMES[0]);

    if path.exists() && !force {
        if ctx.output.is_json() {
            bail!("{} already exists, use --force to overwrite", path.display());
        }
        let overwrite = Confirm::new()
            .with_prompt(format!("{} already exists. Overwrite?", path.display()))
            .default(false)
            .interact()?;
        if !overwrite {
            ctx.output.info("Aborted.");
            return Ok(());
        }
    }

    fs::write(&path, generate_default_config()?)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    ctx.output.success(&format!("Created {}", path.display()));
    Ok(())
}

fn validate_config(ctx: &Context) -> Result<()> {
    ctx.config.validate()?;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({ "valid": true }));
        return Ok(());
    }
    ctx.output.success("Configuration is valid");
    ctx.output.kv("database", &ctx.config.database.url);
    ctx.output.kv("currency", ctx.config.orders.currency.code());
    ctx.output.kv(
        "page size",
        &format!(
            "{} (max {})",
            ctx.config.catalog.default_page_size, ctx.config.catalog.max_page_size
        ),
    );
    ctx.output.kv(
        "contact rate limit",
        &format!(
            "{} per {}s",
            ctx.config.contact.rate_limit_requests, ctx.config.contact.rate_limit_window_secs
        ),
    );
    Ok(())
}
