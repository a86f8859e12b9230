use anyhow::Result;

use crate::Context;
use crate::cli::ConfigCommand;
use crate::config::Config;
use crate::paths;
use crate::ui;

pub fn run(_ctx: &Context, config: &Config, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => show(config),
        ConfigCommand::Path => {
            println!("{}", paths::config_file()?.display());
            Ok(())
        }
    }
}

fn show(config: &Config) -> Result<()> {
    let path = paths::config_file()?;

    ui::header("Configuration");
    ui::kv("File", &path.display().to_string());
    if !path.exists() {
        ui::dim("(not found, using defaults)");
    }

    println!();
    ui::kv("endpoint", config.endpoint.as_deref().unwrap_or("(unset)"));
    ui::kv(
        "max_pages",
        &config
            .max_pages
            .map_or_else(|| format!("{} (default)", pagekit::DEFAULT_MAX_PAGES), |n| n.to_string()),
    );
    ui::kv(
        "timeout_secs",
        &config
            .timeout_secs
            .map_or_else(|| "(none)".to_string(), |s| s.to_string()),
    );
    ui::kv(
        "identity_field",
        config
            .identity_field
            .as_deref()
            .unwrap_or(equivalence::DEFAULT_IDENTITY_FIELD),
    );
    ui::kv("match_by_id", &config.match_by_id.to_string());
    Ok(())
}
