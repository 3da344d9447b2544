//! Config Command
//!
//! Manage ScriptGenius configuration.
//!
//! Usage:
//!   scriptgenius config show [-g] [-f json]
//!   scriptgenius config path
//!   scriptgenius config init [-g] [--force]

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, OutputFormat};
use crate::config::ConfigLoader;
use crate::types::Result;

/// Show configuration
///
/// With `global`, prints the raw global file; otherwise the merged effective
/// configuration.
pub fn show(ctx: &CommandContext, global: bool, format: &str) -> Result<()> {
    let format = OutputFormat::parse(format)?;

    if global {
        match ConfigLoader::global_config_path() {
            Some(path) if path.exists() => {
                println!("# Global Config: {}\n", path.display());
                println!("{}", std::fs::read_to_string(&path)?);
            }
            Some(_) => {
                println!("No global config found.");
                println!("Run 'scriptgenius config init --global' to create one.");
            }
            None => println!("Cannot determine global config directory."),
        }
        return Ok(());
    }

    println!("{}", ConfigLoader::render(&ctx.config, format.is_json())?);
    Ok(())
}

/// Show configuration paths
pub fn path() -> Result<()> {
    ConfigLoader::show_path();
    Ok(())
}

/// Initialize global or project configuration
pub fn init(global: bool, force: bool) -> Result<()> {
    let out = Output::new();
    let path = if global {
        ConfigLoader::global_config_path()
    } else {
        Some(ConfigLoader::project_config_path())
    };

    let existed = path.as_ref().is_some_and(|p| p.exists());
    let path = if global {
        ConfigLoader::init_global(force)?
    } else {
        ConfigLoader::init_project(force)?
    };

    if existed && !force {
        out.warning(&format!(
            "Config already exists: {} (use --force to overwrite)",
            path.display()
        ));
    } else {
        let scope = if global { "global" } else { "project" };
        out.success(&format!("Initialized {} configuration", scope));
        println!("  Config:    {}", path.display());
    }
    Ok(())
}
