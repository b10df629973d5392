use std::fs;
use std::path::Path;

use crate::cli::commands::InitArgs;
use crate::io::config_io::{self, CONFIG_FILE};

pub const CONFIG_TEMPLATE: &str = include_str!("../../templates/config.toml");

/// Write the config template into `data_dir`, creating it if needed.
/// Refuses to replace an existing config.toml unless `force` is set.
fn write_config_template(data_dir: &Path, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = data_dir.join(CONFIG_FILE);
    if path.exists() && !force {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )
        .into());
    }
    fs::create_dir_all(data_dir)?;
    fs::write(&path, CONFIG_TEMPLATE)?;
    Ok(())
}

pub fn cmd_init(args: InitArgs, data_dir: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = config_io::resolve_data_dir(data_dir)?;
    write_config_template(&data_dir, args.force)?;
    println!("Initialized taskdeck in {}", data_dir.display());
    Ok(())
}
