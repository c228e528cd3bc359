use std::path::{Path, PathBuf};

use crate::cli::commands::InitArgs;
use crate::io::config_io::{self, DATA_DIR_NAME};

/// Where `tm init` creates the data directory: the -D path as given, or
/// `.taskmate/` under the current directory.
fn init_target(flag: Option<&str>, cwd: &Path) -> PathBuf {
    match flag {
        Some(dir) => PathBuf::from(dir),
        None => cwd.join(DATA_DIR_NAME),
    }
}

pub fn cmd_init(args: InitArgs, data_dir: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let target = init_target(data_dir, &cwd);

    // Warn when an enclosing directory already has one
    if data_dir.is_none()
        && let Some(parent) = cwd.parent()
        && let Ok(existing) = config_io::discover_data_dir(parent)
    {
        eprintln!("Note: parent data directory found at {}/", existing.display());
        eprintln!("Creating a new one in ./{}/", DATA_DIR_NAME);
    }

    config_io::init_data_dir(&target, args.force)?;
    println!("Initialized TaskMate data directory: {}", target.display());
    Ok(())
}
