use crate::cli::{ParamsArgs, ParamsCommands};
use crate::error::Result;
use crate::params::ParamsLocator;
use std::path::PathBuf;
use tracing::info;

pub fn run(args: ParamsArgs) -> Result<()> {
    match args.command {
        ParamsCommands::Path => handle_path(),
        ParamsCommands::SetPath { path } => handle_set_path(path),
        ParamsCommands::ResetPath => handle_reset_path(),
    }
}

fn handle_path() -> Result<()> {
    let locator = ParamsLocator::new()?;
    let path = locator.get_params_path();
    println!("{}", path.display());
    if !path.is_dir() {
        eprintln!("Note: this directory does not exist yet.");
    }
    Ok(())
}

fn handle_set_path(path: PathBuf) -> Result<()> {
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()?.join(path)
    };
    info!("Persisting custom params path: {:?}", &absolute);
    ParamsLocator::set_custom_path(&absolute)?;
    println!("AlphaFold parameter path set to: {}", absolute.display());
    Ok(())
}

fn handle_reset_path() -> Result<()> {
    info!("Removing custom params path.");
    ParamsLocator::reset_path()?;
    let locator = ParamsLocator::new()?;
    println!(
        "AlphaFold parameter path reset to default: {}",
        locator.get_params_path().display()
    );
    Ok(())
}
