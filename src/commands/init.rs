use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::config::{self, starter_toml};

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Directory to initialize (defaults to the current directory)
    #[arg(long)]
    pub dir: Option<PathBuf>,
    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        let dir = match self.dir.clone() {
            Some(d) => d,
            None => std::env::current_dir().context("could not determine current directory")?,
        };
        let path = dir.join(config::CONFIG_FILE);

        if path.exists() && !self.force {
            anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
        }

        std::fs::write(&path, starter_toml())
            .with_context(|| format!("writing {}", path.display()))?;
        println!("wrote {}", path.display());
        Ok(())
    }
}
