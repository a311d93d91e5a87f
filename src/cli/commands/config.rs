use anyhow::{bail, Result};
use std::path::PathBuf;

use crate::cli::commands::Command;
use crate::cli::ConfigAction;
use crate::config::DeskflowConfig;

pub struct ConfigCommand {
    action: ConfigAction,
    dir: PathBuf,
}

impl ConfigCommand {
    pub fn new(action: ConfigAction) -> Self {
        Self {
            action,
            dir: PathBuf::from("."),
        }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    fn init(&self, force: bool) -> Result<()> {
        let path = self.dir.join("deskflow.toml");
        if path.exists() && !force {
            println!("⚠️  {} already exists", path.display());
            println!("   💡 Use --force to overwrite it");
            bail!("configuration file already exists");
        }

        DeskflowConfig::default().save_to_file(&path)?;
        println!("✅ Wrote {}", path.display());
        println!("   💡 Set session.actor_id and session.role, then export DESKFLOW_TOKEN");
        Ok(())
    }

    fn show(&self) -> Result<()> {
        let mut effective = DeskflowConfig::load_from(&self.dir)?;
        redact(&mut effective);
        print!("{}", toml::to_string_pretty(&effective)?);
        Ok(())
    }
}

fn redact(config: &mut DeskflowConfig) {
    if config.backend.token.is_some() {
        config.backend.token = Some("********".to_string());
    }
}

impl Command for ConfigCommand {
    async fn execute(&self) -> Result<()> {
        match self.action {
            ConfigAction::Init { force } => self.init(force),
            ConfigAction::Show => self.show(),
        }
    }
}
