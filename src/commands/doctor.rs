use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::config::{self, Config};
use crate::lookup::{BikeIndexClient, SerialLookup};
use crate::platform::{ReplyPoster, RestPoster};

#[derive(Debug, Args)]
pub struct DoctorArgs {
    /// Path to the config file (defaults to .stolenbot.toml in the current directory)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Skip network probes; check only the config file and templates
    #[arg(long)]
    pub offline: bool,
    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DoctorReport {
    pub config_path: String,
    pub templates_ok: bool,
    pub lookup_reachable: Option<bool>,
    pub credentials_ok: Option<bool>,
    pub issues: Vec<String>,
}

impl DoctorArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        let path = match self.config.clone() {
            Some(p) => p,
            None => {
                let cwd = std::env::current_dir().context("could not determine current directory")?;
                config::find_config(&cwd).ok_or_else(|| {
                    anyhow::anyhow!(
                        "no {} found at {}; run `stolenbot init` first",
                        config::CONFIG_FILE,
                        cwd.display()
                    )
                })?
            }
        };
        let config = Config::load(&path)?;

        let mut report = DoctorReport {
            config_path: path.display().to_string(),
            templates_ok: true,
            lookup_reachable: None,
            credentials_ok: None,
            issues: vec![],
        };

        if let Err(e) = config.replies.templates().validate() {
            report.templates_ok = false;
            report.issues.push(format!("reply template does not render: {e}"));
        }

        if !self.offline {
            probe(&config, &mut report);
        }

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            OutputFormat::Text => print_text(&report),
        }

        if report.issues.is_empty() {
            Ok(())
        } else {
            anyhow::bail!("{} issue(s) found", report.issues.len())
        }
    }
}

fn probe(config: &Config, report: &mut DoctorReport) {
    // A serial no bike should carry; an empty result still proves the
    // service answers.
    let lookup = BikeIndexClient::new(&config.lookup.base_url);
    match lookup.search("stolenbot-doctor-probe") {
        Ok(_) => report.lookup_reachable = Some(true),
        Err(e) => {
            report.lookup_reachable = Some(false);
            report.issues.push(format!("lookup service: {e}"));
        }
    }

    match config.auth.resolve_bearer_token() {
        Ok(token) => {
            let poster = RestPoster::new(
                &config.platform.rest_base_url,
                &token,
                config.platform.max_message_len,
            );
            match poster.verify_credentials() {
                Ok(identity) => {
                    report.credentials_ok = Some(true);
                    tracing::info!(screen_name = %identity.screen_name, "credentials valid");
                }
                Err(e) => {
                    report.credentials_ok = Some(false);
                    report.issues.push(format!("credentials: {e:#}"));
                }
            }
        }
        Err(e) => {
            report.credentials_ok = Some(false);
            report.issues.push(format!("{e:#}"));
        }
    }
}

fn print_text(report: &DoctorReport) {
    println!("config:      {}", report.config_path);
    println!("templates:   {}", if report.templates_ok { "ok" } else { "BROKEN" });
    match report.lookup_reachable {
        Some(true) => println!("lookup:      reachable"),
        Some(false) => println!("lookup:      UNREACHABLE"),
        None => println!("lookup:      skipped (offline)"),
    }
    match report.credentials_ok {
        Some(true) => println!("credentials: ok"),
        Some(false) => println!("credentials: FAILED"),
        None => println!("credentials: skipped (offline)"),
    }
    for issue in &report.issues {
        println!("issue: {issue}");
    }
}
