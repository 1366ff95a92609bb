//! `olk` command line: subcommands over one logged-in [`ArrayClient`].

use crate::client::ArrayClient;
use crate::config::ArrayConfig;
use crate::credentials::encode_credential;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

/// Command line of the `olk` binary.
#[derive(Parser)]
#[command(name = "olk")]
#[command(about = "OceanLink storage array REST CLI", long_about = None)]
pub struct Cli {
    /// Array configuration file (TOML or JSON)
    #[arg(short, long, env = "OLK_CONFIG", default_value = "/etc/oceanlink/array.toml")]
    pub config: PathBuf,

    /// Emit logs as JSON
    #[arg(long)]
    pub json: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands of `olk`.
#[derive(Subcommand)]
pub enum Command {
    /// Log in, print the device URL, log out
    CheckLogin,
    /// Print the array `/system/` record
    ArrayInfo,
    /// List storage pools
    Pools,
    /// Show one filesystem by name
    Fs {
        /// Filesystem name as created, dashes allowed
        name: String,
    },
    /// List every HyperMetro domain
    HypermetroDomains,
    /// Print the obfuscated form of a credential for the config file
    EncodeCredential {
        /// Plaintext username or password
        value: String,
    },
}

impl Cli {
    /// Run the selected subcommand against the configured array.
    pub async fn run(self) -> Result<()> {
        if let Command::EncodeCredential { ref value } = self.command {
            println!("{}", encode_credential(value));
            return Ok(());
        }

        let config = ArrayConfig::from_file(&self.config)
            .with_context(|| format!("loading {}", self.config.display()))?;
        let client = ArrayClient::from_config(&config)?;
        client.login().await?;

        let outcome = self.dispatch(&client).await;
        client.shutdown().await;
        outcome
    }

    async fn dispatch(&self, client: &ArrayClient) -> Result<()> {
        match self.command {
            Command::CheckLogin => {
                let url = client.base_url().await.unwrap_or_default();
                println!("Logged in: {}", url);
            }
            Command::ArrayInfo => {
                let info = client.get_array_info().await?;
                print_json(&info.unwrap_or(Value::Null))?;
            }
            Command::Pools => {
                for pool in client.get_all_pools().await? {
                    println!(
                        "{}\t{}",
                        pool.get("ID").and_then(Value::as_str).unwrap_or("-"),
                        pool.get("NAME").and_then(Value::as_str).unwrap_or("-")
                    );
                }
            }
            Command::Fs { ref name } => match client.get_filesystem_by_name(name).await? {
                Some(fs) => print_json(&fs)?,
                None => anyhow::bail!("Filesystem {} not found", name),
            },
            Command::HypermetroDomains => {
                let domains = client.get_hypermetro_domains().await?;
                println!("{} domains", domains.len());
                for domain in domains {
                    println!(
                        "{}\t{}",
                        domain.get("ID").and_then(Value::as_str).unwrap_or("-"),
                        domain.get("NAME").and_then(Value::as_str).unwrap_or("-")
                    );
                }
            }
            Command::EncodeCredential { .. } => {}
        }
        Ok(())
    }
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
