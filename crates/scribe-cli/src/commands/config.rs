use std::path::Path;

use clap::{Parser, Subcommand};
use scribe::config::Config;
use scribe::export::{CredentialStore, FileCredentialStore, NotionCredentials};

use crate::error::CliResult;
use crate::output::{OutputFormat, settings_table};

#[derive(Parser)]
pub struct ConfigCommand {
    #[clap(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    #[clap(about = "Show current configuration")]
    Show,

    #[clap(about = "Store the Notion API token and database ID")]
    Notion(NotionArgs),
}

#[derive(Parser)]
pub struct NotionArgs {
    #[clap(long, help = "Notion integration token")]
    pub token: String,

    #[clap(long, help = "ID of the database pages are created in")]
    pub database: String,
}

impl ConfigCommand {
    pub async fn execute(
        &self,
        config: &Config,
        config_path: Option<&Path>,
        format: OutputFormat,
    ) -> CliResult<()> {
        match &self.command {
            ConfigSubcommand::Show => Self::show(config, config_path, format).await,
            ConfigSubcommand::Notion(args) => Self::notion(config, args, format).await,
        }
    }

    async fn show(config: &Config, config_path: Option<&Path>, format: OutputFormat) -> CliResult<()> {
        let credentials = FileCredentialStore::new(config.notion.credentials_path.clone())
            .load()
            .await?
            .with_env_fallback(&config.notion.api_token_env);

        match format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "proxy": {
                        "listen_addr": config.proxy.listen_addr,
                        "upstream_url": config.proxy.upstream_url,
                        "allowed_hosts": config.proxy.allowed_hosts,
                        "timeout_secs": config.proxy.timeout_secs,
                    },
                    "capture": {
                        "path_suffix": config.capture.path_suffix,
                        "session_param": config.capture.session_param,
                        "cache_param": config.capture.cache_param,
                    },
                    "export": {
                        "title_prefix": config.export.title_prefix,
                        "output_dir": config.export.output_dir.display().to_string(),
                        "block_ceiling": config.export.block_ceiling,
                    },
                    "notion": {
                        "api_url": config.notion.api_url,
                        "notion_version": config.notion.notion_version,
                        "timeout_secs": config.notion.timeout_secs,
                        "credentials_path": config.notion.credentials_path.display().to_string(),
                        "credentials_configured": credentials.is_complete(),
                    }
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                match config_path {
                    Some(path) => println!("Configuration from: {}", path.display()),
                    None => println!("Configuration: (default search path)"),
                }
                println!("==============================\n");

                println!("[Proxy]");
                let proxy_table = settings_table(&[
                    ("listen_addr", config.proxy.listen_addr.clone()),
                    (
                        "upstream_url",
                        config
                            .proxy
                            .upstream_url
                            .clone()
                            .unwrap_or_else(|| "(not set)".to_string()),
                    ),
                    (
                        "allowed_hosts",
                        if config.proxy.allowed_hosts.is_empty() {
                            "(all)".to_string()
                        } else {
                            config.proxy.allowed_hosts.join(", ")
                        },
                    ),
                    ("timeout_secs", config.proxy.timeout_secs.to_string()),
                ]);
                println!("{proxy_table}\n");

                println!("[Capture]");
                let capture_table = settings_table(&[
                    ("path_suffix", config.capture.path_suffix.clone()),
                    ("session_param", config.capture.session_param.clone()),
                    ("cache_param", config.capture.cache_param.clone()),
                ]);
                println!("{capture_table}\n");

                println!("[Export]");
                let export_table = settings_table(&[
                    ("title_prefix", config.export.title_prefix.clone()),
                    ("output_dir", config.export.output_dir.display().to_string()),
                    ("block_ceiling", config.export.block_ceiling.to_string()),
                ]);
                println!("{export_table}\n");

                println!("[Notion]");
                let notion_table = settings_table(&[
                    ("api_url", config.notion.api_url.clone()),
                    ("notion_version", config.notion.notion_version.clone()),
                    ("timeout_secs", config.notion.timeout_secs.to_string()),
                    (
                        "credentials_path",
                        config.notion.credentials_path.display().to_string(),
                    ),
                    (
                        "credentials",
                        if credentials.is_complete() {
                            "configured".to_string()
                        } else {
                            "(not set)".to_string()
                        },
                    ),
                ]);
                println!("{notion_table}");
            }
        }

        Ok(())
    }

    async fn notion(config: &Config, args: &NotionArgs, format: OutputFormat) -> CliResult<()> {
        let store = FileCredentialStore::new(config.notion.credentials_path.clone());
        store
            .save(&NotionCredentials::new(&args.token, &args.database))
            .await?;

        match format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "saved": true,
                    "path": store.path().display().to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                println!("Saved Notion credentials to {}", store.path().display());
            }
        }

        Ok(())
    }
}
