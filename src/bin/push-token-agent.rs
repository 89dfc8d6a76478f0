use std::sync::Arc;

use anyhow::Result;
use clap::{arg, command, Parser, Subcommand};
use push_token_agent::config::types::ServiceConfig;
use push_token_agent::push::{Notification, Priority, PushClient, PushType};
use push_token_agent::server;
use push_token_agent::token::refresh::spawn_refresher;
use push_token_agent::token::ProviderToken;
use push_token_agent::utils::config_loader;
use push_token_agent::utils::constants::DEFAULT_CONFIG_PATH;
use push_token_agent::utils::logging::{self, LogLevel};
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the current bearer token
    Token,
    /// Send one notification and print the gateway's answer
    Push {
        device_token: String,
        #[arg(short, long)]
        topic: String,
        /// JSON payload
        #[arg(short, long)]
        payload: String,
        #[arg(long)]
        collapse_id: Option<String>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long, value_enum)]
        push_type: Option<PushType>,
    },
    /// Keep the token fresh and serve it with the metrics over HTTP
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load YAML config, start logging
    // -------------------------------

    let args = Args::parse();
    let service_config = config_loader::run(&args.config).await?;
    logging::run(Some(&service_config), args.log_level);

    // -------------------------------
    // 2. Build the provider token, load its key
    // -------------------------------

    let token = Arc::new(service_config.provider.build(service_config.refresh_after()).await?);
    info!("provider token '{}' ready", token);

    match args.command {
        Command::Token => {
            println!("{}", token.signed_token()?);
        }
        Command::Push {
            device_token,
            topic,
            payload,
            collapse_id,
            priority,
            push_type,
        } => {
            let mut notification = Notification::new(device_token, payload).topic(topic);
            if let Some(collapse_id) = collapse_id {
                notification = notification.collapse_id(collapse_id);
            }
            if let Some(priority) = priority {
                notification = notification.priority(priority);
            }
            if let Some(push_type) = push_type {
                notification = notification.push_type(push_type);
            }

            let client = PushClient::new(token, &service_config.gateway)?;
            let response = client.push(&notification).await?;
            println!("{}", serde_json::to_string(&response)?);
        }
        Command::Serve => serve(&service_config, token).await?,
    }

    Ok(())
}

async fn serve(service_config: &ServiceConfig, token: Arc<ProviderToken>) -> Result<()> {
    // -------------------------------
    // 3. Refresh the token ahead of staleness
    // -------------------------------

    let refresher = spawn_refresher(token.clone(), service_config.refresh_margin());

    // -------------------------------
    // 4. Start http server with metrics and token sink
    // -------------------------------

    let http_server = server::server::start(&service_config.settings, &service_config.sinks, token);

    info!("Service starting...");
    tokio::select! {
        res = http_server => {
            res?;
            info!("nothing to serve over http, refreshing only");
            tokio::signal::ctrl_c().await?;
        }
        res = tokio::signal::ctrl_c() => res?,
    }
    info!("shutting down");
    refresher.abort();

    Ok(())
}
