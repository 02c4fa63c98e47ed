//! promptgate binary: run the gateway as a local server, or answer one
//! serverless-style invocation read from stdin.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;

use promptgate::transport::{server, serverless};
use promptgate::{Gateway, GatewayConfig, Provider};

#[derive(Debug, Parser)]
#[command(name = "promptgate", version, about)]
struct Cli
{   /// Project root for static files and `.env` (default: current dir)
    #[arg(long, global = true)]
    root: Option<PathBuf>
  , /// Env file to load (default: <root>/.env)
    #[arg(long, global = true)]
    env_file: Option<PathBuf>
  , /// Debug logging for this crate
    #[arg(short, long, global = true)]
    verbose: bool
  , #[command(subcommand)]
    command: Option<Command>
}

#[derive(Debug, Subcommand)]
enum Command
{   /// Run the local HTTP server (default)
    Serve
    {   /// Overrides PORT
        #[arg(long)]
        port: Option<u16>
    }
  , /// Read one serverless event as JSON from stdin, print the reply
    Invoke
    {   /// gemini or openai
        #[arg(long)]
        provider: Provider
    }
}

fn main() -> anyhow::Result<()>
{   let cli = Cli::parse();

    let filter = if cli.verbose { "info,promptgate=debug" } else { "info" };
    env_logger::Builder::from_env(
      env_logger::Env::default().default_filter_or(filter)
    ).init();

    let root = match cli.root
    {   Some(root) => root
      , None => std::env::current_dir()
          .context("cannot determine current directory")?
    };

    // The environment is only written here, while the process is single threaded.
    let env_path = cli.env_file.unwrap_or_else(|| root.join(".env"));
    let config = GatewayConfig::load(root, &env_path)
      .context("invalid configuration")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
      .enable_all()
      .build()
      .context("cannot start async runtime")?;

    runtime.block_on(run(
      cli.command.unwrap_or(Command::Serve { port: None }),
      config
    ))
}

async fn run(command: Command, mut config: GatewayConfig) -> anyhow::Result<()>
{   match command
    {   Command::Serve { port } => {
          if let Some(port) = port
          {   config.port = port;
          }
          let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
          let gateway = Gateway::new(Arc::new(config));

          let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("cannot bind {}", addr))?;
          info!("Local server only; nothing is deployed.");
          server::serve(listener, gateway).await?;
        }
      , Command::Invoke { provider } => {
          let mut raw = String::new();
          tokio::io::stdin()
            .read_to_string(&mut raw)
            .await
            .context("cannot read event from stdin")?;
          let event: serverless::ServerlessEvent = serde_json::from_str(&raw)
            .context("event must be a JSON object")?;

          let gateway = Gateway::new(Arc::new(config));
          let reply = serverless::invoke(&gateway, provider, event).await;
          println!("{}", serde_json::to_string(&reply)?);
        }
    }

    Ok(())
}
