//! CLI entry point for donblog

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use donblog::config::SiteConfig;
use donblog::Blog;

#[derive(Parser)]
#[command(name = "donblog")]
#[command(version)]
#[command(about = "A server-rendered blog backed by a Sanity content store", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = "donblog.yml")]
    config: PathBuf,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the blog server
    #[command(alias = "s")]
    Serve {
        /// Port to listen on (overrides `bind`)
        #[arg(short, long)]
        port: Option<u16>,

        /// IP address to bind to (overrides `bind`)
        #[arg(short, long)]
        ip: Option<String>,

        /// Skip rendering every post into the page cache at startup
        #[arg(long)]
        no_prerender: bool,
    },

    /// List the detail page paths of every post
    Paths,

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "donblog=debug,info"
    } else {
        "donblog=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Serve {
            port,
            ip,
            no_prerender,
        } => {
            let config = SiteConfig::from_path_and_env(&cli.config)?;
            let addr = bind_addr(&config.bind, ip.as_deref(), port)?;
            let blog = Arc::new(Blog::new(config)?);

            if !no_prerender {
                tracing::info!("Prerendering posts...");
                if let Err(e) = blog.prerender().await {
                    tracing::warn!("Prerender failed, pages will render on demand: {}", e);
                }
            }

            donblog::server::start(blog, addr).await?;
        }

        Commands::Paths => {
            let config = SiteConfig::from_path_and_env(&cli.config)?;
            let blog = Blog::new(config)?;
            for path in blog.paths().await? {
                println!("{}", path);
            }
        }

        Commands::Version => {
            println!("donblog version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

/// Resolve the listen address from `bind` and the CLI overrides
fn bind_addr(bind: &str, ip: Option<&str>, port: Option<u16>) -> Result<SocketAddr> {
    let configured: SocketAddr = bind
        .parse()
        .with_context(|| format!("invalid bind address {:?}", bind))?;

    let ip = match ip {
        // "localhost" is not an IP literal
        Some("localhost") => "127.0.0.1".parse()?,
        Some(ip) => ip.parse().with_context(|| format!("invalid IP address {:?}", ip))?,
        None => configured.ip(),
    };

    Ok(SocketAddr::new(ip, port.unwrap_or(configured.port())))
}
