use clap::Parser;
use kvdns_domain::CliOverrides;
use kvdns_infrastructure::DnsServerHandler;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

mod bootstrap;
mod di;
mod server;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "kvdns")]
#[command(version)]
#[command(about = "kvdns - authoritative DNS answered from Consul KV")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// DNS server port
    #[arg(short = 'd', long)]
    dns_port: Option<u16>,

    /// Bind address
    #[arg(short = 'b', long)]
    bind: Option<String>,

    /// Consul HTTP address
    #[arg(long)]
    kv_address: Option<String>,

    /// Consul ACL token
    #[arg(long)]
    kv_token: Option<String>,

    /// Root of the KV tree holding zones and settings
    #[arg(long)]
    kv_prefix: Option<String>,

    /// Authoritative zones, in match order
    #[arg(short = 'z', long = "zone", value_name = "ZONE")]
    zones: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        dns_port: cli.dns_port,
        bind_address: cli.bind,
        kv_address: cli.kv_address,
        kv_token: cli.kv_token,
        kv_prefix: cli.kv_prefix,
        zones: (!cli.zones.is_empty()).then_some(cli.zones),
        log_level: cli.log_level,
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;

    bootstrap::init_logging(&config);

    info!("Starting kvdns v{}", env!("CARGO_PKG_VERSION"));

    let shutdown = CancellationToken::new();
    let services = di::ZoneServices::new(&config, shutdown.clone()).await?;

    let dns_addr = format!("{}:{}", config.server.bind_address, config.server.dns_port);
    let dns_handler = DnsServerHandler::new(
        services.engine.clone(),
        Duration::from_millis(config.server.query_timeout),
    );

    let server_shutdown = shutdown.clone();
    let tcp_enabled = config.server.tcp_enabled;
    let mut dns_server = tokio::spawn(async move {
        server::start_dns_server(dns_addr, dns_handler, tcp_enabled, server_shutdown).await
    });

    tokio::select! {
        result = &mut dns_server => {
            match result {
                Ok(Err(e)) => error!(error = %e, "DNS server error"),
                Err(e) => error!(error = %e, "DNS server task failed"),
                Ok(Ok(())) => {}
            }
            shutdown.cancel();
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
            shutdown.cancel();
            let _ = dns_server.await;
        }
    }

    if let Some(watcher) = services.watcher {
        let _ = watcher.await;
    }

    info!(
        requests = services.engine.metrics().total_requests(),
        "Server shutdown complete"
    );
    Ok(())
}
