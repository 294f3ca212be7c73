use anyhow::{Context, Result};
use sqlsh::complete::grammar;
use sqlsh::config::AppConfig;
use sqlsh::db::{Connection, InstrumentOpts, InstrumentedConn, MemDriver, Registry};
use sqlsh::meta::{InfoSchemaReader, MetaSource, PluginReader};
use sqlsh::shell::Shell;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load();
    let mut url = None;
    let mut dry_run = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--dry-run" => dry_run = true,
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            other => url = Some(other.to_string()),
        }
    }

    // a bare word is a saved connection name; otherwise it is the URL
    let url = url
        .map(|u| {
            config
                .get_connection(&u)
                .map(|c| c.url.clone())
                .unwrap_or(u)
        })
        .or_else(|| {
            config
                .last_connection
                .as_deref()
                .and_then(|name| config.get_connection(name))
                .map(|c| c.url.clone())
        })
        .or_else(|| std::env::var("SQLSH_DSN").ok())
        .unwrap_or_else(|| "mem:".to_string());

    let runtime = tokio::runtime::Runtime::new()?;

    let mut registry = Registry::new();
    registry.register(Arc::new(MemDriver));

    let (driver, conn) = runtime
        .block_on(registry.open(&url))
        .with_context(|| format!("opening {url}"))?;
    let conn: Arc<dyn Connection> = Arc::from(conn);

    let opts = InstrumentOpts {
        echo: config.echo_queries,
        dry_run,
        timeout: Some(config.metadata_timeout()),
    };
    let meta_conn = Arc::new(InstrumentedConn::new(conn.clone(), opts));
    let sources: Vec<Arc<dyn MetaSource>> = vec![Arc::new(InfoSchemaReader::new(meta_conn))];
    let reader = Arc::new(PluginReader::new(sources));

    let version = runtime
        .block_on(driver.version(conn.as_ref()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("Connected with driver {} ({version})", driver.name());
    println!("Type \"\\?\" for help, \"\\q\" to quit.");

    let handle = runtime.handle().clone();
    Shell::new(handle, registry, config, driver, conn, reader, opts)?.run()
}

fn print_usage() {
    println!("usage: sqlsh [--dry-run] [URL | SAVED-CONNECTION]");
    println!();
    println!("The URL scheme selects the driver (for example mem:).");
    println!("Commands inside the shell: {}", grammar::COMMANDS.join(", "));
}
