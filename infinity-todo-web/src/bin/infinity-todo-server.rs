use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use infinity_todo::Store;
use infinity_todo_web::{paths, serve};
use log::{error, info};
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "infinity-todo-server", about = "Serve the todo API on a local port", version)]
struct Cli {
    /// Path to the SQLite database [default: todo.db in the app data directory]
    #[arg(long, env = "INFINITY_TODO_DB")]
    db: Option<PathBuf>,

    /// Port to listen on; 0 picks a free one
    #[arg(long, env = "PORT", default_value_t = 0)]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    bind: IpAddr,
}

fn setup_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();
    let cli = Cli::parse();

    let db_path = match cli.db {
        Some(path) => path,
        None => paths::db_path()?,
    };
    paths::ensure_db_dir(&db_path)?;
    let store = Store::open(&db_path)
        .with_context(|| format!("failed to open database {}", db_path.display()))?;
    info!("using database {}", db_path.display());

    let listener = TcpListener::bind((cli.bind, cli.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", cli.bind, cli.port))?;
    let addr = listener.local_addr()?;
    // The window host reads this line to find the API.
    println!("Server started on http://{addr}");
    info!("listening on {addr}");

    serve(listener, store, shutdown_signal()).await
}
