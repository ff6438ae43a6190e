use std::{net::SocketAddr, path::PathBuf, time::Duration};

use clap::Parser;
use qrhop::db::Db;
use shadow_rs::shadow;
use tracing_subscriber::EnvFilter;

shadow!(build);

#[derive(Parser, Debug)]
#[command(version = build::VERSION, long_version = build::CLAP_LONG_VERSION, about = "QR code redirect service", long_about = "")]
struct Args {
    #[arg(long, env = "HOST", default_value = "127.0.0.1:5000")]
    host: SocketAddr,
    /// directory holding qrhop.db
    #[arg(long, env = "SQLITE_PATH", default_value = ".")]
    sqlite_path: PathBuf,
    /// keep records in memory only; everything is lost on exit
    #[arg(long, default_value_t = false)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // construct a subscriber that prints formatted traces to stdout
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    // use that subscriber to process traces emitted after this point
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    tracing::info!("{:?}", &args);

    // we want a store failure to stop startup loudly
    let db = if args.in_memory {
        tracing::warn!("using in-memory store");
        Db::in_memory()?
    } else {
        let db_path = args.sqlite_path.join("qrhop.db");
        tracing::info!("sqlitedb: {}", db_path.display());
        Db::open(&db_path)?
    };
    tracing::info!("records on startup: {}", db.record.count().await?);

    let routes = qrhop::routes::get_routes(db);

    tracing::info!("starting warp server: {}", &args.host);
    warp::serve(routes)
        .bind(args.host)
        .await
        .graceful(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("failed to install CTRL+C signal handler: {e}");
                std::future::pending::<()>().await;
            }
        })
        .run()
        .await;

    tracing::info!("gracefully exited.");
    tokio::time::sleep(Duration::from_secs(2)).await;

    Ok(())
}
