use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::net::{UnixListener, UnixStream};
use tokio::signal;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use crate::commands::executable::Executable;
use crate::commands::Command;
use crate::connection::Connection;
use crate::reply::Reply;
use crate::snapshot;
use crate::store::Store;
use crate::Error;

/// Time between periodic snapshots when a db file is configured.
pub const SAVE_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct Options {
    pub socket_path: PathBuf,
    /// When `None`, persistence is disabled entirely: no load, no periodic
    /// save, no shutdown save.
    pub db_file: Option<PathBuf>,
}

/// Runs the server until a shutdown signal (ctrl-c) arrives. Owns the whole
/// lifecycle: snapshot load at startup, the accept loop, the periodic
/// snapshot task, and the final snapshot on shutdown.
pub async fn run(options: Options) -> Result<(), Error> {
    let _ = tracing_subscriber::fmt()
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let store = Store::new();

    if let Some(db_file) = &options.db_file {
        load_snapshot(&store, db_file).await?;
    }

    // A stale socket file from a previous run would make bind fail.
    match tokio::fs::remove_file(&options.socket_path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    let listener = UnixListener::bind(&options.socket_path)?;
    info!("Listening on {}", options.socket_path.display());

    let (shutdown_tx, _) = watch::channel(false);

    let snapshot_task = options.db_file.clone().map(|db_file| {
        tokio::spawn(snapshot_loop(
            store.clone(),
            db_file,
            shutdown_tx.subscribe(),
        ))
    });

    let shutdown = signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
            accepted = listener.accept() => {
                let (stream, _) = accepted?;
                let store = store.clone();

                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, store).await {
                        error!("Connection error: {}", e);
                    }
                });
            }
        }
    }

    let _ = shutdown_tx.send(true);

    // An in-flight periodic save must finish before the final save starts:
    // both write through the same temp file, and a concurrent pair could
    // rename a torn snapshot into place.
    if let Some(task) = snapshot_task {
        let _ = task.await;
    }

    if let Some(db_file) = &options.db_file {
        if let Err(e) = snapshot::write_to_path(&store, db_file).await {
            error!("Final snapshot failed: {}", e);
        }
    }

    Ok(())
}

/// Loads a prior snapshot into the store. A missing file is not an error: the
/// server simply starts empty. Any other failure aborts startup.
async fn load_snapshot(store: &Store, path: &Path) -> Result<(), Error> {
    match snapshot::read_from_path(path).await {
        Ok(pairs) => {
            store.clear_and_load(pairs);
            info!("Loaded {} keys from {}", store.len(), path.display());
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            info!("No snapshot at {}, starting empty", path.display());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Periodically dumps the store. Save failures are logged and never stop the
/// loop; only the shutdown signal does.
async fn snapshot_loop(store: Store, path: PathBuf, mut shutdown: watch::Receiver<bool>) {
    let mut tick = tokio::time::interval(SAVE_INTERVAL);
    // The first tick completes immediately.
    tick.tick().await;

    loop {
        tokio::select! {
            _ = tick.tick() => {
                match snapshot::write_to_path(&store, &path).await {
                    Ok(()) => debug!("Saved {} keys to {}", store.len(), path.display()),
                    Err(e) => warn!("Periodic snapshot failed: {}", e),
                }
            }
            _ = shutdown.changed() => break,
        }
    }
}

#[instrument(name = "connection", skip(stream, store), fields(connection_id))]
async fn handle_connection(stream: UnixStream, store: Store) -> Result<(), Error> {
    let mut conn = Connection::new(stream);
    tracing::Span::current().record("connection_id", conn.id.to_string());

    while let Some(line) = conn.read_line().await? {
        debug!("Received: {}", line);

        // Command errors stay on this connection as ERR replies; they never
        // tear the connection down.
        let reply = match Command::parse(&line) {
            Ok(cmd) => cmd.exec(&store),
            Err(e) => Reply::from(e),
        };

        debug!("Replying: {:?}", reply);
        conn.write_reply(reply).await?;
    }

    info!("Client disconnected");
    Ok(())
}
