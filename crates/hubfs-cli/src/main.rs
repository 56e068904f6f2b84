//! # hubfs
//!
//! Mounts a repository's contents as a read-only filesystem.
//!
//! The mount stays up until the process receives SIGINT or SIGTERM, then
//! unmounts cleanly. A session that ends any other way is a failure and the
//! process exits non-zero.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use hubfs_fs::{spawn_mount, HubFs, MountOptions};
use hubfs_remote::GithubClient;
use tokio::runtime::Handle;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// How often the watcher checks whether the mount session thread exited.
const SESSION_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Mount a repository's contents as a read-only filesystem.
#[derive(Parser, Debug)]
#[command(name = "hubfs", version, about)]
struct Cli {
    /// Repository to mount, as `owner/name`.
    repository: String,

    /// Directory to mount at.
    mountpoint: PathBuf,

    /// Allow other users to access the mount.
    #[arg(long)]
    allow_other: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    debug: bool,
}

fn init_logging(debug: bool) {
    let filter = if debug {
        "hubfs=debug,hubfs_fs=debug,hubfs_remote=debug"
    } else {
        "hubfs=info,hubfs_fs=info,hubfs_remote=info"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn ensure_mountpoint(path: &Path) -> anyhow::Result<()> {
    if !path.is_dir() {
        bail!("mountpoint {} is not a directory", path.display());
    }
    Ok(())
}

/// Waits for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

/// Resolves once the mount session thread has exited, which happens on a
/// session-loop I/O error or an external unmount.
async fn session_ended(guard: &JoinHandle<io::Result<()>>) {
    while !guard.is_finished() {
        tokio::time::sleep(SESSION_POLL_INTERVAL).await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    ensure_mountpoint(&cli.mountpoint)?;

    let client = Arc::new(GithubClient::new());
    let root = GithubClient::repo_root(&cli.repository);
    let fs = HubFs::new(client, root, Handle::current());

    let options = MountOptions {
        allow_other: cli.allow_other,
        ..MountOptions::default()
    };

    let session = spawn_mount(fs, &cli.mountpoint, &options)
        .with_context(|| format!("failed to mount at {}", cli.mountpoint.display()))?;

    info!(
        repository = %cli.repository,
        mountpoint = %cli.mountpoint.display(),
        "mounted, press Ctrl+C to unmount"
    );

    // The session can also end without a signal: session-loop I/O error or
    // an external `fusermount -u`. Exit non-zero in that case.
    let signalled = tokio::select! {
        () = shutdown_signal() => true,
        () = session_ended(&session.guard) => false,
    };

    if signalled {
        info!("unmounting");
        drop(session);
        return Ok(());
    }

    match session.guard.join() {
        Ok(Ok(())) => bail!("mount session ended unexpectedly"),
        Ok(Err(e)) => Err(e).context("mount session failed"),
        Err(_) => bail!("mount session thread panicked"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::sync::mpsc;
    use tokio::runtime::Runtime;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parses_positionals() {
        let cli = Cli::try_parse_from(["hubfs", "octocat/hello-world", "/mnt/hub"]).unwrap();
        assert_eq!(cli.repository, "octocat/hello-world");
        assert_eq!(cli.mountpoint, PathBuf::from("/mnt/hub"));
        assert!(!cli.debug);
        assert!(!cli.allow_other);
    }

    #[test]
    fn test_cli_requires_both_positionals() {
        assert!(Cli::try_parse_from(["hubfs", "octocat/hello-world"]).is_err());
        assert!(Cli::try_parse_from(["hubfs"]).is_err());
    }

    #[test]
    fn test_ensure_mountpoint() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ensure_mountpoint(dir.path()).is_ok());

        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, b"x").unwrap();
        assert!(ensure_mountpoint(&file).is_err());
        assert!(ensure_mountpoint(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_session_ended_resolves_when_thread_exits() {
        let rt = Runtime::new().unwrap();
        let guard = std::thread::spawn(|| Ok::<(), io::Error>(()));

        rt.block_on(session_ended(&guard));
        assert!(guard.is_finished());
        assert!(guard.join().unwrap().is_ok());
    }

    #[test]
    fn test_session_ended_waits_for_running_thread() {
        let rt = Runtime::new().unwrap();
        let (tx, rx) = mpsc::channel::<()>();
        let guard = std::thread::spawn(move || {
            rx.recv().ok();
            Ok::<(), io::Error>(())
        });

        let timed_out = rt.block_on(async {
            tokio::time::timeout(Duration::from_millis(50), session_ended(&guard))
                .await
                .is_err()
        });
        assert!(timed_out, "watcher resolved while the session thread was alive");

        tx.send(()).unwrap();
        rt.block_on(session_ended(&guard));
        assert!(guard.join().unwrap().is_ok());
    }
}
