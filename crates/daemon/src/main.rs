// SPDX-License-Identifier: MIT

//! fabd — the multi-project agent supervisor daemon.
//!
//! Listens on a Unix socket for `fab`'s requests,
//! supervises one scheduler task per running project, and
//! brokers permission/question asks and staged actions between agents
//! and the human operator.

use std::sync::Arc;
use std::time::{Duration, Instant};

use fab_core::SystemClock;
use tokio::net::UnixListener;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tracing::{error, info, warn};

use fab_daemon::ask::{PermissionManager, QuestionManager};
use fab_daemon::claim_registry::ClaimRegistry;
use fab_daemon::env;
use fab_daemon::error::DaemonError;
use fab_daemon::event_bus::EventBus;
use fab_daemon::instance_lock::InstanceLock;
use fab_daemon::listener::{start_project, ListenCtx, Listener};
use fab_daemon::manager_chat::ManagerChatStore;
use fab_daemon::project_registry::ProjectRegistry;
use fab_daemon::rule_store::RuleStore;
use fab_daemon::staged_action::StagedActionStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("fabd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("fabd {}", env!("CARGO_PKG_VERSION"));
                println!("Multi-project coding-agent supervisor daemon.");
                println!();
                println!("USAGE:");
                println!("    fabd");
                println!();
                println!("The daemon is normally started by the `fab` CLI and should not");
                println!("be invoked directly. It listens on a Unix socket under $FAB_DIR");
                println!("for commands from `fab`.");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("usage: fabd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let fab_dir = env::fab_dir()?;
    std::fs::create_dir_all(&fab_dir)?;

    let _log_guard = setup_logging(&fab_dir)?;

    let lock = match InstanceLock::acquire(&fab_dir) {
        Ok(lock) => lock,
        Err(DaemonError::AlreadyRunning(pid)) => {
            eprintln!("fabd is already running (pid {pid})");
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    info!(fab_dir = %fab_dir.display(), "starting fabd");

    let projects = Arc::new(ProjectRegistry::load(&fab_dir)?);
    let claims = Arc::new(ClaimRegistry::load(&fab_dir)?);
    let event_bus = Arc::new(EventBus::new(env::broadcast_write_deadline()));
    let clock = SystemClock;
    let ask_timeout = env::ask_expiry();

    let ctx = Arc::new(ListenCtx {
        fab_dir: fab_dir.clone(),
        clock: clock.clone(),
        start_time: Instant::now(),
        abort_grace: env::abort_grace_window(),
        projects: Arc::clone(&projects),
        claims: Arc::clone(&claims),
        event_bus: Arc::clone(&event_bus),
        permissions: Arc::new(PermissionManager::new(clock.clone(), ask_timeout)),
        questions: Arc::new(QuestionManager::new(clock.clone(), ask_timeout)),
        staged_actions: Arc::new(StagedActionStore::new(clock.clone())),
        manager_chat: Arc::new(ManagerChatStore::new(clock.clone())),
        rules: Arc::new(RuleStore::new(fab_dir.clone(), env::script_matcher_timeout())),
        supervisors: parking_lot::Mutex::new(std::collections::HashMap::new()),
        shutdown: Arc::new(Notify::new()),
    });

    for project in projects.list() {
        if project.autostart {
            if let Err(e) = start_project(&ctx, &project.name).await {
                warn!(project = %project.name, error = %e, "failed to autostart project");
            }
        }
    }

    let socket_path = fab_dir.join("fabd.sock");
    if socket_path.exists() {
        std::fs::remove_file(&socket_path)?;
    }
    let unix = UnixListener::bind(&socket_path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&socket_path, std::fs::Permissions::from_mode(0o600))?;
    }

    spawn_ask_reaper(Arc::clone(&ctx));

    let listener = Listener::new(unix, Arc::clone(&ctx));
    let listener_task = tokio::spawn(listener.run());

    println!("READY");
    info!(socket = %socket_path.display(), "fabd ready");

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
        _ = ctx.shutdown.notified() => info!("shutdown requested via command"),
    }
    ctx.shutdown.notify_one();
    if let Err(e) = listener_task.await {
        error!(error = %e, "listener task panicked");
    }

    let names: Vec<String> = ctx.supervisors.lock().keys().cloned().collect();
    for name in names {
        if let Some(handle) = ctx.supervisors.lock().remove(&name) {
            handle.stop().await;
        }
    }

    drop(lock);
    info!("fabd stopped");
    Ok(())
}

/// Periodically sweeps expired permission/question asks (the ask
/// broker's own "expire after `timeout`" contract) — these would
/// otherwise only be cleaned up the next time a caller happens to touch
/// the same broker.
fn spawn_ask_reaper<C: fab_core::Clock>(ctx: Arc<ListenCtx<C>>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(5));
        loop {
            interval.tick().await;
            ctx.permissions.cleanup_expired();
            ctx.questions.cleanup_expired();
        }
    });
}

fn setup_logging(
    fab_dir: &std::path::Path,
) -> Result<tracing_appender::non_blocking::WorkerGuard, DaemonError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let logs_dir = fab_dir.join("logs");
    std::fs::create_dir_all(&logs_dir)?;
    let file_appender = tracing_appender::rolling::never(&logs_dir, "fabd.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(fmt::layer().with_writer(non_blocking)).init();

    Ok(guard)
}
