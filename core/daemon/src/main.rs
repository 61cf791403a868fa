//! Selfcare daemon entrypoint.
//!
//! A privileged background agent with two jobs: nudge toward a reboot
//! once uptime crosses the threshold (with bounded, shrinking deferrals),
//! and serve a loopback-only authenticated relay so the lower-privileged
//! companion can ask for privileged operations. Startup binds the first
//! free loopback port in the fixed range, publishes it to the discovery
//! files, mints the per-boot relay secret, then runs the accept loop and
//! the periodic uptime monitor until a shutdown signal arrives.

use std::env;
use std::net::TcpListener;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use selfcare_core::paths;
use selfcare_core::uptime::SystemUptime;
use selfcare_core::{EscalationEngine, SkipStateStore};
use selfcare_relay_protocol::{PORT_RANGE_END, PORT_RANGE_START};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod auth;
mod devices;
mod dispatch;
mod exec;
mod monitor;
mod port;
mod prompt_cmd;
mod relay;
mod signals;

use auth::RelaySecret;
use devices::PactlDeviceController;
use dispatch::Dispatcher;
use prompt_cmd::ZenityPrompt;
use relay::RelayContext;

const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(100);

fn main() {
    init_logging();

    // Foreground mode shares the whole lifecycle with service mode; the
    // flag only exists so manual runs are explicit about it.
    if env::args().any(|arg| arg == "--foreground") {
        info!("Running attached to console");
    }

    let shutdown = signals::install();

    let skip_state_path = match paths::skip_state_path() {
        Ok(path) => path,
        Err(err) => {
            error!(error = %err, "Failed to resolve skip state path");
            std::process::exit(1);
        }
    };
    let engine = EscalationEngine::load(SkipStateStore::new(&skip_state_path));

    let secret_path = match paths::secret_file_path() {
        Ok(path) => path,
        Err(err) => {
            error!(error = %err, "Failed to resolve relay secret path");
            std::process::exit(1);
        }
    };
    let secret = match RelaySecret::generate(&secret_path) {
        Ok(secret) => secret,
        Err(err) => {
            error!(error = %err, "Failed to create relay secret");
            std::process::exit(1);
        }
    };

    let (listener, bound_port) = match port::bind_first_free(PORT_RANGE_START, PORT_RANGE_END) {
        Ok(bound) => bound,
        Err(err) => {
            error!(error = %err, "Relay startup failed");
            std::process::exit(1);
        }
    };

    let private_port_path = match paths::port_file_path() {
        Ok(path) => path,
        Err(err) => {
            error!(error = %err, "Failed to resolve port file path");
            std::process::exit(1);
        }
    };
    let record =
        match port::PortRecord::publish(bound_port, &private_port_path, &paths::shared_port_file_path())
        {
            Ok(record) => record,
            Err(err) => {
                error!(error = %err, "Failed to publish discovery files");
                std::process::exit(1);
            }
        };

    info!(port = bound_port, "Selfcare daemon started");

    // The monitor thread is detached; it observes the same shutdown flag.
    let _monitor = monitor::spawn_uptime_monitor(
        engine,
        Box::new(SystemUptime),
        Box::new(ZenityPrompt),
        shutdown,
    );

    let ctx = Arc::new(RelayContext {
        secret,
        dispatcher: Dispatcher::new(Box::new(PactlDeviceController)),
    });

    run_accept_loop(listener, Arc::clone(&ctx), shutdown);

    // Graceful shutdown: stop advertising, drop the per-boot credential.
    // In-flight connections finish their single read/write cycle or are
    // abandoned at process exit.
    record.remove();
    ctx.secret.remove();
    info!("Selfcare daemon stopped");
}

fn run_accept_loop(
    listener: TcpListener,
    ctx: Arc<RelayContext>,
    shutdown: &'static std::sync::atomic::AtomicBool,
) {
    if let Err(err) = listener.set_nonblocking(true) {
        error!(error = %err, "Failed to configure relay listener");
        return;
    }

    while !shutdown.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, peer)) => {
                info!(peer = %peer, "Client connected");
                if let Err(err) = stream.set_nonblocking(false) {
                    warn!(error = %err, "Failed to configure relay connection");
                    continue;
                }
                let ctx = Arc::clone(&ctx);
                thread::spawn(move || relay::handle_connection(stream, ctx));
            }
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL_INTERVAL);
            }
            Err(err) => {
                warn!(error = %err, "Failed to accept relay connection");
            }
        }
    }
}

fn init_logging() {
    let debug_enabled = env::var("SELFCARE_DEBUG_LOG")
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    let filter = if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
