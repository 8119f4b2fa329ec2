use std::sync::atomic::{AtomicBool, Ordering};

use axum::Router;
use clap::Parser;

use picup::{cli, config, http};
use picup::http::state::AppState;

/// Set to true once the first Ctrl+C is received. Second Ctrl+C force-exits.
static SHUTTING_DOWN: AtomicBool = AtomicBool::new(false);

/// Wait for the first Ctrl+C (graceful shutdown).
/// On second Ctrl+C (during shutdown wait), force-exits immediately.
async fn wait_for_shutdown() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
    if SHUTTING_DOWN.swap(true, Ordering::SeqCst) {
        eprintln!("\npicup: forced exit");
        std::process::exit(1);
    }
    // first Ctrl+C: proceed with graceful shutdown
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = cli::Args::parse();

    let file_config = config::find_config_file(args.config.as_deref())
        .and_then(|path| {
            match config::load_config(&path) {
                Ok(cfg) => {
                    tracing::debug!("Loaded config from {}", path.display());
                    Some(cfg)
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config file: {}", e);
                    None
                }
            }
        });

    let config = config::Config::resolve(file_config, &args);

    if !config.root.exists() {
        eprintln!("error: data directory does not exist: {}", config.root.display());
        std::process::exit(1);
    }
    if !config.root.is_dir() {
        eprintln!("error: not a directory: {}", config.root.display());
        std::process::exit(1);
    }

    let state = AppState::from_root(&config.root, config.strict_store);

    // Startup banner: data layout and existing record count.
    tracing::info!(
        "picup serving {} on port {} (store: {})",
        config.root.display(),
        config.port,
        state.store.path().display()
    );
    match state.store.load().await {
        Ok(records) => tracing::info!("{} picture(s) on record", records.len()),
        Err(e) => tracing::warn!("Could not read image store at startup: {}", e),
    }
    if !state.site_dir.exists() {
        tracing::warn!(
            "Site directory {} does not exist — the upload form will 404 until it is created",
            state.site_dir.display()
        );
    }

    let app = http::build_router(state);

    if config.localhost {
        run_localhost(config.port, app).await;
    } else {
        run_dual_stack(config.port, app).await;
    }
}

/// Run a localhost-only HTTP server and wait for graceful shutdown.
async fn run_localhost(port: u16, app: Router) {
    let addr = format!("127.0.0.1:{}", port);
    tracing::info!("Listening on http://{} (localhost only)", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            eprintln!("error: failed to bind {}: {}", addr, e);
            std::process::exit(1);
        });

    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(4);

    let mut http_rx = shutdown_tx.subscribe();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { let _ = http_rx.recv().await; })
            .await
            .unwrap_or_else(|e| tracing::error!("HTTP server error: {}", e));
    });

    wait_for_shutdown().await;
    tracing::info!("Shutting down...");

    let _ = shutdown_tx.send(());
    let _ = tokio::time::timeout(std::time::Duration::from_secs(1), server).await;

    tracing::info!("Goodbye.");
}

/// Run dual-stack (IPv4 + IPv6) HTTP servers and wait for graceful shutdown.
async fn run_dual_stack(port: u16, app: Router) {
    // Dual-bind: separate IPv4 (0.0.0.0) and IPv6 (:::) sockets.
    // Use socket2 for IPv6 to explicitly set IPV6_V6ONLY=true.
    // Linux defaults IPV6_V6ONLY=false (shared stack), which causes
    // "Address already in use" when both 0.0.0.0 and ::: are bound.
    // Setting IPV6_V6ONLY=true makes both sockets independent on all OSes.
    let ipv4_addr = format!("0.0.0.0:{}", port);
    tracing::info!("Listening on port {} (IPv4 + IPv6)", port);

    let ipv4_listener = tokio::net::TcpListener::bind(&ipv4_addr)
        .await
        .unwrap_or_else(|e| {
            eprintln!("error: failed to bind IPv4 {}: {}", ipv4_addr, e);
            std::process::exit(1);
        });

    // "[::]:port" is the Rust SocketAddr syntax for the IPv6 any-address
    let ipv6_addr_parsed: std::net::SocketAddr = format!("[::]:{}", port)
        .parse()
        .unwrap_or_else(|e| {
            eprintln!("error: failed to parse IPv6 address: {}", e);
            std::process::exit(1);
        });
    let ipv6_raw = socket2::Socket::new(
        socket2::Domain::IPV6,
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )
    .unwrap_or_else(|e| {
        eprintln!("error: failed to create IPv6 socket: {}", e);
        std::process::exit(1);
    });
    ipv6_raw.set_only_v6(true).unwrap_or_else(|e| {
        tracing::warn!("Could not set IPV6_V6ONLY: {} -- dual-bind may fail on Linux", e);
    });
    ipv6_raw.set_reuse_address(true).unwrap_or_else(|e| {
        tracing::warn!("Could not set SO_REUSEADDR on IPv6 socket: {}", e);
    });
    ipv6_raw.set_nonblocking(true).unwrap_or_else(|e| {
        eprintln!("error: failed to set IPv6 socket non-blocking: {}", e);
        std::process::exit(1);
    });
    ipv6_raw.bind(&ipv6_addr_parsed.into()).unwrap_or_else(|e| {
        eprintln!("error: failed to bind IPv6 :::{}: {}", port, e);
        std::process::exit(1);
    });
    ipv6_raw.listen(1024).unwrap_or_else(|e| {
        eprintln!("error: failed to listen on IPv6 socket: {}", e);
        std::process::exit(1);
    });
    let ipv6_std_listener: std::net::TcpListener = ipv6_raw.into();
    let ipv6_listener = tokio::net::TcpListener::from_std(ipv6_std_listener).unwrap_or_else(|e| {
        eprintln!("error: failed to convert IPv6 listener to tokio: {}", e);
        std::process::exit(1);
    });

    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(4);

    let app_v4 = app.clone();
    let mut http_v4_rx = shutdown_tx.subscribe();
    tokio::spawn(async move {
        axum::serve(ipv4_listener, app_v4)
            .with_graceful_shutdown(async move { let _ = http_v4_rx.recv().await; })
            .await
            .unwrap_or_else(|e| tracing::error!("IPv4 server error: {}", e));
    });
    let mut http_v6_rx = shutdown_tx.subscribe();
    tokio::spawn(async move {
        axum::serve(ipv6_listener, app)
            .with_graceful_shutdown(async move { let _ = http_v6_rx.recv().await; })
            .await
            .unwrap_or_else(|e| tracing::error!("IPv6 server error: {}", e));
    });

    wait_for_shutdown().await;
    tracing::info!("Shutting down...");

    let _ = shutdown_tx.send(());
    // HTTP tasks drain in-flight requests via with_graceful_shutdown;
    // process exit cleans up whatever remains.
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    tracing::info!("Goodbye.");
}
