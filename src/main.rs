//! SOCKS5 proxy binary.
//!
//! Usage: `socks5-relay <port>`. With no arguments, prints usage and exits
//! successfully — matching the source's `argc != 2` branch, which is not an
//! error case as far as the process exit code is concerned.

use socks5_relay::Listener;
use tracing::{error, info};

fn print_usage() {
    println!("Usage: socks5-relay <port>");
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        print_usage();
        return;
    }

    let port: u16 = match args[1].parse() {
        Ok(port) => port,
        Err(_) => {
            // The source's C++ `std::stoi` throws on a non-numeric argument
            // and the top-level handler prints the exception with exit code
            // 0. This keeps the "no nonzero exit" behavior without an
            // unhandled panic: fall back to the same usage text.
            error!("invalid port: {}", args[1]);
            print_usage();
            return;
        }
    };

    let listener = match Listener::bind(port).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("failed to bind port {port}: {err}");
            return;
        }
    };

    info!("socks5-relay listening on 0.0.0.0:{port}");

    #[cfg(unix)]
    let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
    {
        Ok(sigterm) => sigterm,
        Err(err) => {
            error!("failed to install SIGTERM handler: {err}");
            return;
        }
    };
    #[cfg(unix)]
    let terminate = sigterm.recv();
    #[cfg(not(unix))]
    let terminate = std::future::pending::<Option<()>>();

    tokio::select! {
        () = listener.serve() => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(err) = result {
                error!("failed to install signal handler: {err}");
            }
            info!("received SIGINT, exiting");
        }
        _ = terminate => {
            info!("received SIGTERM, exiting");
        }
    }
}
