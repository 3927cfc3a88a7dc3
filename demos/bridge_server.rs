//! Frame bridge example
//!
//! Run with: cargo run --example bridge_server [VIEWER_ADDR] [INGEST_ADDR]
//!
//! Examples:
//!   cargo run --example bridge_server                          # 0.0.0.0:9870 / 0.0.0.0:9871
//!   cargo run --example bridge_server localhost                # 127.0.0.1:9870 / 0.0.0.0:9871
//!   cargo run --example bridge_server 0.0.0.0:9880 0.0.0.0:9881
//!
//! ## Watch a stream
//!
//! Connect any WebSocket client to ws://localhost:9870 and it will
//! receive one JSON frame per message, then `{"end":true,...}`.
//!
//! ## Submit a batch
//!
//! curl -X POST http://localhost:9871/frames \
//!   -d '{"fps": 30, "frames": [{"t": 0.0, "params": {"jawOpen": 0.4}}]}'
//!
//! ## Broadcast a status line
//!
//! curl -X POST http://localhost:9871/status -d '{"text": "processing take 12"}'

use std::net::SocketAddr;

use framecast_rs::{BridgeConfig, BridgeServer};

/// Parse a bind address from a command line argument.
///
/// Accepts formats:
/// - "localhost" -> 127.0.0.1:<default port>
/// - "127.0.0.1" -> 127.0.0.1:<default port>
/// - "127.0.0.1:9880" -> 127.0.0.1:9880
fn parse_bind_addr(arg: &str, default_port: u16) -> Result<SocketAddr, String> {
    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, default_port));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

fn print_usage() {
    eprintln!("Usage: bridge_server [VIEWER_ADDR] [INGEST_ADDR]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  VIEWER_ADDR    WebSocket listener address (default: 0.0.0.0:9870)");
    eprintln!("  INGEST_ADDR    HTTP ingest listener address (default: 0.0.0.0:9871)");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  bridge_server                            # defaults");
    eprintln!("  bridge_server localhost                  # viewer on 127.0.0.1:9870");
    eprintln!("  bridge_server 0.0.0.0:9880 0.0.0.0:9881  # both custom");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let mut config = BridgeConfig::default();
    if let Some(arg) = args.get(1) {
        match parse_bind_addr(arg, 9870) {
            Ok(addr) => config = config.viewer_bind(addr),
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        }
    }
    if let Some(arg) = args.get(2) {
        match parse_bind_addr(arg, 9871) {
            Ok(addr) => config = config.ingest_bind(addr),
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        }
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("framecast_rs=debug".parse()?)
                .add_directive("bridge_server=debug".parse()?),
        )
        .init();

    println!("Frame bridge");
    println!("  WS:   ws://{}", config.viewer_addr);
    println!("  HTTP: http://{}/frames", config.ingest_addr);
    println!();
    println!("=== Submit a batch ===");
    println!(
        "curl -X POST http://localhost:{}/frames -d '{{\"fps\": 30, \"frames\": [{{\"t\": 0.0, \"params\": {{}}}}]}}'",
        config.ingest_addr.port()
    );
    println!();
    println!("=== Broadcast a status ===");
    println!(
        "curl -X POST http://localhost:{}/status -d '{{\"text\": \"hello viewers\"}}'",
        config.ingest_addr.port()
    );
    println!();

    let server = BridgeServer::new(config);

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                eprintln!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
        }
    }

    Ok(())
}
