//! Simple dispatch server example with a seeded provider roster
//!
//! Run with: cargo run --example simple_server [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example simple_server                    # binds to 0.0.0.0:5000
//!   cargo run --example simple_server localhost          # binds to 127.0.0.1:5000
//!   cargo run --example simple_server 127.0.0.1:5001     # binds to 127.0.0.1:5001
//!
//! ## Talking to it
//!
//! The wire format is one JSON object per line. With netcat:
//!
//!   nc localhost 5000
//!   {"event":"provider:register","data":{"provider_id":"doc1"}}
//!
//! and from a second terminal:
//!
//!   nc localhost 5000
//!   {"event":"user:register","data":{"user_id":"u1"}}
//!   {"event":"consult:request","data":{"emergency_id":"em_1","user_id":"u1","latitude":40.7128,"longitude":-74.006}}

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dispatch_rs::{
    DispatchConfig, DispatchServer, Location, Provider, SelectionPolicy, ServerConfig,
};

/// The roster the registry starts with
fn seed_providers() -> Vec<Provider> {
    vec![
        Provider::doctor(
            "doc1",
            "Dr. Sarah Johnson",
            "Emergency Medicine",
            Location::new(40.7128, -74.006),
        ),
        Provider::doctor(
            "doc2",
            "Dr. Michael Chen",
            "Cardiology",
            Location::new(40.715, -74.008),
        ),
        Provider::doctor(
            "doc3",
            "Dr. Emma Williams",
            "Trauma Surgery",
            Location::new(40.712, -74.005),
        ),
        Provider::ambulance("amb1", "Ambulance Unit 1", Location::new(40.7114, -74.003)),
        Provider::ambulance("amb2", "Ambulance Unit 2", Location::new(40.712, -74.009)),
        Provider::ambulance("amb3", "Ambulance Unit 3", Location::new(40.714, -74.004)),
    ]
}

/// Parse bind address from command line argument.
///
/// Accepts formats:
/// - "localhost" -> 127.0.0.1:5000
/// - "localhost:5001" -> 127.0.0.1:5001
/// - "127.0.0.1" -> 127.0.0.1:5000
/// - "0.0.0.0:5000" -> 0.0.0.0:5000
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    const DEFAULT_PORT: u16 = 5000;

    // Replace "localhost" with "127.0.0.1"
    let normalized = arg.replace("localhost", "127.0.0.1");

    // Try parsing as SocketAddr first (includes port)
    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    // Try parsing as IP address without port
    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

fn print_usage() {
    eprintln!("Usage: simple_server [BIND_ADDR]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR    Address to bind to (default: 0.0.0.0:5000)");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let bind_addr = match args.get(1) {
        Some(addr_str) => match parse_bind_addr(addr_str) {
            Ok(addr) => addr,
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        },
        None => "0.0.0.0:5000".parse().unwrap(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dispatch_rs=debug".parse()?)
                .add_directive("simple_server=debug".parse()?),
        )
        .init();

    let config = ServerConfig {
        bind_addr,
        ..ServerConfig::default()
    };

    // Nearest-doctor selection plus a 30s ring timeout
    let dispatch = DispatchConfig::default()
        .selection(SelectionPolicy::Nearest)
        .ring_timeout(Duration::from_secs(30));

    println!("Starting dispatch server on {}", config.bind_addr);
    println!();
    println!("Seeded providers: 3 doctors, 3 ambulances");
    println!("Wire format: one JSON object per line, try it with `nc {}`", config.bind_addr);
    println!();

    let server = Arc::new(DispatchServer::new(config, dispatch, seed_providers()));

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
