//! End-to-end call flow over real sockets
//!
//! Run with: cargo run --example call_flow
//!
//! Starts a server on an ephemeral port, connects a doctor and a patient
//! client over TCP, and walks a full consultation: register both parties,
//! request a consult, accept the call, trade one offer/answer pair, end the
//! call. Every frame each side receives is printed.

use std::sync::Arc;

use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use dispatch_rs::{DispatchConfig, DispatchServer, Location, Provider, ServerConfig};

/// Minimal line-oriented client for the demo
struct Client {
    name: &'static str,
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(name: &'static str, addr: std::net::SocketAddr) -> std::io::Result<Self> {
        let socket = TcpStream::connect(addr).await?;
        let (read_half, writer) = socket.into_split();

        Ok(Self {
            name,
            reader: BufReader::new(read_half),
            writer,
        })
    }

    async fn send(&mut self, event: serde_json::Value) -> std::io::Result<()> {
        let mut frame = event.to_string().into_bytes();
        frame.push(b'\n');
        self.writer.write_all(&frame).await
    }

    async fn recv(&mut self) -> std::io::Result<serde_json::Value> {
        let mut line = String::new();
        self.reader.read_line(&mut line).await?;

        let value: serde_json::Value = serde_json::from_str(line.trim())?;
        println!("[{}] <- {}", self.name, value);
        Ok(value)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dispatch_rs=info".parse()?),
        )
        .init();

    let providers = vec![Provider::doctor(
        "doc1",
        "Dr. Sarah Johnson",
        "Emergency Medicine",
        Location::new(40.7128, -74.006),
    )];

    // Grab an ephemeral port, then serve on it in the background
    let probe = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = probe.local_addr()?;
    drop(probe);

    let server = Arc::new(DispatchServer::new(
        ServerConfig::with_addr(addr),
        DispatchConfig::default(),
        providers,
    ));
    {
        let server = Arc::clone(&server);
        tokio::spawn(async move {
            if let Err(e) = server.run().await {
                eprintln!("Server error: {}", e);
            }
        });
    }
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    let mut doctor = Client::connect("doctor", addr).await?;
    let mut patient = Client::connect("patient", addr).await?;

    // Both parties introduce themselves
    doctor
        .send(json!({"event": "provider:register", "data": {"provider_id": "doc1"}}))
        .await?;
    doctor.recv().await?; // provider:registered

    patient
        .send(json!({"event": "user:register", "data": {"user_id": "u1"}}))
        .await?;

    // Patient asks for a consultation
    patient
        .send(json!({"event": "consult:request", "data": {
            "emergency_id": "em_1",
            "user_id": "u1",
            "latitude": 40.7128,
            "longitude": -74.006
        }}))
        .await?;

    let found = patient.recv().await?; // consult:found
    let incoming = doctor.recv().await?; // call:incoming
    let session_id = incoming["data"]["session_id"].clone();
    assert_eq!(found["data"]["session_id"], session_id);

    // Doctor accepts
    doctor
        .send(json!({"event": "call:accept", "data": {
            "session_id": session_id,
            "provider_id": "doc1"
        }}))
        .await?;
    doctor.recv().await?; // call:accepted
    patient.recv().await?; // call:joined

    // One offer/answer exchange through the relay
    patient
        .send(json!({"event": "signal:offer", "data": {
            "session_id": session_id,
            "from_role": "requester",
            "payload": {"type": "offer", "sdp": "v=0..."}
        }}))
        .await?;
    doctor.recv().await?; // signal:offer

    doctor
        .send(json!({"event": "signal:answer", "data": {
            "session_id": session_id,
            "from_role": "provider",
            "payload": {"type": "answer", "sdp": "v=0..."}
        }}))
        .await?;
    patient.recv().await?; // signal:answer

    // Patient hangs up; both sides hear about it
    patient
        .send(json!({"event": "call:end", "data": {"session_id": session_id}}))
        .await?;
    patient.recv().await?; // call:ended
    doctor.recv().await?; // call:ended

    println!();
    println!("Call flow complete");
    Ok(())
}
