//! `oauth2-gateway` binary entry point.

// crates.io
use clap::Parser;
// self
use oauth2_gateway::server::{self, ServeArgs};

#[tokio::main]
async fn main() -> oauth2_gateway::Result<()> {
	server::run(ServeArgs::parse()).await
}
