//!
//! apolices server binary
//! ----------------------
//! Command-line entry point for the session gate in front of the policy registry.
//! Configuration comes from environment variables (optionally a `.env` file), with
//! CLI flags overriding the listener settings.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use apolices::config::ServerConfig;

fn parse_port_arg(args: &[String], flag: &str) -> Option<u16> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag
            && i + 1 < args.len() {
                return args[i + 1].parse::<u16>().ok();
            }
        i += 1;
    }
    None
}

fn parse_string_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag).and_then(|i| args.get(i + 1)).cloned()
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("apolices server\n\nUSAGE:\n  apolices_server [--http-port N] [--bind ADDR] [--static-dir PATH]\n\nOPTIONS:\n  --http-port N       HTTP port (env: APOLICES_HTTP_PORT, default 3000)\n  --bind ADDR         Listen address (env: APOLICES_BIND, default 0.0.0.0)\n  --static-dir PATH   Static asset folder (env: APOLICES_STATIC_DIR, default public)\n\nREQUIRED ENV:\n  AUTH_JWT_SECRET     session signing secret\n\nOPTIONAL ENV:\n  AUTH_USERS          JSON list of {{email,name,role,password|password_hash}}\n  AUTH_SESSION_DAYS   session lifetime in days, fractions allowed (default 7)\n  APP_ENV/NODE_ENV    'production' marks the session cookie Secure\n");
        return Ok(());
    }

    // .env is optional; real environment variables win
    let dotenv = dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info"))
        .context("invalid RUST_LOG filter")?;
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    if let Some(path) = dotenv {
        tracing::info!("loaded environment from {}", path.display());
    }

    // A missing signing secret stops the process here, before anything is bound.
    let mut cfg = ServerConfig::from_env().context("refusing to start")?;

    if let Some(port) = parse_port_arg(&args, "--http-port") { cfg.http_port = port; }
    if let Some(bind) = parse_string_arg(&args, "--bind") { cfg.bind = bind; }
    if let Some(dir) = parse_string_arg(&args, "--static-dir") { cfg.static_dir = PathBuf::from(dir); }

    apolices::server::run_with_config(cfg).await
}
