//!
//! apolices CLI binary
//! -------------------
//! Interactive client for the session endpoints: log in, check who is logged in,
//! log out. Useful for checking a deployment's credential configuration.

use std::env;

use anyhow::Result;

use apolices::cli::{self, connectivity::AuthClient};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--url <base>] [--email <e> --password <p>]\n\nFlags:\n  --url <base>        Server base URL (default http://127.0.0.1:3000)\n  --email <e>         Log in before starting the prompt\n  --password <p>      Password for --email\n  -h, --help          Show this help\n\n{}",
        cli::HELP
    );
}

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag).and_then(|i| args.get(i + 1)).cloned()
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let program = args.first().cloned().unwrap_or_else(|| "apolices_cli".to_string());
    if args.iter().any(|a| a == "-h" || a == "--help") {
        print_usage(&program);
        return Ok(());
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();

    let base = arg_value(&args, "--url").unwrap_or_else(|| "http://127.0.0.1:3000".to_string());
    let client = AuthClient::new(&base)?;
    let rt = tokio::runtime::Runtime::new()?;

    if let (Some(email), Some(password)) = (arg_value(&args, "--email"), arg_value(&args, "--password")) {
        match rt.block_on(client.login(&email, &password))? {
            Some(u) => println!("logged in: {}", cli::describe_user(Some(&u))),
            None => println!("Credenciais inválidas"),
        }
    }

    cli::run_repl(&rt, &client)
}
