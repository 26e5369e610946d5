//! Basic example: connect to a host and run a few commands.
//!
//! # Prerequisites
//!
//! - A reachable SSH server
//! - Valid credentials (username/password or SSH key)
//!
//! # Usage
//!
//! With password authentication:
//! ```bash
//! cargo run --example run_command -- --host localhost --user you --password secret
//! ```
//!
//! With SSH key authentication:
//! ```bash
//! cargo run --example run_command -- --host localhost --user you --key ~/.ssh/id_ed25519
//! ```
//!
//! The `--prompt` flag takes the regex that marks your shell prompt
//! (default: `[$#>]\s*$`).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use sshpect::SessionBuilder;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    println!("Connecting to {}:{}...", args.host, args.port);

    let mut builder = SessionBuilder::new(&args.host)
        .port(args.port)
        .username(&args.user)
        .prompt(&args.prompt)
        .timeout(Duration::from_secs(args.timeout));

    if let Some(password) = &args.password {
        builder = builder.password(password);
    } else if let Some(key_path) = &args.key {
        builder = builder.private_key(key_path);
    } else {
        eprintln!("Error: Must provide either --password or --key");
        std::process::exit(1);
    }

    let mut session = builder.build()?;
    session.open().await?;
    println!("Connected!");

    println!("\nExecuting: uname -a");
    println!("{}", "-".repeat(50));
    let response = session.send_command("uname -a").await?;
    println!("{}", response.output);
    println!("{}", "-".repeat(50));
    println!(
        "Completed in {:?} (success: {})",
        response.elapsed,
        response.is_success()
    );

    println!("\nExecuting: ls -la (echo stripped)");
    let response = session.send_command_stripped("ls -la").await?;
    println!("{}", response.output);

    println!("\nExecuting: whoami");
    let response = session.send_command("whoami").await?;
    println!("Running as: {}", response.output.trim());

    session.close().await?;
    println!("\nDone!");

    Ok(())
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    host: String,
    port: u16,
    user: String,
    password: Option<String>,
    key: Option<PathBuf>,
    prompt: String,
    timeout: u64,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut host = "localhost".to_string();
        let mut port = 22u16;
        let mut user = env::var("USER").unwrap_or_else(|_| "root".to_string());
        let mut password = None;
        let mut key = None;
        let mut prompt = r"[$#>]\s*$".to_string();
        let mut timeout = 30u64;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--host" | "-h" => {
                    i += 1;
                    if i < args.len() {
                        host = args[i].clone();
                    }
                }
                "--port" | "-p" => {
                    i += 1;
                    if i < args.len() {
                        port = args[i].parse().unwrap_or(22);
                    }
                }
                "--user" | "-u" => {
                    i += 1;
                    if i < args.len() {
                        user = args[i].clone();
                    }
                }
                "--password" | "-P" => {
                    i += 1;
                    if i < args.len() {
                        password = Some(args[i].clone());
                    }
                }
                "--key" | "-k" => {
                    i += 1;
                    if i < args.len() {
                        key = Some(PathBuf::from(&args[i]));
                    }
                }
                "--prompt" => {
                    i += 1;
                    if i < args.len() {
                        prompt = args[i].clone();
                    }
                }
                "--timeout" | "-t" => {
                    i += 1;
                    if i < args.len() {
                        timeout = args[i].parse().unwrap_or(30);
                    }
                }
                "--help" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                }
            }
            i += 1;
        }

        Self {
            host,
            port,
            user,
            password,
            key,
            prompt,
            timeout,
        }
    }

    fn print_help() {
        println!(
            "Usage: run_command [OPTIONS]\n\n\
             Options:\n\
             \x20 --host, -h <HOST>          Target host (default: localhost)\n\
             \x20 --port, -p <PORT>          SSH port (default: 22)\n\
             \x20 --user, -u <USER>          Username (default: $USER)\n\
             \x20 --password, -P <PASSWORD>  Password authentication\n\
             \x20 --key, -k <PATH>           Private key authentication\n\
             \x20 --prompt <REGEX>           Prompt pattern (default: [$#>]\\s*$)\n\
             \x20 --timeout, -t <SECONDS>    Connect/command timeout (default: 30)"
        );
    }
}
