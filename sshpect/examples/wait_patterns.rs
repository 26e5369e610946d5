//! Pattern-list example: drive a command that asks questions.
//!
//! Sends a command, waits on caller patterns alongside the prompt, and
//! answers whichever question shows up first. Also demonstrates the raw
//! `read_until` API for streaming a long command.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example wait_patterns -- --host localhost --user you --password secret \
//!     --command "rm -i /tmp/scratch"
//! ```

use std::env;
use std::time::Duration;

use sshpect::SessionBuilder;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut session = SessionBuilder::new(&args.host)
        .port(args.port)
        .username(&args.user)
        .password(args.password.as_deref().unwrap_or_default())
        .prompt(r"[$#>]\s*$")
        .timeout(Duration::from_secs(15))
        .build()?;

    session.open().await?;
    println!("Connected to {}:{}", args.host, args.port);

    // Questions the command might ask, tried ahead of the prompt.
    let questions = [r"\?\s*$", r"(?i)password.*:\s*$"];

    println!("\nExecuting: {}", args.command);
    let mut response = session
        .send_command_wait_for_list(&args.command, &questions)
        .await?;

    // Index len(questions) is the prompt itself: the command finished
    // without asking anything.
    while let Some(index) = response.status.matched_pattern() {
        if index >= questions.len() {
            break;
        }
        println!("Command asked: {}", response.output.trim_end());
        response = session.send_command_wait_for_list("y", &questions).await?;
    }

    if response.is_success() {
        println!("Finished:\n{}", response.output);
    } else {
        println!(
            "No prompt after {:?}; partial output:\n{}",
            response.elapsed, response.output
        );
    }

    // Raw read: watch a long command for a marker instead of the prompt.
    println!("\nTailing dmesg for 'usb' (5s window)...");
    session.send_command_no_wait("dmesg | tail -n 50").await?;
    let result = session
        .read_until_pattern("(?i)usb", Duration::from_secs(5))
        .await?;
    if result.status.is_match() {
        println!("Marker seen after {} bytes", result.data.len());
    } else {
        println!("No marker; drained {} bytes", result.data.len());
    }

    session.close().await?;
    Ok(())
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    host: String,
    port: u16,
    user: String,
    password: Option<String>,
    command: String,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut host = "localhost".to_string();
        let mut port = 22u16;
        let mut user = env::var("USER").unwrap_or_else(|_| "root".to_string());
        let mut password = None;
        let mut command = "rm -i /tmp/scratch".to_string();

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
                "--command" | "-c" => {
                    i += 1;
                    if i < args.len() {
                        command = args[i].clone();
                    }
                }
                "--help" => {
                    println!(
                        "Usage: wait_patterns --host <HOST> --user <USER> --password <PASSWORD> \
                         [--command <CMD>]"
                    );
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
            command,
        }
    }
}
