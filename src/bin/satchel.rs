//! satchel: LMS command-line client
//!
//! Thin shell over [`LmsApi`](satchel::LmsApi) with file-backed credentials,
//! handy for poking at a running backend.

use std::io::{self, IsTerminal, Read};

use clap::{Parser, Subcommand};
use serde::Serialize;

use satchel::{Config, LmsApi, PreloadQueue};

/// LMS command-line client
#[derive(Parser)]
#[command(name = "satchel")]
#[command(version = satchel::PKG_VERSION)]
#[command(about = "School LMS API client")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// API base URL (overrides the config file)
    #[arg(long, env = "SATCHEL_API_URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and store the access token
    Login {
        /// Account email
        email: String,
        /// Password (or omit to read from stdin)
        #[arg(long, env = "SATCHEL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Log out and forget the stored token
    Logout,

    /// Show the current user
    Me,

    /// List tests
    Tests,

    /// Show a single test
    Test {
        /// Test id
        id: String,
    },

    /// List homework
    Homework,

    /// Warm the current user and test list, then report cache contents
    Warm,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if args.base_url.is_some() {
        config.api.base_url = args.base_url;
    }
    let gateway = config.build_gateway()?;
    let api = LmsApi::new(gateway.clone());

    match args.command {
        Command::Login { email, password } => {
            let password = match password {
                Some(p) => p,
                None => read_stdin()?,
            };
            let response = api.login(email, password).await?;
            println!(
                "logged in as {} ({:?})",
                response.data.user.name, response.data.user.role
            );
        }
        Command::Logout => {
            api.logout().await?;
            println!("logged out");
        }
        Command::Me => print_json(&api.get_current_user().await?.data)?,
        Command::Tests => print_json(&api.list_tests().await?.data)?,
        Command::Test { id } => print_json(&api.get_test(&id).await?.data)?,
        Command::Homework => print_json(&api.list_homework().await?.data)?,
        Command::Warm => {
            let preload = PreloadQueue::new(gateway.clone(), config.preload_config());
            preload.warm_defaults();
            preload.wait_idle().await;
            for key in gateway.cache().keys() {
                println!("{key}");
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_stdin() -> Result<String, Box<dyn std::error::Error>> {
    if io::stdin().is_terminal() {
        eprintln!("password:");
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf.trim_end_matches(['\r', '\n']).to_string())
}
