//! selfcarectl: companion CLI for the selfcare daemon.
//!
//! Runs at a lower privilege tier than the daemon; everything privileged
//! goes through the loopback relay. One subcommand maps to one relay
//! operation, one connection, one response.

mod daemon_client;
mod logging;

use clap::{Parser, Subcommand};
use selfcare_relay_protocol::{Operation, RequestEnvelope, ResponseEnvelope};

#[derive(Parser)]
#[command(name = "selfcarectl")]
#[command(about = "Talk to the selfcare daemon over the loopback relay")]
#[command(version)]
struct Cli {
    /// Print the raw response envelope as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report daemon status (platform, pid, working directory, elevation)
    Status,

    /// Run a command through the privileged daemon
    Run {
        /// Program to execute
        #[arg(value_name = "COMMAND")]
        command: String,

        /// Arguments passed to the program
        #[arg(value_name = "ARGS", trailing_var_arg = true)]
        arguments: Vec<String>,
    },

    /// Check whether the daemon runs elevated
    Privileges,

    /// Invoke a device-control method (mute, unmute, set_volume)
    Device {
        /// Method name
        #[arg(value_name = "METHOD")]
        method: String,

        /// Optional numeric argument (e.g. volume percent)
        #[arg(value_name = "VALUE")]
        value: Option<i64>,
    },
}

fn main() {
    logging::init();
    let cli = Cli::parse();

    let request = build_request(&cli.command);
    let response = match daemon_client::send_request(&request) {
        Ok(response) => response,
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(2);
        }
    };

    let exit_code = render(&response, cli.json);
    std::process::exit(exit_code);
}

fn build_request(command: &Commands) -> RequestEnvelope {
    match command {
        Commands::Status => RequestEnvelope::new(Operation::GetSystemStatus),
        Commands::Run { command, arguments } => {
            let mut request = RequestEnvelope::new(Operation::RunCommand);
            request.command = Some(command.clone());
            if !arguments.is_empty() {
                request.arguments = Some(arguments.join(" "));
            }
            request
        }
        Commands::Privileges => RequestEnvelope::new(Operation::CheckPrivileges),
        Commands::Device { method, value } => {
            let mut request = RequestEnvelope::new(Operation::DeviceControl);
            request.command = Some(method.clone());
            request.arguments = value.map(|v| v.to_string());
            request
        }
    }
}

/// Prints the response and picks the process exit code: the remote exit
/// code for RunCommand when present, otherwise 0/1 by success.
fn render(response: &ResponseEnvelope, raw_json: bool) -> i32 {
    if raw_json {
        match serde_json::to_string_pretty(response) {
            Ok(json) => println!("{}", json),
            Err(_) => println!("{}", response.message),
        }
    } else {
        if !response.message.is_empty() {
            eprintln!("{}", response.message);
        }
        if !response.output.is_empty() {
            println!("{}", response.output);
        }
    }

    if let Some(code) = response.exit_code {
        code
    } else if response.success {
        0
    } else {
        1
    }
}
