use std::process::ExitCode;

use shellmate::tracing::{init_tracing, shutdown_tracing};
use shellmate::{Assistant, AssistantConfig, HostInfo, OllamaChatClient, ShellExecutor, StdioTerminal};

/// Conventional exit status for a process ended by SIGINT
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AssistantConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_tracing(env!("CARGO_PKG_NAME"), config.otlp_endpoint.as_deref()) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    let host = HostInfo::detect();
    let client = match OllamaChatClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to create HTTP client: {}", e);
            shutdown_tracing();
            return ExitCode::FAILURE;
        }
    };
    let executor = ShellExecutor::new(host.family, config.command_timeout);

    tracing::info!(
        model = %config.model,
        endpoint = %client.endpoint(),
        os = %host.family,
        max_error_retry = config.max_error_retry,
        "Starting session"
    );

    let mut assistant = Assistant::new(config, host, client, executor, StdioTerminal::new());
    assistant.greet();

    // Dropping the session future also kills any running child (kill_on_drop).
    // `biased` polls ctrl_c first so the handler is installed before the
    // first prompt appears.
    let status = tokio::select! {
        biased;
        _ = tokio::signal::ctrl_c() => {
            println!("\nInterrupted. Goodbye!");
            ExitCode::from(EXIT_INTERRUPTED)
        }
        result = assistant.run() => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        },
    };

    shutdown_tracing();
    status
}
