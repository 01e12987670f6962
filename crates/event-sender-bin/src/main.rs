//! Event sender - posts event payloads to the collector in order, with retry,
//! expiry and redirect handling.

use std::path::PathBuf;

use clap::Parser;
use delivery_config_and_utils::{init_logging, Config};
use event_delivery::{EventSender, EventSenderService};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::info;

/// Event sender command-line interface.
#[derive(Parser, Debug)]
#[command(name = "event-sender")]
#[command(about = "Deliver telemetry event payloads to the collector")]
#[command(version)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, env = "EVENTS_CONFIG")]
    config: Option<PathBuf>,

    /// Collector endpoint (overrides the configuration)
    #[arg(long)]
    endpoint: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Payload to send, repeatable. One payload per stdin line when omitted.
    #[arg(short, long = "payload")]
    payloads: Vec<String>,

    /// Extra drain cycles for events still queued once the input is exhausted
    #[arg(long, default_value_t = 0)]
    retry_passes: u32,
}

impl Cli {
    fn resolve_config(&self) -> Result<Config, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::new(),
        };
        if let Some(endpoint) = &self.endpoint {
            config.endpoint_url = Some(endpoint.clone());
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    init_logging("event-sender", &config.log_level)?;

    let service = EventSenderService::from_config(&config)?;
    let sender = service.sender();

    let (submitted, read_result) = if cli.payloads.is_empty() {
        submit_lines(BufReader::new(tokio::io::stdin()), &sender).await
    } else {
        let count = cli.payloads.len();
        for payload in cli.payloads {
            sender.enqueue_now(payload);
        }
        (count, Ok(()))
    };

    for _ in 0..cli.retry_passes {
        sender.wake();
    }
    drop(sender);

    // let the worker finish what it was handed even when input failed
    let dispatcher = service.shutdown().await?;
    let remaining = dispatcher.queue().len();
    read_result?;

    info!(submitted, remaining, "Input exhausted");
    println!("{} event(s) submitted, {} still queued", submitted, remaining);

    Ok(())
}

/// Enqueue one payload per input line.
///
/// Returns how many were handed over, plus the read error that stopped the
/// input early, if any.
async fn submit_lines<R>(reader: R, sender: &EventSender) -> (usize, std::io::Result<()>)
where
    R: AsyncBufRead + Unpin,
{
    let mut submitted = 0usize;
    let mut lines = reader.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                sender.enqueue_now(line);
                submitted += 1;
            }
            Ok(None) => return (submitted, Ok(())),
            Err(e) => return (submitted, Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreadable_input_keeps_submitted_events() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut config = Config::new();
        config.endpoint_url = Some(format!("http://127.0.0.1:{}/m/event", port));
        let service = EventSenderService::from_config(&config).unwrap();
        let sender = service.sender();

        let input: &[u8] = b"{\"event\":\"a\"}\n\xff\xfe\n{\"event\":\"b\"}\n";
        let (submitted, result) = submit_lines(input, &sender).await;
        drop(sender);

        assert_eq!(submitted, 1);
        assert_eq!(
            result.unwrap_err().kind(),
            std::io::ErrorKind::InvalidData
        );

        // collector is down, so the submitted event waits in the queue
        let dispatcher = service.shutdown().await.unwrap();
        let head = dispatcher.queue().remove_head().unwrap();
        assert_eq!(head.payload(), "{\"event\":\"a\"}");
    }

    #[test]
    fn parses_repeated_payloads() {
        let cli = Cli::try_parse_from([
            "event-sender",
            "--payload",
            "{\"event\":\"a\"}",
            "-p",
            "{\"event\":\"b\"}",
            "--retry-passes",
            "2",
        ])
        .unwrap();
        assert_eq!(cli.payloads.len(), 2);
        assert_eq!(cli.retry_passes, 2);
        assert!(cli.endpoint.is_none());
    }

    #[test]
    fn command_line_overrides_config() {
        let cli = Cli::try_parse_from([
            "event-sender",
            "--endpoint",
            "http://localhost:8050/m/event",
            "--log-level",
            "debug",
        ])
        .unwrap();
        let config = cli.resolve_config().unwrap();
        assert_eq!(
            config.endpoint_url.as_deref(),
            Some("http://localhost:8050/m/event")
        );
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
