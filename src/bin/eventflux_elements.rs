// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runs one element over newline-delimited JSON events read from stdin.
//!
//! ```text
//! eventflux-elements --config pipeline.toml text-filter < events.ndjson
//! eventflux-elements --set task.field=s0::state --set task.timestamp-field=s0::ts task-duration
//! ```
//!
//! Processor output is written to stdout, one JSON object per line. Logs go to
//! stderr and follow `RUST_LOG`.

use clap::{Parser, Subcommand};
use crossbeam_channel::Receiver;
use eventflux_elements::core::config::FlatConfig;
use eventflux_elements::core::element::{Element, ProcessorHost, SinkHost};
use eventflux_elements::core::error::ErrorConfig;
use eventflux_elements::core::event::Event;
use eventflux_elements::core::exception::{ElementError, ElementResult};
use eventflux_elements::core::processor::{
    TaskDuration, TaskDurationParameters, TextFilter, TextFilterParameters,
};
use eventflux_elements::core::stream::output::sink::{
    BrokerPublisher, BrokerPublisherParameters, RabbitMqConnector,
};
use eventflux_elements::core::stream::{ChannelCollector, EventCollector, LogCollector};
use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "eventflux-elements",
    version,
    about = "Run a single stream-processing element over NDJSON events"
)]
struct Cli {
    /// TOML file with an `[elements.<name>]` table per element
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Element table to read from the config file (defaults to the command name)
    #[arg(short, long)]
    name: Option<String>,

    /// Log emitted events instead of writing them to stdout
    #[arg(long)]
    log_events: bool,

    /// Property override, highest priority
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_property)]
    overrides: Vec<(String, String)>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Forward events whose text field matches a keyword
    TextFilter,
    /// Emit the time spent between key transitions
    TaskDuration,
    /// Publish every event to a RabbitMQ destination
    Publish,
}

impl Command {
    fn default_name(self) -> &'static str {
        match self {
            Command::TextFilter => "text-filter",
            Command::TaskDuration => "task-duration",
            Command::Publish => "publish",
        }
    }
}

fn parse_property(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

fn load_config(cli: &Cli, name: &str) -> ElementResult<FlatConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| {
                ElementError::configuration(format!(
                    "Cannot read config file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            FlatConfig::from_toml_str(&text, name)?
        }
        None => FlatConfig::new(),
    };

    let overrides: HashMap<String, String> = cli.overrides.iter().cloned().collect();
    config.merge(&FlatConfig::from_properties(&overrides));
    Ok(config)
}

/// Where processor output goes: a channel drained to stdout, or the log
fn output_collector(
    name: &str,
    log_events: bool,
) -> (Box<dyn EventCollector>, Option<Receiver<Event>>) {
    if log_events {
        (Box::new(LogCollector::new(format!("[{}]", name))), None)
    } else {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Box::new(ChannelCollector::new(tx)), Some(rx))
    }
}

fn build_element(
    command: Command,
    name: &str,
    config: &FlatConfig,
    log_events: bool,
) -> ElementResult<(Box<dyn Element>, Option<Receiver<Event>>)> {
    let error_config = ErrorConfig::from_flat_config(config)?;

    match command {
        Command::TextFilter => {
            let parameters = TextFilterParameters::from_flat_config(config)?;
            let (collector, output) = output_collector(name, log_events);
            let host = ProcessorHost::new(name, TextFilter::new(), parameters, collector)
                .with_error_config(error_config);
            Ok((Box::new(host), output))
        }
        Command::TaskDuration => {
            let parameters = TaskDurationParameters::from_flat_config(config)?;
            let (collector, output) = output_collector(name, log_events);
            let host = ProcessorHost::new(name, TaskDuration::new(), parameters, collector)
                .with_error_config(error_config);
            Ok((Box::new(host), output))
        }
        Command::Publish => {
            let host = SinkHost::new(
                name,
                BrokerPublisher::new(RabbitMqConnector::from_flat_config(config)?),
                BrokerPublisherParameters::from_flat_config(config)?,
            )
            .with_error_config(error_config);
            Ok((Box::new(host), None))
        }
    }
}

fn write_output(output: Option<&Receiver<Event>>, out: &mut impl Write) -> ElementResult<()> {
    let Some(receiver) = output else {
        return Ok(());
    };
    for event in receiver.try_iter() {
        let line = serde_json::to_string(&event)?;
        writeln!(out, "{}", line)
            .map_err(|e| ElementError::runtime(format!("Failed to write output: {}", e)))?;
    }
    Ok(())
}

fn pump(
    element: &mut dyn Element,
    output: Option<&Receiver<Event>>,
    input: impl BufRead,
    out: &mut impl Write,
) -> ElementResult<()> {
    for (index, line) in input.lines().enumerate() {
        let line =
            line.map_err(|e| ElementError::runtime(format!("Failed to read input: {}", e)))?;
        if line.trim().is_empty() {
            continue;
        }

        let event = match Event::from_json_str(&line) {
            Ok(event) => event,
            Err(e) => {
                log::warn!("Skipping malformed input on line {}: {}", index + 1, e);
                continue;
            }
        };

        element.on_event(event)?;
        write_output(output, out)?;
    }
    Ok(())
}

fn run(cli: Cli) -> ElementResult<()> {
    let name = cli
        .name
        .clone()
        .unwrap_or_else(|| cli.command.default_name().to_string());
    let config = load_config(&cli, &name)?;
    let (mut element, output) = build_element(cli.command, &name, &config, cli.log_events)?;

    if let Err(e) = element.start() {
        // Release whatever a partial start acquired
        let _ = element.stop();
        return Err(e);
    }

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let pumped = pump(element.as_mut(), output.as_ref(), stdin.lock(), &mut out);
    let stopped = element.stop();
    write_output(output.as_ref(), &mut out)?;

    let stats = element.stats();
    log::info!(
        "[{}] Processed {} events, dropped {}",
        element.name(),
        stats.events_received,
        stats.events_dropped
    );

    pumped.and(stopped)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventflux_elements::core::config::PropertySource;

    #[test]
    fn test_parse_property() {
        assert_eq!(
            parse_property("filter.keyword= a=b").unwrap(),
            ("filter.keyword".to_string(), " a=b".to_string())
        );
        assert!(parse_property("no-separator").is_err());
        assert!(parse_property("=value").is_err());
    }

    #[test]
    fn test_set_overrides_beat_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"[elements.errors]\n\"filter.field\" = \"s0::level\"\n\"filter.operator\" = \"contains\"\n\"filter.keyword\" = \"ERR\"\n",
        )
        .unwrap();
        let path = file.path().to_str().unwrap();

        let cli = Cli::try_parse_from([
            "eventflux-elements",
            "--config",
            path,
            "--set",
            "filter.keyword=ERROR",
            "--set",
            "filter.operator=equals",
            "text-filter",
        ])
        .unwrap();
        let config = load_config(&cli, "errors").unwrap();

        assert_eq!(
            config.get_with_source("filter.keyword"),
            Some(("ERROR", PropertySource::Pipeline))
        );
        assert_eq!(config.get("filter.operator"), Some("equals"));
        assert_eq!(
            config.get_with_source("filter.field"),
            Some(("s0::level", PropertySource::TomlFile))
        );
    }

    #[test]
    fn test_pump_task_duration_lines() {
        let mut config = FlatConfig::new();
        config.set("task.field", "s0::state", PropertySource::Pipeline);
        config.set("task.timestamp-field", "s0::ts", PropertySource::Pipeline);

        let (mut element, output) =
            build_element(Command::TaskDuration, "task-duration", &config, false).unwrap();
        element.start().unwrap();

        let input = concat!(
            "{\"state\":\"A\",\"ts\":0}\n",
            "\n",
            "not json\n",
            "{\"state\":\"B\",\"ts\":15}\n",
        );
        let mut out = Vec::new();
        pump(element.as_mut(), output.as_ref(), input.as_bytes(), &mut out).unwrap();
        element.stop().unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"processId\":\"A-B\",\"duration\":15.0}\n"
        );
    }

    #[test]
    fn test_logged_output_bypasses_stdout() {
        let mut config = FlatConfig::new();
        config.set("filter.field", "s0::level", PropertySource::Pipeline);
        config.set("filter.operator", "equals", PropertySource::Pipeline);
        config.set("filter.keyword", "ERROR", PropertySource::Pipeline);

        let (mut element, output) =
            build_element(Command::TextFilter, "text-filter", &config, true).unwrap();
        assert!(output.is_none());
        element.start().unwrap();

        let mut out = Vec::new();
        pump(element.as_mut(), None, "{\"level\":\"ERROR\"}\n".as_bytes(), &mut out).unwrap();
        element.stop().unwrap();

        assert!(out.is_empty());
        assert_eq!(element.stats().events_received, 1);
    }

    #[test]
    fn test_missing_parameters_fail_before_start() {
        let err = build_element(Command::TextFilter, "text-filter", &FlatConfig::new(), false).unwrap_err();
        assert!(matches!(err, ElementError::MissingParameter { .. }));
    }
}
