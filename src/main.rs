mod config;
mod demo;
mod ipc;
mod messages;
mod model;
mod record;
mod reports;
mod screens;
mod source;
mod status;
mod validate;
mod view;

use std::io::{self, BufRead, Write};

use anyhow::Context;
use clap::Parser;

/// Logs go to stderr; stdout carries nothing but response lines.
fn init_tracing(directive: Option<&str>) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| match directive {
            Some(d) => tracing_subscriber::EnvFilter::try_new(d),
            None => Ok(tracing_subscriber::EnvFilter::new("warn")),
        })
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .compact()
        .try_init()
        .ok();
}

fn main() -> anyhow::Result<()> {
    let config = config::Config::parse();
    init_tracing(config.log.as_deref());
    tracing::info!(
        page_size = config.page_size,
        threshold_days = config.defaulter_threshold_days,
        today = %config.today(),
        demo_failure = ?config.demo_failure,
        "feedeskd starting"
    );

    let source = demo::DemoSource::with_failure(config.demo_failure);
    let mut state = ipc::AppState::new(config, Box::new(source));

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line.context("reading request line")?;
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "unparseable request line");
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                writeln!(stdout, "{}", resp).context("writing response")?;
                stdout.flush().context("flushing response")?;
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        writeln!(stdout, "{}", resp).context("writing response")?;
        stdout.flush().context("flushing response")?;
    }

    tracing::info!("stdin closed, exiting");
    Ok(())
}
