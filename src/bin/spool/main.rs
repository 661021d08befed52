mod args;
mod util;

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use print_spool::config::QueueConfig;
use print_spool::dispatch::Dispatcher;
use print_spool::engine::QueueEngine;
use print_spool::line_reader::LineReader;
use print_spool::parser::ParsingError;
use print_spool::types::protocol::SpoolCommand;
use print_spool::types::serialisable::SpoolSerialisable;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio::{select, signal};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn, Level};

use crate::args::Args;
use crate::util::bytes_to_human_str;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Logging goes to stderr so replies on stdout stay machine-readable.
    if args.debug {
        tracing_subscriber::fmt()
            .with_max_level(Level::TRACE)
            .with_writer(io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt().json().with_writer(io::stderr).init();
    }

    let config = match load_config(&args).await {
        Ok(config) => config,
        Err(error) => {
            error!(error = %format!("{error:#}"), "unusable configuration");
            return ExitCode::from(2);
        },
    };

    let engine = match QueueEngine::new(config) {
        Ok(engine) => Arc::new(engine),
        Err(error) => {
            error!(%error, "unusable configuration");
            return ExitCode::from(2);
        },
    };

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(error) = signal::ctrl_c().await {
                warn!(%error, "something strange with ctrl-c handling!");
            };
            cancel.cancel();
        });
    }

    if let Err(error) = run(&args, engine, cancel).await {
        error!(error = %format!("{error:#}"), "encountered runtime error");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

async fn load_config(args: &Args) -> Result<QueueConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            QueueConfig::from_yaml(&raw)
                .with_context(|| format!("parsing {}", path.display()))?
        },
        None => QueueConfig::default(),
    };

    if let Some(capacity) = args.capacity {
        config.capacity = capacity;
    }
    if let Some(expiry) = args.expiry {
        config.expiry_threshold = expiry;
    }
    if let Some(interval) = args.aging_interval {
        config.aging_interval = interval;
    }

    Ok(config)
}

async fn run(
    args: &Args,
    engine: Arc<QueueEngine>,
    cancel: CancellationToken,
) -> Result<()> {
    let source: Box<dyn AsyncRead + Unpin + Send> = match &args.script {
        Some(path) => Box::new(
            tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening {}", path.display()))?,
        ),
        None => Box::new(tokio::io::stdin()),
    };
    let mut r: LineReader<_> = source.into();
    let mut w = tokio::io::stdout();

    let config = engine.config();
    info!(
        capacity = config.capacity,
        expiry = config.expiry_threshold,
        aging_interval = config.aging_interval,
        "queue ready"
    );
    let mut dispatcher = Dispatcher::new(engine);

    loop {
        let line = select!(
            x = r.read_line() => match x.context("reading script")? {
                Some(x) => x,
                None => break,
            },
            _ = cancel.cancelled() => break,
        );

        // Blank lines and comments are for people reading the script.
        if line.iter().all(u8::is_ascii_whitespace) || line.starts_with(b"#")
        {
            continue;
        }

        trace!(line = bytes_to_human_str(&line), "processing command");

        let cmd: Result<SpoolCommand, ParsingError> =
            (&line as &[u8]).try_into();

        let resp: Vec<u8> = match cmd {
            Ok(SpoolCommand::Quit) => break,
            Ok(cmd) => dispatcher
                .execute(cmd)
                .await
                .iter()
                .flat_map(|r| r.serialise_spool())
                .collect(),
            Err(error) => {
                let line = bytes_to_human_str(&line);
                debug!(%error, %line, "rejected line");
                error.serialise_spool()
            },
        };

        w.write_all(&resp).await.context("writing reply")?;
        w.flush().await.context("writing reply")?;
    }

    let stats = dispatcher.engine().stats();
    info!(
        now = stats.now,
        waiting = stats.current_jobs_waiting,
        completed = stats.total_completed,
        expired = stats.total_expired,
        rejected = stats.total_rejected,
        "script finished"
    );

    Ok(())
}
