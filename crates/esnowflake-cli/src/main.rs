#![doc = include_str!("../README.md")]

mod config;
mod telemetry;

use std::io::{self, BufWriter, Write};
use std::thread::scope;
use std::time::Instant;

use anyhow::{Context, bail};
use clap::Parser;
use config::{CliArgs, CliConfig, Command, Mode};
use esnowflake::Generator;
use telemetry::init_telemetry;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = CliConfig::try_from(args)?;

    init_telemetry()?;

    let generator = Generator::with_options(
        config.identity,
        esnowflake::OsRandom,
        esnowflake::SystemClock,
        config.options,
    );

    match config.command {
        Command::Generate {
            mode,
            count,
            threads,
        } => generate(&generator, mode, count, threads),
        Command::Decode { ids, local } => decode(&generator, &ids, local),
    }
}

// IDs formatted per stdout write. Bounds memory regardless of `--count`.
const BATCH: usize = 4096;

fn generate(generator: &Generator, mode: Mode, count: usize, threads: usize) -> anyhow::Result<()> {
    tracing::info!(?mode, count, threads, worker = ?generator.identity(), "generating IDs");
    let start = Instant::now();

    let next = |g: &Generator| match mode {
        Mode::Random => g.generate_by_random(),
        Mode::Sequence => g.generate_by_sequence(),
    };

    if threads <= 1 {
        write_batches(count, || next(generator), stdout_sink)?;
    } else {
        let per_thread = count / threads;
        let remainder = count % threads;
        scope(|s| {
            let handles: Vec<_> = (0..threads)
                .map(|i| {
                    let n = per_thread + usize::from(i < remainder);
                    let next = &next;
                    s.spawn(move || write_batches(n, || next(generator), stdout_sink))
                })
                .collect();
            handles.into_iter().try_for_each(|h| {
                h.join()
                    .map_err(|_| anyhow::anyhow!("generator thread panicked"))?
            })
        })?;
    }
    io::stdout().flush()?;

    tracing::info!(count, elapsed = ?start.elapsed(), "done");
    Ok(())
}

/// Produces `count` IDs, one per line, handing them to `sink` at most
/// `BATCH` at a time.
fn write_batches(
    count: usize,
    next: impl Fn() -> esnowflake::Result<String>,
    mut sink: impl FnMut(&[u8]) -> io::Result<()>,
) -> anyhow::Result<()> {
    let mut buf = String::with_capacity(BATCH * (esnowflake::ENCODED_LEN + 1));
    let mut remaining = count;
    while remaining > 0 {
        let n = remaining.min(BATCH);
        buf.clear();
        for _ in 0..n {
            buf.push_str(&next()?);
            buf.push('\n');
        }
        sink(buf.as_bytes())?;
        remaining -= n;
    }
    Ok(())
}

// Each batch is written under one stdout lock, so concurrent writers
// interleave whole lines.
fn stdout_sink(bytes: &[u8]) -> io::Result<()> {
    io::stdout().lock().write_all(bytes)
}

fn decode(generator: &Generator, ids: &[String], local: bool) -> anyhow::Result<()> {
    let mut out = BufWriter::new(io::stdout().lock());
    let mut failed = 0;
    for id in ids {
        let decoded = if local {
            generator.get_time_in(id, &chrono::Local)
        } else {
            generator.get_time(id)
        }
        .and_then(|time| Ok((time, generator.get_ip(id)?)));

        match decoded {
            Ok((time, ip)) => writeln!(out, "{id}\t{time}\t{ip}")?,
            Err(e) => {
                tracing::error!(id = %id, error = %e, "failed to decode");
                failed += 1;
            }
        }
    }
    out.flush().context("writing to stdout")?;

    if failed > 0 {
        bail!("{failed} of {} IDs could not be decoded", ids.len());
    }
    Ok(())
}
