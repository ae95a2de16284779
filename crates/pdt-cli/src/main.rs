// SPDX-License-Identifier: Apache-2.0
//! `pdt`: preferred-directions Delaunay edge flipping over OFF streams.
//!
//! Reads a planar triangulation in OFF format on standard input, flips edges
//! until every interior edge is locally PD-Delaunay for the configured
//! direction pair, and writes the result in OFF format on standard output.
//! Exits `0` on success and non-zero on any parse, validation, or
//! configuration failure.
//!
//! # Usage
//! ```text
//! pdt [--u X,Y] [--v X,Y] [--stats] < input.off > output.off
//! ```
//!
//! Logging goes to stderr and is controlled by `RUST_LOG`.

// The CLI is expected to print to stdout/stderr.
#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::io::{self, BufReader, BufWriter, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pdt_flip::{flip_to_pd_delaunay, PreferredDirections};
use pdt_interval::RoundedScalar;
use pdt_kernel::{Kernel, Vector2};
use pdt_mesh::Triangulation;

/// A direction given as `X,Y` on the command line.
fn parse_direction(raw: &str) -> Result<(f64, f64), String> {
    let (x, y) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got {raw:?}"))?;
    let parse = |s: &str| -> Result<f64, String> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|_| format!("cannot parse {s:?} as a number"))?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(format!("direction component {s:?} is not finite"))
        }
    };
    Ok((parse(x)?, parse(y)?))
}

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Primary preferred direction for cocircular ties, as `X,Y`.
    #[arg(long = "u", value_parser = parse_direction, default_value = "1,0")]
    u: (f64, f64),

    /// Tie-breaking direction, as `X,Y`.
    #[arg(long = "v", value_parser = parse_direction, default_value = "1,1")]
    v: (f64, f64),

    /// Print predicate-filter and interval statistics to stderr.
    #[arg(long)]
    stats: bool,
}

fn print_stats() {
    let kernel = Kernel::<f64>::statistics();
    let interval = f64::stats();
    eprintln!(
        "orientation: {} calls, {} exact",
        kernel.orientation_total_count, kernel.orientation_exact_count
    );
    eprintln!(
        "side_of_oriented_circle: {} calls, {} exact",
        kernel.side_of_oriented_circle_total_count, kernel.side_of_oriented_circle_exact_count
    );
    eprintln!(
        "preferred_direction: {} calls, {} exact",
        kernel.preferred_direction_total_count, kernel.preferred_direction_exact_count
    );
    eprintln!(
        "interval ops: {}, indeterminate: {}",
        interval.arithmetic_op_count(),
        interval.indeterminate_result_count()
    );
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let directions = PreferredDirections::new(
        Vector2::new(args.u.0, args.u.1),
        Vector2::new(args.v.0, args.v.1),
    )
    .context("invalid preferred directions")?;

    let mut mesh = Triangulation::<f64>::read_off(BufReader::new(io::stdin().lock()))
        .context("reading OFF triangulation from stdin")?;
    let summary = flip_to_pd_delaunay(&mut mesh, &directions);
    tracing::info!(flips = summary.flips, "run complete");

    let mut out = BufWriter::new(io::stdout().lock());
    mesh.write_off(&mut out)
        .context("writing OFF triangulation to stdout")?;
    out.flush().context("flushing stdout")?;

    if args.stats {
        print_stats();
    }
    Ok(())
}
