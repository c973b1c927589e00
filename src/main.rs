//! benchplot - renders the paper's benchmark figures from raw result files.
//!
//! Each invocation reads one experiment directory, aggregates the per-system
//! series it needs and writes one SVG figure.

mod aggregate;
mod chart;
mod dataset;
mod error;
mod figures;
mod logging;
mod parser;
mod plot;
mod series;

use anyhow::{Context, Result};
use clap::Parser;
use figures::FigureKind;
use log::info;
use logging::SeriesLogger;
use std::path::PathBuf;

/// Benchmark figure generator
#[derive(Parser, Debug)]
#[command(name = "benchplot")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Figure to render
    #[arg(value_enum)]
    figure: FigureKind,

    /// Output SVG path (default: the figure's file name in the current directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Experiment directory, overriding the figure's default under --results-dir
    #[arg(short, long)]
    experiment: Option<PathBuf>,

    /// Root directory holding all experiment results
    #[arg(long, env = "BENCHPLOT_RESULTS", default_value = "paper_results")]
    results_dir: PathBuf,

    /// Also write every aggregated series of the experiment as JSON Lines
    #[arg(long)]
    dump_series: Option<PathBuf>,

    /// Log parsed series at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);
    run(&args)
}

/// Load, render, then write; nothing is written unless the render succeeds
fn run(args: &Args) -> Result<()> {
    let figure = args.figure.figure();
    let dir = args
        .experiment
        .clone()
        .unwrap_or_else(|| args.results_dir.join(figure.experiment));
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(figure.default_output));

    info!("Loading {} results from: {}", figure.name, dir.display());
    let data = figure
        .load(&dir)
        .with_context(|| format!("Failed to aggregate results for {}", figure.name))?;
    let panels = figure.panels(&data)?;
    let svg = plot::render_to_string(&figure.chart, &panels)
        .with_context(|| format!("Failed to render {}", figure.name))?;

    if let Some(ref dump_path) = args.dump_series {
        let mut logger = SeriesLogger::new(dump_path)?;
        for (source, all) in figure.sources.iter().zip(&data) {
            // Every metric of the kind, not only the plotted one
            for metric in source.kind.y {
                if let Some(collection) = all.get(metric.name) {
                    logger.log(figure.name, &source.kind, metric, collection)?;
                }
            }
        }
        logger.flush()?;
        info!("Dumped {} series to: {}", logger.records_written(), dump_path.display());
    }

    plot::write_svg(&output, &svg)?;
    info!("Generated {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::ffi::OsStr;
    use std::fs;
    use std::path::Path;

    fn memcached_args(root: &Path) -> Args {
        let results = root.join("results");
        let output = root.join("out").join("memcached.svg");
        let dump = root.join("series.jsonl");
        Args::try_parse_from([
            OsStr::new("benchplot"),
            OsStr::new("memcached"),
            OsStr::new("--results-dir"),
            results.as_os_str(),
            OsStr::new("-o"),
            output.as_os_str(),
            OsStr::new("--dump-series"),
            dump.as_os_str(),
        ])
        .unwrap()
    }

    fn write_result(root: &Path, system: &str) {
        let dir = root.join("results").join("memcached").join("USR");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(system), "1, 2, 1000000, 40, 10, 250\n").unwrap();
    }

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_figure_names() {
        let args =
            Args::try_parse_from(["benchplot", "schbench-policies", "-o", "out.svg", "-v"])
                .unwrap();
        assert_eq!(args.figure, FigureKind::SchbenchPolicies);
        assert_eq!(args.output, Some(PathBuf::from("out.svg")));
        assert!(args.verbose);
        assert!(Args::try_parse_from(["benchplot", "latency"]).is_err());
    }

    #[test]
    fn failed_render_writes_neither_dump_nor_chart() {
        let root = tempfile::tempdir().unwrap();
        write_result(root.path(), "shenango");

        let args = memcached_args(root.path());
        assert!(run(&args).is_err());
        assert!(!root.path().join("series.jsonl").exists());
        assert!(!root.path().join("out").join("memcached.svg").exists());
    }

    #[test]
    fn dump_and_chart_follow_a_successful_render() {
        let root = tempfile::tempdir().unwrap();
        write_result(root.path(), "shenango");
        write_result(root.path(), "skyloft");

        run(&memcached_args(root.path())).unwrap();
        let dump = fs::read_to_string(root.path().join("series.jsonl")).unwrap();
        assert_eq!(dump.lines().count(), 2);
        assert!(dump.contains("\"kind\":\"memcached\""));
        assert!(root.path().join("out").join("memcached.svg").exists());
    }
}
