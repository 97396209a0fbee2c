//! Toy place-cell experiment runner.
//!
//! Examples:
//!   placesim-run
//!   placesim-run --seed 7 --figures figures/
//!   placesim-run --undersample --config run.json --out data/under.pcsim
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::path::PathBuf;
use std::process;

use placesim::error::SimError;
use placesim_vis::PlotError;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

mod config;
mod pipeline;

use config::{RunConfig, ZoneConfig};
use pipeline::OutputPaths;

#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Sim(#[from] SimError),

    #[error(transparent)]
    Plot(#[from] PlotError),

    #[error("config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Usage(String),
}

#[derive(Debug, Default)]
struct CliArgs {
    paths: OutputPaths,
    seed: Option<u64>,
    config: Option<PathBuf>,
    undersample: bool,
}

fn usage() -> ! {
    eprintln!("placesim-run (toy place-cell dataset generator)");
    eprintln!("Usage: placesim-run [options]\n");
    eprintln!("Options:");
    eprintln!("  --out PATH          Dataset archive (default data/toy_example.pcsim)");
    eprintln!("  --preview PATH      Population heatmap PNG (default data/preview.png)");
    eprintln!("  --seed N            Seed for the whole run (default 42)");
    eprintln!("  --config FILE.json  Load run parameters from JSON");
    eprintln!("  --figures DIR       Also write every figure into DIR");
    eprintln!("  --undersample       Use the last-zone undersampling trajectory");
    process::exit(1);
}

fn parse_args<I>(args: I) -> Result<CliArgs, RunError>
where
    I: IntoIterator<Item = String>,
{
    let mut out = CliArgs::default();
    let mut args = args.into_iter();

    while let Some(flag) = args.next() {
        let mut value = |name: &str| {
            args.next()
                .ok_or_else(|| RunError::Usage(format!("{name} expects a value")))
        };
        match flag.as_str() {
            "--out" => out.paths.dataset = PathBuf::from(value("--out")?),
            "--preview" => out.paths.preview = PathBuf::from(value("--preview")?),
            "--figures" => out.paths.figures = Some(PathBuf::from(value("--figures")?)),
            "--config" => out.config = Some(PathBuf::from(value("--config")?)),
            "--seed" => {
                let raw = value("--seed")?;
                let seed = raw
                    .parse::<u64>()
                    .map_err(|_| RunError::Usage(format!("--seed: not an integer: {raw}")))?;
                out.seed = Some(seed);
            }
            "--undersample" => out.undersample = true,
            "-h" | "--help" => usage(),
            other => return Err(RunError::Usage(format!("unknown argument: {other}"))),
        }
    }
    Ok(out)
}

fn resolve_config(args: &CliArgs) -> Result<RunConfig, RunError> {
    let mut cfg = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    if let Some(seed) = args.seed {
        cfg = cfg.with_seed(seed);
    }
    if args.undersample && cfg.undersampling.is_none() {
        cfg.undersampling = Some(ZoneConfig::default());
    }
    Ok(cfg)
}

fn run(args: CliArgs) -> Result<(), RunError> {
    let cfg = resolve_config(&args)?;
    tracing::info!(
        seed = cfg.trajectory.seed,
        duration_s = cfg.trajectory.duration_s,
        undersampled = cfg.undersampling.is_some(),
        "starting run"
    );

    let sim = pipeline::simulate(&cfg)?;
    pipeline::write_outputs(&sim, &cfg, &args.paths)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            usage();
        }
    };

    if let Err(e) = run(args) {
        tracing::error!(error = %e, "run failed");
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_arguments_give_defaults() {
        let parsed = parse_args(args(&[])).unwrap();
        assert_eq!(parsed.paths.dataset, PathBuf::from("data/toy_example.pcsim"));
        assert_eq!(parsed.paths.preview, PathBuf::from("data/preview.png"));
        assert!(parsed.paths.figures.is_none());
        assert!(parsed.seed.is_none());
        assert!(!parsed.undersample);

        let cfg = resolve_config(&parsed).unwrap();
        assert_eq!(cfg.trajectory.seed, 42);
        assert!(cfg.undersampling.is_none());
    }

    #[test]
    fn flags_are_applied() {
        let parsed = parse_args(args(&[
            "--out",
            "o.pcsim",
            "--preview",
            "p.png",
            "--seed",
            "7",
            "--figures",
            "figs",
            "--undersample",
        ]))
        .unwrap();
        assert_eq!(parsed.paths.dataset, PathBuf::from("o.pcsim"));
        assert_eq!(parsed.paths.preview, PathBuf::from("p.png"));
        assert_eq!(parsed.paths.figures, Some(PathBuf::from("figs")));

        let cfg = resolve_config(&parsed).unwrap();
        assert_eq!(cfg.trajectory.seed, 7);
        assert_eq!(cfg.undersampling, Some(ZoneConfig::default()));
    }

    #[test]
    fn bad_arguments_are_usage_errors() {
        assert!(matches!(
            parse_args(args(&["--seed", "abc"])),
            Err(RunError::Usage(_))
        ));
        assert!(matches!(parse_args(args(&["--out"])), Err(RunError::Usage(_))));
        assert!(matches!(
            parse_args(args(&["--frobnicate"])),
            Err(RunError::Usage(_))
        ));
    }

    #[test]
    fn missing_config_file_is_io_error() {
        let parsed = parse_args(args(&["--config", "/nonexistent/placesim/run.json"])).unwrap();
        assert!(matches!(resolve_config(&parsed), Err(RunError::Io(_))));
    }
}
