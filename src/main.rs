use anyhow::{bail, Result};
use label_sampler::{init_tracing_once, LabelSampler, RunConfig, SplitOutcome};
use std::path::PathBuf;

fn main() -> Result<()> {
    let mut args = std::env::args_os().skip(1);
    let Some(cfg_path) = args.next().map(PathBuf::from) else {
        bail!("usage: label-sampler <run-config.json>");
    };
    init_tracing_once();

    let cfg = RunConfig::load(&cfg_path)?;
    let sampler = LabelSampler::from_options(cfg.to_options());
    let report = sampler.run(&cfg.input, &cfg.output)?;

    for r in &report.splits {
        match &r.outcome {
            SplitOutcome::Sampled { stats, files } => println!(
                "{}: sampled {} -> {} records (target {} x {} classes, {} null, {} exempt) in {} files",
                r.split,
                stats.total_in,
                stats.total_out,
                stats.target_size,
                stats.classes(),
                stats.null,
                stats.exempt,
                files.len()
            ),
            SplitOutcome::Copied { files } => println!("{}: copied {} files", r.split, files),
            SplitOutcome::Omitted => println!("{}: omitted", r.split),
        }
    }
    Ok(())
}
