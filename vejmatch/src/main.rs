mod error;
mod input;
mod report;

use std::{fs, path::PathBuf, process::ExitCode};

use clap::Parser;
use log::{error, info};
use rusty_match::{
    apply_assignments, drop_none, AttributeAggregator, GridPartition, MatchConf, MatchPlan,
    Source, Stage, TargetFilter, Value,
};

use error::CliError;
use input::load_network;
use report::Report;

/// Match a reference road network onto a target network and carry one of
/// its attributes over.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Reference network, a JSON feature file
    #[arg(long, env = "VEJMATCH_REFERENCE")]
    reference: PathBuf,

    /// Target network, a JSON feature file
    #[arg(long, env = "VEJMATCH_TARGET")]
    target: PathBuf,

    /// Reference attribute to carry over
    #[arg(long, env = "VEJMATCH_ATTRIBUTE")]
    attribute: String,

    /// JSON file with matching thresholds
    #[arg(long, env = "VEJMATCH_CONF")]
    conf: Option<PathBuf>,

    /// Cut both networks into segments of this length (m)
    #[arg(long, env = "VEJMATCH_SEGMENT_LENGTH")]
    segment_length: Option<f64>,

    /// Number of passes spent on remainders of partial matches
    #[arg(long, env = "VEJMATCH_MAX_PASSES")]
    max_passes: Option<usize>,

    /// Match in square cells of this size (m)
    #[arg(long, env = "VEJMATCH_GRID")]
    grid: Option<f64>,

    /// Match against target edges with this attribute first, e.g. highway=cycleway
    #[arg(long, env = "VEJMATCH_FIRST_STAGE")]
    first_stage: Option<String>,

    /// Leave out target edges that resolved to none
    #[arg(long, env = "VEJMATCH_DROP_NONE")]
    drop_none: bool,

    /// Where to write the JSON report
    #[arg(long, short, env = "VEJMATCH_OUTPUT")]
    output: PathBuf,

    #[arg(long, short)]
    verbose: bool,
}

fn load_conf(args: &Args) -> Result<MatchConf, CliError> {
    let mut conf = match &args.conf {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|source| CliError::Read {
                path: path.clone(),
                source,
            })?;
            MatchConf::from_json(&text)?
        }
        None => MatchConf::new(args.max_passes.ok_or(CliError::MissingMaxPasses)?),
    };

    if let Some(max_passes) = args.max_passes {
        conf.max_passes = max_passes;
    }
    if let Some(length) = args.segment_length {
        conf.segment_length = Some(length);
    }
    conf.validate()?;
    Ok(conf)
}

fn stages(first_stage: Option<&str>) -> Result<Vec<Stage>, CliError> {
    let Some(filter) = first_stage else {
        return Ok(vec![Stage::all()]);
    };
    let Some((name, value)) = filter.split_once('=') else {
        return Err(CliError::BadStage(filter.to_owned()));
    };

    let value = Value::from(value);
    Ok(vec![
        Stage::new(
            filter,
            TargetFilter::AttributeEquals(name.to_owned(), value.clone()),
        ),
        Stage::new(
            "rest",
            TargetFilter::AttributeNotEquals(name.to_owned(), value),
        ),
    ])
}

fn run(args: &Args) -> Result<(), CliError> {
    let conf = load_conf(args)?;
    let reference = load_network(&args.reference, Source::Reference)?;
    let mut target = load_network(&args.target, Source::Target)?;

    let mut plan = MatchPlan::new(conf).with_stages(stages(args.first_stage.as_deref())?);
    if let Some(cell_size) = args.grid {
        let overlap = plan.conf.buffer_distance;
        plan = plan.with_grid(GridPartition::new(cell_size, overlap));
    }

    let result = plan.run(&reference, &target)?;

    let mut assignments =
        AttributeAggregator::new(&reference, &result, &args.attribute).resolve(&result.outcome.matches);
    if args.drop_none {
        assignments = drop_none(assignments);
    }
    let updated = apply_assignments(&mut target, &args.attribute, &assignments);
    info!("{} set on {updated} target edges", args.attribute);

    let report = Report::new(
        target.crs.to_string(),
        args.attribute.clone(),
        &result,
        assignments,
    );
    info!("{}", report.summary);

    let json = serde_json::to_string_pretty(&report)?;
    fs::write(&args.output, json).map_err(|source| CliError::Write {
        path: args.output.clone(),
        source,
    })?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
