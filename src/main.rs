use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use crate::batch::Session;
use crate::config::Config;
use crate::prompt::Prompter;
use crate::slurm::resource::ResourceRequest;
use crate::slurm::submit::Sbatch;
use crate::split::SplitRequest;

mod batch;
mod config;
mod error;
mod listing;
mod parse;
mod prompt;
mod slurm;
mod split;

/// Directory the command works in, normally the current directory
pub struct WorkingDirectory {
    pub path: PathBuf,
}

impl WorkingDirectory {
    fn current() -> std::io::Result<Self> {
        Ok(WorkingDirectory { path: env::current_dir()? })
    }
}

/// Prepare, submit and post-process ORCA jobs on a SLURM cluster
#[derive(Parser)]
#[command(name = "slurmqc", version)]
struct Cli {
    /// TOML file overriding the built-in defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Answer yes to every yes/no question
    #[arg(short, long, global = true)]
    yes: bool,

    /// Replace existing batch scripts without asking
    #[arg(long, global = true)]
    overwrite: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate resources, write batch scripts and submit them
    Submit {
        /// an input file, or all | conall | dir | condir
        target: Option<String>,
        /// wall time in whole hours
        hours: Option<String>,
        /// standard | bigmem | teaching
        partition: Option<String>,
        account: Option<String>,
    },
    /// Split ../<root>.xyz into one job directory per structure
    #[command(allow_negative_numbers = true)]
    Split {
        root: Option<String>,
        /// sp | opt | topt
        job_type: Option<String>,
        cpus: Option<String>,
        /// -2 to 2
        charge: Option<String>,
        multiplicity: Option<String>,
        /// wall time for the follow-up submission, asked for when missing
        #[arg(long)]
        hours: Option<String>,
    },
    /// Print energies from output files: one file, the current directory, or `dir` for subdirectories
    Parse {
        target: Option<String>,
        /// print records as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // --help and --version are not failures
            return if err.use_stderr() { ExitCode::FAILURE } else { ExitCode::SUCCESS };
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };
    config.overwrite |= cli.overwrite;
    let config = config;

    let wd = WorkingDirectory::current().context("reading the current directory")?;
    info!("Working in {}", wd.path.display());
    let scheduler = Sbatch::default();
    let mut session = Session {
        config: &config,
        scheduler: &scheduler,
        prompter: Prompter::stdio().assume_yes(cli.yes),
    };

    match cli.command {
        Command::Submit { target, hours, partition, account } => {
            let target = batch::Target::parse(target.as_deref())?;
            let resources = ResourceRequest::validate(
                hours.as_deref(),
                partition.as_deref(),
                account.as_deref(),
                &config,
            )?;
            println!("{}", resources.summary());
            let submissions = session.run(&target, &wd, &resources)?;
            info!("{} scripts handled", submissions.len());
        }
        Command::Split { root, job_type, cpus, charge, multiplicity, hours } => {
            let request = SplitRequest::validate(
                root.as_deref(),
                job_type.as_deref(),
                cpus.as_deref(),
                charge.as_deref(),
                multiplicity.as_deref(),
            )?;
            let dirs = request.run(&wd, &config)?;
            split::offer_submission(&dirs, hours.as_deref(), &mut session)?;
        }
        Command::Parse { target, json } => {
            let target = parse::Target::parse(target.as_deref());
            let records = parse::collect(&target, &wd, &config)?;
            print!("{}", parse::report(&target, &records, json)?);
        }
    }
    Ok(())
}
