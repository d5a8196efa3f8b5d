//! `split`: one ORCA job directory per structure of a multi-structure xyz file
//!
//! The aggregate file `<root>.xyz` lives one directory above the working directory. Every
//! record becomes `<root><n>/<root><n>.inp`, ready for `submit dir`.

use std::fs;
use std::io;
use std::path::PathBuf;

use clap::ValueEnum;
use log::info;

use crate::batch::Session;
use crate::config::Config;
use crate::error::{JobError, Result};
use crate::prompt::is_digits;
use crate::slurm::resource::ResourceRequest;
use crate::slurm::submit::Submission;
use crate::WorkingDirectory;

/// Parse the aggregate file and cut it into records
pub mod records;

/// Render per-structure input files
pub mod input;

pub static USAGE: &str = "slurmqc split <root> [sp|opt|topt] [cpus] [charge] [multiplicity]";

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum JobType {
    /// single point
    Sp,
    /// optimisation and frequencies
    Opt,
    /// transition state optimisation and frequencies
    Topt,
}

impl JobType {
    pub fn keywords<'a>(&self, config: &'a Config) -> &'a str {
        match self {
            JobType::Sp => &config.keywords.sp,
            JobType::Opt => &config.keywords.opt,
            JobType::Topt => &config.keywords.topt,
        }
    }
}

/// Validated `split` arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitRequest {
    pub root: String,
    pub job_type: JobType,
    pub cpus: u32,
    pub charge: i32,
    pub multiplicity: u32,
}

impl SplitRequest {
    pub fn validate(
        root: Option<&str>,
        job_type: Option<&str>,
        cpus: Option<&str>,
        charge: Option<&str>,
        multiplicity: Option<&str>,
    ) -> Result<Self> {
        let root = match root {
            Some(root) if !root.is_empty() => root.to_string(),
            _ => return Err(JobError::Usage(USAGE.to_string())),
        };

        let job_type = job_type.unwrap_or("sp");
        let job_type = <JobType as ValueEnum>::from_str(job_type, false).map_err(|_| {
            JobError::InvalidInput(format!("job type '{job_type}' must be one of sp, opt, topt"))
        })?;

        let cpus = positive(cpus.unwrap_or("8"), "cpu count")?;

        let charge = charge.unwrap_or("0");
        let charge = match charge {
            "-2" | "-1" | "0" | "1" | "2" => charge.parse().unwrap_or_default(),
            _ => {
                return Err(JobError::InvalidInput(format!(
                    "charge '{charge}' must be one of -2, -1, 0, 1, 2"
                )))
            }
        };

        let multiplicity = positive(multiplicity.unwrap_or("1"), "multiplicity")?;

        Ok(SplitRequest { root, job_type, cpus, charge, multiplicity })
    }

    /// Split `../<root>.xyz` into job directories and return them in order
    pub fn run(&self, wd: &WorkingDirectory, config: &Config) -> Result<Vec<PathBuf>> {
        let aggregate_path = wd.path.join("..").join(format!("{}.{}", self.root, config.aggregate_extension));
        let aggregate = records::Aggregate::read(&aggregate_path)?;
        info!(
            "{} records of {} atoms in {}",
            aggregate.records(),
            aggregate.atoms,
            aggregate_path.display()
        );

        // nothing is written when any chunk, input or job directory name is already taken
        for name in aggregate.chunk_names(&self.root) {
            let input = format!("{name}.{}", config.input_extension);
            if let Some(taken) = [name, input].iter().map(|n| wd.path.join(n)).find(|p| p.exists()) {
                return Err(JobError::File {
                    path: taken,
                    source: io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        "already exists, remove it to split again",
                    ),
                });
            }
        }

        let mut inputs = Vec::new();
        for chunk in aggregate.write_chunks(&wd.path, &self.root)? {
            inputs.push(input::write_input(&chunk, aggregate.atoms, self, config)?);
        }

        let mut dirs = Vec::with_capacity(inputs.len());
        for inp in inputs {
            let (Some(stem), Some(name)) = (inp.file_stem(), inp.file_name()) else {
                continue;
            };
            let dir = wd.path.join(stem);
            fs::create_dir(&dir).map_err(JobError::file(&dir))?;
            let moved = dir.join(name);
            fs::rename(&inp, &moved).map_err(JobError::file(&moved))?;
            dirs.push(dir);
        }
        println!("created {} job directories", dirs.len());
        Ok(dirs)
    }
}

/// Offer to submit every generated job directory right away
///
/// `hours` skips the wall time question. Each job then goes through single file submission,
/// asking before each one when `config.confirm` is set.
pub fn offer_submission(
    dirs: &[PathBuf],
    hours: Option<&str>,
    session: &mut Session,
) -> Result<Vec<Submission>> {
    if dirs.is_empty() || !session.prompter.confirm(&format!("submit {} jobs now?", dirs.len()))? {
        return Ok(Vec::new());
    }
    let hours = match hours {
        Some(hours) => hours.to_string(),
        None => session.prompter.hours("wall time in hours?")?,
    };
    let resources = ResourceRequest::validate(Some(&hours), None, None, session.config)?;
    println!("{}", resources.summary());

    let mut submissions = Vec::with_capacity(dirs.len());
    for dir in dirs {
        let Some(name) = dir.file_name() else { continue };
        let input = dir.join(format!("{}.{}", name.to_string_lossy(), session.config.input_extension));
        submissions.push(session.submit_file(&input, &resources, session.config.confirm)?);
    }
    Ok(submissions)
}

fn positive(value: &str, what: &str) -> Result<u32> {
    match value.parse::<u32>() {
        Ok(n) if n > 0 && is_digits(value) => Ok(n),
        _ => Err(JobError::InvalidInput(format!("{what} '{value}' must be a positive integer"))),
    }
}
