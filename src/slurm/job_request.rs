use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::config::Config;
use crate::error::{JobError, Result};
use crate::slurm::resource::ResourceRequest;

/// processor count directive, `%pal nprocs N end`
static NPROCS: &str = "nprocs";
/// per core memory directive in MB, `%maxcore N`
static MAXCORE: &str = "%maxcore";

/// One input file together with the resources it asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub input: PathBuf,
    pub cpus: u32,
    pub memory_per_core: u32,
    pub resources: ResourceRequest,
}

impl JobRequest {
    /// Read the CPU and memory directives of an input file and check them against the partition
    pub fn inspect(input: &Path, resources: &ResourceRequest, config: &Config) -> Result<Self> {
        if !input.is_file() {
            return Err(JobError::NotFound(input.to_path_buf()));
        }
        let extension = input.extension().and_then(|e| e.to_str()).unwrap_or_default();
        if extension != config.input_extension {
            return Err(JobError::InvalidFormat(format!(
                "{} is not a .{} input file",
                input.display(),
                config.input_extension
            )));
        }

        info!("Inspecting {}", input.display());
        let contents = fs::read_to_string(input)?;
        let limits = resources.limits();

        let cpus = directive_value(&contents, NPROCS).ok_or_else(|| missing(input, NPROCS))?;
        let cpus = cpus
            .parse::<u32>()
            .ok()
            .filter(|&n| n > 0 && n <= limits.max_cpus)
            .ok_or_else(|| {
                JobError::ResourceExceeded(format!(
                    "{}: {cpus} cpus requested, partition {} allows 1 to {}",
                    input.display(),
                    resources.partition,
                    limits.max_cpus
                ))
            })?;

        let memory = directive_value(&contents, MAXCORE).ok_or_else(|| missing(input, MAXCORE))?;
        let memory_per_core = memory
            .parse::<u32>()
            .ok()
            .filter(|&n| n <= limits.max_memory)
            .ok_or_else(|| {
                JobError::ResourceExceeded(format!(
                    "{}: {memory} MB per core requested, partition {} allows {} MB",
                    input.display(),
                    resources.partition,
                    limits.max_memory
                ))
            })?;

        Ok(JobRequest {
            input: input.to_path_buf(),
            cpus,
            memory_per_core,
            resources: resources.clone(),
        })
    }

    /// Input file name without directory or extension, used for the job name and derived files
    pub fn stem(&self) -> String {
        self.input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Every digit on the first line mentioning `directive`, concatenated
///
/// Separators are not respected: `nprocs 1 6` reads as 16.
fn directive_value(contents: &str, directive: &str) -> Option<String> {
    let line = contents
        .lines()
        .find(|line| line.to_ascii_lowercase().contains(directive))?;
    let digits: String = line.chars().filter(char::is_ascii_digit).collect();
    (!digits.is_empty()).then_some(digits)
}

fn missing(input: &Path, field: &'static str) -> JobError {
    JobError::MissingField { path: input.to_path_buf(), field }
}
