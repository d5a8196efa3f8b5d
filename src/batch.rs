//! `submit`: pick input files, then validate, render and submit each one

use std::path::{Path, PathBuf};

use log::info;

use crate::config::Config;
use crate::error::{JobError, Result};
use crate::listing::{files_with_extension, subdirectories};
use crate::prompt::Prompter;
use crate::slurm::job_request::JobRequest;
use crate::slurm::resource::ResourceRequest;
use crate::slurm::submit::{submit, Scheduler, Submission};
use crate::WorkingDirectory;

pub static USAGE: &str = "slurmqc submit <input-file>|all|dir|conall|condir [hours] [partition] [account]";

/// Which input files one `submit` invocation covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// a single input file, confirmation as configured
    File(PathBuf),
    /// every input file in the working directory
    All { confirm: bool },
    /// every input file in every subdirectory of the working directory
    Dir { confirm: bool },
}

impl Target {
    pub fn parse(arg: Option<&str>) -> Result<Self> {
        match arg {
            None | Some("") => Err(JobError::Usage(USAGE.to_string())),
            Some("all") => Ok(Target::All { confirm: false }),
            Some("conall") => Ok(Target::All { confirm: true }),
            Some("dir") => Ok(Target::Dir { confirm: false }),
            Some("condir") => Ok(Target::Dir { confirm: true }),
            Some(file) => Ok(Target::File(PathBuf::from(file))),
        }
    }
}

/// Everything a submission needs besides the file itself
pub struct Session<'a> {
    pub config: &'a Config,
    pub scheduler: &'a dyn Scheduler,
    pub prompter: Prompter,
}

impl Session<'_> {
    /// Inspect, render and submit one input file
    pub fn submit_file(
        &mut self,
        input: &Path,
        resources: &ResourceRequest,
        confirm: bool,
    ) -> Result<Submission> {
        let request = JobRequest::inspect(input, resources, self.config)?;
        info!(
            "{}: {} cpus, {} MB per core",
            input.display(),
            request.cpus,
            request.memory_per_core
        );
        let job = request.create(self.config, &mut self.prompter)?;
        submit(&job, confirm, self.scheduler, &mut self.prompter)
    }

    fn submit_all_in(
        &mut self,
        dir: &Path,
        resources: &ResourceRequest,
        confirm: bool,
    ) -> Result<Vec<Submission>> {
        let inputs = files_with_extension(dir, &self.config.input_extension)?;
        info!("{} input files in {}", inputs.len(), dir.display());
        inputs
            .iter()
            .map(|input| self.submit_file(input, resources, confirm))
            .collect()
    }

    /// Submit everything `target` names, stopping at the first failure
    pub fn run(
        &mut self,
        target: &Target,
        wd: &WorkingDirectory,
        resources: &ResourceRequest,
    ) -> Result<Vec<Submission>> {
        match target {
            Target::File(file) => {
                let confirm = self.config.confirm;
                Ok(vec![self.submit_file(&wd.path.join(file), resources, confirm)?])
            }
            Target::All { confirm } => self.submit_all_in(&wd.path, resources, *confirm),
            Target::Dir { confirm } => {
                let mut submissions = Vec::new();
                for dir in subdirectories(&wd.path)? {
                    submissions.extend(self.submit_all_in(&dir, resources, *confirm)?);
                }
                Ok(submissions)
            }
        }
    }
}
