use std::path::Path;
use std::process::Command;

use log::{info, warn};

use crate::error::Result;
use crate::prompt::Prompter;
use crate::slurm::job::JobPath;

/// Something that accepts batch scripts
pub trait Scheduler {
    /// Submit a script and return whatever the scheduler printed
    fn submit(&self, script: &Path) -> Result<String>;
}

/// Submission through the `sbatch` command
pub struct Sbatch {
    command: String,
}

impl Default for Sbatch {
    fn default() -> Self {
        Sbatch { command: "sbatch".to_string() }
    }
}

impl Scheduler for Sbatch {
    /// Runs in the script's directory so relative paths in the script resolve next to it.
    /// A non-zero exit status is reported but not treated as an error.
    fn submit(&self, script: &Path) -> Result<String> {
        let wd = match script.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let file_name = script.file_name().unwrap_or(script.as_os_str());

        let mut sbatch = Command::new(&self.command);
        let cmd = sbatch.arg(file_name).current_dir(wd);
        info!("Running sbatch process ");
        info!("{:?}", &cmd);
        let output = cmd.output()?;

        if !output.status.success() {
            warn!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        let mut reply = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if reply.is_empty() {
            reply = String::from_utf8_lossy(&output.stderr).trim().to_string();
        }
        Ok(reply)
    }
}

/// What happened to a generated script
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// handed to the scheduler, with its reply
    Submitted(String),
    /// the user answered no
    Skipped,
}

/// Hand a script to the scheduler, asking first when `confirm` is set
pub fn submit(
    job: &JobPath,
    confirm: bool,
    scheduler: &dyn Scheduler,
    prompter: &mut Prompter,
) -> Result<Submission> {
    if confirm {
        let question = format!("submit {}?", job.path.display());
        if !prompter.confirm(&question)? {
            info!("Skipping {}", job.path.display());
            println!("not submitted: {}", job.path.display());
            return Ok(Submission::Skipped);
        }
    }
    let reply = scheduler.submit(&job.path)?;
    info!("SLURM reply: {reply}");
    println!("{}: {reply}", job.path.display());
    Ok(Submission::Submitted(reply))
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;
    use std::io::{sink, Cursor};
    use std::path::PathBuf;

    use super::*;

    /// Records submitted scripts instead of talking to SLURM
    #[derive(Default)]
    pub(crate) struct RecordingScheduler {
        pub(crate) submitted: RefCell<Vec<PathBuf>>,
    }

    impl Scheduler for RecordingScheduler {
        fn submit(&self, script: &Path) -> Result<String> {
            let mut submitted = self.submitted.borrow_mut();
            submitted.push(script.to_path_buf());
            Ok(format!("Submitted batch job {}", 1000 + submitted.len()))
        }
    }

    fn job() -> JobPath {
        JobPath { path: PathBuf::from("/scratch/water/water.sh") }
    }

    fn answers(text: &str) -> Prompter {
        Prompter::new(Cursor::new(text.to_string()), sink())
    }

    #[test]
    fn submits_without_asking() {
        let scheduler = RecordingScheduler::default();
        let got = submit(&job(), false, &scheduler, &mut answers("")).unwrap();
        assert_eq!(got, Submission::Submitted("Submitted batch job 1001".to_string()));
        assert_eq!(*scheduler.submitted.borrow(), vec![job().path]);
    }

    #[test]
    fn confirmed_submission() {
        let scheduler = RecordingScheduler::default();
        let got = submit(&job(), true, &scheduler, &mut answers("huh\ny\n")).unwrap();
        assert!(matches!(got, Submission::Submitted(_)));
        assert_eq!(scheduler.submitted.borrow().len(), 1);
    }

    #[test]
    fn declined_submission_is_skipped() {
        let scheduler = RecordingScheduler::default();
        let got = submit(&job(), true, &scheduler, &mut answers("no\n")).unwrap();
        assert_eq!(got, Submission::Skipped);
        assert!(scheduler.submitted.borrow().is_empty());
    }

    #[test]
    fn missing_sbatch_binary_is_an_error() {
        let scheduler = Sbatch { command: "/nonexistent/sbatch".to_string() };
        assert!(scheduler.submit(Path::new("job.sh")).is_err());
    }
}
