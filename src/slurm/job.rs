use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Serialize;
use tinytemplate::{format_unescaped, TinyTemplate};

use crate::config::Config;
use crate::error::{JobError, Result};
use crate::prompt::Prompter;
use crate::slurm::job_request::JobRequest;

/// extension of generated batch scripts
static SCRIPT_EXTENSION: &str = "sh";

/// A JobPath is the path to a job script that's submitted to SLURM via sbatch
///
/// The script expects its input file in the same directory and writes the program output there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPath {
    pub path: PathBuf,
}

impl JobRequest {
    /// Render the batch script for this request and write it next to the input file
    ///
    /// An existing script is replaced silently when `config.overwrite` is set, otherwise only
    /// after the user agrees. Declining leaves the old script untouched.
    pub fn create(&self, config: &Config, prompter: &mut Prompter) -> Result<JobPath> {
        let path = self.input.with_extension(SCRIPT_EXTENSION);

        if path.exists() {
            if config.overwrite {
                warn!("{} already exists and will be overwritten", path.display());
            } else {
                let question = format!("{} already exists, overwrite?", path.display());
                if !prompter.confirm(&question)? {
                    return Err(JobError::ConfirmationDeclined(format!(
                        "not overwriting {}",
                        path.display()
                    )));
                }
            }
            fs::remove_file(&path)?;
        }

        let job = JobTemplate {
            header: render_header(self)?,
            workflow: render_workflow(self, config)?,
        };
        info!("Writing batch script {}", path.display());
        job.write(&path)?;

        Ok(JobPath { path })
    }
}

/// All rendered data necessary to submit one job to SLURM
struct JobTemplate {
    header: Header,
    workflow: Workflow,
}

impl JobTemplate {
    /// Write complete job script to disk by appending rendered template sections to the file
    fn write(self, out_path: &Path) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(out_path)?;

        // order is important when writing the file
        let contents = [self.header.content, self.workflow.content];

        for content in contents.iter() {
            file.write_all(content.as_bytes())?;
        }

        Ok(())
    }
}

/// Rendered SBATCH header
///
/// Set from the validated request:
/// - partition and account
/// - task count, always on a single node
/// - wall time (`HH:00:00`)
/// - job name (input file stem)
///
/// Other options are fixed:
/// - no environment export from the submitting shell
/// - scheduler log in `slurm-<jobid>.out`
struct Header {
    content: String,
}

/// Rendered module setup and program invocation
struct Workflow {
    content: String,
}

/// Rendering context for header
#[derive(Serialize)]
struct HeaderContext {
    name: String,
    partition: String,
    account: String,
    cpus: u32,
    time: String,
}

/// Rendering context for workflow
#[derive(Serialize)]
struct WorkflowContext {
    module: String,
    program: String,
    input: String,
    output: String,
}

/// Render the SBATCH header using TinyTemplate
fn render_header(request: &JobRequest) -> Result<Header> {
    /// included header template
    static HEADER: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/header.txt"));
    let mut tt = TinyTemplate::new();
    tt.set_default_formatter(&format_unescaped);
    tt.add_template("header", HEADER)?;

    let resources = &request.resources;
    let context = HeaderContext {
        name: request.stem(),
        partition: resources.partition.to_string(),
        account: resources.account.clone(),
        cpus: request.cpus,
        time: resources.time(),
    };

    Ok(Header { content: tt.render("header", &context)? })
}

/// Render the program invocation using TinyTemplate
///
/// The binary is located with `which` when the job starts, not now.
fn render_workflow(request: &JobRequest, config: &Config) -> Result<Workflow> {
    /// included workflow template
    static WORKFLOW: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/workflow.txt"));
    let mut tt = TinyTemplate::new();
    tt.set_default_formatter(&format_unescaped);
    tt.add_template("workflow", WORKFLOW)?;

    let name = request.stem();
    let context = WorkflowContext {
        module: config.module.clone(),
        program: config.program.clone(),
        input: format!("{name}.{}", config.input_extension),
        output: format!("{name}.{}", config.output_extension),
    };
    Ok(Workflow { content: tt.render("workflow", &context)? })
}

#[cfg(test)]
mod tests {
    use std::io::{sink, Cursor};

    use tempfile::TempDir;

    use super::*;
    use crate::slurm::resource::ResourceRequest;

    fn request(dir: &TempDir) -> JobRequest {
        let input = dir.path().join("benzene.inp");
        fs::write(&input, "! HF\n%pal nprocs 12 end\n%maxcore 2000\n").unwrap();
        let resources = ResourceRequest::validate(Some("5"), Some("bigmem"), Some("chem"), &Config::default()).unwrap();
        JobRequest::inspect(&input, &resources, &Config::default()).unwrap()
    }

    fn answers(text: &str) -> Prompter {
        Prompter::new(Cursor::new(text.to_string()), sink())
    }

    #[test]
    fn renders_full_script() {
        let dir = TempDir::new().unwrap();
        let job = request(&dir).create(&Config::default(), &mut answers("")).unwrap();
        assert_eq!(job.path, dir.path().join("benzene.sh"));
        let expected = "#!/bin/bash
#SBATCH --export=NONE
#SBATCH --partition=bigmem
#SBATCH --account=chem
#SBATCH --ntasks=12
#SBATCH --nodes=1
#SBATCH --time=05:00:00
#SBATCH --job-name=benzene
#SBATCH --output=slurm-%j.out

module purge
module load orca

$(which orca) benzene.inp > benzene.out
";
        assert_eq!(fs::read_to_string(&job.path).unwrap(), expected);
    }

    #[test]
    fn rendering_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let request = request(&dir);
        let config = Config { overwrite: true, ..Config::default() };
        let first = fs::read_to_string(request.create(&config, &mut answers("")).unwrap().path).unwrap();
        let second = fs::read_to_string(request.create(&config, &mut answers("")).unwrap().path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn declined_overwrite_keeps_old_script() {
        let dir = TempDir::new().unwrap();
        let request = request(&dir);
        let script = dir.path().join("benzene.sh");
        fs::write(&script, "#!/bin/bash\necho old\n").unwrap();

        let err = request.create(&Config::default(), &mut answers("maybe\nn\n")).unwrap_err();
        assert!(matches!(err, JobError::ConfirmationDeclined(_)));
        assert_eq!(fs::read_to_string(&script).unwrap(), "#!/bin/bash\necho old\n");
    }

    #[test]
    fn accepted_overwrite_regenerates() {
        let dir = TempDir::new().unwrap();
        let request = request(&dir);
        let script = dir.path().join("benzene.sh");
        fs::write(&script, "echo old\n").unwrap();

        request.create(&Config::default(), &mut answers("y\n")).unwrap();
        let contents = fs::read_to_string(&script).unwrap();
        assert!(contents.starts_with("#!/bin/bash\n"));
        assert!(!contents.contains("echo old"));
    }

    #[test]
    fn configured_overwrite_does_not_ask() {
        let dir = TempDir::new().unwrap();
        let request = request(&dir);
        fs::write(dir.path().join("benzene.sh"), "echo old\n").unwrap();
        let config = Config { overwrite: true, ..Config::default() };
        // no answers available, asking would abort
        assert!(request.create(&config, &mut answers("")).is_ok());
    }
}
