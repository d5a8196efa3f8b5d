//! `parse`: classify ORCA output files and pull out their final energies
//!
//! Classification is an ordered list of rules, the first rule whose marker appears in the file
//! decides the job type and which energy lines are reported. Files matching no rule, such as
//! SLURM logs, are skipped without complaint.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;

use crate::config::Config;
use crate::error::{JobError, Result};
use crate::listing::{files_with_extension, subdirectories};
use crate::WorkingDirectory;

/// files whose name contains this are isolated atom references, not jobs
static ATOM_FILTER: &str = "atom";

static RULES: &[Rule] = &[
    Rule {
        marker: "* Single Point Calculation *",
        job_type: JobType::SinglePoint,
        energies: &[("electronic energy", "FINAL SINGLE POINT ENERGY")],
    },
    Rule {
        marker: "* Geometry Optimization Run *",
        job_type: JobType::Optimization,
        energies: &[
            ("gibbs free energy", "Final Gibbs free energy"),
            ("G-E(el)", "G-E(el)"),
        ],
    },
];

struct Rule {
    marker: &'static str,
    job_type: JobType,
    /// (label, marker) of each energy line to report
    energies: &'static [(&'static str, &'static str)],
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    SinglePoint,
    Optimization,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Energy {
    pub label: &'static str,
    /// Hartree, when the line holds a number after its marker
    pub value: Option<f64>,
    pub line: String,
}

/// What one output file says about its job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    pub file_name: String,
    pub job_type: JobType,
    pub energies: Vec<Energy>,
}

impl ResultRecord {
    pub fn read(path: &Path, name: String) -> Result<Self> {
        let contents = fs::read(path)?;
        Ok(Self::classify(name, &String::from_utf8_lossy(&contents)))
    }

    pub fn classify(file_name: String, contents: &str) -> Self {
        let Some(rule) = RULES.iter().find(|rule| contents.contains(rule.marker)) else {
            return ResultRecord { file_name, job_type: JobType::Unknown, energies: Vec::new() };
        };
        let energies = rule
            .energies
            .iter()
            .filter_map(|&(label, marker)| {
                // the last occurrence is the converged value
                let line = contents.lines().filter(|line| line.contains(marker)).last()?;
                Some(Energy { label, value: number_after(line, marker), line: line.trim().to_string() })
            })
            .collect();
        ResultRecord { file_name, job_type: rule.job_type, energies }
    }

    /// Multi-line report for a single named file, empty for unclassified files
    pub fn verbose(&self) -> String {
        let mut out = format!("{}\n", self.file_name);
        match self.job_type {
            JobType::SinglePoint => out += "single point calculation\n",
            JobType::Optimization => out += "geometry optimisation with frequencies\n",
            JobType::Unknown => return String::new(),
        }
        for energy in &self.energies {
            out += &format!("  {}\n", energy.line);
        }
        out
    }

    /// One line for directory listings, None for unclassified files
    pub fn condensed(&self) -> Option<String> {
        if self.job_type == JobType::Unknown {
            return None;
        }
        let lines: Vec<&str> = self.energies.iter().map(|e| e.line.as_str()).collect();
        Some(format!("{}  {}", self.file_name, lines.join("  ")))
    }
}

fn number_after(line: &str, marker: &str) -> Option<f64> {
    let (_, rest) = line.split_once(marker)?;
    rest.split_whitespace().find_map(|token| token.parse::<f64>().ok())
}

/// Which output files one `parse` invocation reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    File(PathBuf),
    /// every output file in the working directory
    Here,
    /// every output file in every subdirectory
    Dir,
}

impl Target {
    pub fn parse(arg: Option<&str>) -> Self {
        match arg {
            None => Target::Here,
            Some("dir") => Target::Dir,
            Some(file) => Target::File(PathBuf::from(file)),
        }
    }
}

/// Read every output file `target` names
///
/// Directory modes leave out unclassified files and names containing "atom".
pub fn collect(target: &Target, wd: &WorkingDirectory, config: &Config) -> Result<Vec<ResultRecord>> {
    match target {
        Target::File(file) => {
            let path = wd.path.join(file);
            if !path.is_file() {
                return Err(JobError::NotFound(path));
            }
            let record = ResultRecord::read(&path, file.display().to_string())?;
            if record.job_type == JobType::Unknown {
                info!("No job type marker in {}", path.display());
            }
            Ok(vec![record])
        }
        Target::Here => collect_dir(&wd.path, &wd.path, config),
        Target::Dir => {
            let mut records = Vec::new();
            for dir in subdirectories(&wd.path)? {
                records.extend(collect_dir(&dir, &wd.path, config)?);
            }
            Ok(records)
        }
    }
}

fn collect_dir(dir: &Path, root: &Path, config: &Config) -> Result<Vec<ResultRecord>> {
    let mut records = Vec::new();
    for path in files_with_extension(dir, &config.output_extension)? {
        let skip = path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().contains(ATOM_FILTER));
        if skip {
            info!("Skipping atom reference {}", path.display());
            continue;
        }
        let name = path.strip_prefix(root).unwrap_or(&path).display().to_string();
        let record = ResultRecord::read(&path, name)?;
        if record.job_type == JobType::Unknown {
            info!("No job type marker in {}", path.display());
            continue;
        }
        records.push(record);
    }
    Ok(records)
}

/// Text (or JSON) for the collected records
pub fn report(target: &Target, records: &[ResultRecord], json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(records)? + "\n");
    }
    let text = match target {
        Target::File(_) => records.iter().map(ResultRecord::verbose).collect(),
        Target::Here | Target::Dir => records
            .iter()
            .filter_map(ResultRecord::condensed)
            .map(|line| line + "\n")
            .collect(),
    };
    Ok(text)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    static SINGLE_POINT: &str = "
                       ****************************
                       * Single Point Calculation *
                       ****************************
Total Energy       :          -76.32660461 Eh
-------------------------   --------------------
FINAL SINGLE POINT ENERGY       -76.326604613293
-------------------------   --------------------
";

    static OPTIMIZATION: &str = "
                       *****************************
                       * Geometry Optimization Run *
                       *****************************
FINAL SINGLE POINT ENERGY       -76.320000000000
FINAL SINGLE POINT ENERGY       -76.326604613293
G-E(el)                           ...      0.00252717 Eh      1.59 kcal/mol
Final Gibbs free energy         ...    -76.32407744 Eh
";

    static SLURM_LOG: &str = "srun: job 1234 queued and waiting for resources\n";

    #[test]
    fn single_point_has_one_energy() {
        let got = ResultRecord::classify("h2o.out".to_string(), SINGLE_POINT);
        assert_eq!(got.job_type, JobType::SinglePoint);
        assert_eq!(got.energies.len(), 1);
        assert_eq!(got.energies[0].line, "FINAL SINGLE POINT ENERGY       -76.326604613293");
        assert_eq!(got.energies[0].value, Some(-76.326604613293));
    }

    #[test]
    fn optimization_has_gibbs_and_correction() {
        let got = ResultRecord::classify("h2o.out".to_string(), OPTIMIZATION);
        assert_eq!(got.job_type, JobType::Optimization);
        let labels: Vec<&str> = got.energies.iter().map(|e| e.label).collect();
        assert_eq!(labels, ["gibbs free energy", "G-E(el)"]);
        assert_eq!(got.energies[0].value, Some(-76.32407744));
        assert_eq!(got.energies[1].value, Some(0.00252717));
    }

    #[test]
    fn unmarked_file_is_unknown_and_silent() {
        let got = ResultRecord::classify("slurm-1234.out".to_string(), SLURM_LOG);
        assert_eq!(got.job_type, JobType::Unknown);
        assert!(got.energies.is_empty());
        assert_eq!(got.condensed(), None);
    }

    #[test]
    fn first_matching_rule_wins() {
        let both = format!("{SINGLE_POINT}{OPTIMIZATION}");
        assert_eq!(ResultRecord::classify("x".to_string(), &both).job_type, JobType::SinglePoint);
    }

    #[test]
    fn condensed_line() {
        let got = ResultRecord::classify("h2o.out".to_string(), OPTIMIZATION);
        assert_eq!(
            got.condensed().unwrap(),
            "h2o.out  Final Gibbs free energy         ...    -76.32407744 Eh  \
             G-E(el)                           ...      0.00252717 Eh      1.59 kcal/mol"
        );
    }

    fn workspace() -> (TempDir, WorkingDirectory) {
        let tmp = TempDir::new().unwrap();
        let wd = WorkingDirectory { path: tmp.path().to_path_buf() };
        fs::write(tmp.path().join("b_opt.out"), OPTIMIZATION).unwrap();
        fs::write(tmp.path().join("a_sp.out"), SINGLE_POINT).unwrap();
        fs::write(tmp.path().join("slurm-99.out"), SLURM_LOG).unwrap();
        fs::write(tmp.path().join("h_atom.out"), SINGLE_POINT).unwrap();
        fs::write(tmp.path().join("a_sp.inp"), "! HF\n").unwrap();
        (tmp, wd)
    }

    #[test]
    fn directory_mode_skips_atoms_and_logs() {
        let (_tmp, wd) = workspace();
        let records = collect(&Target::Here, &wd, &Config::default()).unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, ["a_sp.out", "b_opt.out"]);
        let text = report(&Target::Here, &records, false).unwrap();
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn subdirectory_mode() {
        let (tmp, wd) = workspace();
        fs::create_dir(tmp.path().join("conf1")).unwrap();
        fs::write(tmp.path().join("conf1/conf1.out"), SINGLE_POINT).unwrap();
        let records = collect(&Target::Dir, &wd, &Config::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].file_name, Path::new("conf1").join("conf1.out").display().to_string());
    }

    #[test]
    fn named_file_is_verbose() {
        let (_tmp, wd) = workspace();
        let target = Target::parse(Some("a_sp.out"));
        let records = collect(&target, &wd, &Config::default()).unwrap();
        let text = report(&target, &records, false).unwrap();
        assert_eq!(
            text,
            "a_sp.out\nsingle point calculation\n  FINAL SINGLE POINT ENERGY       -76.326604613293\n"
        );
    }

    #[test]
    fn named_unknown_file_prints_nothing() {
        let (_tmp, wd) = workspace();
        let target = Target::parse(Some("slurm-99.out"));
        let records = collect(&target, &wd, &Config::default()).unwrap();
        assert_eq!(records[0].job_type, JobType::Unknown);
        assert_eq!(report(&target, &records, false).unwrap(), "");
    }

    #[test]
    fn named_missing_file() {
        let (_tmp, wd) = workspace();
        let got = collect(&Target::parse(Some("gone.out")), &wd, &Config::default());
        assert!(matches!(got, Err(JobError::NotFound(_))));
    }

    #[test]
    fn json_failures_are_not_input_errors() {
        let err: JobError = serde_json::from_str::<u8>("x").unwrap_err().into();
        assert!(matches!(err, JobError::Json(_)));
        assert!(err.to_string().starts_with("serialising records"));
    }

    #[test]
    fn json_report() {
        let records = vec![ResultRecord::classify("h2o.out".to_string(), SINGLE_POINT)];
        let json = report(&Target::Here, &records, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["job_type"], "single_point");
        assert_eq!(value[0]["energies"][0]["value"], -76.326604613293);
    }
}
