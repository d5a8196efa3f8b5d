use std::path::Path;

use log::info;
use serde::Deserialize;

use crate::error::{JobError, Result};

/// Site defaults, built once in `main` and passed by reference everywhere else
///
/// Every field is optional in the TOML file, missing fields keep the values from `Default`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// wall-clock hours used when none are given on the command line
    pub hours: String,
    pub partition: String,
    pub account: String,
    /// the one account that is only valid on the teaching partition (and vice versa)
    pub teaching_account: String,
    /// environment module loaded in the batch script
    pub module: String,
    /// program binary, located with `which` when the job runs
    pub program: String,
    /// replace existing batch scripts without asking
    pub overwrite: bool,
    /// ask before each submission in single file mode
    pub confirm: bool,
    pub input_extension: String,
    pub output_extension: String,
    pub aggregate_extension: String,
    /// `%maxcore` written into split inputs, in MB
    pub split_memory: u32,
    pub keywords: Keywords,
}

/// Keyword line for each job type the splitter can write
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Keywords {
    pub sp: String,
    pub opt: String,
    pub topt: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            hours: "24".to_string(),
            partition: "standard".to_string(),
            account: "chem".to_string(),
            teaching_account: "teaching".to_string(),
            module: "orca".to_string(),
            program: "orca".to_string(),
            overwrite: false,
            confirm: true,
            input_extension: "inp".to_string(),
            output_extension: "out".to_string(),
            aggregate_extension: "xyz".to_string(),
            split_memory: 3000,
            keywords: Keywords::default(),
        }
    }
}

impl Default for Keywords {
    fn default() -> Self {
        Keywords {
            sp: "! B3LYP D3BJ def2-TZVP".to_string(),
            opt: "! B3LYP D3BJ def2-SVP OPT FREQ".to_string(),
            topt: "! B3LYP D3BJ def2-SVP OptTS FREQ".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        info!("Reading configuration from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|err| JobError::Config(err.to_string()))
    }
}
