use std::fmt;

use clap::ValueEnum;

use crate::error::{JobError, Result};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum Partition {
    Standard,
    Bigmem,
    Teaching,
}

/// Resource ceilings of one partition
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Limits {
    pub max_cpus: u32,
    pub max_hours: u32,
    /// MB per core
    pub max_memory: u32,
}

impl Partition {
    /// Look up a partition by its scheduler name
    pub fn parse(name: &str) -> Result<Self> {
        <Partition as ValueEnum>::from_str(name, false).map_err(|_| {
            JobError::InvalidInput(format!(
                "unknown partition '{name}', expected one of standard, bigmem, teaching"
            ))
        })
    }

    pub fn limits(&self) -> Limits {
        match self {
            Partition::Standard => Limits { max_cpus: 40, max_hours: 48, max_memory: 4000 },
            Partition::Bigmem => Limits { max_cpus: 40, max_hours: 48, max_memory: 16000 },
            Partition::Teaching => Limits { max_cpus: 8, max_hours: 2, max_memory: 2000 },
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Partition::Standard => write!(f, "standard"),
            Partition::Bigmem => write!(f, "bigmem"),
            Partition::Teaching => write!(f, "teaching"),
        }
    }
}
