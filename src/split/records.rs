use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::error::{JobError, Result};

/// Largest number of records one aggregate file may hold, bounded by the 4 digit suffix
pub const MAX_RECORDS: usize = 9999;

/// A multi-structure xyz file: every record is an atom count line, a comment line and one line
/// per atom
#[derive(Debug)]
pub struct Aggregate {
    /// lines including their terminators, so chunks reproduce the file byte for byte
    lines: Vec<String>,
    pub atoms: usize,
}

impl Aggregate {
    pub fn read(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(JobError::NotFound(path.to_path_buf()));
        }
        info!("Reading structures from {}", path.display());
        Self::parse(path, &fs::read_to_string(path)?)
    }

    fn parse(path: &Path, contents: &str) -> Result<Self> {
        let lines: Vec<String> = contents.split_inclusive('\n').map(String::from).collect();
        let first = lines.first().ok_or_else(|| JobError::EmptyInput(path.to_path_buf()))?;
        let atoms = first
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| {
                JobError::InvalidFormat(format!(
                    "{}: first line '{}' is not an atom count",
                    path.display(),
                    first.trim()
                ))
            })?;

        let aggregate = Aggregate { lines, atoms };
        let records = aggregate.records();
        if records > MAX_RECORDS {
            return Err(JobError::TooManyRecords { count: records });
        }
        if records == 0 {
            return Err(JobError::InvalidFormat(format!(
                "{}: {} lines is less than one {} line record",
                path.display(),
                aggregate.lines.len(),
                aggregate.record_len()
            )));
        }
        let leftover = aggregate.lines.len() % aggregate.record_len();
        if leftover != 0 {
            warn!("{}: ignoring {leftover} trailing lines after the last full record", path.display());
        }
        Ok(aggregate)
    }

    /// lines per record
    pub fn record_len(&self) -> usize {
        self.atoms + 2
    }

    /// number of complete records
    pub fn records(&self) -> usize {
        self.lines.len() / self.record_len()
    }

    /// `<root><suffix>` for every record, numbered from 1 and zero padded
    pub fn chunk_names(&self, root: &str) -> Vec<String> {
        let width = suffix_width(self.records());
        (1..=self.records()).map(|i| format!("{root}{i:0width$}")).collect()
    }

    /// Write every record to `<dir>/<root><suffix>`, numbered from 1 and zero padded
    pub fn write_chunks(&self, dir: &Path, root: &str) -> Result<Vec<PathBuf>> {
        let mut chunks = Vec::with_capacity(self.records());
        let records = self.lines.chunks_exact(self.record_len());
        for (name, record) in self.chunk_names(root).into_iter().zip(records) {
            let path = dir.join(name);
            fs::write(&path, record.concat()).map_err(JobError::file(&path))?;
            chunks.push(path);
        }
        info!("Split into {} chunks of {} lines", chunks.len(), self.record_len());
        Ok(chunks)
    }
}

/// Digits needed to number `records` chunks starting from 1
pub fn suffix_width(records: usize) -> usize {
    match records {
        0..=9 => 1,
        10..=99 => 2,
        100..=999 => 3,
        _ => 4,
    }
}
