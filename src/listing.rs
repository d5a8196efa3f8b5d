//! Directory listings for the batch modes
//!
//! The filesystem returns entries in no particular order, so everything is sorted by path.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

fn sorted_paths(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut paths = fs::read_dir(dir)?
        .map(|res| res.map(|e| e.path()))
        .collect::<io::Result<Vec<PathBuf>>>()?;
    paths.sort();
    Ok(paths)
}

/// Regular files in `dir` ending in `.<extension>`
pub fn files_with_extension(dir: &Path, extension: &str) -> io::Result<Vec<PathBuf>> {
    Ok(sorted_paths(dir)?
        .into_iter()
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == extension))
        .collect())
}

pub fn subdirectories(dir: &Path) -> io::Result<Vec<PathBuf>> {
    Ok(sorted_paths(dir)?.into_iter().filter(|p| p.is_dir()).collect())
}
