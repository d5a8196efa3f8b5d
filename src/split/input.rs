use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;
use tinytemplate::{format_unescaped, TinyTemplate};

use crate::config::Config;
use crate::error::{JobError, Result};
use crate::split::SplitRequest;

/// Rendering context for one structure's input file
#[derive(Serialize)]
struct InputContext {
    keywords: String,
    cpus: u32,
    memory: u32,
    charge: i32,
    multiplicity: u32,
    /// one line per atom, each newline terminated
    atoms: String,
}

/// Turn a chunk into `<chunk>.inp`, then delete the chunk
///
/// Only the last `atoms` lines of the chunk are used, the count and comment lines are dropped.
pub fn write_input(chunk: &Path, atoms: usize, request: &SplitRequest, config: &Config) -> Result<PathBuf> {
    /// included input file template
    static INPUT: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/input.txt"));
    let mut tt = TinyTemplate::new();
    tt.set_default_formatter(&format_unescaped);
    tt.add_template("input", INPUT)?;

    let contents = fs::read_to_string(chunk)?;
    let lines: Vec<&str> = contents.lines().collect();
    let atom_lines = &lines[lines.len().saturating_sub(atoms)..];
    let atoms: String = atom_lines.iter().map(|line| format!("{line}\n")).collect();

    let context = InputContext {
        keywords: request.job_type.keywords(config).to_string(),
        cpus: request.cpus,
        memory: config.split_memory,
        charge: request.charge,
        multiplicity: request.multiplicity,
        atoms,
    };

    let mut name = chunk.as_os_str().to_owned();
    name.push(format!(".{}", config.input_extension));
    let path = PathBuf::from(name);
    info!("Writing {}", path.display());
    fs::write(&path, tt.render("input", &context)?).map_err(JobError::file(&path))?;
    fs::remove_file(chunk).map_err(JobError::file(chunk))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::split::JobType;

    #[test]
    fn renders_orca_input_and_removes_chunk() {
        let dir = TempDir::new().unwrap();
        let chunk = dir.path().join("water07");
        fs::write(
            &chunk,
            "3\nframe 7\nO 0.000 0.000 0.117\nH 0.000 0.757 -0.467\nH 0.000 -0.757 -0.467\n",
        )
        .unwrap();
        let request = SplitRequest {
            root: "water".to_string(),
            job_type: JobType::Opt,
            cpus: 8,
            charge: -1,
            multiplicity: 2,
        };

        let path = write_input(&chunk, 3, &request, &Config::default()).unwrap();
        assert_eq!(path, dir.path().join("water07.inp"));
        assert!(!chunk.exists());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "! B3LYP D3BJ def2-SVP OPT FREQ
%pal
  nprocs 8
end
%maxcore 3000
* xyz -1 2
O 0.000 0.000 0.117
H 0.000 0.757 -0.467
H 0.000 -0.757 -0.467
*
"
        );
    }

    #[test]
    fn chunk_without_final_newline() {
        let dir = TempDir::new().unwrap();
        let chunk = dir.path().join("he1");
        fs::write(&chunk, "1\n\nHe 0 0 0").unwrap();
        let request = SplitRequest {
            root: "he".to_string(),
            job_type: JobType::Sp,
            cpus: 1,
            charge: 0,
            multiplicity: 1,
        };
        let path = write_input(&chunk, 1, &request, &Config::default()).unwrap();
        assert!(fs::read_to_string(path).unwrap().ends_with("* xyz 0 1\nHe 0 0 0\n*\n"));
    }
}
