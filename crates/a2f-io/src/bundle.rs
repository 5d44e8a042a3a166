//! Converted artifact set and its commit to disk.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::Result;
use crate::job::{JOB_FILE, PARTITION_FILE};

/// Every artifact of one conversion, held in memory until committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedJob {
    pub job_name: String,
    pub mesh: String,
    pub control: String,
    pub job: String,
    /// Present for distributed runs.
    pub partition: Option<String>,
}

impl ConvertedJob {
    /// File names paired with their contents, in write order.
    pub fn artifacts(&self) -> Vec<(String, &str)> {
        let mut out = vec![
            (format!("{}.msh", self.job_name), self.mesh.as_str()),
            (format!("{}.cnt", self.job_name), self.control.as_str()),
            (JOB_FILE.to_string(), self.job.as_str()),
        ];
        if let Some(partition) = &self.partition {
            out.push((PARTITION_FILE.to_string(), partition.as_str()));
        }
        out
    }

    /// Writes all artifacts into `dir`.
    ///
    /// Each artifact is first written to a hidden staging file next to its
    /// destination; the staged files are renamed into place only once all of
    /// them have been written. A failed write leaves every destination
    /// untouched; on any failure the remaining staging files are removed.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let artifacts = self.artifacts();
        let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(artifacts.len());
        for (name, contents) in &artifacts {
            let staging = dir.join(format!(".{name}.partial"));
            if let Err(err) = fs::write(&staging, contents) {
                discard(&staged);
                let _ = fs::remove_file(&staging);
                return Err(err.into());
            }
            staged.push((staging, dir.join(name)));
        }

        for (done, (staging, path)) in staged.iter().enumerate() {
            if let Err(err) = fs::rename(staging, path) {
                discard(&staged[done..]);
                return Err(err.into());
            }
            debug!("wrote {}", path.display());
        }
        info!("wrote {} artifacts to {}", staged.len(), dir.display());
        Ok(staged.into_iter().map(|(_, path)| path).collect())
    }
}

fn discard(staged: &[(PathBuf, PathBuf)]) {
    for (staging, _) in staged {
        let _ = fs::remove_file(staging);
    }
}
