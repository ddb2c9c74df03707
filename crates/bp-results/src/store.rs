//! On-disk run store.
//!
//! Layout: `<root>/<run_id>/manifest.json` plus `<root>/<run_id>/trajectory.jsonl`,
//! one [`TrajectoryRecord`] per line. A run counts as present once its
//! manifest exists. Run ids must have the shape [`is_run_id`] accepts before
//! they are joined onto the store root.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::hash::is_run_id;
use crate::types::{RunManifest, TrajectoryRecord};
use crate::{ResultsError, ResultsResult};

const MANIFEST_FILE: &str = "manifest.json";
const TRAJECTORY_FILE: &str = "trajectory.jsonl";
const STORE_DIR: [&str; 2] = [".bardenpho", "runs"];

#[derive(Clone, Debug)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        fs::create_dir_all(&root_dir)?;
        Ok(Self { root_dir })
    }

    /// Store kept beside a plant file, under `.bardenpho/runs`.
    pub fn for_plant(plant_path: &Path) -> ResultsResult<Self> {
        let Some(plant_dir) = plant_path.parent() else {
            return Err(ResultsError::InvalidPath {
                message: format!("{} has no parent directory", plant_path.display()),
            });
        };
        Self::new(STORE_DIR.iter().fold(plant_dir.to_path_buf(), |p, d| p.join(d)))
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn run_dir(&self, run_id: &str) -> ResultsResult<PathBuf> {
        if !is_run_id(run_id) {
            return Err(ResultsError::InvalidRunId {
                run_id: run_id.to_string(),
            });
        }
        Ok(self.root_dir.join(run_id))
    }

    fn file(&self, run_id: &str, name: &str) -> ResultsResult<PathBuf> {
        Ok(self.run_dir(run_id)?.join(name))
    }

    fn existing_file(&self, run_id: &str, name: &str) -> ResultsResult<PathBuf> {
        let path = self.file(run_id, name)?;
        if path.is_file() {
            Ok(path)
        } else {
            Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            })
        }
    }

    /// False for anything that is not a well-formed run id.
    pub fn has_run(&self, run_id: &str) -> bool {
        self.file(run_id, MANIFEST_FILE).is_ok_and(|path| path.is_file())
    }

    /// Writes the trajectory first and the manifest last, so a run never
    /// appears without its records.
    pub fn save_run(
        &self,
        manifest: &RunManifest,
        records: &[TrajectoryRecord],
    ) -> ResultsResult<()> {
        let run_dir = self.run_dir(&manifest.run_id)?;
        fs::create_dir_all(&run_dir)?;

        let mut out = BufWriter::new(File::create(run_dir.join(TRAJECTORY_FILE))?);
        for record in records {
            serde_json::to_writer(&mut out, record)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;

        let manifest_json = serde_json::to_string_pretty(manifest)?;
        fs::write(run_dir.join(MANIFEST_FILE), manifest_json)?;
        Ok(())
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        let path = self.existing_file(run_id, MANIFEST_FILE)?;
        Ok(serde_json::from_reader(BufReader::new(File::open(path)?))?)
    }

    pub fn load_timeseries(&self, run_id: &str) -> ResultsResult<Vec<TrajectoryRecord>> {
        let path = self.existing_file(run_id, TRAJECTORY_FILE)?;
        let mut records = Vec::new();
        for (index, line) in BufReader::new(File::open(path)?).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line).map_err(|source| ResultsError::Corrupt {
                run_id: run_id.to_string(),
                line: index + 1,
                source,
            })?;
            records.push(record);
        }
        Ok(records)
    }

    /// Manifests in the store, oldest first. Directories that are not named
    /// by a run id or lack a readable manifest are skipped.
    pub fn list_runs(&self, scenario_id: Option<&str>) -> ResultsResult<Vec<RunManifest>> {
        if !self.root_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut runs = Vec::new();
        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let run_id = entry.file_name().to_string_lossy().into_owned();
            if !is_run_id(&run_id) {
                continue;
            }
            if let Ok(manifest) = self.load_manifest(&run_id)
                && scenario_id.is_none_or(|id| manifest.scenario_id == id)
            {
                runs.push(manifest);
            }
        }

        runs.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id)?;
        if run_dir.is_dir() {
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }
}
