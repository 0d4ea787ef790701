use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tracing::info;

use super::network::QNetwork;
use crate::{
    constants::files::WEIGHTS_FILE,
    error::{Result, TraderError},
    utils::create_folder_if_not_exists,
};

/// Durable home of the agent's weights under a fixed name. Every save
/// replaces the previous artifact.
#[derive(Debug, Clone)]
pub struct WeightsFile {
    dir: PathBuf,
}

impl WeightsFile {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{WEIGHTS_FILE}.bin"))
    }

    pub fn summary_path(&self) -> PathBuf {
        self.dir.join(format!("{WEIGHTS_FILE}.txt"))
    }

    pub fn save(&self, weights: &QNetwork) -> Result<()> {
        create_folder_if_not_exists(&self.dir)?;

        let encoded = postcard::to_stdvec(weights)?;
        write_replacing(&self.path(), &encoded)?;
        write_replacing(&self.summary_path(), summarize(weights).as_bytes())?;

        info!(path = %self.path().display(), bytes = encoded.len(), "saved weights");
        Ok(())
    }

    pub fn load(&self) -> Result<QNetwork> {
        let path = self.path();
        let file = fs::read(&path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => {
                TraderError::ModelUnavailable(format!("{} does not exist", path.display()))
            }
            _ => err.into(),
        })?;
        Ok(postcard::from_bytes(&file)?)
    }
}

/// Writes a uniquely named file next to the target then renames it over the
/// target, so readers never see half a file and concurrent saves don't collide
fn write_replacing(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

fn summarize(weights: &QNetwork) -> String {
    let mut lines = vec![format!(
        "inputs {} outputs {}",
        weights.input_size(),
        weights.output_size()
    )];

    for (index, layer) in weights.layers().iter().enumerate() {
        lines.push(format!(
            "layer {index}: {}x{} weights, {} biases",
            layer.inputs(),
            layer.outputs(),
            layer.bias.len()
        ));
    }

    lines.join("\n")
}
