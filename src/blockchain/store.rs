use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use super::Block;
use crate::error::Result;

/// JSON file holding the whole chain as a top-level array of blocks.
///
/// Single writer: nothing guards the file against other processes.
#[derive(Debug, Clone)]
pub struct ChainStore {
    path: PathBuf,
}

impl ChainStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted chain. A missing, unreadable or unparsable file
    /// yields an empty chain rather than an error.
    pub fn load(&self) -> Vec<Block> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no chain file at {}", self.path.display());
                return Vec::new();
            }
            Err(e) => {
                warn!(
                    "chain file {} unreadable, starting empty: {}",
                    self.path.display(),
                    e
                );
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Block>>(&contents) {
            Ok(chain) => chain,
            Err(e) => {
                warn!(
                    "chain file {} is corrupt, starting empty: {}",
                    self.path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    /// Overwrite the file with `chain`, indented for reading.
    /// Writes a sibling temp file first and renames it into place.
    pub fn save(&self, chain: &[Block]) -> Result<()> {
        let mut buf = Vec::new();
        let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        chain.serialize(&mut ser)?;

        let temp_path = self.temp_path();
        let mut file = File::create(&temp_path)?;
        file.write_all(&buf)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, &self.path)?;
        debug!(
            "saved {} blocks to {} ({} bytes)",
            chain.len(),
            self.path.display(),
            buf.len()
        );
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}
