//! JSON-file record store
//!
//! One file per application: `<root>/applications/<application>.json`, holding
//! the flat member records as a pretty-printed array in insertion order.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::domain::{MemberAttributes, MemberId, MemberRecord};
use crate::infrastructure::traits::{FileSystem, RecordStore};

const APPLICATIONS_DIR: &str = "applications";

/// Record store backed by JSON files under a data directory.
pub struct JsonRecordStore {
    fs: Arc<dyn FileSystem>,
    root: PathBuf,
    // Serializes the read-modify-write cycle of inserts
    write_lock: Mutex<()>,
}

impl JsonRecordStore {
    pub fn new(fs: Arc<dyn FileSystem>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            root: data_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn applications_dir(&self) -> PathBuf {
        self.root.join(APPLICATIONS_DIR)
    }

    /// File holding the records of `application_id`.
    pub fn application_path(&self, application_id: &str) -> PathBuf {
        self.applications_dir()
            .join(format!("{application_id}.json"))
    }

    fn read_records(&self, path: &Path) -> io::Result<Vec<MemberRecord>> {
        let content = self.fs.read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("parse {}: {}", path.display(), e),
            )
        })
    }

    /// Write via a sibling temp file and rename, so readers never see half a file.
    ///
    /// Structural keys are stripped from every payload first; a flattened
    /// `id` in `extra` would otherwise produce a file that cannot be read back.
    fn write_records(&self, path: &Path, records: &mut [MemberRecord]) -> io::Result<()> {
        for record in records.iter_mut() {
            record.attributes.strip_reserved();
        }
        let content = serde_json::to_string_pretty(&*records)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        self.fs.ensure_parent(path)?;
        let tmp = path.with_extension("json.tmp");
        self.fs.write(&tmp, &(content + "\n"))?;
        self.fs.rename(&tmp, path)
    }
}

impl RecordStore for JsonRecordStore {
    fn load(&self, application_id: &str) -> io::Result<Vec<MemberRecord>> {
        let path = self.application_path(application_id);
        if !self.fs.exists(&path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no records for application '{application_id}'"),
            ));
        }
        let records = self.read_records(&path)?;
        debug!("load: {} records from {}", records.len(), path.display());
        Ok(records)
    }

    fn insert(
        &self,
        application_id: &str,
        parent_id: Option<&MemberId>,
        attributes: &MemberAttributes,
    ) -> io::Result<MemberId> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| io::Error::other("record store lock poisoned"))?;

        let path = self.application_path(application_id);
        let mut records = if self.fs.exists(&path) {
            self.read_records(&path)?
        } else {
            Vec::new()
        };

        if let Some(parent) = parent_id {
            if !records.iter().any(|r| &r.id == parent) {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("parent '{parent}' is not stored in application '{application_id}'"),
                ));
            }
        }

        let id = MemberId::generate();
        records.push(MemberRecord {
            id: id.clone(),
            parent_id: parent_id.cloned(),
            attributes: attributes.payload(),
        });
        self.write_records(&path, &mut records)?;
        debug!("insert: {} into {}", id, application_id);
        Ok(id)
    }

    fn applications(&self) -> io::Result<Vec<String>> {
        let dir = self.applications_dir();
        if !self.fs.is_dir(&dir) {
            return Ok(Vec::new());
        }

        let mut ids: Vec<String> = walkdir::WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().map(|ext| ext == "json").unwrap_or(false))
            .filter_map(|e| {
                e.path()
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().to_string())
            })
            .collect();
        ids.sort();
        Ok(ids)
    }
}
