//! # Record Store
//!
//! Keeps the patient record in a JSON file.
//!
//! Saves never leave a half-written file behind: the record is written to
//! `<path>.tmp` next to the target and then renamed over it.

use sonara_core::{
    PatientRecord, SonaraError, primitives::MAX_RECORD_SIZE, record_from_json, record_to_json,
};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Default location of the record file.
pub const DEFAULT_DATA_FILE: &str = "patient_data.json";

/// File-backed storage for a [`PatientRecord`].
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the record. A missing file is an empty record.
    ///
    /// A file that exists but cannot be parsed is an error, so that it is
    /// never silently replaced by an empty record on the next save.
    pub fn load(&self) -> Result<PatientRecord, SonaraError> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "No record file yet, starting fresh");
            return Ok(PatientRecord::new());
        }

        let metadata = std::fs::metadata(&self.path)
            .map_err(|e| SonaraError::Io(format!("Cannot read record metadata: {}", e)))?;
        if metadata.len() > MAX_RECORD_SIZE as u64 {
            return Err(SonaraError::Serialization(format!(
                "Record file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_RECORD_SIZE
            )));
        }

        let data = std::fs::read(&self.path)
            .map_err(|e| SonaraError::Io(format!("Read record: {}", e)))?;
        record_from_json(&data)
    }

    /// Write the record atomically.
    pub fn save(&self, record: &PatientRecord) -> Result<(), SonaraError> {
        let data = record_to_json(record)?;
        let temp = self.temp_path();

        std::fs::write(&temp, &data)
            .map_err(|e| SonaraError::Io(format!("Write record: {}", e)))?;
        if let Err(e) = std::fs::rename(&temp, &self.path) {
            let _ = std::fs::remove_file(&temp);
            return Err(SonaraError::Io(format!("Replace record: {}", e)));
        }

        tracing::debug!(
            path = %self.path.display(),
            bytes = data.len(),
            sessions = record.total_sessions,
            "Record saved"
        );
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sonara_core::SessionSummary;

    fn summary(day: u32, count: u32) -> SessionSummary {
        SessionSummary {
            date: NaiveDate::from_ymd_opt(2026, 3, day).expect("valid date"),
            exercises_completed: count,
            session_duration: 95,
            target_achieved: count >= 20,
            exercise_log: Vec::new(),
        }
    }

    #[test]
    fn missing_file_loads_empty_record() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = RecordStore::new(dir.path().join(DEFAULT_DATA_FILE));
        assert!(!store.exists());
        assert_eq!(store.load().expect("load"), PatientRecord::new());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = RecordStore::new(dir.path().join(DEFAULT_DATA_FILE));

        let mut record = PatientRecord::new();
        record.record_session(summary(2, 20));
        record.record_session(summary(3, 7));
        store.save(&record).expect("save");

        assert!(store.exists());
        assert!(!store.temp_path().exists());
        assert_eq!(store.load().expect("load"), record);
    }

    #[test]
    fn save_replaces_previous_contents() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = RecordStore::new(dir.path().join(DEFAULT_DATA_FILE));

        let mut record = PatientRecord::new();
        record.record_session(summary(2, 20));
        store.save(&record).expect("first save");
        record.record_session(summary(3, 4));
        store.save(&record).expect("second save");

        let loaded = store.load().expect("load");
        assert_eq!(loaded.total_sessions, 2);
        assert_eq!(loaded.daily_streak, 2);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(DEFAULT_DATA_FILE);
        std::fs::write(&path, b"{ not json").expect("write");

        let err = RecordStore::new(&path).load().expect_err("corrupt");
        assert!(matches!(err, SonaraError::Serialization(_)));
        // The damaged file is left alone.
        assert_eq!(std::fs::read(&path).expect("read"), b"{ not json");
    }

    #[test]
    fn save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = RecordStore::new(dir.path().join("nope").join(DEFAULT_DATA_FILE));
        let err = store.save(&PatientRecord::new()).expect_err("no directory");
        assert!(matches!(err, SonaraError::Io(_)));
    }
}
