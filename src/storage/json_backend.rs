use std::{
    cmp::Reverse,
    ffi::OsStr,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::{
    memory::MemoryStore, CommitBatch, DocumentStore, Result, StoreSnapshot, StoredDocument,
    Subscription, SNAPSHOT_SCHEMA_VERSION,
};
use crate::errors::StoreError;

const STORE_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const TMP_SUFFIX: &str = "tmp";
pub const DEFAULT_RETENTION: usize = 5;

/// Describes a persisted backup of the store file.
#[derive(Debug, Clone)]
pub struct BackupInfo {
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub size_bytes: u64,
    pub path: PathBuf,
}

/// File-backed document store. Every successful mutation rewrites the JSON
/// snapshot before it becomes visible; a failed write rolls the mutation back.
pub struct JsonFileStore {
    path: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
    inner: MemoryStore,
    io_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn open(path: PathBuf, backups_dir: PathBuf) -> Result<Self> {
        Self::with_retention(path, backups_dir, DEFAULT_RETENTION)
    }

    pub fn with_retention(path: PathBuf, backups_dir: PathBuf, retention: usize) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::create_dir_all(&backups_dir)?;
        let inner = if path.exists() {
            MemoryStore::from_snapshot(load_snapshot(&path)?)?
        } else {
            MemoryStore::new()
        };
        tracing::debug!(path = %path.display(), "opened json store");
        Ok(Self {
            path,
            backups_dir,
            retention: retention.max(1),
            inner,
            io_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The in-memory view, e.g. for simulating an offline backend.
    pub fn memory(&self) -> &MemoryStore {
        &self.inner
    }

    /// Copies the current contents into a timestamped backup file.
    pub fn backup(&self, note: Option<&str>) -> Result<BackupInfo> {
        let _guard = self.lock_io()?;
        let snapshot = self.inner.export()?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let mut stem = format!("{}_{}", self.stem(), timestamp);
        if let Some(label) = sanitize_backup_note(note) {
            stem.push('_');
            stem.push_str(&label);
        }
        let mut path = self.backups_dir.join(format!("{}.{}", stem, STORE_EXTENSION));
        let mut counter = 1;
        while path.exists() {
            counter += 1;
            path = self
                .backups_dir
                .join(format!("{}-{}.{}", stem, counter, STORE_EXTENSION));
        }
        write_atomic(&path, &serialize_snapshot(&snapshot)?)?;
        self.prune_backups()?;
        let name = file_name(&path);
        tracing::info!(backup = %name, "store backup created");
        Ok(BackupInfo {
            created_at: parse_backup_timestamp(&name),
            size_bytes: fs::metadata(&path).map(|meta| meta.len()).unwrap_or(0),
            name,
            path,
        })
    }

    /// Backups sorted newest first.
    pub fn list_backups(&self) -> Result<Vec<BackupInfo>> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(STORE_EXTENSION) {
                continue;
            }
            let name = file_name(&path);
            entries.push(BackupInfo {
                created_at: parse_backup_timestamp(&name),
                size_bytes: fs::metadata(&path).map(|meta| meta.len()).unwrap_or(0),
                name,
                path,
            });
        }
        entries.sort_by_key(|info| Reverse((info.created_at, info.name.clone())));
        Ok(entries)
    }

    /// Replaces the live contents with a backup and rewrites the store file.
    pub fn restore_backup(&self, name: &str) -> Result<()> {
        if !is_plain_backup_name(name) {
            return Err(StoreError::InvalidBackupName(name.to_string()));
        }
        let path = self.backups_dir.join(name);
        if !path.exists() {
            return Err(StoreError::Unavailable(format!("backup `{}` not found", name)));
        }
        let snapshot = load_snapshot(&path)?;
        let _guard = self.lock_io()?;
        write_snapshot(&self.path, &snapshot)?;
        self.inner.replace_all(snapshot)?;
        tracing::info!(backup = %name, "store restored from backup");
        Ok(())
    }

    fn persist(&self, snapshot: &StoreSnapshot) -> Result<()> {
        write_snapshot(&self.path, snapshot)
    }

    fn prune_backups(&self) -> Result<()> {
        for entry in self.list_backups()?.into_iter().skip(self.retention) {
            let _ = fs::remove_file(entry.path);
        }
        Ok(())
    }

    fn stem(&self) -> String {
        self.path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("store")
            .to_string()
    }

    fn lock_io(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.io_lock
            .lock()
            .map_err(|_| StoreError::Unavailable("store file lock poisoned".into()))
    }
}

impl DocumentStore for JsonFileStore {
    fn get(&self, collection: &str, id: Uuid) -> Result<Option<StoredDocument>> {
        self.inner.get(collection, id)
    }

    fn list(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        self.inner.list(collection)
    }

    fn insert(&self, collection: &str, id: Uuid, data: Value) -> Result<u64> {
        let _guard = self.lock_io()?;
        self.inner
            .insert_with(collection, id, data, &|snapshot| self.persist(snapshot))
    }

    fn update(&self, collection: &str, id: Uuid, data: Value) -> Result<u64> {
        let _guard = self.lock_io()?;
        self.inner
            .update_with(collection, id, data, &|snapshot| self.persist(snapshot))
    }

    fn delete(&self, collection: &str, id: Uuid) -> Result<bool> {
        let _guard = self.lock_io()?;
        self.inner
            .delete_with(collection, id, &|snapshot| self.persist(snapshot))
    }

    fn commit(&self, batch: CommitBatch) -> Result<u64> {
        let _guard = self.lock_io()?;
        self.inner
            .commit_with(batch, &|snapshot| self.persist(snapshot))
    }

    fn subscribe(&self, collection: &str) -> Result<Subscription> {
        self.inner.subscribe(collection)
    }
}

/// Reads a snapshot file, refusing schemas newer than this build understands.
pub fn load_snapshot(path: &Path) -> Result<StoreSnapshot> {
    let data = fs::read_to_string(path)?;
    let snapshot: StoreSnapshot = serde_json::from_str(&data)?;
    if snapshot.schema_version > SNAPSHOT_SCHEMA_VERSION {
        return Err(StoreError::Schema(format!(
            "`{}` was written by a newer version (schema {})",
            path.display(),
            snapshot.schema_version
        )));
    }
    Ok(snapshot)
}

/// Stages the snapshot to a temporary file and renames it into place.
pub fn write_snapshot(path: &Path, snapshot: &StoreSnapshot) -> Result<()> {
    let tmp = tmp_path(path);
    write_atomic(&tmp, &serialize_snapshot(snapshot)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn serialize_snapshot(snapshot: &StoreSnapshot) -> Result<String> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string()
}

fn sanitize_backup_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    let mut sanitized = String::new();
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
        } else if (ch.is_whitespace() || matches!(ch, '-' | '.' | '_'))
            && !sanitized.is_empty()
            && !sanitized.ends_with('-')
        {
            sanitized.push('-');
        }
    }
    let trimmed = sanitized.trim_matches('-');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let stem = name.strip_suffix(&format!(".{}", STORE_EXTENSION))?;
    let segments: Vec<&str> = stem.split('_').collect();
    segments.windows(2).find_map(|pair| {
        let (date, time) = (pair[0], pair[1].get(..6)?);
        if !is_digits(date, 8) || !is_digits(time, 6) {
            return None;
        }
        NaiveDateTime::parse_from_str(&format!("{}{}", date, time), "%Y%m%d%H%M%S")
            .ok()
            .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
    })
}

/// Backup names are bare file names inside the backups directory.
fn is_plain_backup_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains(['/', '\\'])
        && name != "."
        && name != ".."
        && Path::new(name).file_name() == Some(OsStr::new(name))
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    file.sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_note_is_slugified() {
        assert_eq!(
            sanitize_backup_note(Some("  Before Stock Take! ")),
            Some("before-stock-take".into())
        );
        assert_eq!(sanitize_backup_note(Some("!!!")), None);
        assert_eq!(sanitize_backup_note(None), None);
    }

    #[test]
    fn backup_timestamp_parses_with_and_without_note() {
        let plain = parse_backup_timestamp("shop_20240105_093000.json").unwrap();
        assert_eq!(plain.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-01-05 09:30:00");
        assert!(parse_backup_timestamp("shop_20240105_093000_eod.json").is_some());
        assert!(parse_backup_timestamp("shop_20240105_093000_eod-2.json").is_some());
        assert!(parse_backup_timestamp("notes.json").is_none());
    }

    #[test]
    fn restore_only_accepts_names_inside_backups_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("inventory.json"), dir.path().join("backups"))
            .unwrap();
        store.insert("things", Uuid::new_v4(), serde_json::json!({})).unwrap();
        let backup = store.backup(None).unwrap();

        for name in ["../inventory.json", "/etc/passwd", "..", "", "nested/x.json", "..\\x.json"] {
            let err = store.restore_backup(name).unwrap_err();
            assert!(matches!(err, StoreError::InvalidBackupName(_)), "{name}");
        }
        store.restore_backup(&backup.name).unwrap();
    }

    #[test]
    fn tmp_path_appends_suffix() {
        assert_eq!(
            tmp_path(Path::new("/data/shop.json")),
            PathBuf::from("/data/shop.json.tmp")
        );
    }
}
