//! Per-target workspaces: scan output, activity log and evidence directories

use crate::core::error::WorkspaceError;
use chrono::Local;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use url::Url;

pub const INFO_FILE: &str = "workspace_info.json";
pub const SCANS_DIR: &str = "scans";
pub const LOGS_DIR: &str = "logs";
pub const EVIDENCE_DIR: &str = "evidence";
pub const ACTIVITY_LOG: &str = "activity.log";

const FOLDER_SUFFIX: &str = ".results";

/// Longest host or path part kept in a folder name, in bytes
const MAX_PART_LEN: usize = 96;
const DIGEST_LEN: usize = 12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceInfo {
    pub target_url: String,
    pub created: String,
    pub last_accessed: String,
    pub scans_performed: Vec<ScanRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub module: String,
    pub timestamp: String,
    pub file: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceSummary {
    pub path: PathBuf,
    pub scan_files: usize,
    pub log_files: usize,
}

/// Single active workspace per process.
#[derive(Debug)]
pub struct WorkspaceManager {
    base_dir: PathBuf,
    current: Option<PathBuf>,
}

impl WorkspaceManager {
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self, WorkspaceError> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).map_err(|e| WorkspaceError::io(&base_dir, e))?;
        let base_dir = fs::canonicalize(&base_dir).map_err(|e| WorkspaceError::io(&base_dir, e))?;
        tracing::debug!("Workspaces base directory: {}", base_dir.display());
        Ok(Self {
            base_dir,
            current: None,
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[cfg(test)]
    pub fn active(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    /// Create (or reopen) the workspace for `target_url` and make it active.
    pub fn create_workspace(&mut self, target_url: &str) -> Result<PathBuf, WorkspaceError> {
        let path = self.base_dir.join(folder_name(target_url));

        for dir in [
            path.clone(),
            path.join(SCANS_DIR),
            path.join(LOGS_DIR),
            path.join(EVIDENCE_DIR),
        ] {
            fs::create_dir_all(&dir).map_err(|e| WorkspaceError::io(&dir, e))?;
        }

        let info_file = path.join(INFO_FILE);
        let now = iso_now();
        let info = match read_info(&info_file)? {
            Some(mut existing) => {
                existing.last_accessed = now;
                existing
            }
            None => WorkspaceInfo {
                target_url: target_url.to_string(),
                created: now.clone(),
                last_accessed: now,
                scans_performed: Vec::new(),
            },
        };
        write_json(&info_file, &info)?;

        self.current = Some(path.clone());
        Ok(path)
    }

    /// Write `results` to `scans/<module>_<YYYYMMDD_HHMMSS>.json` and record it
    /// in the manifest.
    pub fn save_scan_results<T>(&self, module_name: &str, results: &T) -> Result<PathBuf, WorkspaceError>
    where
        T: Serialize + ?Sized,
    {
        let workspace = self.current.as_ref().ok_or(WorkspaceError::NoWorkspace)?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let filename = format!("{}_{}.json", module_name, timestamp);
        let scan_file = workspace.join(SCANS_DIR).join(&filename);

        write_json(&scan_file, results)?;

        let info_file = workspace.join(INFO_FILE);
        if let Some(mut info) = read_info(&info_file)? {
            info.last_accessed = iso_now();
            info.scans_performed.push(ScanRecord {
                module: module_name.to_string(),
                timestamp,
                file: filename,
            });
            write_json(&info_file, &info)?;
        }

        Ok(scan_file)
    }

    /// Append `[YYYY-MM-DD HH:MM:SS] message` to the activity log. No-op
    /// without an active workspace.
    pub fn log_activity(&self, message: &str) -> Result<(), WorkspaceError> {
        let Some(workspace) = &self.current else {
            return Ok(());
        };

        let log_file = workspace.join(LOGS_DIR).join(ACTIVITY_LOG);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .map_err(|e| WorkspaceError::io(&log_file, e))?;

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(file, "[{}] {}", timestamp, message).map_err(|e| WorkspaceError::io(&log_file, e))
    }

    pub fn info(&self) -> Result<Option<WorkspaceInfo>, WorkspaceError> {
        match &self.current {
            Some(path) => read_info(&path.join(INFO_FILE)),
            None => Ok(None),
        }
    }

    pub fn summary(&self) -> Option<WorkspaceSummary> {
        let path = self.current.clone()?;
        let scan_files = count_with_extension(&path.join(SCANS_DIR), "json");
        let log_files = count_with_extension(&path.join(LOGS_DIR), "log");
        Some(WorkspaceSummary {
            path,
            scan_files,
            log_files,
        })
    }
}

/// `<scheme>.<host>[.<path>].results`, safe to use as a single path component.
pub fn folder_name(target_url: &str) -> String {
    let (scheme, host, path) = match Url::parse(target_url) {
        Ok(url) if url.has_host() => {
            let host = match (url.host_str(), url.port()) {
                (Some(h), Some(p)) => format!("{}_{}", h, p),
                (Some(h), None) => h.to_string(),
                (None, _) => "localhost".to_string(),
            };
            (url.scheme().to_string(), host, url.path().to_string())
        }
        // No authority (bare host or relative path): treat it all as a path
        _ => ("http".to_string(), "localhost".to_string(), target_url.to_string()),
    };

    let mut name = format!("{}.{}", scheme, bounded(sanitize(&host)));

    let decoded = match urlencoding::decode(&path) {
        Ok(p) => p.into_owned(),
        Err(_) => path.clone(),
    };
    let trimmed = decoded.trim_matches('/');
    if !trimmed.is_empty() {
        name.push('.');
        name.push_str(&bounded(sanitize(&trimmed.replace('/', "."))));
    }

    name.push_str(FOLDER_SUFFIX);
    name
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Over-long parts are cut and tagged with a digest of the full text, so
/// distinct long targets still get distinct folders.
fn bounded(part: String) -> String {
    if part.len() <= MAX_PART_LEN {
        return part;
    }

    let mut hasher = Sha256::new();
    hasher.update(part.as_bytes());
    let digest = format!("{:x}", hasher.finalize());

    let mut cut = MAX_PART_LEN - DIGEST_LEN - 1;
    while !part.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}_{}", &part[..cut], &digest[..DIGEST_LEN])
}

fn iso_now() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

fn read_info(path: &Path) -> Result<Option<WorkspaceInfo>, WorkspaceError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|e| WorkspaceError::io(path, e))?;
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| WorkspaceError::json(path, e))
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), WorkspaceError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| WorkspaceError::json(path, e))?;
    fs::write(path, json).map_err(|e| WorkspaceError::io(path, e))
}

fn count_with_extension(dir: &Path, extension: &str) -> usize {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some(extension))
                .count()
        })
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn manager() -> (TempDir, WorkspaceManager) {
        let dir = TempDir::new().unwrap();
        let manager = WorkspaceManager::new(dir.path().join("workspaces")).unwrap();
        (dir, manager)
    }

    #[test]
    fn test_folder_names() {
        assert_eq!(
            folder_name("https://victim.example.com/App"),
            "https.victim.example.com.App.results"
        );
        assert_eq!(folder_name("https://a.b.com/"), "https.a.b.com.results");
        assert_eq!(folder_name("http://a.b.com"), "http.a.b.com.results");
        assert_eq!(
            folder_name("https://a.b.com/Apps/My App/"),
            "https.a.b.com.Apps.My_App.results"
        );
        assert_eq!(
            folder_name("https://a.b.com:8443/App"),
            "https.a.b.com_8443.App.results"
        );
        assert_eq!(
            folder_name("victim.com/App"),
            "http.localhost.victim.com.App.results"
        );
    }

    #[test]
    fn test_long_paths_are_bounded() {
        let long = "x".repeat(300);
        let name = folder_name(&format!("https://b.example.com/{}", long));
        assert!(name.len() < 255);
        assert!(name.starts_with("https.b.example.com.xxxx"));
        assert!(name.ends_with(".results"));

        let other = folder_name(&format!("https://b.example.com/{}y", long));
        assert_ne!(name, other);
        assert_eq!(other.len(), name.len());

        let wide = folder_name(&format!("https://b.example.com/{}", "é".repeat(200)));
        assert!(wide.len() < 255);
    }

    #[test]
    fn test_create_workspace_with_long_path() {
        let (_dir, mut manager) = manager();
        let target = format!("https://b.example.com/{}", "x".repeat(300));
        let path = manager.create_workspace(&target).unwrap();
        assert!(path.join(SCANS_DIR).is_dir());
        assert_eq!(manager.info().unwrap().unwrap().target_url, target);
    }

    #[test]
    fn test_failed_create_keeps_previous_workspace() {
        let (_dir, mut manager) = manager();
        let first = manager.create_workspace("https://a.example.com/App").unwrap();

        // a plain file where the workspace directory would go
        fs::write(manager.base_dir().join(folder_name("https://b.example.com/App")), "").unwrap();
        assert!(matches!(
            manager.create_workspace("https://b.example.com/App"),
            Err(WorkspaceError::Io { .. })
        ));
        assert_eq!(manager.active(), Some(first.as_path()));
    }

    #[test]
    fn test_create_workspace_layout() {
        let (_dir, mut manager) = manager();
        let path = manager
            .create_workspace("https://victim.example.com/App")
            .unwrap();

        assert!(path.is_absolute());
        assert!(path.ends_with("https.victim.example.com.App.results"));
        for sub in [SCANS_DIR, LOGS_DIR, EVIDENCE_DIR] {
            assert!(path.join(sub).is_dir());
        }

        let info = manager.info().unwrap().unwrap();
        assert_eq!(info.target_url, "https://victim.example.com/App");
        assert!(info.scans_performed.is_empty());
        assert_eq!(manager.active(), Some(path.as_path()));
    }

    #[test]
    fn test_create_workspace_is_idempotent() {
        let (_dir, mut manager) = manager();
        let first = manager.create_workspace("https://a.b.com/App1").unwrap();
        let created = manager.info().unwrap().unwrap().created;

        let second = manager.create_workspace("https://a.b.com/App1").unwrap();
        let info = manager.info().unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(info.created, created);
    }

    #[test]
    fn test_reopen_keeps_scan_history() {
        let (_dir, mut manager) = manager();
        manager.create_workspace("https://a.b.com/App1").unwrap();
        manager.save_scan_results("osscan", &json!({"ok": true})).unwrap();
        manager.create_workspace("https://a.b.com/App1").unwrap();
        assert_eq!(manager.info().unwrap().unwrap().scans_performed.len(), 1);
    }

    #[test]
    fn test_save_without_workspace_writes_nothing() {
        let (_dir, manager) = manager();
        let result = manager.save_scan_results("osscan", &json!({"a": 1}));
        assert!(matches!(result, Err(WorkspaceError::NoWorkspace)));
        assert_eq!(fs::read_dir(manager.base_dir()).unwrap().count(), 0);
    }

    #[test]
    fn test_save_scan_results_updates_manifest() {
        let (_dir, mut manager) = manager();
        manager.create_workspace("https://a.b.com/App").unwrap();

        let file = manager
            .save_scan_results("osenum", &json!({"screens": ["/App/Home"]}))
            .unwrap();

        let name = file.file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("osenum_"));
        assert!(name.ends_with(".json"));
        // osenum_YYYYMMDD_HHMMSS.json
        assert_eq!(name.len(), "osenum_".len() + 15 + ".json".len());

        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&file).unwrap()).unwrap();
        assert_eq!(saved["screens"][0], "/App/Home");

        let info = manager.info().unwrap().unwrap();
        assert_eq!(info.scans_performed.len(), 1);
        assert_eq!(info.scans_performed[0].module, "osenum");
        assert_eq!(info.scans_performed[0].file, name);
    }

    #[test]
    fn test_log_activity() {
        let (_dir, mut manager) = manager();
        manager.log_activity("ignored, no workspace").unwrap();

        let path = manager.create_workspace("https://a.b.com").unwrap();
        manager.log_activity("Target set to: https://a.b.com").unwrap();
        manager.log_activity("Started module: osscan").unwrap();

        let log = fs::read_to_string(path.join(LOGS_DIR).join(ACTIVITY_LOG)).unwrap();
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("] Target set to: https://a.b.com"));
        // [YYYY-MM-DD HH:MM:SS]
        assert_eq!(lines[1].find(']'), Some(20));
    }

    #[test]
    fn test_summary_counts_files() {
        let (_dir, mut manager) = manager();
        assert!(manager.summary().is_none());

        manager.create_workspace("https://a.b.com").unwrap();
        manager.log_activity("hello").unwrap();
        manager.save_scan_results("osscan", &json!([])).unwrap();

        let summary = manager.summary().unwrap();
        assert_eq!(summary.scan_files, 1);
        assert_eq!(summary.log_files, 1);
    }
}
