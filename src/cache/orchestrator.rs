//! Cache Orchestrator
//!
//! Drives one caching invocation: classify the source, decide skip / hit /
//! miss, run the copy pipeline on a miss, enforce the size budget after a
//! successful write, and hand the resolved path to the forwarded command.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::cache::{evict, key, pipeline};
use crate::errors::CacheError;
use crate::forward;
use crate::prefs::CachePreferences;
use crate::progress::ProgressReporter;
use crate::source::{self, SourceDescriptor};

/// One caching request, as received from the CLI surface
#[derive(Debug, Clone, Default)]
pub struct CacheRequest {
    pub path: String,
    pub cache_non_network_paths: bool,
    pub forward_to_command: Option<String>,
    pub forward_to_command_arguments: Option<String>,
}

/// Which branch of the state machine an invocation took
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Branch {
    /// Local source with non-network caching disabled; cache untouched
    Skipped,
    /// Derived local path already existed; pipeline skipped
    Hit,
    /// Pipeline ran and wrote the cached file
    Miss { bytes_copied: u64 },
}

/// Terminal result of a successful invocation
#[derive(Debug, Clone)]
pub struct Outcome {
    pub branch: Branch,
    /// Path handed to the forwarded command: the cached local path on
    /// hit/miss, the original path on skip
    pub resolved_path: PathBuf,
    /// Exit code of the forwarded command, when one was configured
    pub forward_exit: Option<i32>,
}

impl Outcome {
    pub fn status_message(&self) -> String {
        match &self.branch {
            Branch::Skipped => "Skipped caching: source is not a network path.".to_string(),
            Branch::Hit => format!(
                "Source already cached at '{}'.",
                self.resolved_path.display()
            ),
            Branch::Miss { bytes_copied } => format!(
                "Successfully preloaded {} bytes to '{}'.",
                bytes_copied,
                self.resolved_path.display()
            ),
        }
    }
}

/// Run the cache state machine for one request
pub fn run(request: &CacheRequest, prefs: &CachePreferences) -> Result<Outcome, CacheError> {
    let descriptor = SourceDescriptor::classify(&request.path);

    if !descriptor.is_remote() && !request.cache_non_network_paths {
        info!(path = %request.path, "Skipping caching, source is not a network path");
        return finish(request, Branch::Skipped, PathBuf::from(&request.path));
    }

    // Local existence is probed up front; remote existence is implied by a
    // successful stream open inside the pipeline branch
    if !descriptor.is_http() && !Path::new(descriptor.path()).exists() {
        return Err(CacheError::SourceNotFound(request.path.clone()));
    }

    let local_path = key::derive_local_path(descriptor.path(), &prefs.cache_directory);

    if local_path.exists() {
        debug!(path = %request.path, local = %local_path.display(), "Cache HIT");
        return finish(request, Branch::Hit, local_path);
    }

    debug!(path = %request.path, local = %local_path.display(), "Cache MISS, preloading");
    let stream = source::open(&descriptor)?;
    let mut reader = stream.reader;

    let progress = ProgressReporter::new(descriptor.base_file_name(), stream.len);
    info!(path = %request.path, size = stream.len, "Preloading file");

    let bytes_copied = pipeline::run(
        &mut reader,
        stream.len,
        &local_path,
        pipeline::BUFFER_SIZE,
        &progress,
    )?;

    // Only a fully successful write adds bytes worth evicting for
    evict::enforce(&prefs.cache_directory, prefs.max_cache_size_bytes());

    finish(request, Branch::Miss { bytes_copied }, local_path)
}

/// ForwardOrDone: delegate to the forwarded command when one is configured
fn finish(
    request: &CacheRequest,
    branch: Branch,
    resolved_path: PathBuf,
) -> Result<Outcome, CacheError> {
    let forward_exit = match &request.forward_to_command {
        Some(command) if !command.trim().is_empty() => Some(forward::run(
            command,
            request.forward_to_command_arguments.as_deref(),
            &resolved_path,
        )?),
        _ => None,
    };

    Ok(Outcome {
        branch,
        resolved_path,
        forward_exit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn prefs_at(dir: &Path) -> CachePreferences {
        CachePreferences {
            cache_directory: dir.to_path_buf(),
            max_cache_size_mb: 1024,
        }
    }

    fn request_for(path: &Path) -> CacheRequest {
        CacheRequest {
            path: path.to_str().unwrap().to_string(),
            cache_non_network_paths: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_local_source_skipped_when_flag_unset() {
        let cache_dir = tempfile::tempdir().unwrap();
        let source_dir = tempfile::tempdir().unwrap();
        let source = source_dir.path().join("video.mp4");
        fs::write(&source, b"data").unwrap();

        let mut request = request_for(&source);
        request.cache_non_network_paths = false;

        let outcome = run(&request, &prefs_at(cache_dir.path())).unwrap();
        assert_eq!(outcome.branch, Branch::Skipped);
        assert_eq!(outcome.resolved_path, source);
        // Cache directory untouched
        assert_eq!(fs::read_dir(cache_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_source_fails_fast() {
        let cache_dir = tempfile::tempdir().unwrap();
        let request = CacheRequest {
            path: "/no/such/video.mp4".to_string(),
            cache_non_network_paths: true,
            ..Default::default()
        };

        match run(&request, &prefs_at(cache_dir.path())) {
            Err(CacheError::SourceNotFound(_)) => {}
            other => panic!("expected SourceNotFound, got {other:?}"),
        }
        assert_eq!(fs::read_dir(cache_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_miss_then_hit_round_trip() {
        let cache_dir = tempfile::tempdir().unwrap();
        let source_dir = tempfile::tempdir().unwrap();
        let source = source_dir.path().join("video.mp4");
        let content = vec![42u8; 10_000];
        fs::write(&source, &content).unwrap();

        let prefs = prefs_at(cache_dir.path());
        let request = request_for(&source);

        let first = run(&request, &prefs).unwrap();
        let Branch::Miss { bytes_copied } = first.branch else {
            panic!("expected Miss, got {:?}", first.branch);
        };
        assert_eq!(bytes_copied, 10_000);
        assert!(first.resolved_path.exists());
        assert_eq!(fs::read(&first.resolved_path).unwrap(), content);
        let name = first.resolved_path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("video.mp4_"));

        let second = run(&request, &prefs).unwrap();
        assert_eq!(second.branch, Branch::Hit);
        assert_eq!(second.resolved_path, first.resolved_path);
    }

    #[test]
    fn test_miss_evicts_older_files_over_budget() {
        let cache_dir = tempfile::tempdir().unwrap();
        let source_dir = tempfile::tempdir().unwrap();

        // Two MB of unrelated older cache content against a 1 MB budget
        fs::write(cache_dir.path().join("old_a"), vec![0u8; 1024 * 1024]).unwrap();
        fs::write(cache_dir.path().join("old_b"), vec![0u8; 1024 * 1024]).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(25));

        let source = source_dir.path().join("video.mp4");
        fs::write(&source, vec![1u8; 500 * 1024]).unwrap();

        let prefs = CachePreferences {
            cache_directory: cache_dir.path().to_path_buf(),
            max_cache_size_mb: 1,
        };
        let outcome = run(&request_for(&source), &prefs).unwrap();
        assert!(matches!(outcome.branch, Branch::Miss { .. }));

        // The just-written file survives; enough older files are gone to fit
        assert!(outcome.resolved_path.exists());
        let total: u64 = fs::read_dir(cache_dir.path())
            .unwrap()
            .flatten()
            .map(|e| e.metadata().unwrap().len())
            .sum();
        assert!(total <= 1024 * 1024, "cache still over budget: {total}");
    }

    #[test]
    fn test_forwarding_exit_code_surfaces() {
        let cache_dir = tempfile::tempdir().unwrap();
        let source_dir = tempfile::tempdir().unwrap();
        let source = source_dir.path().join("video.mp4");
        fs::write(&source, b"data").unwrap();

        let mut request = request_for(&source);
        request.forward_to_command = Some("exit 5 #".to_string());

        let outcome = run(&request, &prefs_at(cache_dir.path())).unwrap();
        assert_eq!(outcome.forward_exit, Some(5));
    }
}
