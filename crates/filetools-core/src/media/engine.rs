//! Transcoding engine and its shared runtime
//!
//! The engine owns a flat working directory: inputs are written into it by
//! name, a command runs against those names and the output is read back.
//! `MediaRuntime` loads the engine on first use, refuses to load it on
//! devices below the configured memory floor and serializes jobs through a
//! mutex so concurrent requests never share the working directory.

use super::{MediaError, TranscodeJob};
use crate::file::Blob;
use crate::progress::{report, ProgressSink};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use sysinfo::System;
use tempfile::TempDir;
use tokio::process::Command;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

/// A command-line transcoder with a private working directory
#[async_trait]
pub trait TranscodeEngine: Send + Sync {
    async fn write_file(&self, name: &str, data: &[u8]) -> Result<(), MediaError>;

    /// Run one command; `args` refer to files by their working-directory names
    async fn exec(&self, args: &[String]) -> Result<(), MediaError>;

    async fn read_file(&self, name: &str) -> Result<Vec<u8>, MediaError>;

    async fn remove_file(&self, name: &str) -> Result<(), MediaError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Path or name of the ffmpeg binary
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Devices with less total memory than this refuse to load the engine
    #[serde(default = "default_min_memory_mb")]
    pub min_memory_mb: u64,

    /// Upper bound for a single engine run; unbounded when absent
    #[serde(default)]
    pub exec_timeout_secs: Option<u64>,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_min_memory_mb() -> u64 {
    2048
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            min_memory_mb: default_min_memory_mb(),
            exec_timeout_secs: None,
        }
    }
}

/// Capabilities of the machine the engine would run on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceProfile {
    /// Zero when the amount could not be determined
    pub total_memory_mb: u64,
}

impl DeviceProfile {
    pub fn detect() -> Self {
        let mut system = System::new();
        system.refresh_memory();
        Self {
            total_memory_mb: system.total_memory() / (1024 * 1024),
        }
    }

    /// Reason the engine cannot run here, if any
    pub fn check(&self, config: &EngineConfig) -> Result<(), MediaError> {
        if self.total_memory_mb != 0 && self.total_memory_mb < config.min_memory_mb {
            return Err(MediaError::EngineDisabled(format!(
                "{} MB of memory available, {} MB required",
                self.total_memory_mb, config.min_memory_mb
            )));
        }
        Ok(())
    }
}

/// Engine backed by the system `ffmpeg` binary and a temporary directory
pub struct FfmpegEngine {
    binary: PathBuf,
    workdir: TempDir,
}

impl FfmpegEngine {
    /// Check that the binary runs and create the working directory
    pub async fn load(config: &EngineConfig) -> Result<Self, MediaError> {
        let binary = config.ffmpeg_path.clone();
        let status = Command::new(&binary)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| MediaError::EngineLoad(format!("{}: {}", binary.display(), e)))?;
        if !status.success() {
            return Err(MediaError::EngineLoad(format!(
                "{} -version exited with {}",
                binary.display(),
                status
            )));
        }

        let workdir = tempfile::Builder::new()
            .prefix("filetools-")
            .tempdir()
            .map_err(|e| MediaError::EngineLoad(format!("Failed to create working directory: {}", e)))?;

        info!(binary = %binary.display(), workdir = %workdir.path().display(), "Transcoding engine loaded");
        Ok(Self { binary, workdir })
    }

    pub fn workdir(&self) -> &Path {
        self.workdir.path()
    }

    /// Resolve a working-directory name, rejecting anything that is not a
    /// plain file name
    fn path(&self, name: &str) -> Result<PathBuf, MediaError> {
        let plain = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\']);
        if !plain {
            return Err(MediaError::Io(format!("Invalid working file name: {}", name)));
        }
        Ok(self.workdir.path().join(name))
    }
}

#[async_trait]
impl TranscodeEngine for FfmpegEngine {
    async fn write_file(&self, name: &str, data: &[u8]) -> Result<(), MediaError> {
        tokio::fs::write(self.path(name)?, data)
            .await
            .map_err(|e| MediaError::Io(format!("Failed to write {}: {}", name, e)))
    }

    async fn exec(&self, args: &[String]) -> Result<(), MediaError> {
        debug!(?args, "Running ffmpeg");
        let output = Command::new(&self.binary)
            .current_dir(self.workdir.path())
            .args(["-y", "-hide_banner", "-loglevel", "error"])
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| MediaError::ExecFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = stderr.trim();
            return Err(MediaError::ExecFailed(if message.is_empty() {
                format!("ffmpeg exited with {}", output.status)
            } else {
                message.to_string()
            }));
        }
        Ok(())
    }

    async fn read_file(&self, name: &str) -> Result<Vec<u8>, MediaError> {
        tokio::fs::read(self.path(name)?)
            .await
            .map_err(|e| MediaError::Io(format!("Failed to read {}: {}", name, e)))
    }

    async fn remove_file(&self, name: &str) -> Result<(), MediaError> {
        match tokio::fs::remove_file(self.path(name)?).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MediaError::Io(format!("Failed to remove {}: {}", name, e))),
        }
    }
}

/// Lazily loaded, shared transcoding engine
pub struct MediaRuntime {
    config: EngineConfig,
    device: DeviceProfile,
    engine: OnceCell<Mutex<Box<dyn TranscodeEngine>>>,
}

impl MediaRuntime {
    /// Runtime for this machine; the engine loads on the first job
    pub fn new(config: EngineConfig) -> Self {
        Self::with_device(config, DeviceProfile::detect())
    }

    pub fn with_device(config: EngineConfig, device: DeviceProfile) -> Self {
        Self {
            config,
            device,
            engine: OnceCell::new(),
        }
    }

    /// Runtime around an already loaded engine
    pub fn with_engine(config: EngineConfig, engine: impl TranscodeEngine + 'static) -> Self {
        let engine: Box<dyn TranscodeEngine> = Box::new(engine);
        Self {
            config,
            device: DeviceProfile { total_memory_mb: 0 },
            engine: OnceCell::new_with(Some(Mutex::new(engine))),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_loaded(&self) -> bool {
        self.engine.initialized()
    }

    async fn engine(&self) -> Result<&Mutex<Box<dyn TranscodeEngine>>, MediaError> {
        self.engine
            .get_or_try_init(|| async {
                if let Err(e) = self.device.check(&self.config) {
                    warn!("{}", e);
                    return Err(e);
                }
                let engine: Box<dyn TranscodeEngine> = Box::new(FfmpegEngine::load(&self.config).await?);
                Ok(Mutex::new(engine))
            })
            .await
    }

    /// Run a job: write inputs, execute, read the output, clean up.
    ///
    /// Progress goes 10 (engine ready), 20 (inputs written), 90 (command
    /// finished), 100 (output read).
    pub async fn run(
        &self,
        job: TranscodeJob,
        progress: Option<&ProgressSink>,
    ) -> Result<Blob, MediaError> {
        let engine = self.engine().await?.lock().await;
        report(progress, 10);

        let result = self.run_locked(&**engine, &job, progress).await;

        for name in job
            .inputs
            .iter()
            .map(|input| input.name.as_str())
            .chain(std::iter::once(job.output.as_str()))
        {
            if let Err(e) = engine.remove_file(name).await {
                warn!("Failed to clean up {}: {}", name, e);
            }
        }

        let data = result?;
        report(progress, 100);
        Ok(Blob::new(data, job.mime))
    }

    async fn run_locked(
        &self,
        engine: &dyn TranscodeEngine,
        job: &TranscodeJob,
        progress: Option<&ProgressSink>,
    ) -> Result<Vec<u8>, MediaError> {
        for input in &job.inputs {
            engine.write_file(&input.name, &input.data).await?;
        }
        report(progress, 20);

        match self.config.exec_timeout_secs {
            Some(secs) => tokio::time::timeout(Duration::from_secs(secs), engine.exec(&job.args))
                .await
                .map_err(|_| MediaError::Timeout(secs))??,
            None => engine.exec(&job.args).await?,
        }
        report(progress, 90);

        engine.read_file(&job.output).await
    }
}

impl std::fmt::Debug for MediaRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaRuntime")
            .field("config", &self.config)
            .field("device", &self.device)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex as StdMutex};

    #[derive(Debug, Default)]
    pub struct FakeState {
        pub files: HashMap<String, Vec<u8>>,
        pub written: Vec<String>,
        pub execs: Vec<Vec<String>>,
    }

    /// In-memory engine: `exec` writes the concatenated inputs to the last
    /// argument, which is the output name for every job
    #[derive(Clone, Default)]
    pub struct FakeEngine {
        pub state: Arc<StdMutex<FakeState>>,
        pub fail_with: Option<String>,
        pub delay: Option<Duration>,
    }

    #[async_trait]
    impl TranscodeEngine for FakeEngine {
        async fn write_file(&self, name: &str, data: &[u8]) -> Result<(), MediaError> {
            let mut state = self.state.lock().unwrap();
            state.files.insert(name.to_string(), data.to_vec());
            state.written.push(name.to_string());
            Ok(())
        }

        async fn exec(&self, args: &[String]) -> Result<(), MediaError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(message) = &self.fail_with {
                return Err(MediaError::ExecFailed(message.clone()));
            }
            let mut state = self.state.lock().unwrap();
            state.execs.push(args.to_vec());
            let mut output = Vec::new();
            for pair in args.windows(2).filter(|w| w[0] == "-i") {
                output.extend(state.files.get(&pair[1]).cloned().unwrap_or_default());
            }
            if let Some(name) = args.last() {
                state.files.insert(name.clone(), output);
            }
            Ok(())
        }

        async fn read_file(&self, name: &str) -> Result<Vec<u8>, MediaError> {
            self.state
                .lock()
                .unwrap()
                .files
                .get(name)
                .cloned()
                .ok_or_else(|| MediaError::Io(format!("Failed to read {}", name)))
        }

        async fn remove_file(&self, name: &str) -> Result<(), MediaError> {
            self.state.lock().unwrap().files.remove(name);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::FakeEngine;
    use super::*;
    use crate::media::JobInput;
    use std::sync::{Arc, Mutex as StdMutex};

    fn job() -> TranscodeJob {
        TranscodeJob {
            inputs: vec![JobInput::new("input.mp3", b"abc".to_vec())],
            args: vec!["-i".into(), "input.mp3".into(), "output.mp3".into()],
            output: "output.mp3".into(),
            mime: "audio/mpeg".into(),
        }
    }

    #[tokio::test]
    async fn test_run_reports_progress_and_cleans_up() {
        let engine = FakeEngine::default();
        let state = engine.state.clone();
        let runtime = MediaRuntime::with_engine(EngineConfig::default(), engine);

        let seen = Arc::new(StdMutex::new(Vec::new()));
        let captured = seen.clone();
        let sink = ProgressSink::new(move |p| captured.lock().unwrap().push(p));

        let blob = runtime.run(job(), Some(&sink)).await.unwrap();
        assert_eq!(blob.data, b"abc");
        assert_eq!(blob.mime, "audio/mpeg");
        assert_eq!(*seen.lock().unwrap(), vec![10, 20, 90, 100]);
        assert!(state.lock().unwrap().files.is_empty());
    }

    #[tokio::test]
    async fn test_failed_exec_still_cleans_up() {
        let engine = FakeEngine {
            fail_with: Some("boom".into()),
            ..FakeEngine::default()
        };
        let state = engine.state.clone();
        let runtime = MediaRuntime::with_engine(EngineConfig::default(), engine);

        let err = runtime.run(job(), None).await.unwrap_err();
        assert!(matches!(err, MediaError::ExecFailed(ref m) if m == "boom"));
        assert!(state.lock().unwrap().files.is_empty());
    }

    #[tokio::test]
    async fn test_exec_timeout() {
        let engine = FakeEngine {
            delay: Some(Duration::from_secs(5)),
            ..FakeEngine::default()
        };
        let config = EngineConfig {
            exec_timeout_secs: Some(0),
            ..EngineConfig::default()
        };
        let runtime = MediaRuntime::with_engine(config, engine);
        assert!(matches!(
            runtime.run(job(), None).await,
            Err(MediaError::Timeout(0))
        ));
    }

    #[tokio::test]
    async fn test_low_memory_device_fails_fast() {
        let runtime = MediaRuntime::with_device(
            EngineConfig::default(),
            DeviceProfile {
                total_memory_mb: 1024,
            },
        );
        let err = runtime.run(job(), None).await.unwrap_err();
        assert!(matches!(err, MediaError::EngineDisabled(_)));
        assert!(!runtime.is_loaded());
    }

    #[tokio::test]
    async fn test_missing_binary_is_a_load_error() {
        let config = EngineConfig {
            ffmpeg_path: PathBuf::from("/nonexistent/ffmpeg-binary"),
            min_memory_mb: 0,
            exec_timeout_secs: None,
        };
        let runtime = MediaRuntime::with_device(config, DeviceProfile { total_memory_mb: 0 });
        assert!(matches!(
            runtime.run(job(), None).await,
            Err(MediaError::EngineLoad(_))
        ));
    }

    #[test]
    fn test_unknown_memory_is_allowed() {
        let device = DeviceProfile { total_memory_mb: 0 };
        assert!(device.check(&EngineConfig::default()).is_ok());
    }

    #[test]
    fn test_config_defaults_from_empty_toml() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}
