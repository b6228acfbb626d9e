//! # Shader Hot-Reload
//!
//! Watches every program's WGSL file and rebuilds that program's pipelines
//! when the file is saved, without restarting the demo.
//!
//! ```text
//! notify thread ──► mpsc ──► AssetServer::poll (render thread)
//!                              │
//!                              ▼
//!                           Debouncer  path → (kind, last event)
//!                              │  quiet for 100ms
//!                              ▼
//!                    Renderer::reload_shader(kind, source)
//! ```
//!
//! Editors often save by writing a temp file and renaming it over the
//! original, which fires several events in a row. The debouncer collapses
//! each burst into one reload: a new event for a pending path restarts its
//! timer.
//!
//! The watcher is attached to each shader's directory rather than the file,
//! since a rename over the file would orphan a per-file inotify watch.
//! Events are then filtered down to the registered paths.
//!
//! If the watcher cannot be created the demo still runs; shaders just don't
//! reload.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::render::{GpuContext, Renderer, ShaderKind};

/// Quiet time required after the last event before a path reloads.
pub const DEBOUNCE_DURATION: Duration = Duration::from_millis(100);

/// Collapses bursts of events per path into one ready entry.
#[derive(Debug)]
pub struct Debouncer<K> {
    pending: HashMap<PathBuf, (K, Instant)>,
    window: Duration,
}

impl<K: Clone> Debouncer<K> {
    pub fn new(window: Duration) -> Self {
        Self {
            pending: HashMap::new(),
            window,
        }
    }

    /// Record an event for `path` at `now`, restarting its timer.
    pub fn record(&mut self, path: PathBuf, kind: K, now: Instant) {
        self.pending.insert(path, (kind, now));
    }

    /// Remove and return every entry quiet for at least the window.
    pub fn drain_ready(&mut self, now: Instant) -> Vec<(PathBuf, K)> {
        let window = self.window;
        let mut ready = Vec::new();
        self.pending.retain(|path, (kind, last)| {
            if now.saturating_duration_since(*last) >= window {
                ready.push((path.clone(), kind.clone()));
                false
            } else {
                true
            }
        });
        ready
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

/// Whether a filesystem event can mean new file contents. Atomic saves show
/// up as creates.
pub fn is_content_change(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Modify(_) | EventKind::Create(_))
}

/// Filesystem watcher for shader sources.
pub struct AssetServer {
    /// `None` if the watcher failed to start.
    watcher: Option<RecommendedWatcher>,
    rx: mpsc::Receiver<notify::Result<notify::Event>>,
    watched: HashMap<PathBuf, ShaderKind>,
    watched_dirs: HashSet<PathBuf>,
    debouncer: Debouncer<ShaderKind>,
    rx_disconnected: bool,
}

impl AssetServer {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        let watcher = notify::recommended_watcher(move |res| {
            // Receiver gone means the app is shutting down.
            let _ = tx.send(res);
        });
        let watcher = match watcher {
            Ok(w) => Some(w),
            Err(e) => {
                log::warn!("Failed to create file watcher: {e}. Hot-reload disabled.");
                None
            }
        };

        Self {
            watcher,
            rx,
            watched: HashMap::new(),
            watched_dirs: HashSet::new(),
            debouncer: Debouncer::new(DEBOUNCE_DURATION),
            rx_disconnected: false,
        }
    }

    /// Start watching one program's source file.
    pub fn watch(&mut self, path: &Path, kind: ShaderKind) {
        let canonical = match path.canonicalize() {
            Ok(p) => p,
            Err(e) => {
                log::warn!("Cannot watch '{}': {e}", path.display());
                return;
            }
        };

        let dir = canonical.parent().map(Path::to_path_buf).unwrap_or_else(|| canonical.clone());
        if let Some(watcher) = &mut self.watcher {
            if !self.watched_dirs.contains(&dir) {
                if let Err(e) = watcher.watch(&dir, RecursiveMode::NonRecursive) {
                    log::warn!("Failed to watch '{}': {e}", dir.display());
                    return;
                }
                self.watched_dirs.insert(dir);
            }
        }

        log::debug!("Watching '{}' for {:?}", canonical.display(), kind);
        self.watched.insert(canonical, kind);
    }

    /// Drain watcher events into the debouncer.
    fn poll(&mut self) {
        if self.rx_disconnected {
            return;
        }

        loop {
            match self.rx.try_recv() {
                Ok(Ok(event)) if is_content_change(&event.kind) => {
                    let now = Instant::now();
                    for path in &event.paths {
                        let canonical = path.canonicalize().unwrap_or_else(|_| path.clone());
                        if let Some(&kind) = self.watched.get(&canonical) {
                            self.debouncer.record(canonical, kind, now);
                        }
                    }
                }
                Ok(Ok(_)) => {}
                Ok(Err(e)) => log::warn!("File watcher error: {e}"),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    log::warn!("File watcher disconnected. Hot-reload disabled.");
                    self.rx_disconnected = true;
                    break;
                }
            }
        }
    }

    /// Programs whose files changed and have since been quiet.
    pub fn ready(&mut self) -> Vec<(PathBuf, ShaderKind)> {
        self.poll();
        self.debouncer.drain_ready(Instant::now())
    }
}

impl Default for AssetServer {
    fn default() -> Self {
        Self::new()
    }
}

/// Reload every debounced program. Called once per frame before rendering.
pub fn process_shader_reloads(server: &mut AssetServer, renderer: &mut Renderer, gpu: &GpuContext) {
    for (path, kind) in server.ready() {
        let source = match crate::render::shader::load_source(&path) {
            Ok(source) => source,
            Err(e) => {
                log::warn!("Hot-reload failed: {e}");
                continue;
            }
        };

        match renderer.reload_shader(gpu, kind, &source) {
            Ok(()) => log::info!("Hot-reloaded {} shader: {}", kind.name(), path.display()),
            Err(e) => log::warn!("{e}. Keeping old pipeline."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, ModifyKind, RemoveKind};

    fn path(name: &str) -> PathBuf {
        PathBuf::from(format!("/shaders/{name}.wgsl"))
    }

    #[test]
    fn waits_for_quiet_window() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(DEBOUNCE_DURATION);
        d.record(path("object"), ShaderKind::Object, t0);

        assert!(d.drain_ready(t0 + Duration::from_millis(50)).is_empty());
        let ready = d.drain_ready(t0 + DEBOUNCE_DURATION);
        assert_eq!(ready, vec![(path("object"), ShaderKind::Object)]);
        assert_eq!(d.pending(), 0);
    }

    #[test]
    fn burst_collapses_into_one_reload() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(DEBOUNCE_DURATION);
        for ms in [0, 30, 60, 90] {
            d.record(path("lamp"), ShaderKind::Lamp, t0 + Duration::from_millis(ms));
        }

        // 100ms after the first event but only 10ms after the last.
        assert!(d.drain_ready(t0 + Duration::from_millis(100)).is_empty());
        assert_eq!(d.drain_ready(t0 + Duration::from_millis(190)).len(), 1);
        assert!(d.drain_ready(t0 + Duration::from_secs(5)).is_empty(), "reloads once");
    }

    #[test]
    fn paths_debounce_independently() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(DEBOUNCE_DURATION);
        d.record(path("object"), ShaderKind::Object, t0);
        d.record(path("text"), ShaderKind::Text, t0 + Duration::from_millis(80));

        let ready = d.drain_ready(t0 + Duration::from_millis(120));
        assert_eq!(ready, vec![(path("object"), ShaderKind::Object)]);
        assert_eq!(d.pending(), 1);
    }

    #[test]
    fn only_writes_trigger_reload() {
        assert!(is_content_change(&EventKind::Modify(ModifyKind::Any)));
        assert!(is_content_change(&EventKind::Create(CreateKind::File)));
        assert!(!is_content_change(&EventKind::Remove(RemoveKind::File)));
        assert!(!is_content_change(&EventKind::Access(AccessKind::Any)));
    }

    #[test]
    fn watching_missing_file_is_skipped() {
        let mut server = AssetServer::new();
        server.watch(Path::new("/nonexistent/umbra/object.wgsl"), ShaderKind::Object);
        assert!(server.watched.is_empty());
        assert!(server.ready().is_empty());
    }

    #[test]
    fn shaders_in_one_directory_share_a_watch() {
        let dir = std::env::temp_dir().join(format!("umbra-shaders-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let object = dir.join("object.wgsl");
        let lamp = dir.join("lamp.wgsl");
        std::fs::write(&object, "").unwrap();
        std::fs::write(&lamp, "").unwrap();

        let mut server = AssetServer::new();
        server.watch(&object, ShaderKind::Object);
        server.watch(&lamp, ShaderKind::Lamp);
        let canonical_dir = dir.canonicalize().unwrap();
        let has_watcher = server.watcher.is_some();
        let watched = server.watched.len();
        let dirs = server.watched_dirs.clone();
        drop(server);
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(watched, 2);
        if has_watcher {
            assert_eq!(dirs.len(), 1);
            assert!(dirs.contains(&canonical_dir));
        }
    }
}
