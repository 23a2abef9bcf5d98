//! Reference-counted texture cache.
//!
//! Textures are keyed by string id and loaded lazily: scenes call
//! [`TextureCache::request`] during their enter/update phases, which only
//! records the demand, and the frame loop performs the actual GPU uploads
//! once per frame through [`TextureCache::load_pending`]. This keeps every
//! scene method free of renderer handles.
//!
//! Entries carry a reference count, a last-used timestamp, and an estimated
//! byte size. When the configured memory budget is exceeded, unreferenced
//! entries are evicted oldest-first, then entries idle for over a minute,
//! then entries idle for over ten seconds. Preloaded and fallback entries
//! are never evicted. Evicting a still-referenced entry only unloads its
//! texture and queues a reload; the entry and its count survive, so
//! request/release pairs stay balanced across evictions.

use crate::gfx::fallback;
use log::{debug, error, info, warn};
use raylib::prelude::*;
use rustc_hash::FxHashMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Assets larger than this fail validation.
const MAX_ASSET_BYTES: u64 = 50 * 1024 * 1024;

/// Default memory budget when none is configured.
const DEFAULT_BUDGET_BYTES: u64 = 256 * 1024 * 1024;

/// Eviction tier thresholds in seconds of idle time.
const EVICT_IDLE_LONG: f32 = 60.0;
const EVICT_IDLE_SHORT: f32 = 10.0;

/// Result of the most recent load attempt for an entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Demand recorded, no load attempted yet.
    Pending,
    Loaded,
    FileUnavailable,
    ImageDecodeFailed,
    /// The entry could not be admitted under the memory budget.
    BudgetExceeded,
}

struct CacheEntry {
    texture: Option<Texture2D>,
    path: PathBuf,
    refcount: u32,
    last_used: Instant,
    est_bytes: u64,
    preloaded: bool,
    fallback: bool,
    outcome: LoadOutcome,
    /// Load demanded but not yet performed.
    wanted: bool,
}

/// Startup asset audit produced by [`TextureCache::validate_registered`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub valid: Vec<String>,
    pub missing: Vec<String>,
    pub oversized: Vec<String>,
    pub unreadable: Vec<String>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.oversized.is_empty() && self.unreadable.is_empty()
    }
}

pub struct TextureCache {
    entries: FxHashMap<String, CacheEntry>,
    /// Paths to try at first request, left-to-right.
    registered: FxHashMap<String, Vec<PathBuf>>,
    budget_bytes: u64,
    fallbacks_enabled: bool,
}

impl TextureCache {
    pub fn new() -> Self {
        Self {
            entries: FxHashMap::default(),
            registered: FxHashMap::default(),
            budget_bytes: DEFAULT_BUDGET_BYTES,
            fallbacks_enabled: true,
        }
    }

    pub fn set_memory_budget(&mut self, bytes: u64) {
        self.budget_bytes = bytes;
    }

    pub fn set_fallbacks_enabled(&mut self, enabled: bool) {
        self.fallbacks_enabled = enabled;
    }

    /// Declare the path to try when `id` is first requested. Replaces any
    /// earlier registration.
    pub fn register_path(&mut self, id: &str, path: impl Into<PathBuf>) {
        self.registered.insert(id.to_string(), vec![path.into()]);
    }

    /// Declare a chain of paths to try left-to-right, accepting the first
    /// that loads.
    pub fn register_fallback_paths(&mut self, id: &str, paths: Vec<PathBuf>) {
        self.registered.insert(id.to_string(), paths);
    }

    /// Record demand for `id`, bumping its reference count. Returns true
    /// when a texture is already resident or a load is now queued.
    pub fn request(&mut self, id: &str) -> bool {
        let path = self.resolve_path(id);
        self.request_with_path(id, path)
    }

    /// Like [`request`](Self::request) with an explicit path for ids that
    /// were never registered.
    pub fn request_with_path(&mut self, id: &str, path: impl Into<PathBuf>) -> bool {
        let now = Instant::now();
        if let Some(entry) = self.entries.get_mut(id) {
            entry.refcount += 1;
            entry.last_used = now;
            return entry.texture.is_some() || entry.wanted;
        }
        self.entries.insert(
            id.to_string(),
            CacheEntry {
                texture: None,
                path: path.into(),
                refcount: 1,
                last_used: now,
                est_bytes: 0,
                preloaded: false,
                fallback: false,
                outcome: LoadOutcome::Pending,
                wanted: true,
            },
        );
        true
    }

    /// Decrement the reference count. Does not unload immediately; the
    /// entry becomes an eviction candidate once unreferenced.
    pub fn release(&mut self, id: &str) {
        match self.entries.get_mut(id) {
            Some(entry) => entry.refcount = entry.refcount.saturating_sub(1),
            None => warn!("TextureCache: release of unknown id {:?}", id),
        }
    }

    /// Request `id` and pin it against eviction.
    pub fn preload(&mut self, id: &str) {
        self.request(id);
        if let Some(entry) = self.entries.get_mut(id) {
            entry.preloaded = true;
        }
    }

    /// Resident texture for `id`, if loaded.
    pub fn get(&self, id: &str) -> Option<&Texture2D> {
        self.entries.get(id).and_then(|e| e.texture.as_ref())
    }

    /// Width and height of the resident texture for `id`.
    pub fn dimensions(&self, id: &str) -> Option<(f32, f32)> {
        self.get(id).map(|t| (t.width as f32, t.height as f32))
    }

    /// Whether `id` is currently served by a procedural fallback.
    pub fn is_fallback(&self, id: &str) -> bool {
        self.entries.get(id).is_some_and(|e| e.fallback)
    }

    pub fn outcome(&self, id: &str) -> Option<LoadOutcome> {
        self.entries.get(id).map(|e| e.outcome)
    }

    pub fn refcount(&self, id: &str) -> u32 {
        self.entries.get(id).map_or(0, |e| e.refcount)
    }

    pub fn resident_count(&self) -> usize {
        self.entries.values().filter(|e| e.texture.is_some()).count()
    }

    pub fn total_estimated_bytes(&self) -> u64 {
        self.entries.values().map(|e| e.est_bytes).sum()
    }

    /// Perform all queued loads. Call once per frame from the frame loop,
    /// outside any drawing scope.
    pub fn load_pending(&mut self, rl: &mut RaylibHandle, th: &RaylibThread) {
        let pending: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, e)| e.wanted && e.texture.is_none())
            .map(|(id, _)| id.clone())
            .collect();
        for id in pending {
            self.load_one(rl, th, &id);
            self.enforce_budget_for(&id);
        }
    }

    fn load_one(&mut self, rl: &mut RaylibHandle, th: &RaylibThread, id: &str) {
        let candidates: Vec<PathBuf> = {
            let Some(entry) = self.entries.get(id) else {
                return;
            };
            let mut paths = vec![entry.path.clone()];
            if let Some(registered) = self.registered.get(id) {
                for p in registered {
                    if !paths.contains(p) {
                        paths.push(p.clone());
                    }
                }
            }
            paths
        };

        let mut outcome = LoadOutcome::FileUnavailable;
        let mut loaded: Option<(Texture2D, PathBuf)> = None;
        for path in &candidates {
            if !path.is_file() {
                continue;
            }
            match rl.load_texture(th, &path.to_string_lossy()) {
                Ok(texture) => {
                    loaded = Some((texture, path.clone()));
                    break;
                }
                Err(e) => {
                    warn!("TextureCache: decode failed for {:?}: {}", path, e);
                    outcome = LoadOutcome::ImageDecodeFailed;
                }
            }
        }

        let Some(entry) = self.entries.get_mut(id) else {
            return;
        };
        entry.wanted = false;
        entry.last_used = Instant::now();
        match loaded {
            Some((texture, path)) => {
                entry.est_bytes = (texture.width as u64) * (texture.height as u64) * 4;
                entry.texture = Some(texture);
                entry.path = path;
                entry.outcome = LoadOutcome::Loaded;
                entry.fallback = false;
                debug!("TextureCache: loaded {:?} ({} bytes)", id, entry.est_bytes);
            }
            None => {
                entry.outcome = outcome;
                if self.fallbacks_enabled {
                    let image = fallback::generate_image(id);
                    match rl.load_texture_from_image(th, &image) {
                        Ok(texture) => {
                            entry.texture = Some(texture);
                            entry.est_bytes = fallback::estimated_bytes();
                            entry.fallback = true;
                            warn!("TextureCache: serving fallback for {:?}", id);
                        }
                        Err(e) => {
                            error!("TextureCache: fallback upload failed for {:?}: {}", id, e)
                        }
                    }
                } else {
                    warn!("TextureCache: no texture for {:?} ({:?})", id, outcome);
                }
            }
        }
    }

    /// Evict until under budget after admitting `new_id`. If eviction
    /// cannot make room, the new entry itself is dropped.
    fn enforce_budget_for(&mut self, new_id: &str) {
        if !self.enforce_budget() {
            if let Some(entry) = self.entries.get_mut(new_id) {
                if entry.texture.is_some() && !entry.fallback {
                    error!(
                        "TextureCache: budget exhausted, not admitting {:?}",
                        new_id
                    );
                    entry.texture = None;
                    entry.est_bytes = 0;
                    entry.outcome = LoadOutcome::BudgetExceeded;
                }
            }
        }
    }

    /// Evict entries until total estimated bytes fit the budget. Returns
    /// true when under budget.
    pub fn enforce_budget(&mut self) -> bool {
        let now = Instant::now();
        while self.total_estimated_bytes() > self.budget_bytes {
            let metas: Vec<EvictMeta> = self
                .entries
                .iter()
                .filter(|(_, e)| e.texture.is_some())
                .map(|(id, e)| EvictMeta {
                    id: id.clone(),
                    refcount: e.refcount,
                    idle_secs: now.duration_since(e.last_used).as_secs_f32(),
                    preloaded: e.preloaded,
                    fallback: e.fallback,
                })
                .collect();
            let Some(victim) = select_eviction(&metas) else {
                return false;
            };
            info!("TextureCache: evicting {:?}", victim);
            self.evict_id(&victim);
        }
        true
    }

    /// Unload the texture for `id`, keeping the entry (and its reference
    /// count) intact while references are outstanding. Referenced victims
    /// are re-queued so the next [`load_pending`](Self::load_pending)
    /// restores them; unreferenced ones are dropped entirely.
    fn evict_id(&mut self, id: &str) {
        let Some(entry) = self.entries.get_mut(id) else {
            return;
        };
        entry.texture = None;
        entry.est_bytes = 0;
        entry.outcome = LoadOutcome::Pending;
        if entry.refcount > 0 {
            entry.wanted = true;
        } else {
            self.entries.remove(id);
        }
    }

    #[cfg(test)]
    fn entry_mut(&mut self, id: &str) -> Option<&mut CacheEntry> {
        self.entries.get_mut(id)
    }

    /// Audit every registered id: does a path resolve to a readable image
    /// file of acceptable size?
    pub fn validate_registered(&self) -> ValidationReport {
        let mut report = ValidationReport::default();
        let mut ids: Vec<&String> = self.registered.keys().collect();
        ids.sort();
        for id in ids {
            let paths = &self.registered[id];
            let status = paths
                .iter()
                .map(|p| validate_file(p))
                .reduce(|best, next| {
                    // First usable path wins; otherwise keep the best diagnosis.
                    if best == FileStatus::Valid { best } else { next.max(best) }
                })
                .unwrap_or(FileStatus::Missing);
            match status {
                FileStatus::Valid => report.valid.push(id.clone()),
                FileStatus::Missing => report.missing.push(id.clone()),
                FileStatus::Oversized => report.oversized.push(id.clone()),
                FileStatus::Unreadable => report.unreadable.push(id.clone()),
            }
        }
        report
    }

    fn resolve_path(&self, id: &str) -> PathBuf {
        self.registered
            .get(id)
            .and_then(|paths| paths.first().cloned())
            .unwrap_or_else(|| PathBuf::from(id))
    }
}

impl Default for TextureCache {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum FileStatus {
    Missing,
    Unreadable,
    Oversized,
    Valid,
}

fn validate_file(path: &Path) -> FileStatus {
    let Ok(meta) = fs::metadata(path) else {
        return FileStatus::Missing;
    };
    if !meta.is_file() {
        return FileStatus::Missing;
    }
    if meta.len() > MAX_ASSET_BYTES {
        return FileStatus::Oversized;
    }
    let mut header = [0u8; 8];
    let Ok(mut file) = fs::File::open(path) else {
        return FileStatus::Unreadable;
    };
    let Ok(n) = file.read(&mut header) else {
        return FileStatus::Unreadable;
    };
    if sniff_image_header(&header[..n]) {
        FileStatus::Valid
    } else {
        FileStatus::Unreadable
    }
}

/// Recognize PNG, JPEG, BMP, and GIF magic bytes.
fn sniff_image_header(header: &[u8]) -> bool {
    header.starts_with(&[0x89, b'P', b'N', b'G'])
        || header.starts_with(&[0xFF, 0xD8, 0xFF])
        || header.starts_with(b"BM")
        || header.starts_with(b"GIF8")
}

struct EvictMeta {
    id: String,
    refcount: u32,
    idle_secs: f32,
    preloaded: bool,
    fallback: bool,
}

/// Pick the next eviction victim, or None when nothing is evictable.
///
/// Tier 1: unreferenced entries, oldest idle first. Tier 2: entries idle
/// longer than a minute. Tier 3: entries idle longer than ten seconds.
/// Preloaded and fallback entries are exempt.
fn select_eviction(metas: &[EvictMeta]) -> Option<String> {
    let eligible = |m: &&EvictMeta| !m.preloaded && !m.fallback;
    let oldest = |filter: &dyn Fn(&EvictMeta) -> bool| -> Option<&EvictMeta> {
        metas
            .iter()
            .filter(eligible)
            .filter(|m| filter(m))
            .max_by(|a, b| a.idle_secs.total_cmp(&b.idle_secs))
    };
    let victim = oldest(&|m| m.refcount == 0)
        .or_else(|| oldest(&|m| m.idle_secs > EVICT_IDLE_LONG))
        .or_else(|| oldest(&|m| m.idle_secs > EVICT_IDLE_SHORT))?;
    Some(victim.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn meta(id: &str, refcount: u32, idle: f32) -> EvictMeta {
        EvictMeta {
            id: id.to_string(),
            refcount,
            idle_secs: idle,
            preloaded: false,
            fallback: false,
        }
    }

    // ==================== REQUEST / RELEASE BOOKKEEPING ====================

    #[test]
    fn test_request_creates_pending_entry() {
        let mut cache = TextureCache::new();
        assert!(cache.request_with_path("agumon", "assets/sprites/agumon_sheet.png"));
        assert_eq!(cache.refcount("agumon"), 1);
        assert_eq!(cache.outcome("agumon"), Some(LoadOutcome::Pending));
        assert!(cache.get("agumon").is_none());
    }

    #[test]
    fn test_repeat_requests_bump_refcount() {
        let mut cache = TextureCache::new();
        cache.request_with_path("x", "x.png");
        cache.request_with_path("x", "x.png");
        cache.request_with_path("x", "x.png");
        assert_eq!(cache.refcount("x"), 3);
    }

    #[test]
    fn test_release_decrements_and_saturates() {
        let mut cache = TextureCache::new();
        cache.request_with_path("x", "x.png");
        cache.release("x");
        assert_eq!(cache.refcount("x"), 0);
        cache.release("x");
        assert_eq!(cache.refcount("x"), 0);
    }

    #[test]
    fn test_request_uses_registered_path() {
        let mut cache = TextureCache::new();
        cache.register_path("agumon", "assets/sprites/agumon_sheet.png");
        cache.request("agumon");
        assert_eq!(cache.refcount("agumon"), 1);
    }

    // ==================== EVICTION TIERS ====================

    #[test]
    fn test_eviction_prefers_unreferenced_oldest() {
        let metas = vec![meta("a", 0, 5.0), meta("b", 0, 50.0), meta("c", 2, 500.0)];
        assert_eq!(select_eviction(&metas), Some("b".to_string()));
    }

    #[test]
    fn test_eviction_second_tier_referenced_but_stale() {
        let metas = vec![meta("a", 1, 120.0), meta("b", 1, 70.0), meta("c", 1, 5.0)];
        assert_eq!(select_eviction(&metas), Some("a".to_string()));
    }

    #[test]
    fn test_eviction_third_tier() {
        let metas = vec![meta("a", 1, 15.0), meta("b", 1, 11.0), meta("c", 1, 5.0)];
        assert_eq!(select_eviction(&metas), Some("a".to_string()));
    }

    #[test]
    fn test_eviction_exempts_preloaded_and_fallback() {
        let mut a = meta("a", 0, 100.0);
        a.preloaded = true;
        let mut b = meta("b", 0, 100.0);
        b.fallback = true;
        assert_eq!(select_eviction(&[a, b]), None);
    }

    #[test]
    fn test_eviction_none_when_all_busy_and_fresh() {
        let metas = vec![meta("a", 1, 2.0), meta("b", 3, 1.0)];
        assert_eq!(select_eviction(&metas), None);
    }

    #[test]
    fn test_evicting_referenced_entry_keeps_count_and_requeues() {
        let mut cache = TextureCache::new();
        cache.request_with_path("layer", "layer.png");
        {
            let entry = cache.entry_mut("layer").unwrap();
            entry.wanted = false;
            entry.est_bytes = 1024;
            entry.outcome = LoadOutcome::Loaded;
        }
        cache.evict_id("layer");
        assert_eq!(cache.refcount("layer"), 1);
        assert_eq!(cache.total_estimated_bytes(), 0);
        assert_eq!(cache.outcome("layer"), Some(LoadOutcome::Pending));
        assert!(cache.entry_mut("layer").unwrap().wanted);
        // The holder's eventual release still finds the entry.
        cache.release("layer");
        assert_eq!(cache.refcount("layer"), 0);
    }

    #[test]
    fn test_evicting_unreferenced_entry_drops_it() {
        let mut cache = TextureCache::new();
        cache.request_with_path("old", "old.png");
        cache.release("old");
        cache.evict_id("old");
        assert_eq!(cache.outcome("old"), None);
    }

    // ==================== VALIDATION ====================

    #[test]
    fn test_sniff_image_headers() {
        assert!(sniff_image_header(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A]));
        assert!(sniff_image_header(&[0xFF, 0xD8, 0xFF, 0xE0]));
        assert!(sniff_image_header(b"BM\x00\x00"));
        assert!(sniff_image_header(b"GIF89a"));
        assert!(!sniff_image_header(b"RIFF"));
        assert!(!sniff_image_header(b""));
    }

    #[test]
    fn test_validate_registered_classifies() {
        let dir = std::env::temp_dir().join("digivice_cache_test");
        std::fs::create_dir_all(&dir).unwrap();
        let png = dir.join("ok.png");
        let mut f = std::fs::File::create(&png).unwrap();
        f.write_all(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]).unwrap();
        let junk = dir.join("junk.png");
        std::fs::File::create(&junk)
            .unwrap()
            .write_all(b"not an image")
            .unwrap();

        let mut cache = TextureCache::new();
        cache.register_path("good", &png);
        cache.register_path("junk", &junk);
        cache.register_path("gone", dir.join("missing.png"));

        let report = cache.validate_registered();
        assert_eq!(report.valid, vec!["good".to_string()]);
        assert_eq!(report.missing, vec!["gone".to_string()]);
        assert_eq!(report.unreadable, vec!["junk".to_string()]);
        assert!(!report.is_clean());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_fallback_chain_first_valid_wins() {
        let dir = std::env::temp_dir().join("digivice_cache_chain_test");
        std::fs::create_dir_all(&dir).unwrap();
        let png = dir.join("alt.png");
        std::fs::File::create(&png)
            .unwrap()
            .write_all(&[0x89, b'P', b'N', b'G'])
            .unwrap();

        let mut cache = TextureCache::new();
        cache.register_fallback_paths(
            "layered",
            vec![dir.join("missing.png"), png.clone()],
        );
        let report = cache.validate_registered();
        assert_eq!(report.valid, vec!["layered".to_string()]);

        std::fs::remove_dir_all(&dir).ok();
    }
}
