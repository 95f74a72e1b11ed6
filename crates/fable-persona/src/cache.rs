// SPDX-FileCopyrightText: 2026 Fable Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content-addressed persona cache.
//!
//! A persona is keyed by a SHA-256 digest over the cache schema version, the
//! corpus summaries, the description targets, and the character name. Any
//! change to those inputs yields a new key, and a file under an existing key
//! that fails to parse is reported as corruption rather than regenerated.
//! Generation for one key is serialized so concurrent callers never pay for
//! the same persona twice.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use fable_core::{FableError, Persona};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{sanitize_file_name, storage_err, write_atomic};

/// Bumped whenever the persisted layout or the key inputs change.
pub const CACHE_SCHEMA_VERSION: u32 = 1;

/// Hex characters of the key kept in the artifact file name.
pub(crate) const KEY_PREFIX_LEN: usize = 16;

/// Digest of an ordered summary sequence. Length-prefixed so that
/// `["ab", "c"]` and `["a", "bc"]` differ.
pub fn corpus_digest(summaries: &[String]) -> String {
    let mut hasher = Sha256::new();
    for summary in summaries {
        hasher.update((summary.len() as u64).to_le_bytes());
        hasher.update(summary.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Everything a cached persona depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonaKey {
    pub corpus_digest: String,
    pub name: String,
    pub short_target: usize,
    pub long_target: usize,
}

impl PersonaKey {
    pub fn new(summaries: &[String], name: &str, short_target: usize, long_target: usize) -> Self {
        Self {
            corpus_digest: corpus_digest(summaries),
            name: name.to_string(),
            short_target,
            long_target,
        }
    }

    /// Hex SHA-256 over all key inputs.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(CACHE_SCHEMA_VERSION.to_le_bytes());
        hasher.update(self.corpus_digest.as_bytes());
        hasher.update((self.short_target as u64).to_le_bytes());
        hasher.update((self.long_target as u64).to_le_bytes());
        hasher.update((self.name.len() as u64).to_le_bytes());
        hasher.update(self.name.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// `<sanitized-name>-<key prefix>.v<schema>.json`
    pub fn file_name(&self) -> String {
        let digest = self.digest();
        format!(
            "{}-{}.v{CACHE_SCHEMA_VERSION}.json",
            sanitize_file_name(&self.name),
            &digest[..KEY_PREFIX_LEN]
        )
    }
}

/// Persona artifacts stored under one directory.
pub struct PersonaCache {
    dir: PathBuf,
    in_flight: DashMap<String, Arc<Mutex<()>>>,
}

impl PersonaCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            in_flight: DashMap::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &PersonaKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Read a cached persona. `Ok(None)` means nothing is cached under `key`.
    pub async fn load(&self, key: &PersonaKey) -> Result<Option<Persona>, FableError> {
        let path = self.path_for(key);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage_err(e)),
        };

        let persona: Persona =
            serde_json::from_str(&raw).map_err(|e| FableError::CacheCorruption {
                path: path.clone(),
                message: e.to_string(),
            })?;
        if persona.name != key.name {
            return Err(FableError::CacheCorruption {
                path,
                message: format!("artifact is for {:?}, expected {:?}", persona.name, key.name),
            });
        }
        Ok(Some(persona))
    }

    /// Persist `persona` atomically under `key`.
    pub async fn store(&self, key: &PersonaKey, persona: &Persona) -> Result<PathBuf, FableError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(storage_err)?;
        let path = self.path_for(key);
        let json = serde_json::to_string_pretty(persona)
            .map_err(|e| FableError::Internal(e.to_string()))?;
        write_atomic(&path, json.as_bytes())?;
        debug!(path = %path.display(), persona = %persona.name, "stored persona");
        Ok(path)
    }

    /// Return the cached persona for `key`, generating and storing it first
    /// when absent or when `force_refresh` is set.
    ///
    /// At most one generation per key runs at a time; callers waiting on the
    /// same key observe the stored result. The per-key lock is dropped from
    /// the map once no other caller holds it.
    pub async fn get_or_generate<F, Fut>(
        &self,
        key: &PersonaKey,
        force_refresh: bool,
        generate: F,
    ) -> Result<Persona, FableError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Persona, FableError>>,
    {
        let digest = key.digest();
        let lock = self
            .in_flight
            .entry(digest.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let outcome = {
            let _guard = lock.lock().await;
            self.load_or_generate(key, &digest, force_refresh, generate)
                .await
        };
        drop(lock);
        self.in_flight
            .remove_if(&digest, |_, held| Arc::strong_count(held) == 1);
        outcome
    }

    async fn load_or_generate<F, Fut>(
        &self,
        key: &PersonaKey,
        digest: &str,
        force_refresh: bool,
        generate: F,
    ) -> Result<Persona, FableError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Persona, FableError>>,
    {
        if !force_refresh && let Some(persona) = self.load(key).await? {
            info!(persona = %key.name, key = &digest[..KEY_PREFIX_LEN], "persona cache hit");
            return Ok(persona);
        }

        info!(persona = %key.name, force_refresh, "generating persona for cache");
        let persona = generate().await?;
        self.store(key, &persona).await?;
        Ok(persona)
    }

    #[cfg(test)]
    fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn nick() -> Persona {
        Persona {
            name: "Nick".into(),
            short_description: "I am Nick, who loves lakes and soccer with Eliza.".into(),
            long_description: "I am Nick. ".repeat(40),
            greeting: "Hey there, I'm Nick!".into(),
        }
    }

    fn key(name: &str) -> PersonaKey {
        PersonaKey::new(&["Nick meets Eliza at the lake.".into()], name, 50, 500)
    }

    #[test]
    fn key_changes_with_every_input() {
        let base = key("Nick");
        let digests = [
            base.digest(),
            key("Eliza").digest(),
            PersonaKey { short_target: 60, ..base.clone() }.digest(),
            PersonaKey { long_target: 600, ..base.clone() }.digest(),
            PersonaKey::new(&["Another corpus.".into()], "Nick", 50, 500).digest(),
        ];
        for (i, a) in digests.iter().enumerate() {
            for b in &digests[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(base.digest(), key("Nick").digest());
    }

    #[test]
    fn corpus_digest_respects_boundaries() {
        assert_ne!(
            corpus_digest(&["ab".into(), "c".into()]),
            corpus_digest(&["a".into(), "bc".into()])
        );
    }

    #[test]
    fn file_name_is_sanitized_and_versioned() {
        let name = key("Jay Gatsby (narrator)").file_name();
        assert!(name.starts_with("Jay_Gatsby_-narrator--"));
        assert!(name.ends_with(".v1.json"));
    }

    #[tokio::test]
    async fn cached_persona_round_trips_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PersonaCache::new(dir.path());
        let generated = cache
            .get_or_generate(&key("Nick"), false, || async { Ok(nick()) })
            .await
            .unwrap();
        let loaded = cache.load(&key("Nick")).await.unwrap().unwrap();
        assert_eq!(generated, loaded);

        let raw = std::fs::read_to_string(cache.path_for(&key("Nick"))).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let mut fields: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        fields.sort();
        assert_eq!(
            fields,
            vec!["greeting", "long_description", "name", "short_description"]
        );
    }

    #[tokio::test]
    async fn hit_skips_generation_and_refresh_regenerates() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PersonaCache::new(dir.path());
        let calls = &AtomicUsize::new(0);
        let generate = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(nick())
        };

        cache.get_or_generate(&key("Nick"), false, generate).await.unwrap();
        cache.get_or_generate(&key("Nick"), false, generate).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        cache.get_or_generate(&key("Nick"), true, generate).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn corrupt_artifact_fails_loudly_and_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PersonaCache::new(dir.path());
        let path = cache.path_for(&key("Nick"));
        std::fs::write(&path, r#"{"name": "Nick", "greeting": "hi"}"#).unwrap();

        let err = cache
            .get_or_generate(&key("Nick"), false, || async { Ok(nick()) })
            .await
            .unwrap_err();
        assert!(matches!(err, FableError::CacheCorruption { .. }));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            r#"{"name": "Nick", "greeting": "hi"}"#
        );
    }

    #[tokio::test]
    async fn extra_fields_are_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PersonaCache::new(dir.path());
        let mut value = serde_json::to_value(nick()).unwrap();
        value["mood"] = serde_json::json!("sunny");
        std::fs::write(cache.path_for(&key("Nick")), value.to_string()).unwrap();
        assert!(matches!(
            cache.load(&key("Nick")).await,
            Err(FableError::CacheCorruption { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_generate_once() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(PersonaCache::new(dir.path()));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_generate(&key("Nick"), false, || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::task::yield_now().await;
                        Ok(nick())
                    })
                    .await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), nick());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.in_flight_len(), 0);
    }

    #[tokio::test]
    async fn key_locks_are_released_after_use() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PersonaCache::new(dir.path());

        cache
            .get_or_generate(&key("Nick"), false, || async { Ok(nick()) })
            .await
            .unwrap();
        assert_eq!(cache.in_flight_len(), 0);

        let err = cache
            .get_or_generate(&key("Eliza"), false, || async {
                Err(FableError::Completion {
                    message: "quota exceeded".into(),
                    source: None,
                })
            })
            .await
            .unwrap_err();
        assert!(matches!(err, FableError::Completion { .. }));
        assert_eq!(cache.in_flight_len(), 0);
    }
}
