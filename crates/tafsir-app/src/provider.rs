// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};

use crate::{
    AyahDisplayData, Language, PrefKey, Preferences, ReaderEvent, ReaderRequest, ReaderResponse,
    SearchResult, Surah, SurahId,
};

/// Source of surah metadata and verse text.
pub trait VerseProvider: Send + Sync {
    fn list_chapters(&self) -> Result<Vec<Surah>>;
    fn get_verse(&self, surah: SurahId, ayah: u16) -> Result<AyahDisplayData>;
}

/// Language-model backed search and generation.
pub trait SearchProvider: Send + Sync {
    fn search(&self, query: &str, language: Language, chapters: &[Surah])
    -> Result<Vec<SearchResult>>;
    fn generate_commentary(&self, verse: &AyahDisplayData, language: Language) -> Result<String>;
    fn generate_chapter_overview(
        &self,
        chapter_name: &str,
        chapter_id: SurahId,
        language: Language,
    ) -> Result<String>;
}

pub trait PreferenceStore {
    fn get(&self, key: PrefKey) -> Result<Option<String>>;
    fn set(&self, key: PrefKey, value: &str) -> Result<()>;
}

/// Reads every stored preference over the defaults. A stored value that does
/// not parse is an error rather than a silent fallback.
pub fn read_preferences(store: &dyn PreferenceStore) -> Result<Preferences> {
    let mut preferences = Preferences::default();
    for key in PrefKey::ALL {
        let Some(raw) = store.get(key)? else {
            continue;
        };
        if !preferences.apply_raw(key, &raw) {
            bail!("preference `{}` has invalid value `{raw}`", key.as_str());
        }
    }
    Ok(preferences)
}

/// Writes every `PreferenceChanged` in `events`, stopping at the first failure.
pub fn save_preference_events(store: &dyn PreferenceStore, events: &[ReaderEvent]) -> Result<usize> {
    let mut saved = 0;
    for event in events {
        if let ReaderEvent::PreferenceChanged { key, value } = event {
            store.set(*key, value)?;
            saved += 1;
        }
    }
    Ok(saved)
}

/// Runs one request synchronously against the given providers. Failures are
/// flattened to their display text for the controller's error slot.
pub fn execute_request(
    request: &ReaderRequest,
    chapters: &[Surah],
    corpus: &dyn VerseProvider,
    search: &dyn SearchProvider,
) -> ReaderResponse {
    match request {
        ReaderRequest::Chapters { request_id } => ReaderResponse::Chapters {
            request_id: *request_id,
            result: corpus.list_chapters().map_err(|error| format!("{error:#}")),
        },
        ReaderRequest::Verse {
            request_id,
            position,
        } => ReaderResponse::Verse {
            request_id: *request_id,
            position: *position,
            result: corpus
                .get_verse(position.surah, position.ayah)
                .map_err(|error| format!("{error:#}")),
        },
        ReaderRequest::Search {
            request_id,
            query,
            language,
        } => ReaderResponse::Search {
            request_id: *request_id,
            result: search
                .search(query, *language, chapters)
                .map_err(|error| format!("{error:#}")),
        },
        ReaderRequest::Commentary {
            request_id,
            verse,
            language,
        } => ReaderResponse::Commentary {
            request_id: *request_id,
            result: search
                .generate_commentary(verse, *language)
                .map_err(|error| format!("{error:#}")),
        },
        ReaderRequest::Overview {
            request_id,
            surah,
            name,
            language,
        } => ReaderResponse::Overview {
            request_id: *request_id,
            result: search
                .generate_chapter_overview(name, *surah, *language)
                .map_err(|error| format!("{error:#}")),
        },
    }
}
