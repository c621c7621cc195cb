// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;
use tafsir_app::{
    AyahDisplayData, Language, PrefKey, ReaderRequest, SearchProvider, SearchResult, Surah,
    SurahId, VerseProvider, execute_request,
};
use tafsir_db::Store;
use tafsir_tui::InternalEvent;

/// Runs reader requests on worker threads and persists preferences.
pub struct ServiceRuntime<'a> {
    store: &'a Store,
    corpus: Arc<dyn VerseProvider>,
    search: Arc<dyn SearchProvider>,
}

impl<'a> ServiceRuntime<'a> {
    pub fn new(
        store: &'a Store,
        corpus: Arc<dyn VerseProvider>,
        search: Arc<dyn SearchProvider>,
    ) -> Self {
        Self {
            store,
            corpus,
            search,
        }
    }
}

impl tafsir_tui::AppRuntime for ServiceRuntime<'_> {
    fn spawn_request(
        &mut self,
        request: ReaderRequest,
        chapters: Vec<Surah>,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let corpus = Arc::clone(&self.corpus);
        let search = Arc::clone(&self.search);
        let kind = request.kind();
        thread::Builder::new()
            .name(format!("tafsir-{}", kind.as_str()))
            .spawn(move || {
                let response = execute_request(&request, &chapters, corpus.as_ref(), search.as_ref());
                tracing::debug!(
                    kind = kind.as_str(),
                    request_id = %request.request_id(),
                    "request finished"
                );
                if tx.send(InternalEvent::Response(response)).is_err() {
                    tracing::debug!(kind = kind.as_str(), "ui closed before response arrived");
                }
            })
            .with_context(|| format!("spawn {} worker", kind.as_str()))?;
        Ok(())
    }

    fn save_preference(&mut self, key: PrefKey, value: &str) -> Result<()> {
        self.store.put_raw(key, value)
    }
}

/// Stands in for the language model when `[llm].enabled = false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSearch;

impl DisabledSearch {
    fn unavailable<T>(feature: &str) -> Result<T> {
        bail!(
            "{feature} needs the language model, which is disabled; set [llm].enabled = true in the config and restart"
        )
    }
}

impl SearchProvider for DisabledSearch {
    fn search(
        &self,
        _query: &str,
        _language: Language,
        _chapters: &[Surah],
    ) -> Result<Vec<SearchResult>> {
        Self::unavailable("search")
    }

    fn generate_commentary(
        &self,
        _verse: &AyahDisplayData,
        _language: Language,
    ) -> Result<String> {
        Self::unavailable("commentary")
    }

    fn generate_chapter_overview(
        &self,
        _chapter_name: &str,
        _chapter_id: SurahId,
        _language: Language,
    ) -> Result<String> {
        Self::unavailable("surah overview")
    }
}
