// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{
    AyahDisplayData, ErrorBanner, ErrorKind, Language, PerKind, Point, PrefKey, Preferences,
    RequestId, RequestKind, SearchResult, Surah, SurahId, Swipe, VersePosition, ViewMode,
    interpret_gesture,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    Commentary,
    Overview,
    Settings,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReaderState {
    pub mode: ViewMode,
    pub chapters: Vec<Surah>,
    pub current_surah: Option<Surah>,
    pub current_ayah: u16,
    pub verse: Option<AyahDisplayData>,
    pub search_query: String,
    pub search_results: Vec<SearchResult>,
    pub overlay: Option<Overlay>,
    pub commentary: Option<String>,
    pub overview: Option<String>,
    pub preferences: Preferences,
    pub error: Option<ErrorBanner>,
    loading: PerKind<bool>,
    latest: PerKind<RequestId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReaderCommand {
    LoadChapters,
    GoToVerse { surah: SurahId, ayah: u16 },
    Advance,
    Retreat,
    JumpTo(String),
    Gesture { start: Point, end: Point },
    SetMode(ViewMode),
    ToggleMode,
    SelectSearchResult { surah: SurahId, ayah: u16 },
    SelectChapter(Surah),
    Search(String),
    RequestCommentary,
    RequestOverview,
    OpenSettings,
    CloseOverlay,
    DismissError,
    CycleTheme,
    AdjustArabicFont(i8),
    AdjustTranslationFont(i8),
    ToggleLanguage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderRequest {
    Chapters {
        request_id: RequestId,
    },
    Verse {
        request_id: RequestId,
        position: VersePosition,
    },
    Search {
        request_id: RequestId,
        query: String,
        language: Language,
    },
    Commentary {
        request_id: RequestId,
        verse: Box<AyahDisplayData>,
        language: Language,
    },
    Overview {
        request_id: RequestId,
        surah: SurahId,
        name: String,
        language: Language,
    },
}

impl ReaderRequest {
    pub const fn kind(&self) -> RequestKind {
        match self {
            Self::Chapters { .. } => RequestKind::Chapters,
            Self::Verse { .. } => RequestKind::Verse,
            Self::Search { .. } => RequestKind::Search,
            Self::Commentary { .. } => RequestKind::Commentary,
            Self::Overview { .. } => RequestKind::Overview,
        }
    }

    pub const fn request_id(&self) -> RequestId {
        match self {
            Self::Chapters { request_id }
            | Self::Verse { request_id, .. }
            | Self::Search { request_id, .. }
            | Self::Commentary { request_id, .. }
            | Self::Overview { request_id, .. } => *request_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReaderResponse {
    Chapters {
        request_id: RequestId,
        result: Result<Vec<Surah>, String>,
    },
    Verse {
        request_id: RequestId,
        position: VersePosition,
        result: Result<AyahDisplayData, String>,
    },
    Search {
        request_id: RequestId,
        result: Result<Vec<SearchResult>, String>,
    },
    Commentary {
        request_id: RequestId,
        result: Result<String, String>,
    },
    Overview {
        request_id: RequestId,
        result: Result<String, String>,
    },
}

impl ReaderResponse {
    pub const fn kind(&self) -> RequestKind {
        match self {
            Self::Chapters { .. } => RequestKind::Chapters,
            Self::Verse { .. } => RequestKind::Verse,
            Self::Search { .. } => RequestKind::Search,
            Self::Commentary { .. } => RequestKind::Commentary,
            Self::Overview { .. } => RequestKind::Overview,
        }
    }

    pub const fn request_id(&self) -> RequestId {
        match self {
            Self::Chapters { request_id, .. }
            | Self::Verse { request_id, .. }
            | Self::Search { request_id, .. }
            | Self::Commentary { request_id, .. }
            | Self::Overview { request_id, .. } => *request_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReaderEvent {
    ModeChanged(ViewMode),
    Requested(ReaderRequest),
    ChaptersLoaded(usize),
    VerseChanged(VersePosition),
    ScrollToTop,
    SearchResultsUpdated(usize),
    OverlayChanged(Option<Overlay>),
    GeneratedTextReady(RequestKind),
    ErrorRaised(ErrorBanner),
    ErrorCleared,
    PreferenceChanged { key: PrefKey, value: String },
    /// A response arrived after a newer request of the same kind was issued.
    /// It is still applied.
    StaleResponse {
        kind: RequestKind,
        request_id: RequestId,
        latest: RequestId,
    },
}

impl ReaderState {
    pub fn new(preferences: Preferences) -> Self {
        Self {
            preferences,
            ..Self::default()
        }
    }

    pub fn is_loading(&self, kind: RequestKind) -> bool {
        self.loading.get(kind)
    }

    pub fn latest_request(&self, kind: RequestKind) -> RequestId {
        self.latest.get(kind)
    }

    pub fn position(&self) -> Option<VersePosition> {
        self.current_surah
            .as_ref()
            .map(|surah| VersePosition::new(surah.id, self.current_ayah))
    }

    pub fn chapter(&self, id: SurahId) -> Option<&Surah> {
        self.chapters.iter().find(|surah| surah.id == id)
    }

    pub fn dispatch(&mut self, command: ReaderCommand) -> Vec<ReaderEvent> {
        match command {
            ReaderCommand::LoadChapters => {
                let request_id = self.issue(RequestKind::Chapters);
                vec![ReaderEvent::Requested(ReaderRequest::Chapters { request_id })]
            }
            ReaderCommand::GoToVerse { surah, ayah } => self.go_to_verse(surah, ayah),
            ReaderCommand::Advance => self.advance(),
            ReaderCommand::Retreat => self.retreat(),
            ReaderCommand::JumpTo(raw) => self.jump_to(&raw),
            ReaderCommand::Gesture { start, end } => match interpret_gesture(start, end) {
                Some(Swipe::Advance) => self.advance(),
                Some(Swipe::Retreat) => self.retreat(),
                None => Vec::new(),
            },
            ReaderCommand::SetMode(mode) => self.set_mode(mode),
            ReaderCommand::ToggleMode => self.set_mode(self.mode.toggled()),
            ReaderCommand::SelectSearchResult { surah, ayah } => {
                let mut events = self.set_mode(ViewMode::Reader);
                events.extend(self.go_to_verse(surah, ayah));
                events
            }
            ReaderCommand::SelectChapter(surah) => self.select_chapter(surah),
            ReaderCommand::Search(query) => self.search(query),
            ReaderCommand::RequestCommentary => self.request_commentary(),
            ReaderCommand::RequestOverview => self.request_overview(),
            ReaderCommand::OpenSettings => self.set_overlay(Some(Overlay::Settings)),
            ReaderCommand::CloseOverlay => self.set_overlay(None),
            ReaderCommand::DismissError => {
                if self.error.take().is_some() {
                    vec![ReaderEvent::ErrorCleared]
                } else {
                    Vec::new()
                }
            }
            ReaderCommand::CycleTheme => {
                self.preferences.theme = self.preferences.theme.next();
                vec![self.preference_event(PrefKey::Theme)]
            }
            ReaderCommand::AdjustArabicFont(delta) => {
                let next = self.preferences.arabic_font_size.step(delta);
                if next == self.preferences.arabic_font_size {
                    return Vec::new();
                }
                self.preferences.arabic_font_size = next;
                vec![self.preference_event(PrefKey::ArabicFontSize)]
            }
            ReaderCommand::AdjustTranslationFont(delta) => {
                let next = self.preferences.translation_font_size.step(delta);
                if next == self.preferences.translation_font_size {
                    return Vec::new();
                }
                self.preferences.translation_font_size = next;
                vec![self.preference_event(PrefKey::TranslationFontSize)]
            }
            ReaderCommand::ToggleLanguage => {
                self.preferences.language = self.preferences.language.toggled();
                vec![self.preference_event(PrefKey::Language)]
            }
        }
    }

    /// Applies a provider outcome. Responses are applied in arrival order,
    /// so the last one to resolve wins even if it was requested first.
    pub fn apply(&mut self, response: ReaderResponse) -> Vec<ReaderEvent> {
        let kind = response.kind();
        let request_id = response.request_id();
        let latest = self.latest.get(kind);

        let mut events = Vec::new();
        if request_id < latest {
            events.push(ReaderEvent::StaleResponse {
                kind,
                request_id,
                latest,
            });
        } else {
            self.loading.set(kind, false);
        }

        match response {
            ReaderResponse::Chapters { result, .. } => match result {
                Ok(chapters) => {
                    self.chapters = chapters;
                    events.push(ReaderEvent::ChaptersLoaded(self.chapters.len()));
                    events.extend(self.clear_error_for(kind));
                }
                Err(detail) => events.push(self.raise(ErrorKind::Load, detail)),
            },
            ReaderResponse::Verse {
                position, result, ..
            } => match result {
                Ok(record) => {
                    let tracked = self.current_surah.as_ref().map(|surah| surah.id);
                    if tracked != Some(position.surah) {
                        self.current_surah = self.chapter(position.surah).cloned();
                    }
                    self.current_ayah = position.ayah;
                    self.verse = Some(record);
                    events.push(ReaderEvent::VerseChanged(position));
                    events.push(ReaderEvent::ScrollToTop);
                    events.extend(self.clear_error_for(kind));
                }
                Err(detail) => {
                    events.push(self.raise(ErrorKind::Navigation, format!("{position}: {detail}")))
                }
            },
            ReaderResponse::Search { result, .. } => match result {
                Ok(results) => {
                    self.search_results = results
                        .into_iter()
                        .filter(|result| self.is_valid_position(result.position))
                        .collect();
                    events.push(ReaderEvent::SearchResultsUpdated(self.search_results.len()));
                    events.extend(self.clear_error_for(kind));
                    if self.search_results.is_empty() {
                        let query = self.search_query.clone();
                        events.push(self.raise(ErrorKind::NoResults, query));
                    }
                }
                Err(detail) => events.push(self.raise(ErrorKind::Search, detail)),
            },
            ReaderResponse::Commentary { result, .. } => {
                events.extend(self.apply_generated(kind, Overlay::Commentary, result));
            }
            ReaderResponse::Overview { result, .. } => {
                events.extend(self.apply_generated(kind, Overlay::Overview, result));
            }
        }
        events
    }

    fn go_to_verse(&mut self, surah: SurahId, ayah: u16) -> Vec<ReaderEvent> {
        let Some(chapter) = self.chapter(surah) else {
            return vec![self.raise(
                ErrorKind::Navigation,
                format!("surah {surah} is not loaded"),
            )];
        };
        if !chapter.contains_ayah(ayah) {
            let verse_count = chapter.verse_count;
            return vec![self.raise(
                ErrorKind::Navigation,
                format!("{surah}:{ayah} does not exist; surah {surah} has {verse_count} ayahs"),
            )];
        }

        let request_id = self.issue(RequestKind::Verse);
        vec![ReaderEvent::Requested(ReaderRequest::Verse {
            request_id,
            position: VersePosition::new(surah, ayah),
        })]
    }

    fn advance(&mut self) -> Vec<ReaderEvent> {
        let Some(surah) = self.current_surah.as_ref() else {
            return Vec::new();
        };
        let (id, verse_count) = (surah.id, surah.verse_count);

        if self.current_ayah < verse_count {
            return self.go_to_verse(id, self.current_ayah + 1);
        }
        match id.next() {
            Some(next) => self.go_to_verse(next, 1),
            None => Vec::new(),
        }
    }

    fn retreat(&mut self) -> Vec<ReaderEvent> {
        let Some(surah) = self.current_surah.as_ref() else {
            return Vec::new();
        };
        let id = surah.id;

        if self.current_ayah > 1 {
            return self.go_to_verse(id, self.current_ayah - 1);
        }
        match id.prev() {
            Some(prev) => self.go_to_verse(prev, 1),
            None => Vec::new(),
        }
    }

    fn jump_to(&mut self, raw: &str) -> Vec<ReaderEvent> {
        let Some(surah) = self.current_surah.as_ref() else {
            return Vec::new();
        };
        let Ok(value) = raw.trim().parse::<i64>() else {
            return Vec::new();
        };
        if value < 1 || value > i64::from(surah.verse_count) {
            return Vec::new();
        }

        let id = surah.id;
        // verse_count fits in u16, so does value.
        self.go_to_verse(id, value as u16)
    }

    fn set_mode(&mut self, mode: ViewMode) -> Vec<ReaderEvent> {
        if self.mode == mode {
            return Vec::new();
        }
        self.mode = mode;
        vec![ReaderEvent::ModeChanged(mode)]
    }

    fn select_chapter(&mut self, surah: Surah) -> Vec<ReaderEvent> {
        let mut events = self.set_mode(ViewMode::Reader);
        let id = surah.id;
        self.current_ayah = self.current_ayah.clamp(1, surah.verse_count.max(1));
        self.current_surah = Some(surah);
        events.extend(self.go_to_verse(id, 1));
        events
    }

    fn search(&mut self, query: String) -> Vec<ReaderEvent> {
        let query = query.trim().to_owned();
        if query.is_empty() {
            return Vec::new();
        }

        self.search_query = query.clone();
        let request_id = self.issue(RequestKind::Search);
        vec![ReaderEvent::Requested(ReaderRequest::Search {
            request_id,
            query,
            language: self.preferences.language,
        })]
    }

    fn request_commentary(&mut self) -> Vec<ReaderEvent> {
        let Some(verse) = self.verse.clone() else {
            return Vec::new();
        };

        self.commentary = None;
        let mut events = self.set_overlay(Some(Overlay::Commentary));
        let request_id = self.issue(RequestKind::Commentary);
        events.push(ReaderEvent::Requested(ReaderRequest::Commentary {
            request_id,
            verse: Box::new(verse),
            language: self.preferences.language,
        }));
        events
    }

    fn request_overview(&mut self) -> Vec<ReaderEvent> {
        let Some(surah) = self.current_surah.as_ref() else {
            return Vec::new();
        };
        let (id, name) = (surah.id, surah.transliteration.clone());

        self.overview = None;
        let mut events = self.set_overlay(Some(Overlay::Overview));
        let request_id = self.issue(RequestKind::Overview);
        events.push(ReaderEvent::Requested(ReaderRequest::Overview {
            request_id,
            surah: id,
            name,
            language: self.preferences.language,
        }));
        events
    }

    fn apply_generated(
        &mut self,
        kind: RequestKind,
        overlay: Overlay,
        result: Result<String, String>,
    ) -> Vec<ReaderEvent> {
        match result {
            Ok(text) => {
                let slot = match overlay {
                    Overlay::Overview => &mut self.overview,
                    _ => &mut self.commentary,
                };
                *slot = Some(text);
                let mut events = vec![ReaderEvent::GeneratedTextReady(kind)];
                events.extend(self.clear_error_for(kind));
                events
            }
            Err(detail) => {
                let mut events = Vec::new();
                if self.overlay == Some(overlay) {
                    events.extend(self.set_overlay(None));
                }
                events.push(self.raise(ErrorKind::Generation, detail));
                events
            }
        }
    }

    fn set_overlay(&mut self, overlay: Option<Overlay>) -> Vec<ReaderEvent> {
        if self.overlay == overlay {
            return Vec::new();
        }
        self.overlay = overlay;
        vec![ReaderEvent::OverlayChanged(overlay)]
    }

    fn issue(&mut self, kind: RequestKind) -> RequestId {
        let request_id = self.latest.get(kind).next();
        self.latest.set(kind, request_id);
        self.loading.set(kind, true);
        request_id
    }

    fn raise(&mut self, kind: ErrorKind, detail: impl Into<String>) -> ReaderEvent {
        let banner = ErrorBanner {
            kind,
            detail: detail.into(),
        };
        self.error = Some(banner.clone());
        ReaderEvent::ErrorRaised(banner)
    }

    fn clear_error_for(&mut self, kind: RequestKind) -> Option<ReaderEvent> {
        let owned = self
            .error
            .as_ref()
            .is_some_and(|banner| banner.kind.request_kinds().contains(&kind));
        if owned {
            self.error = None;
            Some(ReaderEvent::ErrorCleared)
        } else {
            None
        }
    }

    fn is_valid_position(&self, position: VersePosition) -> bool {
        if self.chapters.is_empty() {
            return position.ayah >= 1;
        }
        self.chapter(position.surah)
            .is_some_and(|surah| surah.contains_ayah(position.ayah))
    }

    fn preference_event(&self, key: PrefKey) -> ReaderEvent {
        ReaderEvent::PreferenceChanged {
            key,
            value: self.preferences.value_for(key),
        }
    }
}
