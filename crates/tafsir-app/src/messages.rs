// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::HashMap;

use crate::{ErrorKind, Language, ViewMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageId {
    AppTitle,
    SearchTitle,
    ReaderTitle,
    ChaptersTitle,
    ResultsTitle,
    CommentaryTitle,
    OverviewTitle,
    SettingsTitle,
    HelpTitle,
    Loading,
    Generating,
    Searching,
    NoVerseSelected,
    NoChapters,
    SearchPrompt,
    FilterPrompt,
    JumpPrompt,
    LoadFailed,
    NavigationFailed,
    SearchFailed,
    NoResults,
    GenerationFailed,
    ThemeLabel,
    ArabicFontLabel,
    TranslationFontLabel,
    LanguageLabel,
    ConfidenceLabel,
}

const ENGLISH: &[(MessageId, &str)] = &[
    (MessageId::AppTitle, "tafsir"),
    (MessageId::SearchTitle, "search"),
    (MessageId::ReaderTitle, "reader"),
    (MessageId::ChaptersTitle, "surahs"),
    (MessageId::ResultsTitle, "results"),
    (MessageId::CommentaryTitle, "commentary"),
    (MessageId::OverviewTitle, "overview"),
    (MessageId::SettingsTitle, "settings"),
    (MessageId::HelpTitle, "help"),
    (MessageId::Loading, "loading..."),
    (MessageId::Generating, "generating..."),
    (MessageId::Searching, "searching..."),
    (MessageId::NoVerseSelected, "no verse selected; pick a surah or a search result"),
    (MessageId::NoChapters, "surah list unavailable"),
    (MessageId::SearchPrompt, "ask"),
    (MessageId::FilterPrompt, "filter"),
    (MessageId::JumpPrompt, "jump to ayah"),
    (MessageId::LoadFailed, "could not load the surah list"),
    (MessageId::NavigationFailed, "could not load that verse"),
    (MessageId::SearchFailed, "search failed"),
    (MessageId::NoResults, "no matching verses found"),
    (MessageId::GenerationFailed, "generation failed"),
    (MessageId::ThemeLabel, "theme"),
    (MessageId::ArabicFontLabel, "arabic size"),
    (MessageId::TranslationFontLabel, "translation size"),
    (MessageId::LanguageLabel, "language"),
    (MessageId::ConfidenceLabel, "confidence"),
];

const ARABIC: &[(MessageId, &str)] = &[
    (MessageId::AppTitle, "تفسير"),
    (MessageId::SearchTitle, "بحث"),
    (MessageId::ReaderTitle, "القارئ"),
    (MessageId::ChaptersTitle, "السور"),
    (MessageId::ResultsTitle, "النتائج"),
    (MessageId::CommentaryTitle, "التفسير"),
    (MessageId::OverviewTitle, "نظرة عامة"),
    (MessageId::SettingsTitle, "الإعدادات"),
    (MessageId::HelpTitle, "مساعدة"),
    (MessageId::Loading, "جارٍ التحميل..."),
    (MessageId::Generating, "جارٍ الإنشاء..."),
    (MessageId::Searching, "جارٍ البحث..."),
    (MessageId::NoVerseSelected, "لم يتم اختيار آية؛ اختر سورة أو نتيجة بحث"),
    (MessageId::NoChapters, "قائمة السور غير متاحة"),
    (MessageId::SearchPrompt, "اسأل"),
    (MessageId::FilterPrompt, "تصفية"),
    (MessageId::JumpPrompt, "انتقل إلى آية"),
    (MessageId::LoadFailed, "تعذر تحميل قائمة السور"),
    (MessageId::NavigationFailed, "تعذر تحميل الآية"),
    (MessageId::SearchFailed, "فشل البحث"),
    (MessageId::NoResults, "لم يتم العثور على آيات مطابقة"),
    (MessageId::GenerationFailed, "فشل الإنشاء"),
    (MessageId::ThemeLabel, "المظهر"),
    (MessageId::ArabicFontLabel, "حجم الخط العربي"),
    (MessageId::TranslationFontLabel, "حجم خط الترجمة"),
    (MessageId::LanguageLabel, "اللغة"),
    (MessageId::ConfidenceLabel, "الثقة"),
];

/// User-facing strings keyed by message and language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageCatalog {
    entries: HashMap<(MessageId, Language), String>,
}

impl MessageCatalog {
    pub fn builtin() -> Self {
        let mut entries = HashMap::with_capacity(ENGLISH.len() + ARABIC.len());
        for (table, language) in [(ENGLISH, Language::English), (ARABIC, Language::Arabic)] {
            for (id, text) in table {
                entries.insert((*id, language), (*text).to_owned());
            }
        }
        Self { entries }
    }

    /// Falls back to English, then to the message id itself.
    pub fn text(&self, id: MessageId, language: Language) -> String {
        self.entries
            .get(&(id, language))
            .or_else(|| self.entries.get(&(id, Language::English)))
            .cloned()
            .unwrap_or_else(|| format!("{id:?}"))
    }

    pub fn error_title(&self, kind: ErrorKind, language: Language) -> String {
        let id = match kind {
            ErrorKind::Load => MessageId::LoadFailed,
            ErrorKind::Navigation => MessageId::NavigationFailed,
            ErrorKind::Search => MessageId::SearchFailed,
            ErrorKind::NoResults => MessageId::NoResults,
            ErrorKind::Generation => MessageId::GenerationFailed,
        };
        self.text(id, language)
    }

    pub fn mode_title(&self, mode: ViewMode, language: Language) -> String {
        match mode {
            ViewMode::Search => self.text(MessageId::SearchTitle, language),
            ViewMode::Reader => self.text(MessageId::ReaderTitle, language),
        }
    }
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
