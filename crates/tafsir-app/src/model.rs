// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::fmt;

use crate::ids::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Revelation {
    Meccan,
    Medinan,
}

impl Revelation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Meccan => "Meccan",
            Self::Medinan => "Medinan",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "meccan" | "makkah" | "makki" => Some(Self::Meccan),
            "medinan" | "madinah" | "madani" => Some(Self::Medinan),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surah {
    pub id: SurahId,
    pub verse_count: u16,
    pub name: String,
    pub transliteration: String,
    pub translation: String,
    pub revelation: Revelation,
}

impl Surah {
    pub const fn contains_ayah(&self, ayah: u16) -> bool {
        ayah >= 1 && ayah <= self.verse_count
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersePosition {
    pub surah: SurahId,
    pub ayah: u16,
}

impl VersePosition {
    pub const fn new(surah: SurahId, ayah: u16) -> Self {
        Self { surah, ayah }
    }
}

impl fmt::Display for VersePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.surah, self.ayah)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub edition: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AyahDisplayData {
    pub position: VersePosition,
    pub arabic: String,
    pub primary: Translation,
    pub secondary: Translation,
    pub surah_name: String,
    pub surah_transliteration: String,
    pub surah_translation: String,
    pub verse_count: u16,
    pub juz: Option<u16>,
    pub page: Option<u16>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub position: VersePosition,
    pub confidence: f32,
    pub rationale: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Search,
    Reader,
}

impl ViewMode {
    pub const fn toggled(self) -> Self {
        match self {
            Self::Search => Self::Reader,
            Self::Reader => Self::Search,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    English,
    Arabic,
}

impl Language {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Arabic => "ar",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Arabic => "Arabic",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Some(Self::English),
            "ar" | "arabic" => Some(Self::Arabic),
            _ => None,
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::English => Self::Arabic,
            Self::Arabic => Self::English,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    Light,
    #[default]
    Dark,
    Sepia,
}

impl Theme {
    pub const ALL: [Self; 3] = [Self::Light, Self::Dark, Self::Sepia];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::Sepia => "sepia",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "sepia" => Some(Self::Sepia),
            _ => None,
        }
    }

    pub const fn next(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Sepia,
            Self::Sepia => Self::Light,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FontSize(u8);

impl FontSize {
    pub const MIN: Self = Self(1);
    pub const MAX: Self = Self(5);
    pub const DEFAULT: Self = Self(3);

    pub const fn new(value: u8) -> Option<Self> {
        if value >= Self::MIN.0 && value <= Self::MAX.0 {
            Some(Self(value))
        } else {
            None
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    /// Steps by `delta`, clamped to `MIN..=MAX`.
    pub fn step(self, delta: i8) -> Self {
        let raw = i16::from(self.0) + i16::from(delta);
        let clamped = raw.clamp(i16::from(Self::MIN.0), i16::from(Self::MAX.0));
        Self(clamped as u8)
    }

    pub fn parse(value: &str) -> Option<Self> {
        value.trim().parse::<u8>().ok().and_then(Self::new)
    }
}

impl Default for FontSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrefKey {
    Theme,
    ArabicFontSize,
    TranslationFontSize,
    Language,
}

impl PrefKey {
    pub const ALL: [Self; 4] = [
        Self::Theme,
        Self::ArabicFontSize,
        Self::TranslationFontSize,
        Self::Language,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Theme => "ui.theme",
            Self::ArabicFontSize => "ui.arabic_font_size",
            Self::TranslationFontSize => "ui.translation_font_size",
            Self::Language => "llm.language",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Preferences {
    pub theme: Theme,
    pub arabic_font_size: FontSize,
    pub translation_font_size: FontSize,
    pub language: Language,
}

impl Preferences {
    pub fn value_for(&self, key: PrefKey) -> String {
        match key {
            PrefKey::Theme => self.theme.as_str().to_owned(),
            PrefKey::ArabicFontSize => self.arabic_font_size.get().to_string(),
            PrefKey::TranslationFontSize => self.translation_font_size.get().to_string(),
            PrefKey::Language => self.language.as_str().to_owned(),
        }
    }

    /// Applies a stored raw value; returns false when it does not parse.
    pub fn apply_raw(&mut self, key: PrefKey, raw: &str) -> bool {
        let applied = match key {
            PrefKey::Theme => Theme::parse(raw).map(|theme| self.theme = theme),
            PrefKey::ArabicFontSize => {
                FontSize::parse(raw).map(|size| self.arabic_font_size = size)
            }
            PrefKey::TranslationFontSize => {
                FontSize::parse(raw).map(|size| self.translation_font_size = size)
            }
            PrefKey::Language => Language::parse(raw).map(|language| self.language = language),
        };
        applied.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Chapters,
    Verse,
    Search,
    Commentary,
    Overview,
}

impl RequestKind {
    pub const ALL: [Self; 5] = [
        Self::Chapters,
        Self::Verse,
        Self::Search,
        Self::Commentary,
        Self::Overview,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chapters => "chapters",
            Self::Verse => "verse",
            Self::Search => "search",
            Self::Commentary => "commentary",
            Self::Overview => "overview",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Chapters => 0,
            Self::Verse => 1,
            Self::Search => 2,
            Self::Commentary => 3,
            Self::Overview => 4,
        }
    }
}

/// One slot per [`RequestKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PerKind<T> {
    slots: [T; 5],
}

impl<T: Copy> PerKind<T> {
    pub fn get(&self, kind: RequestKind) -> T {
        self.slots[kind.index()]
    }

    pub fn set(&mut self, kind: RequestKind, value: T) {
        self.slots[kind.index()] = value;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Load,
    Navigation,
    Search,
    NoResults,
    Generation,
}

impl ErrorKind {
    pub const fn request_kinds(self) -> &'static [RequestKind] {
        match self {
            Self::Load => &[RequestKind::Chapters],
            Self::Navigation => &[RequestKind::Verse],
            Self::Search | Self::NoResults => &[RequestKind::Search],
            Self::Generation => &[RequestKind::Commentary, RequestKind::Overview],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBanner {
    pub kind: ErrorKind,
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::{FontSize, Language, PrefKey, Preferences, Revelation, Theme};

    #[test]
    fn font_size_steps_are_clamped() {
        assert_eq!(FontSize::MAX.step(1), FontSize::MAX);
        assert_eq!(FontSize::MIN.step(-3), FontSize::MIN);
        assert_eq!(FontSize::DEFAULT.step(1).get(), 4);
        assert!(FontSize::new(0).is_none());
        assert!(FontSize::new(6).is_none());
    }

    #[test]
    fn theme_cycles_through_every_variant() {
        let mut theme = Theme::Light;
        for expected in [Theme::Dark, Theme::Sepia, Theme::Light] {
            theme = theme.next();
            assert_eq!(theme, expected);
        }
    }

    #[test]
    fn language_parse_accepts_codes_and_names() {
        assert_eq!(Language::parse("EN"), Some(Language::English));
        assert_eq!(Language::parse("arabic"), Some(Language::Arabic));
        assert_eq!(Language::parse("fr"), None);
    }

    #[test]
    fn preferences_apply_raw_rejects_bad_values() {
        let mut prefs = Preferences::default();
        assert!(prefs.apply_raw(PrefKey::Theme, "sepia"));
        assert_eq!(prefs.theme, Theme::Sepia);
        assert!(!prefs.apply_raw(PrefKey::ArabicFontSize, "huge"));
        assert_eq!(prefs.arabic_font_size, FontSize::DEFAULT);
        assert_eq!(prefs.value_for(PrefKey::Language), "en");
    }

    #[test]
    fn pref_key_parse_round_trips_every_key() {
        for key in PrefKey::ALL {
            assert_eq!(PrefKey::parse(key.as_str()), Some(key));
        }
        assert_eq!(PrefKey::parse("ui.unknown"), None);
    }

    #[test]
    fn revelation_parse_accepts_service_spelling() {
        assert_eq!(Revelation::parse("Meccan"), Some(Revelation::Meccan));
        assert_eq!(Revelation::parse("Medinan"), Some(Revelation::Medinan));
        assert_eq!(Revelation::parse("elsewhere"), None);
    }
}
