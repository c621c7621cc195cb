// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow, bail};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Mutex;
use tafsir_app::{
    AyahDisplayData, Language, PrefKey, PreferenceStore, ReaderEvent, ReaderState, Revelation,
    SearchProvider, SearchResult, Surah, SurahId, Translation, VerseProvider, VersePosition,
    execute_request,
};

/// Transliteration, gloss, ayah count and revelation for every surah, in order.
pub const SURAH_TABLE: [(&str, &str, u16, Revelation); 114] = [
    ("Al-Faatiha", "The Opening", 7, Revelation::Meccan),
    ("Al-Baqara", "The Cow", 286, Revelation::Medinan),
    ("Aal-i-Imraan", "The Family of Imraan", 200, Revelation::Medinan),
    ("An-Nisaa", "The Women", 176, Revelation::Medinan),
    ("Al-Maaida", "The Table", 120, Revelation::Medinan),
    ("Al-An'aam", "The Cattle", 165, Revelation::Meccan),
    ("Al-A'raaf", "The Heights", 206, Revelation::Meccan),
    ("Al-Anfaal", "The Spoils of War", 75, Revelation::Medinan),
    ("At-Tawba", "The Repentance", 129, Revelation::Medinan),
    ("Yunus", "Jonas", 109, Revelation::Meccan),
    ("Hud", "Hud", 123, Revelation::Meccan),
    ("Yusuf", "Joseph", 111, Revelation::Meccan),
    ("Ar-Ra'd", "The Thunder", 43, Revelation::Meccan),
    ("Ibrahim", "Abraham", 52, Revelation::Meccan),
    ("Al-Hijr", "The Rock", 99, Revelation::Meccan),
    ("An-Nahl", "The Bee", 128, Revelation::Meccan),
    ("Al-Israa", "The Night Journey", 111, Revelation::Meccan),
    ("Al-Kahf", "The Cave", 110, Revelation::Meccan),
    ("Maryam", "Mary", 98, Revelation::Meccan),
    ("Taa-Haa", "Taa-Haa", 135, Revelation::Meccan),
    ("Al-Anbiyaa", "The Prophets", 112, Revelation::Meccan),
    ("Al-Hajj", "The Pilgrimage", 78, Revelation::Medinan),
    ("Al-Muminoon", "The Believers", 118, Revelation::Meccan),
    ("An-Noor", "The Light", 64, Revelation::Medinan),
    ("Al-Furqaan", "The Criterion", 77, Revelation::Meccan),
    ("Ash-Shu'araa", "The Poets", 227, Revelation::Meccan),
    ("An-Naml", "The Ant", 93, Revelation::Meccan),
    ("Al-Qasas", "The Stories", 88, Revelation::Meccan),
    ("Al-Ankaboot", "The Spider", 69, Revelation::Meccan),
    ("Ar-Room", "The Romans", 60, Revelation::Meccan),
    ("Luqman", "Luqman", 34, Revelation::Meccan),
    ("As-Sajda", "The Prostration", 30, Revelation::Meccan),
    ("Al-Ahzaab", "The Clans", 73, Revelation::Medinan),
    ("Saba", "Sheba", 54, Revelation::Meccan),
    ("Faatir", "The Originator", 45, Revelation::Meccan),
    ("Yaseen", "Yaseen", 83, Revelation::Meccan),
    ("As-Saaffaat", "Those drawn up in Ranks", 182, Revelation::Meccan),
    ("Saad", "The letter Saad", 88, Revelation::Meccan),
    ("Az-Zumar", "The Groups", 75, Revelation::Meccan),
    ("Ghafir", "The Forgiver", 85, Revelation::Meccan),
    ("Fussilat", "Explained in detail", 54, Revelation::Meccan),
    ("Ash-Shura", "Consultation", 53, Revelation::Meccan),
    ("Az-Zukhruf", "Ornaments of gold", 89, Revelation::Meccan),
    ("Ad-Dukhaan", "The Smoke", 59, Revelation::Meccan),
    ("Al-Jaathiya", "Crouching", 37, Revelation::Meccan),
    ("Al-Ahqaf", "The Dunes", 35, Revelation::Meccan),
    ("Muhammad", "Muhammad", 38, Revelation::Medinan),
    ("Al-Fath", "The Victory", 29, Revelation::Medinan),
    ("Al-Hujuraat", "The Inner Apartments", 18, Revelation::Medinan),
    ("Qaaf", "The letter Qaaf", 45, Revelation::Meccan),
    ("Adh-Dhaariyat", "The Winnowing Winds", 60, Revelation::Meccan),
    ("At-Tur", "The Mount", 49, Revelation::Meccan),
    ("An-Najm", "The Star", 62, Revelation::Meccan),
    ("Al-Qamar", "The Moon", 55, Revelation::Meccan),
    ("Ar-Rahmaan", "The Beneficent", 78, Revelation::Medinan),
    ("Al-Waaqia", "The Inevitable", 96, Revelation::Meccan),
    ("Al-Hadid", "The Iron", 29, Revelation::Medinan),
    ("Al-Mujaadila", "The Pleading Woman", 22, Revelation::Medinan),
    ("Al-Hashr", "The Exile", 24, Revelation::Medinan),
    ("Al-Mumtahana", "She that is to be examined", 13, Revelation::Medinan),
    ("As-Saff", "The Ranks", 14, Revelation::Medinan),
    ("Al-Jumu'a", "Friday", 11, Revelation::Medinan),
    ("Al-Munaafiqoon", "The Hypocrites", 11, Revelation::Medinan),
    ("At-Taghaabun", "Mutual Disillusion", 18, Revelation::Medinan),
    ("At-Talaaq", "Divorce", 12, Revelation::Medinan),
    ("At-Tahrim", "The Prohibition", 12, Revelation::Medinan),
    ("Al-Mulk", "The Sovereignty", 30, Revelation::Meccan),
    ("Al-Qalam", "The Pen", 52, Revelation::Meccan),
    ("Al-Haaqqa", "The Reality", 52, Revelation::Meccan),
    ("Al-Ma'aarij", "The Ascending Stairways", 44, Revelation::Meccan),
    ("Nooh", "Noah", 28, Revelation::Meccan),
    ("Al-Jinn", "The Jinn", 28, Revelation::Meccan),
    ("Al-Muzzammil", "The Enshrouded One", 20, Revelation::Meccan),
    ("Al-Muddaththir", "The Cloaked One", 56, Revelation::Meccan),
    ("Al-Qiyaama", "The Resurrection", 40, Revelation::Meccan),
    ("Al-Insaan", "Man", 31, Revelation::Medinan),
    ("Al-Mursalaat", "The Emissaries", 50, Revelation::Meccan),
    ("An-Naba", "The Announcement", 40, Revelation::Meccan),
    ("An-Naazi'aat", "Those who drag forth", 46, Revelation::Meccan),
    ("Abasa", "He frowned", 42, Revelation::Meccan),
    ("At-Takwir", "The Overthrowing", 29, Revelation::Meccan),
    ("Al-Infitaar", "The Cleaving", 19, Revelation::Meccan),
    ("Al-Mutaffifin", "Defrauding", 36, Revelation::Meccan),
    ("Al-Inshiqaaq", "The Splitting Open", 25, Revelation::Meccan),
    ("Al-Burooj", "The Constellations", 22, Revelation::Meccan),
    ("At-Taariq", "The Morning Star", 17, Revelation::Meccan),
    ("Al-A'laa", "The Most High", 19, Revelation::Meccan),
    ("Al-Ghaashiya", "The Overwhelming", 26, Revelation::Meccan),
    ("Al-Fajr", "The Dawn", 30, Revelation::Meccan),
    ("Al-Balad", "The City", 20, Revelation::Meccan),
    ("Ash-Shams", "The Sun", 15, Revelation::Meccan),
    ("Al-Lail", "The Night", 21, Revelation::Meccan),
    ("Ad-Dhuhaa", "The Morning Hours", 11, Revelation::Meccan),
    ("Ash-Sharh", "The Consolation", 8, Revelation::Meccan),
    ("At-Tin", "The Fig", 8, Revelation::Meccan),
    ("Al-Alaq", "The Clot", 19, Revelation::Meccan),
    ("Al-Qadr", "The Power, Fate", 5, Revelation::Meccan),
    ("Al-Bayyina", "The Evidence", 8, Revelation::Medinan),
    ("Az-Zalzala", "The Earthquake", 8, Revelation::Medinan),
    ("Al-Aadiyaat", "The Chargers", 11, Revelation::Meccan),
    ("Al-Qaari'a", "The Calamity", 11, Revelation::Meccan),
    ("At-Takaathur", "Competition", 8, Revelation::Meccan),
    ("Al-Asr", "The Declining Day, Epoch", 3, Revelation::Meccan),
    ("Al-Humaza", "The Traducer", 9, Revelation::Meccan),
    ("Al-Fil", "The Elephant", 5, Revelation::Meccan),
    ("Quraish", "Quraysh", 4, Revelation::Meccan),
    ("Al-Maa'un", "Almsgiving", 7, Revelation::Meccan),
    ("Al-Kawthar", "Abundance", 3, Revelation::Meccan),
    ("Al-Kaafiroon", "The Disbelievers", 6, Revelation::Meccan),
    ("An-Nasr", "Divine Support", 3, Revelation::Medinan),
    ("Al-Masad", "The Palm Fibre", 5, Revelation::Meccan),
    ("Al-Ikhlaas", "Sincerity", 4, Revelation::Meccan),
    ("Al-Falaq", "The Dawn", 5, Revelation::Meccan),
    ("An-Naas", "Mankind", 6, Revelation::Meccan),
];

pub const TOTAL_AYAHS: u32 = 6236;

const ARABIC_DIGITS: [char; 10] = ['٠', '١', '٢', '٣', '٤', '٥', '٦', '٧', '٨', '٩'];

fn arabic_number(value: u16) -> String {
    value
        .to_string()
        .chars()
        .filter_map(|digit| digit.to_digit(10))
        .map(|digit| ARABIC_DIGITS[digit as usize])
        .collect()
}

pub fn surah_id(value: u16) -> SurahId {
    SurahId::new(value).unwrap_or_else(|| panic!("surah id {value} is outside 1..=114"))
}

pub fn sample_surahs() -> Vec<Surah> {
    SurahId::all()
        .zip(SURAH_TABLE)
        .map(
            |(id, (transliteration, translation, verse_count, revelation))| Surah {
                id,
                verse_count,
                name: format!("سورة {}", arabic_number(id.get())),
                transliteration: transliteration.to_owned(),
                translation: translation.to_owned(),
                revelation,
            },
        )
        .collect()
}

pub fn sample_surah(id: u16) -> Surah {
    sample_surahs()
        .into_iter()
        .nth(usize::from(id.saturating_sub(1)))
        .unwrap_or_else(|| panic!("surah id {id} is outside 1..=114"))
}

pub fn sample_verse(surah: &Surah, ayah: u16) -> AyahDisplayData {
    let position = VersePosition::new(surah.id, ayah);
    AyahDisplayData {
        position,
        arabic: format!("{} {}", surah.name, arabic_number(ayah)),
        primary: Translation {
            edition: "en.sahih".to_owned(),
            text: format!("Sahih International {position}"),
        },
        secondary: Translation {
            edition: "en.asad".to_owned(),
            text: format!("Muhammad Asad {position}"),
        },
        surah_name: surah.name.clone(),
        surah_transliteration: surah.transliteration.clone(),
        surah_translation: surah.translation.clone(),
        verse_count: surah.verse_count,
        juz: None,
        page: None,
    }
}

/// Full corpus served from memory. Positions in `failing` return an error.
#[derive(Debug, Default)]
pub struct InMemoryCorpus {
    surahs: Vec<Surah>,
    failing: Mutex<BTreeSet<VersePosition>>,
    fail_chapters: bool,
    fetched: Mutex<Vec<VersePosition>>,
}

impl InMemoryCorpus {
    pub fn new() -> Self {
        Self {
            surahs: sample_surahs(),
            ..Self::default()
        }
    }

    pub fn unavailable() -> Self {
        Self {
            fail_chapters: true,
            ..Self::new()
        }
    }

    pub fn fail_at(&self, position: VersePosition) {
        lock(&self.failing).insert(position);
    }

    pub fn fetched(&self) -> Vec<VersePosition> {
        lock(&self.fetched).clone()
    }
}

impl VerseProvider for InMemoryCorpus {
    fn list_chapters(&self) -> Result<Vec<Surah>> {
        if self.fail_chapters {
            bail!("cannot reach verse service");
        }
        Ok(self.surahs.clone())
    }

    fn get_verse(&self, surah: SurahId, ayah: u16) -> Result<AyahDisplayData> {
        let position = VersePosition::new(surah, ayah);
        lock(&self.fetched).push(position);
        if lock(&self.failing).contains(&position) {
            bail!("verse {position} unavailable");
        }

        let chapter = self
            .surahs
            .iter()
            .find(|candidate| candidate.id == surah)
            .ok_or_else(|| anyhow!("surah {surah} not found"))?;
        if !chapter.contains_ayah(ayah) {
            bail!("verse {position} not found");
        }
        Ok(sample_verse(chapter, ayah))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCall {
    Search { query: String, language: Language },
    Commentary { position: VersePosition, language: Language },
    Overview { surah: SurahId, name: String, language: Language },
}

/// Returns queued outcomes in order; an empty queue yields an error.
#[derive(Debug, Default)]
pub struct ScriptedSearch {
    results: Mutex<VecDeque<Result<Vec<SearchResult>, String>>>,
    texts: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<SearchCall>>,
}

impl ScriptedSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_results(&self, results: Vec<SearchResult>) {
        lock(&self.results).push_back(Ok(results));
    }

    pub fn push_search_error(&self, message: &str) {
        lock(&self.results).push_back(Err(message.to_owned()));
    }

    pub fn push_text(&self, text: &str) {
        lock(&self.texts).push_back(Ok(text.to_owned()));
    }

    pub fn push_text_error(&self, message: &str) {
        lock(&self.texts).push_back(Err(message.to_owned()));
    }

    pub fn calls(&self) -> Vec<SearchCall> {
        lock(&self.calls).clone()
    }

    fn next_text(&self) -> Result<String> {
        match lock(&self.texts).pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(anyhow!(message)),
            None => bail!("no scripted text left"),
        }
    }
}

impl SearchProvider for ScriptedSearch {
    fn search(
        &self,
        query: &str,
        language: Language,
        _chapters: &[Surah],
    ) -> Result<Vec<SearchResult>> {
        lock(&self.calls).push(SearchCall::Search {
            query: query.to_owned(),
            language,
        });
        match lock(&self.results).pop_front() {
            Some(Ok(results)) => Ok(results),
            Some(Err(message)) => Err(anyhow!(message)),
            None => bail!("no scripted search results left"),
        }
    }

    fn generate_commentary(&self, verse: &AyahDisplayData, language: Language) -> Result<String> {
        lock(&self.calls).push(SearchCall::Commentary {
            position: verse.position,
            language,
        });
        self.next_text()
    }

    fn generate_chapter_overview(
        &self,
        chapter_name: &str,
        chapter_id: SurahId,
        language: Language,
    ) -> Result<String> {
        lock(&self.calls).push(SearchCall::Overview {
            surah: chapter_id,
            name: chapter_name.to_owned(),
            language,
        });
        self.next_text()
    }
}

#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<BTreeMap<&'static str, String>>,
    fail_writes: bool,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_only() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn with(self, key: PrefKey, value: &str) -> Self {
        lock(&self.values).insert(key.as_str(), value.to_owned());
        self
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: PrefKey) -> Result<Option<String>> {
        Ok(lock(&self.values).get(key.as_str()).cloned())
    }

    fn set(&self, key: PrefKey, value: &str) -> Result<()> {
        if self.fail_writes {
            bail!("preference store is read-only");
        }
        lock(&self.values).insert(key.as_str(), value.to_owned());
        Ok(())
    }
}

/// Resolves every request in `events` (and any follow-ups) in issue order.
pub fn settle(
    state: &mut ReaderState,
    events: Vec<ReaderEvent>,
    corpus: &dyn VerseProvider,
    search: &dyn SearchProvider,
) -> Vec<ReaderEvent> {
    let mut pending: VecDeque<ReaderEvent> = events.into();
    let mut seen = Vec::new();
    while let Some(event) = pending.pop_front() {
        if let ReaderEvent::Requested(request) = &event {
            let response = execute_request(request, &state.chapters, corpus, search);
            pending.extend(state.apply(response));
        }
        seen.push(event);
    }
    seen
}

/// A state with the full surah list already loaded.
pub fn loaded_state() -> ReaderState {
    let mut state = ReaderState::default();
    state.chapters = sample_surahs();
    state
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
