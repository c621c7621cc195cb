// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tafsir_app::{
    AyahDisplayData, Revelation, Surah, SurahId, Translation, VerseProvider, VersePosition,
};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.alquran.cloud/v1";
pub const DEFAULT_ARABIC_EDITION: &str = "quran-uthmani";
pub const DEFAULT_TRANSLATION_EDITIONS: [&str; 2] = ["en.sahih", "en.asad"];

/// Blocking client for an alquran.cloud-compatible verse service.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    arabic_edition: String,
    translation_editions: [String; 2],
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(
        base_url: &str,
        arabic_edition: &str,
        translation_editions: [&str; 2],
        timeout: Duration,
    ) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            bail!("corpus.base_url must not be empty");
        }
        let base_url = Url::parse(trimmed)
            .with_context(|| format!("corpus.base_url {trimmed:?} is not a valid URL"))?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            bail!("corpus.base_url {trimmed:?} must be an http:// or https:// URL");
        }

        for edition in std::iter::once(arabic_edition).chain(translation_editions) {
            if edition.trim().is_empty() || edition.contains([',', '/']) {
                bail!("corpus edition {edition:?} must be a single non-empty identifier");
            }
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            arabic_edition: arabic_edition.trim().to_owned(),
            translation_editions: translation_editions.map(|edition| edition.trim().to_owned()),
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn editions(&self) -> [&str; 3] {
        [
            self.arabic_edition.as_str(),
            self.translation_editions[0].as_str(),
            self.translation_editions[1].as_str(),
        ]
    }

    pub fn list_chapters(&self) -> Result<Vec<Surah>> {
        let rows: Vec<ChapterRow> = self.get_json(&["surah"])?;
        if rows.is_empty() {
            bail!("verse service at {} returned no surahs", self.base_url());
        }

        let mut surahs = rows
            .into_iter()
            .map(ChapterRow::into_surah)
            .collect::<Result<Vec<_>>>()?;
        surahs.sort_by_key(|surah| surah.id);
        surahs.dedup_by_key(|surah| surah.id);
        tracing::debug!(count = surahs.len(), "surah list fetched");
        Ok(surahs)
    }

    pub fn get_verse(&self, surah: SurahId, ayah: u16) -> Result<AyahDisplayData> {
        let position = VersePosition::new(surah, ayah);
        let reference = position.to_string();
        let editions = self.editions().join(",");
        let rows: Vec<AyahRow> = self
            .get_json(&["ayah", &reference, "editions", &editions])
            .with_context(|| format!("fetch verse {position}"))?;
        self.assemble(position, rows)
    }

    fn assemble(&self, position: VersePosition, rows: Vec<AyahRow>) -> Result<AyahDisplayData> {
        let [arabic_edition, primary_edition, secondary_edition] = self.editions();
        let mut arabic = None;
        let mut primary = None;
        let mut secondary = None;
        for row in &rows {
            let slot = match row.edition.identifier.as_str() {
                id if id == arabic_edition => &mut arabic,
                id if id == primary_edition => &mut primary,
                id if id == secondary_edition => &mut secondary,
                _ => continue,
            };
            *slot = Some(row);
        }

        let missing = |edition: &str| {
            anyhow!("verse service returned no text for edition {edition:?} at {position}")
        };
        let arabic = arabic.ok_or_else(|| missing(arabic_edition))?;
        let primary = primary.ok_or_else(|| missing(primary_edition))?;
        let secondary = secondary.ok_or_else(|| missing(secondary_edition))?;

        if arabic.number_in_surah != position.ayah || arabic.surah.number != position.surah.get() {
            bail!(
                "verse service answered {}:{} for {position}",
                arabic.surah.number,
                arabic.number_in_surah
            );
        }

        Ok(AyahDisplayData {
            position,
            arabic: arabic.text.trim().to_owned(),
            primary: primary.translation(),
            secondary: secondary.translation(),
            surah_name: arabic.surah.name.clone(),
            surah_transliteration: arabic.surah.english_name.clone(),
            surah_translation: arabic.surah.english_name_translation.clone(),
            verse_count: arabic.surah.number_of_ayahs,
            juz: arabic.juz,
            page: arabic.page,
        })
    }

    fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%url, "verse service request");
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|error| connection_error(self.base_url(), error))?;

        let status = response.status();
        let body = response.text().context("read verse service response")?;
        let envelope: Envelope = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => return Err(clean_error_response(status, &body)),
            Err(error) => return Err(error).context("decode verse service response"),
        };
        if !status.is_success() || envelope.code != 200 {
            return Err(envelope.into_error(status));
        }

        serde_json::from_value(envelope.data).context("decode verse service payload")
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("corpus.base_url {} cannot take a path", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl VerseProvider for Client {
    fn list_chapters(&self) -> Result<Vec<Surah>> {
        Client::list_chapters(self)
    }

    fn get_verse(&self, surah: SurahId, ayah: u16) -> Result<AyahDisplayData> {
        Client::get_verse(self, surah, ayah)
    }
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!("verse service at {base_url} timed out -- raise [corpus].timeout ({error})");
    }
    anyhow!("cannot reach verse service at {base_url} -- check [corpus].base_url ({error})")
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if body.len() < 100 && !body.contains('{') && !body.trim().is_empty() {
        return anyhow!("verse service error ({}): {}", status.as_u16(), body.trim());
    }
    anyhow!("verse service returned {}", status.as_u16())
}

#[derive(Debug, Deserialize)]
struct Envelope {
    code: u16,
    #[serde(default)]
    status: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl Envelope {
    fn into_error(self, status: StatusCode) -> anyhow::Error {
        let detail = match self.data {
            serde_json::Value::String(message) if !message.is_empty() => message,
            _ => self.status,
        };
        let code = if status.is_success() {
            self.code
        } else {
            status.as_u16()
        };
        if detail.is_empty() {
            anyhow!("verse service returned {code}")
        } else {
            anyhow!("verse service error ({code}): {detail}")
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChapterRow {
    number: u16,
    name: String,
    english_name: String,
    english_name_translation: String,
    number_of_ayahs: u16,
    revelation_type: String,
}

impl ChapterRow {
    fn into_surah(self) -> Result<Surah> {
        let id = SurahId::new(self.number)
            .ok_or_else(|| anyhow!("verse service listed surah {} outside 1..=114", self.number))?;
        if self.number_of_ayahs == 0 {
            bail!("verse service listed surah {id} with no verses");
        }
        let revelation = Revelation::parse(&self.revelation_type).ok_or_else(|| {
            anyhow!(
                "verse service listed surah {id} with unknown revelation type {:?}",
                self.revelation_type
            )
        })?;
        Ok(Surah {
            id,
            verse_count: self.number_of_ayahs,
            name: self.name,
            transliteration: self.english_name,
            translation: self.english_name_translation,
            revelation,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AyahRow {
    text: String,
    number_in_surah: u16,
    #[serde(default)]
    juz: Option<u16>,
    #[serde(default)]
    page: Option<u16>,
    edition: EditionRow,
    surah: ChapterRow,
}

impl AyahRow {
    fn translation(&self) -> Translation {
        Translation {
            edition: self.edition.identifier.clone(),
            text: self.text.trim().to_owned(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct EditionRow {
    identifier: String,
}

#[cfg(test)]
mod tests {
    use super::{ChapterRow, Client, DEFAULT_TRANSLATION_EDITIONS, Envelope};
    use anyhow::Result;
    use reqwest::StatusCode;
    use std::time::Duration;

    fn client(base: &str) -> Result<Client> {
        Client::new(
            base,
            "quran-uthmani",
            DEFAULT_TRANSLATION_EDITIONS,
            Duration::from_secs(1),
        )
    }

    #[test]
    fn endpoint_appends_segments_to_base_path() -> Result<()> {
        let client = client("https://api.example.test/v1/")?;
        let url = client.endpoint(&["ayah", "2:255", "editions", "quran-uthmani,en.sahih"])?;
        assert_eq!(
            url.as_str(),
            "https://api.example.test/v1/ayah/2:255/editions/quran-uthmani,en.sahih"
        );
        assert_eq!(client.base_url(), "https://api.example.test/v1");
        Ok(())
    }

    #[test]
    fn new_rejects_unusable_settings() {
        assert!(client("").is_err());
        assert!(client("ftp://example.test").is_err());
        assert!(client("not a url").is_err());
        assert!(
            Client::new(
                "https://api.example.test",
                "quran-uthmani,en.sahih",
                DEFAULT_TRANSLATION_EDITIONS,
                Duration::from_secs(1),
            )
            .is_err()
        );
    }

    #[test]
    fn chapter_row_validates_number_and_revelation() {
        let row = |number: u16, revelation: &str| ChapterRow {
            number,
            name: "سُورَةُ ٱلْفَاتِحَةِ".to_owned(),
            english_name: "Al-Faatiha".to_owned(),
            english_name_translation: "The Opening".to_owned(),
            number_of_ayahs: 7,
            revelation_type: revelation.to_owned(),
        };
        assert!(row(1, "Meccan").into_surah().is_ok());
        assert!(row(0, "Meccan").into_surah().is_err());
        assert!(row(115, "Meccan").into_surah().is_err());
        assert!(row(1, "Unknown").into_surah().is_err());
    }

    #[test]
    fn envelope_error_prefers_data_message() {
        let envelope = Envelope {
            code: 404,
            status: "NOT FOUND".to_owned(),
            data: serde_json::Value::String("Please specify an Ayah number".to_owned()),
        };
        assert_eq!(
            envelope.into_error(StatusCode::NOT_FOUND).to_string(),
            "verse service error (404): Please specify an Ayah number"
        );

        let envelope = Envelope {
            code: 400,
            status: "Bad Request".to_owned(),
            data: serde_json::Value::Null,
        };
        assert_eq!(
            envelope.into_error(StatusCode::OK).to_string(),
            "verse service error (400): Bad Request"
        );
    }
}
