// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use std::thread;
use std::time::Duration;
use tafsir_app::{Revelation, SurahId, VerseProvider};
use tafsir_corpus::{Client, DEFAULT_ARABIC_EDITION, DEFAULT_TRANSLATION_EDITIONS};
use tiny_http::{Header, Response, Server};

fn json_response(body: &str, status: u16) -> Response<std::io::Cursor<Vec<u8>>> {
    Response::from_string(body)
        .with_status_code(status)
        .with_header(
            Header::from_bytes("Content-Type", "application/json")
                .expect("valid content type header"),
        )
}

fn mock_client(server: &Server) -> Result<Client> {
    Client::new(
        &format!("http://{}/v1", server.server_addr()),
        DEFAULT_ARABIC_EDITION,
        DEFAULT_TRANSLATION_EDITIONS,
        Duration::from_secs(1),
    )
}

fn surah_json(number: u16, name: &str, english: &str, gloss: &str, ayahs: u16) -> serde_json::Value {
    serde_json::json!({
        "number": number,
        "name": name,
        "englishName": english,
        "englishNameTranslation": gloss,
        "numberOfAyahs": ayahs,
        "revelationType": if number == 2 { "Medinan" } else { "Meccan" },
    })
}

fn ayah_json(edition: &str, text: &str) -> serde_json::Value {
    serde_json::json!({
        "number": 262,
        "text": text,
        "numberInSurah": 255,
        "juz": 3,
        "page": 42,
        "edition": { "identifier": edition, "language": "en" },
        "surah": surah_json(2, "سُورَةُ البَقَرَةِ", "Al-Baqara", "The Cow", 286),
    })
}

#[test]
fn unreachable_service_names_base_url() {
    let client = Client::new(
        "http://127.0.0.1:1/v1",
        DEFAULT_ARABIC_EDITION,
        DEFAULT_TRANSLATION_EDITIONS,
        Duration::from_millis(50),
    )
    .expect("client should initialize");

    let error = client
        .list_chapters()
        .expect_err("listing should fail for unreachable endpoint");
    let message = error.to_string();
    assert!(message.contains("http://127.0.0.1:1/v1"));
    assert!(message.contains("[corpus]"));
}

#[test]
fn list_chapters_decodes_and_orders_surahs() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let client = mock_client(&server)?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/v1/surah");
        let body = serde_json::json!({
            "code": 200,
            "status": "OK",
            "data": [
                surah_json(2, "سُورَةُ البَقَرَةِ", "Al-Baqara", "The Cow", 286),
                surah_json(1, "سُورَةُ ٱلْفَاتِحَةِ", "Al-Faatiha", "The Opening", 7),
            ],
        });
        request
            .respond(json_response(&body.to_string(), 200))
            .expect("response should succeed");
    });

    let surahs = client.list_chapters()?;
    assert_eq!(surahs.len(), 2);
    assert_eq!(surahs[0].id, SurahId::FIRST);
    assert_eq!(surahs[0].verse_count, 7);
    assert_eq!(surahs[1].transliteration, "Al-Baqara");
    assert_eq!(surahs[1].translation, "The Cow");
    assert_eq!(surahs[1].revelation, Revelation::Medinan);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn get_verse_combines_three_editions() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let client = mock_client(&server)?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(
            request.url(),
            "/v1/ayah/2:255/editions/quran-uthmani,en.sahih,en.asad"
        );
        let body = serde_json::json!({
            "code": 200,
            "status": "OK",
            "data": [
                ayah_json("en.asad", "GOD - there is no deity save Him"),
                ayah_json("quran-uthmani", "ٱللَّهُ لَآ إِلَـٰهَ إِلَّا هُوَ"),
                ayah_json("en.sahih", "Allah - there is no deity except Him "),
            ],
        });
        request
            .respond(json_response(&body.to_string(), 200))
            .expect("response should succeed");
    });

    let surah = SurahId::new(2).ok_or_else(|| anyhow!("surah 2"))?;
    let verse = VerseProvider::get_verse(&client, surah, 255)?;
    assert_eq!(verse.position.to_string(), "2:255");
    assert_eq!(verse.arabic, "ٱللَّهُ لَآ إِلَـٰهَ إِلَّا هُوَ");
    assert_eq!(verse.primary.edition, "en.sahih");
    assert_eq!(verse.primary.text, "Allah - there is no deity except Him");
    assert_eq!(verse.secondary.edition, "en.asad");
    assert_eq!(verse.surah_transliteration, "Al-Baqara");
    assert_eq!(verse.verse_count, 286);
    assert_eq!(verse.juz, Some(3));
    assert_eq!(verse.page, Some(42));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn missing_edition_is_an_error() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let client = mock_client(&server)?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        let body = serde_json::json!({
            "code": 200,
            "status": "OK",
            "data": [ayah_json("quran-uthmani", "text"), ayah_json("en.sahih", "text")],
        });
        request
            .respond(json_response(&body.to_string(), 200))
            .expect("response should succeed");
    });

    let surah = SurahId::new(2).ok_or_else(|| anyhow!("surah 2"))?;
    let error = client
        .get_verse(surah, 255)
        .expect_err("incomplete reply should fail");
    assert!(error.to_string().contains("en.asad"));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn service_error_message_is_surfaced() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let client = mock_client(&server)?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        let body = r#"{"code":404,"status":"NOT FOUND","data":"Please specify a valid surah reference in the format Surah:Ayat (2:255)"}"#;
        request
            .respond(json_response(body, 404))
            .expect("response should succeed");
    });

    let surah = SurahId::new(9).ok_or_else(|| anyhow!("surah 9"))?;
    let error = client
        .get_verse(surah, 999)
        .expect_err("404 should fail");
    let message = format!("{error:#}");
    assert!(message.contains("fetch verse 9:999"));
    assert!(message.contains("verse service error (404): Please specify"));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn non_json_failure_reports_status() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let client = mock_client(&server)?;

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        request
            .respond(Response::from_string("Bad Gateway").with_status_code(502))
            .expect("response should succeed");
    });

    let error = client
        .list_chapters()
        .expect_err("502 should fail");
    assert_eq!(error.to_string(), "verse service error (502): Bad Gateway");

    handle.join().expect("server thread should join");
    Ok(())
}
