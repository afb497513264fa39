use serde::{Deserialize, Serialize};

use crate::models::{clamp_rating, Draft, Track, UNKNOWN_ALBUM, UNTITLED};

/// Raw record as served by the placeholder collection. Every field is
/// optional because the remote schema only guarantees `id`, `title` and
/// `body`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RemoteRecord {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub rating: Option<f64>,
    pub duration: Option<u32>,
    pub album: Option<String>,
}

impl RemoteRecord {
    /// Lay the fields present in `echo` over `self`.
    pub fn overlay(self, echo: RemoteRecord) -> RemoteRecord {
        RemoteRecord {
            id: echo.id.or(self.id),
            title: echo.title.or(self.title),
            body: echo.body.or(self.body),
            rating: echo.rating.or(self.rating),
            duration: echo.duration.or(self.duration),
            album: echo.album.or(self.album),
        }
    }
}

/// Body sent on create and update. `body` mirrors the album text because the
/// placeholder schema has no album column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemotePayload {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    pub album: String,
    pub duration: u32,
}

impl From<&Draft> for RemotePayload {
    fn from(draft: &Draft) -> Self {
        let album = draft.album.trim().to_string();
        Self {
            title: draft.title.trim().to_string(),
            body: album.clone(),
            rating: draft.rating,
            album,
            duration: draft.duration_seconds,
        }
    }
}

impl From<&RemotePayload> for RemoteRecord {
    fn from(payload: &RemotePayload) -> Self {
        Self {
            id: None,
            title: Some(payload.title.clone()),
            body: Some(payload.body.clone()),
            rating: payload.rating,
            duration: Some(payload.duration),
            album: Some(payload.album.clone()),
        }
    }
}

/// Map a remote record into a Track.
///
/// The remote collection has no duration or rating, so both are derived from
/// the id with a fixed formula. That keeps reloads reproducible but carries no
/// meaning; treat it as a placeholder, not a business rule.
pub fn project(id: i64, record: &RemoteRecord) -> Track {
    let title = record
        .title
        .as_deref()
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .map(capitalize)
        .unwrap_or_else(|| UNTITLED.to_string());

    let album = record
        .album
        .as_deref()
        .map(str::trim)
        .filter(|album| !album.is_empty())
        .map(str::to_string)
        .or_else(|| album_from_body(record.body.as_deref()))
        .unwrap_or_else(|| UNKNOWN_ALBUM.to_string());

    let rating = record.rating.unwrap_or_else(|| pseudo_rating(id));
    let duration = record.duration.unwrap_or_else(|| pseudo_duration(id));

    Track::new(id, title, album, clamp_rating(rating), duration)
}

/// `180 + (id mod 30)`, with 10 standing in for a zero remainder.
pub fn pseudo_duration(id: i64) -> u32 {
    match id.rem_euclid(30) {
        0 => 190,
        rest => 180 + rest as u32,
    }
}

/// `((id mod 10) + 1) / 2`, rounded to one decimal. Spans `0.5..=5.0`.
pub fn pseudo_rating(id: i64) -> f64 {
    let raw = (((id.rem_euclid(10) + 1) as f64) * 10.0).round() / 20.0;
    (raw * 10.0).round() / 10.0
}

/// First three words of the body with a capital initial.
fn album_from_body(body: Option<&str>) -> Option<String> {
    let words: Vec<&str> = body?.split_whitespace().take(3).collect();
    if words.is_empty() {
        None
    } else {
        Some(capitalize(&words.join(" ")))
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
