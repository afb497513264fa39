//! Domain models shared by the gateway, the engine and the terminal front end.
//! They stay plain data holders; the engine owns the list and every rule about
//! how it changes.

use std::fmt;

use serde::Deserialize;

use crate::error::{FieldError, ValidationError};

/// Shortest accepted title, in characters.
pub const TITLE_MIN_CHARS: usize = 2;
/// Longest accepted title, in characters.
pub const TITLE_MAX_CHARS: usize = 100;
/// Lowest rating a Track can hold.
pub const RATING_MIN: f64 = 0.0;
/// Highest rating a Track can hold.
pub const RATING_MAX: f64 = 5.0;
/// Longest accepted duration (two hours).
pub const DURATION_MAX_SECONDS: u32 = 7200;
/// Longest accepted album text, in characters.
pub const ALBUM_MAX_CHARS: usize = 300;
/// Album shown when the remote record carries nothing usable.
pub const UNKNOWN_ALBUM: &str = "Unknown Album";
/// Title shown for a Track whose remote title is blank.
pub const UNTITLED: &str = "Untitled";

#[derive(Debug, Clone, PartialEq)]
/// One catalog entry. Built through [`Track::new`] so the rating is always
/// inside `RATING_MIN..=RATING_MAX`.
pub struct Track {
    /// Identifier assigned by the remote collection.
    pub id: i64,
    pub title: String,
    pub album: String,
    /// Performing artists in credit order.
    pub artists: Vec<String>,
    pub rating: f64,
    pub duration_seconds: u32,
    pub cover_image_url: Option<String>,
}

impl Track {
    pub fn new(
        id: i64,
        title: impl Into<String>,
        album: impl Into<String>,
        rating: f64,
        duration_seconds: u32,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            album: album.into(),
            artists: Vec::new(),
            rating: clamp_rating(rating),
            duration_seconds,
            cover_image_url: None,
        }
    }

    /// Attach artist credits.
    pub fn with_artists(mut self, artists: Vec<String>) -> Self {
        self.artists = artists;
        self
    }

    /// Attach a cover image reference.
    pub fn with_cover(mut self, url: impl Into<String>) -> Self {
        self.cover_image_url = Some(url.into());
        self
    }

    /// `m:ss` rendering of the duration.
    pub fn duration_label(&self) -> String {
        format!(
            "{}:{:02}",
            self.duration_seconds / 60,
            self.duration_seconds % 60
        )
    }

    /// Comma separated artists, or `None` when nobody is credited.
    pub fn artist_line(&self) -> Option<String> {
        if self.artists.is_empty() {
            None
        } else {
            Some(self.artists.join(", "))
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// Clamp a rating into the storable range. NaN collapses to the minimum.
pub fn clamp_rating(rating: f64) -> f64 {
    if rating.is_nan() {
        RATING_MIN
    } else {
        rating.clamp(RATING_MIN, RATING_MAX)
    }
}

/// Fields of a [`Draft`], used to scope validation errors and form focus.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DraftField {
    Title,
    Duration,
    Rating,
    Album,
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DraftField::Title => "title",
            DraftField::Duration => "duration",
            DraftField::Rating => "rating",
            DraftField::Album => "album",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
/// Unsaved form state for a Track being created or edited.
pub struct Draft {
    pub title: String,
    pub duration_seconds: u32,
    /// `None` lets the remote projection derive a rating.
    pub rating: Option<f64>,
    pub album: String,
}

impl Draft {
    /// Pre-fill a draft from an existing Track for the edit flow.
    pub fn from_track(track: &Track) -> Self {
        Self {
            title: track.title.clone(),
            duration_seconds: track.duration_seconds,
            rating: Some(track.rating),
            album: track.album.clone(),
        }
    }

    /// Check every field against its declared bounds. All offending fields are
    /// reported together so a form can mark each of them.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = Vec::new();

        let title_chars = self.title.trim().chars().count();
        if title_chars == 0 {
            errors.push(FieldError::new(DraftField::Title, "Title is required."));
        } else if !(TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&title_chars) {
            errors.push(FieldError::new(
                DraftField::Title,
                format!("Title must be {TITLE_MIN_CHARS}-{TITLE_MAX_CHARS} characters."),
            ));
        }

        if self.duration_seconds == 0 || self.duration_seconds > DURATION_MAX_SECONDS {
            errors.push(FieldError::new(
                DraftField::Duration,
                format!("Duration must be 1-{DURATION_MAX_SECONDS} seconds."),
            ));
        }

        if let Some(rating) = self.rating {
            if !(RATING_MIN..=RATING_MAX).contains(&rating) {
                errors.push(FieldError::new(
                    DraftField::Rating,
                    format!("Rating must be between {RATING_MIN} and {RATING_MAX}."),
                ));
            }
        }

        if self.album.trim().chars().count() > ALBUM_MAX_CHARS {
            errors.push(FieldError::new(
                DraftField::Album,
                format!("Album must be at most {ALBUM_MAX_CHARS} characters."),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(errors))
        }
    }
}

/// Key the derived view is ordered by.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Rating,
    Duration,
    Title,
}

impl SortKey {
    /// Rating → Duration → Title → Rating.
    pub fn next(self) -> Self {
        match self {
            SortKey::Rating => SortKey::Duration,
            SortKey::Duration => SortKey::Title,
            SortKey::Title => SortKey::Rating,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Rating => "rating",
            SortKey::Duration => "duration",
            SortKey::Title => "title",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[serde(alias = "asc")]
    Ascending,
    #[default]
    #[serde(alias = "desc")]
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
/// Active filter and ordering applied to the Track list.
pub struct ViewQuery {
    /// Case-insensitive substring matched against titles.
    pub text: String,
    pub min_rating: f64,
    pub sort_key: SortKey,
    pub direction: SortDirection,
}

impl ViewQuery {
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_min_rating(mut self, min_rating: f64) -> Self {
        self.min_rating = min_rating;
        self
    }

    pub fn sorted_by(mut self, sort_key: SortKey, direction: SortDirection) -> Self {
        self.sort_key = sort_key;
        self.direction = direction;
        self
    }
}
