use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::engine::RequestId;
use crate::error::ValidationError;
use crate::models::{Draft, DraftField, Track};

/// Text state behind the create/edit modal. Values stay as typed until
/// [`TrackForm::parse_inputs`] turns them into a [`Draft`].
#[derive(Default, Clone)]
pub(crate) struct TrackForm {
    pub(crate) title: String,
    pub(crate) duration: String,
    pub(crate) rating: String,
    pub(crate) album: String,
    pub(crate) active: FormField,
    pub(crate) error: Option<String>,
    /// Fields that failed the last validation attempt.
    pub(crate) invalid: Vec<DraftField>,
    /// Set while a submit is waiting on the remote.
    pub(crate) pending: Option<RequestId>,
}

/// Focusable fields, in tab order.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub(crate) enum FormField {
    #[default]
    Title,
    Duration,
    Rating,
    Album,
}

impl FormField {
    pub(crate) const ALL: [FormField; 4] = [
        FormField::Title,
        FormField::Duration,
        FormField::Rating,
        FormField::Album,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            FormField::Title => "Title",
            FormField::Duration => "Duration",
            FormField::Rating => "Rating",
            FormField::Album => "Album",
        }
    }

    fn placeholder(self) -> &'static str {
        match self {
            FormField::Title => "<required>",
            FormField::Duration => "<m:ss or seconds>",
            FormField::Rating => "<0-5, optional>",
            FormField::Album => "<optional>",
        }
    }

    fn draft_field(self) -> DraftField {
        match self {
            FormField::Title => DraftField::Title,
            FormField::Duration => DraftField::Duration,
            FormField::Rating => DraftField::Rating,
            FormField::Album => DraftField::Album,
        }
    }

    fn index(self) -> usize {
        match self {
            FormField::Title => 0,
            FormField::Duration => 1,
            FormField::Rating => 2,
            FormField::Album => 3,
        }
    }
}

impl TrackForm {
    /// Populate the form from an existing Track when entering edit mode.
    pub(crate) fn from_track(track: &Track) -> Self {
        let draft = Draft::from_track(track);
        Self {
            title: draft.title,
            duration: format_duration(draft.duration_seconds),
            rating: draft.rating.map(|r| format!("{r:.1}")).unwrap_or_default(),
            album: draft.album,
            ..Self::default()
        }
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Move focus forward, wrapping after the last field.
    pub(crate) fn next_field(&mut self) {
        let next = (self.active.index() + 1) % FormField::ALL.len();
        self.active = FormField::ALL[next];
    }

    /// Move focus backward, wrapping before the first field.
    pub(crate) fn previous_field(&mut self) {
        let len = FormField::ALL.len();
        let previous = (self.active.index() + len - 1) % len;
        self.active = FormField::ALL[previous];
    }

    /// Append a character to the active field if it fits that field.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            FormField::Title => self.title.push(ch),
            FormField::Album => self.album.push(ch),
            FormField::Duration => {
                if ch.is_ascii_digit() || (ch == ':' && !self.duration.contains(':')) {
                    self.duration.push(ch);
                } else {
                    return false;
                }
            }
            FormField::Rating => {
                if ch.is_ascii_digit() || (ch == '.' && !self.rating.contains('.')) {
                    self.rating.push(ch);
                } else {
                    return false;
                }
            }
        }
        self.clear_errors();
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            FormField::Title => {
                self.title.pop();
            }
            FormField::Duration => {
                self.duration.pop();
            }
            FormField::Rating => {
                self.rating.pop();
            }
            FormField::Album => {
                self.album.pop();
            }
        }
        self.clear_errors();
    }

    fn clear_errors(&mut self) {
        self.error = None;
        self.invalid.clear();
    }

    /// Turn the typed text into a Draft. Only parsing happens here; range
    /// checks belong to [`Draft::validate`].
    pub(crate) fn parse_inputs(&self) -> Result<Draft, ValidationError> {
        let duration_seconds = parse_duration(&self.duration).ok_or_else(|| {
            ValidationError::single(
                DraftField::Duration,
                "Duration must be seconds or m:ss.",
            )
        })?;

        let rating_raw = self.rating.trim();
        let rating = if rating_raw.is_empty() {
            None
        } else {
            Some(rating_raw.parse::<f64>().map_err(|_| {
                ValidationError::single(DraftField::Rating, "Rating must be a number.")
            })?)
        };

        Ok(Draft {
            title: self.title.trim().to_string(),
            duration_seconds,
            rating,
            album: self.album.trim().to_string(),
        })
    }

    /// Record a validation failure for display.
    pub(crate) fn reject(&mut self, err: &ValidationError) {
        self.invalid = err.fields().iter().map(|field| field.field).collect();
        self.error = Some(err.to_string());
    }

    pub(crate) fn value(&self, field: FormField) -> &str {
        match field {
            FormField::Title => &self.title,
            FormField::Duration => &self.duration,
            FormField::Rating => &self.rating,
            FormField::Album => &self.album,
        }
    }

    /// Character count of the requested field, for cursor placement.
    pub(crate) fn value_len(&self, field: FormField) -> usize {
        self.value(field).chars().count()
    }

    /// Render one `Label: value` line.
    pub(crate) fn build_line(&self, field: FormField) -> Line<'static> {
        let value = self.value(field);
        let is_active = self.active == field;
        let is_invalid = self.invalid.contains(&field.draft_field());

        let display = if value.is_empty() {
            field.placeholder().to_string()
        } else {
            value.to_string()
        };

        let style = if is_invalid {
            Style::default().fg(Color::Red)
        } else if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{}: ", field.label())),
            Span::styled(display, style),
        ])
    }
}

/// Accepts plain seconds (`200`) or minutes and seconds (`3:20`).
pub(crate) fn parse_duration(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    match raw.split_once(':') {
        Some((minutes, seconds)) => {
            let minutes: u32 = minutes.parse().ok()?;
            let seconds: u32 = seconds.parse().ok()?;
            if seconds >= 60 {
                return None;
            }
            minutes.checked_mul(60)?.checked_add(seconds)
        }
        None => raw.parse().ok(),
    }
}

pub(crate) fn format_duration(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
