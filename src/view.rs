//! Derived view over the Track list: filter, order, and summary statistics.
//! Everything here is a pure function of its inputs.

use std::cmp::Ordering;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::{SortDirection, SortKey, Track, ViewQuery};

#[cfg(test)]
mod tests;

/// Aggregates computed over the unfiltered list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CatalogStats {
    pub count: usize,
    /// Exactly `0.0` for an empty list.
    pub mean_rating: f64,
    /// Highest rated Track; ties go to the earliest one in list order.
    pub best: Option<Track>,
}

/// Filtered, ordered items plus statistics, ready for rendering.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CatalogView {
    pub items: Vec<Track>,
    pub stats: CatalogStats,
}

/// Compute the view for `tracks` under `query`.
pub fn derive(tracks: &[Track], query: &ViewQuery) -> CatalogView {
    CatalogView {
        items: filter_and_sort(tracks, query),
        stats: stats(tracks),
    }
}

/// Apply the text and rating filters, then a stable sort by the query's key.
pub fn filter_and_sort(tracks: &[Track], query: &ViewQuery) -> Vec<Track> {
    let needle = query.text.trim().to_lowercase();
    let mut items: Vec<Track> = tracks
        .iter()
        .filter(|track| needle.is_empty() || track.title.to_lowercase().contains(&needle))
        .filter(|track| track.rating >= query.min_rating)
        .cloned()
        .collect();

    // Descending flips the comparator so equal keys keep list order either way.
    items.sort_by(|a, b| {
        let ordering = compare(a, b, query.sort_key);
        match query.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
    items
}

fn compare(a: &Track, b: &Track, key: SortKey) -> Ordering {
    match key {
        SortKey::Rating => a.rating.total_cmp(&b.rating),
        SortKey::Duration => a.duration_seconds.cmp(&b.duration_seconds),
        SortKey::Title => compare_titles(&a.title, &b.title),
    }
}

/// Collation in the manner of the Unicode root locale: base letters first,
/// then accents (unaccented before accented), then case (lowercase first).
/// "apple", "Émile" and "Zebra" sort in that order.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(&base_letters(b))
        .then_with(|| accented(a).cmp(&accented(b)))
        .then_with(|| b.cmp(a))
}

/// Lowercased, decomposed, with combining marks removed.
fn base_letters(text: &str) -> String {
    text.nfd()
        .filter(|ch| !is_combining_mark(*ch))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Lowercased and decomposed, marks kept.
fn accented(text: &str) -> String {
    text.to_lowercase().nfd().collect()
}

/// Count, mean rating and best Track of the whole list.
pub fn stats(tracks: &[Track]) -> CatalogStats {
    if tracks.is_empty() {
        return CatalogStats::default();
    }

    let total: f64 = tracks.iter().map(|track| track.rating).sum();
    let best = tracks.iter().fold(None::<&Track>, |best, track| match best {
        Some(current) if track.rating <= current.rating => Some(current),
        _ => Some(track),
    });

    CatalogStats {
        count: tracks.len(),
        mean_rating: total / tracks.len() as f64,
        best: best.cloned(),
    }
}
