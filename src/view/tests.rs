use super::*;
use crate::models::{SortDirection, SortKey, Track, ViewQuery};

fn track(id: i64, title: &str, rating: f64, duration: u32) -> Track {
    Track::new(id, title, "Album", rating, duration)
}

fn sample() -> Vec<Track> {
    vec![
        track(1, "Bohemian Rhapsody", 4.5, 354),
        track(2, "imagine", 3.0, 183),
        track(3, "Hotel California", 4.5, 391),
        track(4, "Yesterday", 2.0, 125),
        track(5, "Hey Jude", 3.5, 431),
    ]
}

fn ids(tracks: &[Track]) -> Vec<i64> {
    tracks.iter().map(|t| t.id).collect()
}

#[test]
fn derive_is_idempotent() {
    let tracks = sample();
    let query = ViewQuery::default().with_text("e").with_min_rating(3.0);
    assert_eq!(derive(&tracks, &query), derive(&tracks, &query));
}

#[test]
fn text_filter_is_case_insensitive_and_trimmed() {
    let query = ViewQuery::default()
        .with_text("  HOTEL ")
        .sorted_by(SortKey::Title, SortDirection::Ascending);
    assert_eq!(ids(&filter_and_sort(&sample(), &query)), vec![3]);
}

#[test]
fn min_rating_is_inclusive() {
    let query = ViewQuery::default()
        .with_min_rating(3.5)
        .sorted_by(SortKey::Duration, SortDirection::Ascending);
    assert_eq!(ids(&filter_and_sort(&sample(), &query)), vec![1, 3, 5]);
}

#[test]
fn widening_the_query_never_drops_matches() {
    let tracks = sample();
    let narrow = ViewQuery::default().with_text("hey j").with_min_rating(3.5);
    let wider = ViewQuery::default().with_text("he").with_min_rating(2.0);

    let narrow_ids = ids(&filter_and_sort(&tracks, &narrow));
    let wider_ids = ids(&filter_and_sort(&tracks, &wider));
    assert!(!narrow_ids.is_empty());
    for id in narrow_ids {
        assert!(wider_ids.contains(&id), "{id} vanished when widening");
    }
}

#[test]
fn descending_mirrors_ascending_without_ties() {
    let tracks = sample();
    let asc = ViewQuery::default().sorted_by(SortKey::Duration, SortDirection::Ascending);
    let desc = ViewQuery::default().sorted_by(SortKey::Duration, SortDirection::Descending);

    let mut reversed = ids(&filter_and_sort(&tracks, &asc));
    reversed.reverse();
    assert_eq!(ids(&filter_and_sort(&tracks, &desc)), reversed);
}

#[test]
fn ties_keep_list_order_in_both_directions() {
    let tracks = sample();
    let asc = ViewQuery::default().sorted_by(SortKey::Rating, SortDirection::Ascending);
    let desc = ViewQuery::default().sorted_by(SortKey::Rating, SortDirection::Descending);

    // Tracks 1 and 3 share 4.5.
    assert_eq!(ids(&filter_and_sort(&tracks, &asc)), vec![4, 2, 5, 1, 3]);
    assert_eq!(ids(&filter_and_sort(&tracks, &desc)), vec![1, 3, 5, 2, 4]);
}

#[test]
fn titles_sort_without_regard_to_case() {
    let query = ViewQuery::default().sorted_by(SortKey::Title, SortDirection::Ascending);
    assert_eq!(
        ids(&filter_and_sort(&sample(), &query)),
        vec![1, 5, 3, 2, 4]
    );
}

#[test]
fn stats_cover_the_unfiltered_list() {
    let tracks = sample();
    let view = derive(&tracks, &ViewQuery::default().with_text("yesterday"));

    assert_eq!(view.items.len(), 1);
    assert_eq!(view.stats.count, 5);
    assert!((view.stats.mean_rating - 3.5).abs() < 1e-9);
    assert_eq!(view.stats.best.map(|t| t.id), Some(1));
}

#[test]
fn empty_list_has_zero_mean() {
    let stats = stats(&[]);
    assert_eq!(stats.count, 0);
    assert_eq!(stats.mean_rating, 0.0);
    assert!(stats.best.is_none());
}

#[test]
fn accented_titles_sort_with_their_base_letter() {
    let tracks = vec![
        track(1, "Zebra", 3.0, 200),
        track(2, "Émile", 3.0, 200),
        track(3, "apple", 3.0, 200),
        track(4, "Emile", 3.0, 200),
        track(5, "éclair", 3.0, 200),
    ];
    let query = ViewQuery::default().sorted_by(SortKey::Title, SortDirection::Ascending);
    let titles: Vec<String> = filter_and_sort(&tracks, &query)
        .into_iter()
        .map(|t| t.title)
        .collect();

    assert_eq!(titles, vec!["apple", "éclair", "Emile", "Émile", "Zebra"]);
}

#[test]
fn case_only_differences_put_lowercase_first() {
    assert_eq!(compare_titles("apple", "Apple"), Ordering::Less);
    assert_eq!(compare_titles("Apple", "apple"), Ordering::Greater);
    assert_eq!(compare_titles("Hey Jude", "Hey Jude"), Ordering::Equal);
}
