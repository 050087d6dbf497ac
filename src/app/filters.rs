// src/app/filters.rs
use std::cmp::Ordering;

use tracing::debug;

use super::types::{FilterSet, MovieRecord, SortKey};

/// Filter then sort a fetched collection. Never mutates `movies` and never fails:
/// records missing a field drop out of that filter or sort last.
pub fn apply(movies: &[MovieRecord], filters: &FilterSet) -> Vec<MovieRecord> {
    filtered_indices(movies, filters)
        .into_iter()
        .map(|i| movies[i].clone())
        .collect()
}

/// Same as [`apply`] but yields positions into `movies`, so callers can keep
/// their own per-row state keyed by index.
pub fn filtered_indices(movies: &[MovieRecord], filters: &FilterSet) -> Vec<usize> {
    let year = filters.year_value();
    let min_rating = filters.rating_value().and_then(parse_rating);

    if let Some(genre) = filters.genre_value() {
        // raw provider records carry genre ids only; nothing to match against
        debug!("genre filter `{genre}` is not enforced");
    }

    let mut out: Vec<usize> = movies
        .iter()
        .enumerate()
        .filter(|(_, m)| year.map_or(true, |y| matches_year(m, y)))
        .filter(|(_, m)| min_rating.map_or(true, |r| matches_rating(m, r)))
        .map(|(i, _)| i)
        .collect();

    if let Some(key) = filters.sort {
        // Vec::sort_by is stable; equal keys keep gateway order
        out.sort_by(|&a, &b| compare(&movies[a], &movies[b], key));
    }
    out
}

fn parse_rating(raw: &str) -> Option<f64> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            debug!("ignoring unparsable rating filter `{raw}`");
            None
        }
    }
}

fn matches_year(movie: &MovieRecord, year: &str) -> bool {
    movie.release_year() == Some(year)
}

fn matches_rating(movie: &MovieRecord, min: f64) -> bool {
    movie.vote_average.is_some_and(|v| v >= min)
}

fn compare(a: &MovieRecord, b: &MovieRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::Newest => missing_last(date_of(a), date_of(b), |x, y| y.cmp(x)),
        SortKey::Oldest => missing_last(date_of(a), date_of(b), |x, y| x.cmp(y)),
        SortKey::Highest => missing_last(a.vote_average, b.vote_average, |x, y| y.total_cmp(&x)),
        SortKey::Alphabetical => a.title.cmp(&b.title),
    }
}

fn date_of(m: &MovieRecord) -> Option<&str> {
    m.release_date.as_deref().filter(|d| !d.trim().is_empty())
}

fn missing_last<T, F>(a: Option<T>, b: Option<T>, cmp: F) -> Ordering
where
    F: FnOnce(T, T) -> Ordering,
{
    match (a, b) {
        (Some(x), Some(y)) => cmp(x, y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: i64, title: &str, date: Option<&str>, rating: Option<f64>) -> MovieRecord {
        MovieRecord {
            id,
            title: title.to_string(),
            release_date: date.map(str::to_string),
            poster_path: None,
            vote_average: rating,
            overview: None,
            top_cast: Vec::new(),
        }
    }

    fn ids(movies: &[MovieRecord]) -> Vec<i64> {
        movies.iter().map(|m| m.id).collect()
    }

    fn sample() -> Vec<MovieRecord> {
        vec![
            movie(1, "heat", Some("1995-12-15"), Some(7.9)),
            movie(2, "Alien", Some("1979-05-25"), Some(8.5)),
            movie(3, "Zodiac", None, Some(7.7)),
            movie(4, "Brazil", Some("1985-02-20"), None),
            movie(5, "Arrival", Some("2016-11-11"), Some(7.9)),
        ]
    }

    #[test]
    fn empty_filter_is_identity() {
        let movies = sample();
        assert_eq!(apply(&movies, &FilterSet::default()), movies);
        assert!(apply(&[], &FilterSet::default()).is_empty());
    }

    #[test]
    fn rating_threshold_is_inclusive_and_keeps_order() {
        let movies = vec![
            movie(1, "a", None, Some(3.0)),
            movie(2, "b", None, Some(4.5)),
            movie(3, "c", None, Some(2.0)),
        ];
        let f = FilterSet {
            rating: Some("3".into()),
            ..Default::default()
        };
        assert_eq!(ids(&apply(&movies, &f)), vec![1, 2]);
    }

    #[test]
    fn rating_five_needs_five_or_more() {
        let movies = vec![
            movie(1, "a", None, Some(4.99)),
            movie(2, "b", None, Some(5.0)),
            movie(3, "c", None, None),
        ];
        let f = FilterSet {
            rating: Some("5".into()),
            ..Default::default()
        };
        assert_eq!(ids(&apply(&movies, &f)), vec![2]);
    }

    #[test]
    fn year_must_match_exactly_and_missing_dates_drop_out() {
        let f = FilterSet {
            year: Some("1979".into()),
            ..Default::default()
        };
        assert_eq!(ids(&apply(&sample(), &f)), vec![2]);

        let f = FilterSet {
            year: Some("19".into()),
            ..Default::default()
        };
        assert!(apply(&sample(), &f).is_empty());
    }

    #[test]
    fn genre_filter_passes_everything() {
        let f = FilterSet {
            genre: Some("Horror".into()),
            ..Default::default()
        };
        assert_eq!(apply(&sample(), &f), sample());
    }

    #[test]
    fn unparsable_rating_is_no_constraint() {
        let f = FilterSet {
            rating: Some("lots".into()),
            ..Default::default()
        };
        assert_eq!(apply(&sample(), &f), sample());
    }

    #[test]
    fn newest_and_oldest_put_missing_dates_last() {
        let f = FilterSet {
            sort: Some(SortKey::Newest),
            ..Default::default()
        };
        assert_eq!(ids(&apply(&sample(), &f)), vec![5, 1, 4, 2, 3]);

        let f = FilterSet {
            sort: Some(SortKey::Oldest),
            ..Default::default()
        };
        assert_eq!(ids(&apply(&sample(), &f)), vec![2, 4, 1, 5, 3]);
    }

    #[test]
    fn highest_breaks_ties_by_insertion_order() {
        let f = FilterSet {
            sort: Some(SortKey::Highest),
            ..Default::default()
        };
        assert_eq!(ids(&apply(&sample(), &f)), vec![2, 1, 5, 3, 4]);
    }

    #[test]
    fn alphabetical_is_case_sensitive_ordinal() {
        let f = FilterSet {
            sort: Some(SortKey::Alphabetical),
            ..Default::default()
        };
        let once = apply(&sample(), &f);
        // lowercase "heat" sorts after every capitalised title
        assert_eq!(ids(&once), vec![2, 5, 4, 3, 1]);
        assert_eq!(apply(&once, &f), once);
    }

    #[test]
    fn apply_is_idempotent_and_leaves_input_alone() {
        let movies = sample();
        let before = movies.clone();
        let f = FilterSet {
            rating: Some("7.8".into()),
            sort: Some(SortKey::Highest),
            ..Default::default()
        };
        let once = apply(&movies, &f);
        assert_eq!(apply(&once, &f), once);
        assert_eq!(movies, before);
    }

    #[test]
    fn filters_are_conjunctive() {
        let f = FilterSet {
            year: Some("1995".into()),
            rating: Some("8".into()),
            ..Default::default()
        };
        assert!(apply(&sample(), &f).is_empty());
    }
}
