// src/app/detail.rs
use super::types::{MovieRecord, Review, Trailer};
use super::view::{resolve_poster, title_line};

pub const NO_REVIEWS: &str = "No reviews yet.";
pub const NO_DESCRIPTION: &str = "No description available.";

#[derive(Clone, Debug, PartialEq)]
pub struct ReviewLine {
    pub author: String,
    pub rating_label: String,
    pub comment: String,
}

/// Everything the spotlight page shows for one movie.
#[derive(Clone, Debug, PartialEq)]
pub struct DetailView {
    pub id: i64,
    pub title_line: String,
    pub poster_url: String,
    pub description: String,
    pub cast_line: Option<String>,
    pub average_rating: Option<f64>,
    pub reviews: Vec<ReviewLine>,
    pub trailers: Vec<TrailerLink>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrailerLink {
    pub name: String,
    pub url: String,
}

impl DetailView {
    pub fn reviews_heading(&self) -> String {
        match self.average_rating {
            Some(avg) => format!("User Reviews ({}, avg {avg:.1}/5)", self.reviews.len()),
            None => "User Reviews".to_string(),
        }
    }

    pub fn empty_label(&self) -> Option<&'static str> {
        self.reviews.is_empty().then_some(NO_REVIEWS)
    }
}

pub fn average_rating(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let total: i64 = reviews.iter().map(|r| i64::from(r.rating)).sum();
    Some(total as f64 / reviews.len() as f64)
}

fn review_line(review: &Review) -> ReviewLine {
    let stars = if review.rating == 1 { "star" } else { "stars" };
    ReviewLine {
        author: review
            .username
            .clone()
            .unwrap_or_else(|| "Unknown".to_string()),
        rating_label: format!("Rating: {} {stars}", review.rating),
        comment: review.comment.clone(),
    }
}

pub fn compose_detail(
    movie: &MovieRecord,
    reviews: &[Review],
    trailers: &[Trailer],
) -> DetailView {
    DetailView {
        id: movie.id,
        title_line: title_line(&movie.title, movie.release_year()),
        poster_url: resolve_poster(movie.poster_path.as_deref()),
        description: movie
            .overview
            .clone()
            .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
        cast_line: (!movie.top_cast.is_empty()).then(|| movie.top_cast.join(", ")),
        average_rating: average_rating(reviews),
        reviews: reviews.iter().map(review_line).collect(),
        trailers: trailers
            .iter()
            .map(|t| TrailerLink {
                name: t.name.clone(),
                url: t.watch_url(),
            })
            .collect(),
    }
}
