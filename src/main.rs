// src/main.rs
use std::env;
use std::process::ExitCode;

use tracing::error;
use tracing_subscriber::EnvFilter;

use reeltalk::app::types::FilterSet;
use reeltalk::app::view::{grid_columns, ListView};
use reeltalk::app::ReelTalkApp;
use reeltalk::config::load_config;

/// Width used to pick the column count when printing the grid.
const TERMINAL_WIDTH_PX: f32 = 1024.0;

/// `reeltalk [words..] [year=2024] [rating=4] [sort=highest]`
/// `reeltalk detail <movie id>`
#[tokio::main]
async fn main() -> ExitCode {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    let cfg = load_config();
    let mut app = match ReelTalkApp::from_config(&cfg) {
        Ok(app) => app,
        Err(e) => {
            error!("failed to build http client: {e}");
            return ExitCode::FAILURE;
        }
    };

    let args: Vec<String> = env::args().skip(1).collect();
    if args.first().map(String::as_str) == Some("detail") {
        return show_detail(&app, args.get(1).map(String::as_str)).await;
    }

    let (pairs, words): (Vec<&str>, Vec<&str>) =
        args.iter().map(String::as_str).partition(|a| a.contains('='));
    let filters = FilterSet::from_pairs(pairs.iter().filter_map(|p| p.split_once('=')));
    let query = words.join(" ");

    app.set_filters(filters);
    app.set_query(&query);
    app.settle().await;
    println!("{}", app.heading());
    match app.list_view() {
        ListView::Idle | ListView::Loading => println!("Loading..."),
        ListView::Failed(reason) => {
            println!("Error: {reason}");
            return ExitCode::FAILURE;
        }
        ListView::NoResults => println!("No movies found."),
        ListView::Malformed(diag) => println!("No movies found ({diag})."),
        ListView::Cards(cards) => {
            let cols = grid_columns(TERMINAL_WIDTH_PX);
            for row in cards.chunks(cols) {
                let line: Vec<String> = row
                    .iter()
                    .map(|c| format!("[{}] {}", c.id, c.title_line))
                    .collect();
                println!("{}", line.join("   "));
            }
        }
    }
    ExitCode::SUCCESS
}

async fn show_detail<G>(app: &ReelTalkApp<G>, id: Option<&str>) -> ExitCode
where
    G: reeltalk::app::gateway::MovieGateway + ?Sized + 'static,
{
    let Some(id) = id.and_then(|s| s.trim().parse::<i64>().ok()) else {
        error!("usage: reeltalk detail <movie id>");
        return ExitCode::FAILURE;
    };
    match app.detail(id).await {
        Ok(view) => {
            println!("{}", view.title_line);
            println!("{}", view.poster_url);
            if let Some(cast) = &view.cast_line {
                println!("Starring: {cast}");
            }
            println!();
            println!("{}", view.description);
            println!();
            println!("{}", view.reviews_heading());
            if let Some(empty) = view.empty_label() {
                println!("{empty}");
            }
            for r in &view.reviews {
                println!("- {} ({}): {}", r.author, r.rating_label, r.comment);
            }
            for t in &view.trailers {
                println!("{}: {}", t.name, t.url);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
