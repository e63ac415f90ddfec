use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use moviedeck::auth::Auth;
use moviedeck::catalog::{CatalogApi, HttpCatalog, SearchQuery};
use moviedeck::config::{check_env, ClientConfig};
use moviedeck::controller::{
    sources, DetailController, FavoriteToggle, ListController, MovieDetailSource, PageSource,
    PersonDetailSource, ToggleOutcome, DEFAULT_TOP_RATED_CATEGORY,
};
use moviedeck::http::ApiClient;
use moviedeck::models::{KnownForMovie, MovieSummary, Review};
use moviedeck::pagination::{page_links, PageLink};
use moviedeck::session::{AuthEvent, FileTokenStore, Session};
use moviedeck::validation::{LoginForm, ProfileForm, SignupForm};

#[derive(Parser)]
#[command(name = "moviedeck", version, about = "Browse the movie catalog from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List all movies
    Movies {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Most popular movies
    Popular {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Top rated movies in a category
    TopRated {
        #[arg(long, default_value = DEFAULT_TOP_RATED_CATEGORY)]
        category: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Search by title, or by person with --person
    Search {
        text: String,
        #[arg(long)]
        person: bool,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Show one movie with cast and similar titles
    Movie { id: String },
    /// Show a person and their filmography
    Person {
        id: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Reviews of a movie
    Reviews {
        id: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    Login {
        username: String,
        #[arg(long, env = "MOVIEDECK_PASSWORD", hide_env_values = true)]
        password: String,
        /// Keep the session token on disk
        #[arg(long)]
        remember_me: bool,
    },
    Register {
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "MOVIEDECK_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        phone: String,
        /// Date of birth, YYYY-MM-DD
        #[arg(long)]
        dob: NaiveDate,
    },
    Logout,
    Profile,
    UpdateProfile {
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        dob: NaiveDate,
    },
    Favorites {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    Favorite {
        #[command(subcommand)]
        action: FavoriteAction,
    },
}

#[derive(Subcommand)]
enum FavoriteAction {
    Add { id: String },
    Remove { id: String },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    match dotenv() {
        Ok(path) => info!("Loaded environment from {:?}", path),
        Err(e) => warn!("No .env file loaded ({}) - relying on environment", e),
    }
    init_tracing();
    let cli = Cli::parse();
    check_env()?;

    let config = ClientConfig::from_env().context("Failed to load client configuration")?;
    let store = FileTokenStore::new(&config.token_file);
    let session = match &cli.command {
        Command::Login { remember_me, .. } => Session::for_login(store, *remember_me),
        _ => Session::new(store),
    };
    watch_session(&session);

    let http = ApiClient::new(&config, session.clone()).context("Failed to build API client")?;
    let api: Arc<dyn CatalogApi> = Arc::new(HttpCatalog::new(http));
    run(cli.command, api, session).await
}

/// Logs when the backend rejects the stored token.
fn watch_session(session: &Session) {
    let mut events = session.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if event == AuthEvent::Invalidated {
                warn!("Session expired, run `moviedeck login` again");
            }
        }
    });
}

async fn run(command: Command, api: Arc<dyn CatalogApi>, session: Session) -> Result<()> {
    let auth = Auth::new(api.clone(), session.clone());
    match command {
        Command::Movies { page } => {
            let list = sources::movies_list(api);
            show_page(&list, page, print_movie).await?;
        }
        Command::Popular { page } => {
            let list = sources::popular_list(api);
            show_page(&list, page, print_movie).await?;
        }
        Command::TopRated { category, page } => {
            let list = sources::top_rated_list(api);
            list.set_query(category).await?;
            show_page(&list, page, print_movie).await?;
        }
        Command::Search { text, person, page } => {
            let query = if person {
                SearchQuery::Person(text)
            } else {
                SearchQuery::Title(text)
            };
            let list = sources::search_list(api);
            list.set_query(query).await?;
            show_page(&list, page, print_movie).await?;
        }
        Command::Movie { id } => {
            let detail = DetailController::new(MovieDetailSource::new(api));
            if let Some(movie) = detail.load(&id).await? {
                print_movie(&movie.summary);
                if let Some(plot) = &movie.plot_full {
                    println!("\n{plot}");
                }
                if !movie.directors.is_empty() {
                    let names: Vec<&str> = movie.directors.iter().map(|d| d.name.as_str()).collect();
                    println!("\nDirected by {}", names.join(", "));
                }
                for actor in &movie.actors {
                    match &actor.character {
                        Some(character) => println!("  {} as {}", actor.name, character),
                        None => println!("  {}", actor.name),
                    }
                }
                if !movie.similar_movies.is_empty() {
                    println!("\nSimilar:");
                    movie.similar_movies.iter().for_each(print_movie);
                }
            }
        }
        Command::Person { id, page } => {
            let detail = DetailController::new(PersonDetailSource::new(api));
            if let Some(view) = detail.load(&id).await? {
                println!("{}", view.person.name);
                if let Some(bio) = &view.person.summary {
                    println!("{bio}\n");
                }
                let filmography = sources::filmography_list(view.known_for);
                show_page(&filmography, page, |m: &KnownForMovie| {
                    let year = m.year.map(|y| y.to_string()).unwrap_or_default();
                    println!("{:<12} {} ({}) - {}", m.id, m.title, year, m.roles.join(", "));
                })
                .await?;
            }
        }
        Command::Reviews { id, page } => {
            let list = sources::reviews_list(api, &id);
            show_page(&list, page, print_review).await?;
        }
        Command::Login {
            username,
            password,
            remember_me,
        } => {
            let form = LoginForm {
                username,
                password,
                remember_me,
            };
            let user = auth.login(&form).await.map_err(report)?;
            println!("Welcome back, {}", user.username);
            if !remember_me {
                println!("Session not saved; pass --remember-me to stay logged in");
            }
        }
        Command::Register {
            username,
            email,
            password,
            phone,
            dob,
        } => {
            let form = SignupForm {
                username,
                email,
                password,
                phone,
                dob,
            };
            let user = auth.register(&form).await.map_err(report)?;
            println!("Account created for {}", user.username);
        }
        Command::Logout => auth.logout(),
        Command::Profile => {
            let user = auth.profile().await.map_err(report)?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        Command::UpdateProfile { email, phone, dob } => {
            let form = ProfileForm { email, phone, dob };
            let user = auth.update_profile(&form).await.map_err(report)?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        Command::Favorites { page } => {
            let list = sources::favorites_list(api, session);
            show_page(&list, page, print_movie).await.map_err(report)?;
        }
        Command::Favorite { action } => {
            let toggle = match action {
                FavoriteAction::Add { id } => FavoriteToggle::new(id, false),
                FavoriteAction::Remove { id } => FavoriteToggle::new(id, true),
            };
            match toggle.toggle(api.as_ref()).await {
                ToggleOutcome::Added => println!("Added {} to favorites", toggle.movie_id()),
                ToggleOutcome::Removed => println!("Removed {} from favorites", toggle.movie_id()),
                ToggleOutcome::Busy | ToggleOutcome::Failed(_) => {}
            }
        }
    }
    Ok(())
}

async fn show_page<S: PageSource>(
    list: &ListController<S>,
    page: u32,
    print: impl Fn(&S::Item),
) -> moviedeck::ApiResult<()> {
    if list.snapshot().page != page {
        list.fetch(page, false).await?;
    }
    let state = list.snapshot();
    if state.items.is_empty() {
        println!("Nothing to show");
        return Ok(());
    }
    state.items.iter().for_each(print);

    let strip: Vec<String> = page_links(state.page, state.total_pages)
        .into_iter()
        .map(|link| match link {
            PageLink::Number(n) if n == state.page => format!("[{n}]"),
            PageLink::Number(n) => n.to_string(),
            PageLink::Ellipsis => "...".to_string(),
        })
        .collect();
    if !strip.is_empty() {
        println!("\nPage {}  {}", state.page, strip.join(" "));
    }
    Ok(())
}

fn print_movie(movie: &MovieSummary) {
    let year = movie.year.map(|y| y.to_string()).unwrap_or_else(|| "----".to_string());
    let rate = movie
        .rate
        .map(|r| format!("{r:.1}"))
        .unwrap_or_else(|| "-".to_string());
    println!("{:<12} {:>4}  {:>4}  {}", movie.id, year, rate, movie.title);
}

fn print_review(review: &Review) {
    let rate = review.rate.map(|r| format!("{r:.0}/10")).unwrap_or_default();
    println!("{} {} - {}", review.username, rate, review.title);
    if review.warning_spoilers {
        println!("  (contains spoilers)");
    } else {
        println!("  {}", review.content);
    }
}

/// Turns a library error into the one-line message shown for forms.
fn report(err: moviedeck::ApiError) -> anyhow::Error {
    anyhow::anyhow!(err.user_message())
}
