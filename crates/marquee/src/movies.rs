use crate::catalog::{LoadedPage, ViewController, VirtualPager};
use crate::config::AppConfig;
use crate::output::{
    browse, format_navigation, header, load_page, output_json, PageOutput, PaginationInfo,
};
use crate::prelude::{println, *};
use crate::providers::{Catalogs, TmdbProvider};
use colored::Colorize;
use marquee_core::entity::{Movie, TopResult};
use marquee_core::paging::{normalize_limit, PageRequest};
use marquee_core::partition::QuerySelector;
use marquee_core::tmdb::poster_url;
use std::sync::Arc;

#[derive(Debug, clap::Parser)]
#[command(name = "movies")]
#[command(about = "TMDB movie lists")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Best rated movies across the configured lists
    #[clap(name = "top")]
    Top(TopOptions),

    /// One page of the configured lists
    #[clap(name = "page")]
    Page(PageOptions),
}

#[derive(Debug, clap::Args, Clone)]
pub struct TopOptions {
    /// Number of movies to show, 0 for every movie on the fetched pages
    #[arg(short, long, default_value = "6", allow_negative_numbers = true)]
    pub limit: i64,

    /// Upper bound on the native TMDB pages to rank over
    #[arg(long, default_value = "1")]
    pub pages: i64,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct PageOptions {
    /// Page number (1-indexed)
    #[arg(short, long, default_value = "1")]
    pub page: i64,

    /// Movies per page
    #[arg(long, env = "MARQUEE_PAGE_SIZE", default_value = "60")]
    pub page_size: i64,

    /// Output as JSON
    #[arg(long, conflicts_with = "interactive")]
    pub json: bool,

    /// Browse pages from the terminal
    #[arg(short, long)]
    pub interactive: bool,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let config = AppConfig::from_env()?;
    if global.verbose {
        println!("TMDB API Base: {}", config.tmdb.base_url);
        println!("Language: {}", config.tmdb.language);
        println!("Lists: {}", config.tmdb.partitions.join(", "));
        println!();
    }

    let pager = Catalogs::from_config(&config)?.movies;

    match app.command {
        Commands::Top(options) => top(pager, options).await,
        Commands::Page(options) => page(pager, &config, options).await,
    }
}

/// Fetches the top rated movies as a structured TopResult
pub async fn top_movies_data(
    pager: &VirtualPager<TmdbProvider>,
    limit: i64,
    pages: i64,
) -> Result<TopResult<Movie>> {
    // a non-positive limit returns every movie on the hinted pages
    let limit = normalize_limit(Some(limit), 0);
    let pages = normalize_limit(Some(pages), 1);

    let items = pager
        .top_n(limit, None, &QuerySelector::Absent, Some(pages))
        .await?;
    Ok(TopResult { items })
}

async fn top(pager: Arc<VirtualPager<TmdbProvider>>, options: TopOptions) -> Result<()> {
    let output = top_movies_data(&pager, options.limit, options.pages).await?;

    if options.json {
        return output_json(&output);
    }

    println!("{}", header(&f!("TOP {} MOVIES", output.items.len())));
    if output.items.is_empty() {
        println!("{}", "No movies found.".yellow());
        return Ok(());
    }

    let mut table = new_table();
    table.add_row(prettytable::row![
        "#".bold().cyan(),
        "Title".bold().cyan(),
        "Rating".bold().cyan(),
        "Votes".bold().cyan(),
        "Released".bold().cyan(),
        "ID".bold().cyan()
    ]);
    for (idx, movie) in output.items.iter().enumerate() {
        table.add_row(prettytable::row![
            idx + 1,
            movie.title.as_deref().unwrap_or("(No title)"),
            f!("{:.1}", movie.rating()),
            movie.votes(),
            movie.release_date.as_deref().unwrap_or("unknown"),
            movie.id
        ]);
    }
    table.printstd();

    Ok(())
}

async fn page(
    pager: Arc<VirtualPager<TmdbProvider>>,
    config: &AppConfig,
    options: PageOptions,
) -> Result<()> {
    let request = PageRequest::normalize(Some(options.page), Some(options.page_size));
    let controller = ViewController::new(pager, request.page_size, None, QuerySelector::Absent);
    let image_base = config.tmdb.image_base.as_str();

    if options.interactive {
        return browse(&controller, request.page, |loaded| {
            format_page(loaded, image_base)
        })
        .await;
    }

    let loaded = load_page(&controller, request.page).await?;
    let command = f!("marquee movies page --page-size {}", request.page_size);
    let pagination = PaginationInfo::new(&loaded.state, &command);

    if options.json {
        return output_json(&PageOutput {
            items: loaded.items,
            pagination,
        });
    }

    let mut result = String::new();
    if loaded.page != request.page {
        result.push_str(&f!(
            "\n{}\n",
            f!("Page {} is past the end, showing page {}.", request.page, loaded.page).yellow()
        ));
    }
    result.push_str(&format_page(&loaded, image_base));
    result.push_str(&format_navigation(&pagination, "marquee movies page"));
    println!("{}", result);

    Ok(())
}

fn format_page(loaded: &LoadedPage<Movie>, image_base: &str) -> String {
    let mut result = header(&f!(
        "MOVIES (Page {} of {})",
        loaded.state.current_page, loaded.state.total_pages
    ));
    if loaded.items.is_empty() {
        result.push_str(&f!("\n{}\n", "No movies on this page.".yellow()));
    }
    for (idx, movie) in loaded.items.iter().enumerate() {
        result.push_str(&format_movie(loaded.offset + idx + 1, movie, image_base));
    }
    result
}

fn format_movie(number: usize, movie: &Movie, image_base: &str) -> String {
    let mut result = String::new();

    result.push_str(&f!(
        "\n{} {}\n",
        f!("[{number}]").yellow().bold(),
        movie
            .title
            .as_deref()
            .unwrap_or("(No title)")
            .white()
            .bold()
    ));

    result.push_str(&f!(
        "    {}: {} | {}: {} | {}: {}\n",
        "Rating".green(),
        f!("{:.1}", movie.rating()).bright_yellow(),
        "Votes".green(),
        movie.votes().to_string().bright_magenta(),
        "Released".green(),
        movie
            .release_date
            .as_deref()
            .unwrap_or("unknown")
            .bright_black()
    ));

    if let Some(poster) = poster_url(image_base, movie.poster_path.as_deref()) {
        result.push_str(&f!(
            "    {}: {}\n",
            "Poster".green(),
            poster.cyan().underline()
        ));
    }

    result.push_str(&f!(
        "    {}: {}\n",
        "ID".green(),
        movie.id.to_string().bright_white()
    ));

    result
}
