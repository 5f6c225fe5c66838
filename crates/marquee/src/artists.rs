use crate::catalog::{LoadedPage, ViewController, VirtualPager};
use crate::config::AppConfig;
use crate::output::{
    browse, format_navigation, header, load_page, output_json, PageOutput, PaginationInfo,
};
use crate::prelude::{println, *};
use crate::providers::{Catalogs, SpotifyProvider};
use colored::Colorize;
use marquee_core::entity::{Artist, TopResult};
use marquee_core::paging::{normalize_limit, PageRequest};
use marquee_core::partition::QuerySelector;
use std::sync::Arc;

#[derive(Debug, clap::Parser)]
#[command(name = "artists")]
#[command(about = "Spotify artist search")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Most popular artists for a query, or across all configured genres
    #[clap(name = "top")]
    Top(TopOptions),

    /// One page of artists
    #[clap(name = "page")]
    Page(PageOptions),
}

#[derive(Debug, clap::Args, Clone)]
pub struct Filter {
    /// Market (ISO 3166-1 alpha-2 country code)
    #[arg(short, long)]
    pub country: Option<String>,

    /// Search query, e.g. "genre:rock". Repeat to merge several; "all" uses
    /// every configured partition.
    #[arg(short, long = "query")]
    pub queries: Vec<String>,
}

impl Filter {
    fn selector(&self) -> QuerySelector {
        QuerySelector::from_values(self.queries.clone())
    }

    /// Flags that reproduce this filter on the command line
    fn flags(&self) -> String {
        let mut flags = String::new();
        if let Some(country) = &self.country {
            flags.push_str(&f!(" --country {country}"));
        }
        for query in &self.queries {
            flags.push_str(&f!(" --query '{query}'"));
        }
        flags
    }
}

#[derive(Debug, clap::Args, Clone)]
pub struct TopOptions {
    /// Number of artists to show
    #[arg(short, long, default_value = "6")]
    pub limit: i64,

    #[clap(flatten)]
    pub filter: Filter,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct PageOptions {
    /// Page number (1-indexed)
    #[arg(short, long, default_value = "1")]
    pub page: i64,

    /// Artists per page
    #[arg(long, env = "MARQUEE_PAGE_SIZE", default_value = "60")]
    pub page_size: i64,

    #[clap(flatten)]
    pub filter: Filter,

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
        println!("Spotify API Base: {}", config.spotify.api_base);
        println!("Market: {}", config.spotify.market);
        println!("Partitions: {}", config.spotify.partitions.join(", "));
        println!();
    }

    let pager = Catalogs::from_config(&config)?.artists;

    match app.command {
        Commands::Top(options) => top(pager, options).await,
        Commands::Page(options) => page(pager, options).await,
    }
}

/// Fetches the most popular artists as a structured TopResult
pub async fn top_artists_data(
    pager: &VirtualPager<SpotifyProvider>,
    limit: i64,
    filter: &Filter,
) -> Result<TopResult<Artist>> {
    let limit = normalize_limit(Some(limit), pager.config().provider_max_batch);
    let items = pager
        .top_n(limit, filter.country.as_deref(), &filter.selector(), None)
        .await?;
    Ok(TopResult { items })
}

async fn top(pager: Arc<VirtualPager<SpotifyProvider>>, options: TopOptions) -> Result<()> {
    let output = top_artists_data(&pager, options.limit, &options.filter).await?;

    if options.json {
        return output_json(&output);
    }

    println!("{}", header(&f!("TOP {} ARTISTS", output.items.len())));
    if output.items.is_empty() {
        println!("{}", "No artists found.".yellow());
        return Ok(());
    }

    let mut table = new_table();
    table.add_row(prettytable::row![
        "#".bold().cyan(),
        "Name".bold().cyan(),
        "Popularity".bold().cyan(),
        "Genres".bold().cyan(),
        "ID".bold().cyan()
    ]);
    for (idx, artist) in output.items.iter().enumerate() {
        table.add_row(prettytable::row![
            idx + 1,
            artist.name.as_deref().unwrap_or("(No name)"),
            artist.popularity(),
            artist.genres.join(", "),
            &artist.id
        ]);
    }
    table.printstd();

    Ok(())
}

async fn page(pager: Arc<VirtualPager<SpotifyProvider>>, options: PageOptions) -> Result<()> {
    let request = PageRequest::normalize(Some(options.page), Some(options.page_size));
    let controller = ViewController::new(
        pager,
        request.page_size,
        options.filter.country.clone(),
        options.filter.selector(),
    );

    if options.interactive {
        return browse(&controller, request.page, format_page).await;
    }

    let loaded = load_page(&controller, request.page).await?;
    let base_command = f!("marquee artists page{}", options.filter.flags());
    let command = f!("{base_command} --page-size {}", request.page_size);
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
    result.push_str(&format_page(&loaded));
    result.push_str(&format_navigation(&pagination, &base_command));
    println!("{}", result);

    Ok(())
}

fn format_page(loaded: &LoadedPage<Artist>) -> String {
    let mut result = header(&f!(
        "ARTISTS (Page {} of {})",
        loaded.state.current_page, loaded.state.total_pages
    ));
    if loaded.items.is_empty() {
        result.push_str(&f!("\n{}\n", "No artists on this page.".yellow()));
    }
    for (idx, artist) in loaded.items.iter().enumerate() {
        result.push_str(&format_artist(loaded.offset + idx + 1, artist));
    }
    result
}

fn format_artist(number: usize, artist: &Artist) -> String {
    let mut result = String::new();

    result.push_str(&f!(
        "\n{} {}\n",
        f!("[{number}]").yellow().bold(),
        artist
            .name
            .as_deref()
            .unwrap_or("(No name)")
            .white()
            .bold()
    ));

    let followers = artist
        .followers()
        .map(|f| f.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    result.push_str(&f!(
        "    {}: {} | {}: {}\n",
        "Popularity".green(),
        artist.popularity().to_string().bright_yellow(),
        "Followers".green(),
        followers.bright_magenta()
    ));

    if !artist.genres.is_empty() {
        result.push_str(&f!(
            "    {}: {}\n",
            "Genres".green(),
            artist.genres.join(", ").bright_white()
        ));
    }

    if let Some(image) = artist.images.first() {
        result.push_str(&f!(
            "    {}: {}\n",
            "Image".green(),
            image.url.cyan().underline()
        ));
    }

    result.push_str(&f!(
        "    {}: {}\n",
        "ID".green(),
        artist.id.bright_white()
    ));

    result
}
