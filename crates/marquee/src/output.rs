//! Shared rendering for the listing commands

use crate::catalog::{LoadOutcome, LoadedPage, SearchProvider, ViewController};
use crate::prelude::{eprintln, println, *};
use colored::Colorize;
use marquee_core::pager::{PageLink, PagerState, DEFAULT_LINK_WINDOW};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Serialize)]
pub struct PaginationInfo {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_results: usize,
    pub page_size: usize,
    pub links: Vec<PageLink>,
    pub next_page_command: Option<String>,
    pub prev_page_command: Option<String>,
}

impl PaginationInfo {
    /// `command` is the invocation without the `--page` flag.
    pub fn new(state: &PagerState, command: &str) -> Self {
        Self {
            current_page: state.current_page,
            total_pages: state.total_pages,
            total_results: state.total_results,
            page_size: state.page_size,
            links: state.links(DEFAULT_LINK_WINDOW),
            next_page_command: state
                .has_next()
                .then(|| f!("{command} --page {}", state.current_page + 1)),
            prev_page_command: state
                .has_prev()
                .then(|| f!("{command} --page {}", state.current_page - 1)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PageOutput<E> {
    pub items: Vec<E>,
    pub pagination: PaginationInfo,
}

/// Load one page through a view controller, turning the outcome into a `Result`.
pub async fn load_page<P: SearchProvider>(
    controller: &ViewController<P>,
    page: usize,
) -> Result<LoadedPage<P::Entity>> {
    match controller.load(page).await {
        LoadOutcome::Loaded(loaded) => Ok(loaded),
        LoadOutcome::Busy => Err(eyre!("A page load is already in progress")),
        LoadOutcome::Failed(err) => Err(err.into()),
    }
}

/// Interactive paging over stdin: `n`/`p` move, a number jumps, `r` reloads
/// the current page and `q` quits.
pub async fn browse<P, F>(controller: &ViewController<P>, first_page: usize, render: F) -> Result<()>
where
    P: SearchProvider,
    F: Fn(&LoadedPage<P::Entity>) -> String,
{
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut outcome = Some(controller.load(first_page).await);

    loop {
        match outcome.take() {
            Some(LoadOutcome::Loaded(page)) => println!("{}", render(&page)),
            Some(LoadOutcome::Failed(err)) => eprintln!("{}", f!("Error: {err}").red()),
            Some(LoadOutcome::Busy) => eprintln!("{}", "A page load is already in progress".yellow()),
            None => eprintln!("{}", "Nothing to load".yellow()),
        }

        let links = controller.links(DEFAULT_LINK_WINDOW);
        if !links.is_empty() {
            println!("\n  {}", format_links(&links));
        }
        println!("{}", "[n]ext [p]rev <page> [r]eload [q]uit".bright_black());

        let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| eyre!("Failed to read from stdin: {}", e))?
        else {
            break;
        };

        outcome = match line.trim() {
            "q" | "quit" => break,
            "n" | "next" => controller.next().await,
            "p" | "prev" => controller.prev().await,
            "r" | "reload" => Some(controller.load(controller.state().current_page).await),
            other => match other.parse::<usize>() {
                Ok(page) => controller.goto(page).await,
                Err(_) => None,
            },
        };
    }

    Ok(())
}

pub fn output_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| eyre!("JSON serialization failed: {}", e))?;
    println!("{}", json);
    Ok(())
}

pub fn header(title: &str) -> String {
    let mut result = String::new();
    result.push_str(&f!("\n{}\n", "=".repeat(80).bright_cyan()));
    result.push_str(&f!("{}\n", title.bright_cyan().bold()));
    result.push_str(&f!("{}\n", "=".repeat(80).bright_cyan()));
    result
}

/// Page bar such as `1 … 4 [5] 6 … 12`
pub fn format_links(links: &[PageLink]) -> String {
    links
        .iter()
        .map(|link| match link {
            PageLink::Page {
                number,
                active: true,
            } => f!("[{number}]").bright_cyan().bold().to_string(),
            PageLink::Page { number, .. } => number.to_string().bright_white().to_string(),
            PageLink::Gap => "…".bright_black().to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn format_navigation(info: &PaginationInfo, command: &str) -> String {
    let mut result = String::new();

    result.push_str(&f!("\n{}\n", "=".repeat(80).bright_yellow()));
    result.push_str(&f!("{}\n", "NAVIGATION".bright_yellow().bold()));
    result.push_str(&f!("{}\n", "=".repeat(80).bright_yellow()));

    result.push_str(&f!(
        "\n{} {} {} {} ({} {})\n",
        "Showing page".bright_white(),
        info.current_page.to_string().bright_cyan().bold(),
        "of".bright_white(),
        info.total_pages.to_string().bright_cyan().bold(),
        info.total_results.to_string().bright_cyan().bold(),
        "total results".bright_white(),
    ));

    if !info.links.is_empty() {
        result.push_str(&f!("\n  {}\n", format_links(&info.links)));
    }

    result.push_str(&f!("\n{}:\n", "To navigate".bright_white().bold()));
    if let Some(next) = &info.next_page_command {
        result.push_str(&f!("  {}: {}\n", "Next page".green(), next.cyan()));
    }
    if let Some(prev) = &info.prev_page_command {
        result.push_str(&f!("  {}: {}\n", "Previous page".green(), prev.cyan()));
    }

    result.push_str(&f!(
        "\n{}:\n",
        "To change page size".bright_white().bold()
    ));
    result.push_str(&f!(
        "  {}\n",
        f!("{command} --page-size <number>").cyan()
    ));

    result.push_str(&f!(
        "\n{}:\n",
        "To get JSON output".bright_white().bold()
    ));
    result.push_str(&f!("  {}\n", f!("{command} --json").cyan()));

    result
}
