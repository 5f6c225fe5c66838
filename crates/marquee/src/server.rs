//! Local HTTP API over the movie and artist catalogs

use crate::catalog::{CacheStats, SearchProvider, VirtualPager};
use crate::prelude::{eprintln, *};
use crate::providers::Catalogs;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use marquee_core::entity::{Artist, Movie, PageResult, TopResult};
use marquee_core::paging::{normalize_limit, PageRequest, DEFAULT_TOP_LIMIT};
use marquee_core::params::parse_number;
use marquee_core::partition::QuerySelector;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Debug, clap::Args)]
pub struct ServeOptions {
    /// Port to listen on
    #[arg(short, long, env = "MARQUEE_PORT", default_value = "3000")]
    port: u16,

    /// Host to bind to
    #[arg(long, env = "MARQUEE_HOST", default_value = "127.0.0.1")]
    host: String,
}

pub async fn run(options: ServeOptions, global: crate::Global) -> Result<()> {
    let config = crate::config::AppConfig::from_env()?;
    let catalogs = Catalogs::from_config(&config)?;
    let addr = f!("{}:{}", options.host, options.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| eyre!("Failed to bind to {}: {}", addr, e))?;

    log::info!("listening on http://{addr}");
    if global.verbose {
        eprintln!("marquee listening on http://{}", addr);
        eprintln!("  GET /api/movies/top?limit&pages");
        eprintln!("  GET /api/movies/paginated?page&pageSize");
        eprintln!("  GET /api/artists/top?limit&country&query");
        eprintln!("  GET /api/artists/paginated?page&pageSize&country&query");
    }

    axum::serve(listener, router(catalogs.movies, catalogs.artists))
        .await
        .map_err(|e| eyre!("Server error: {}", e))?;

    Ok(())
}

/// Routes for both catalogs, with permissive CORS
pub fn router<M, A>(movies: Arc<VirtualPager<M>>, artists: Arc<VirtualPager<A>>) -> Router
where
    M: SearchProvider<Entity = Movie> + 'static,
    A: SearchProvider<Entity = Artist> + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let movie_routes = Router::new()
        .route("/top", get(movies_top::<M>).fallback(method_not_allowed))
        .route("/paginated", get(movies_page::<M>).fallback(method_not_allowed))
        .with_state(movies.clone());

    let artist_routes = Router::new()
        .route("/top", get(artists_top::<A>).fallback(method_not_allowed))
        .route("/paginated", get(artists_page::<A>).fallback(method_not_allowed))
        .with_state(artists.clone());

    let cache_routes = Router::new()
        .route(
            "/api/cache",
            get(cache_stats::<M, A>).delete(cache_clear::<M, A>),
        )
        .with_state((movies, artists));

    Router::new()
        .nest("/api/movies", movie_routes)
        .nest("/api/artists", artist_routes)
        .merge(cache_routes)
        .fallback(not_found)
        .layer(cors)
}

/// Raw query-string pairs; `query` may repeat.
#[derive(Debug, Default)]
struct Params(Vec<(String, String)>);

impl Params {
    fn first(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn number(&self, name: &str) -> CatalogResult<Option<i64>> {
        Ok(parse_number(name, self.first(name))?)
    }

    fn page_request(&self) -> CatalogResult<PageRequest> {
        Ok(PageRequest::normalize(
            self.number("page")?,
            self.number("pageSize")?,
        ))
    }

    /// Missing limit means the default top size, a non-positive one
    /// `non_positive`.
    fn limit(&self, non_positive: usize) -> CatalogResult<usize> {
        Ok(match self.number("limit")? {
            None => DEFAULT_TOP_LIMIT,
            limit => normalize_limit(limit, non_positive),
        })
    }

    fn country(&self) -> Option<&str> {
        self.first("country")
    }

    fn selector(&self) -> QuerySelector {
        let values = self
            .0
            .iter()
            .filter(|(key, _)| key == "query")
            .map(|(_, value)| value.clone())
            .collect();
        QuerySelector::from_values(values)
    }
}

async fn movies_top<M: SearchProvider<Entity = Movie>>(
    State(pager): State<Arc<VirtualPager<M>>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<TopResult<Movie>>, ApiError> {
    let params = Params(params);
    // a non-positive limit returns every movie on the hinted pages
    let limit = params.limit(0)?;
    let pages = normalize_limit(params.number("pages")?, 1);

    let items = pager
        .top_n(limit, None, &QuerySelector::Absent, Some(pages))
        .await?;
    Ok(Json(TopResult { items }))
}

async fn movies_page<M: SearchProvider<Entity = Movie>>(
    State(pager): State<Arc<VirtualPager<M>>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<PageResult<Movie>>, ApiError> {
    let request = Params(params).page_request()?;
    let page = pager.page(request, None, &QuerySelector::Absent).await?;
    Ok(Json(page))
}

async fn artists_top<A: SearchProvider<Entity = Artist>>(
    State(pager): State<Arc<VirtualPager<A>>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<TopResult<Artist>>, ApiError> {
    let params = Params(params);
    let limit = params.limit(pager.config().provider_max_batch)?;

    let items = pager
        .top_n(limit, params.country(), &params.selector(), None)
        .await?;
    Ok(Json(TopResult { items }))
}

async fn artists_page<A: SearchProvider<Entity = Artist>>(
    State(pager): State<Arc<VirtualPager<A>>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<PageResult<Artist>>, ApiError> {
    let params = Params(params);
    let request = params.page_request()?;

    let page = pager
        .page(request, params.country(), &params.selector())
        .await?;
    Ok(Json(page))
}

type Pagers<M, A> = (Arc<VirtualPager<M>>, Arc<VirtualPager<A>>);

fn stats_json(stats: CacheStats) -> serde_json::Value {
    serde_json::json!({
        "hits": stats.hits,
        "misses": stats.misses,
        "evictions": stats.evictions,
        "slices": stats.slices,
        "partitions": stats.partitions,
        "hitRate": stats.hit_rate(),
    })
}

/// Slice cache statistics, with the provider's own cache under `provider`.
async fn catalog_stats<P: SearchProvider>(pager: &VirtualPager<P>) -> serde_json::Value {
    let mut stats = stats_json(pager.cache().stats().await);
    if let Some(provider) = pager.provider_cache_stats().await {
        stats["provider"] = stats_json(provider);
    }
    stats
}

async fn cache_stats<M, A>(State((movies, artists)): State<Pagers<M, A>>) -> Json<serde_json::Value>
where
    M: SearchProvider<Entity = Movie>,
    A: SearchProvider<Entity = Artist>,
{
    Json(serde_json::json!({
        "movies": catalog_stats(&movies).await,
        "artists": catalog_stats(&artists).await,
    }))
}

async fn cache_clear<M, A>(State((movies, artists)): State<Pagers<M, A>>) -> StatusCode
where
    M: SearchProvider<Entity = Movie>,
    A: SearchProvider<Entity = Artist>,
{
    movies.clear_caches().await;
    artists.clear_caches().await;
    log::info!("catalog caches cleared");
    StatusCode::NO_CONTENT
}

async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "GET")],
        Json(serde_json::json!({ "error": "Method not allowed" })),
    )
        .into_response()
}

async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "Not found" })),
    )
        .into_response()
}

/// Catalog error rendered as `{"error": message}`
#[derive(Debug)]
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            log::error!("request failed: {}", self.0);
        }

        (
            status,
            Json(serde_json::json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}
