//! CLI command implementations

use std::net::IpAddr;
use std::sync::Arc;

use anyhow::{Context, ensure};
use clap::Subcommand;
use serde::Serialize;
use streamscope_core::StreamscopeConfig;
use streamscope_core::catalog::{
    CatalogCache, CatalogService, ContentType, SearchRequest, StreamingService, TitleFilter,
    TopRequest,
};
use streamscope_provider::build_provider;

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the JSON API server
    Server {
        /// Address to bind to
        #[arg(long)]
        host: Option<IpAddr>,
        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Highest rated movies of one service, or of every service
    TopMovies {
        /// Service id (netflix, prime, disney, hbo, apple, hulu, peacock)
        service: Option<StreamingService>,
        /// Number of movies per service
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
        /// Two-letter country code
        #[arg(short, long)]
        country: Option<String>,
        /// Minimum rating on a 0-10 scale
        #[arg(long)]
        min_rating: Option<f32>,
    },
    /// Compare catalog sizes, ratings and overlap of several services
    Compare {
        /// Comma-separated service ids
        services: String,
        #[arg(short, long)]
        country: Option<String>,
    },
    /// Detailed statistics for one service
    Stats {
        service: StreamingService,
        #[arg(short, long)]
        country: Option<String>,
    },
    /// Search titles by name
    Search {
        query: String,
        #[arg(short, long)]
        country: Option<String>,
        /// Comma-separated service ids to restrict the search to
        #[arg(short, long)]
        services: Option<String>,
        /// movie or series
        #[arg(long)]
        content_type: Option<ContentType>,
    },
    /// Look up one title by IMDb id
    Title {
        imdb_id: String,
        #[arg(short, long)]
        country: Option<String>,
    },
}

/// Handle the CLI command
///
/// # Errors
/// Returns the first configuration, validation or upstream error
pub async fn handle_command(command: Commands) -> anyhow::Result<()> {
    let mut config = StreamscopeConfig::from_env();

    match command {
        Commands::Server { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            streamscope_web::run_server(config)
                .await
                .context("API server failed")
        }
        Commands::TopMovies {
            service,
            limit,
            country,
            min_rating,
        } => {
            let max = if service.is_some() {
                config.catalog.max_top_limit
            } else {
                config.catalog.max_top_movies_all_limit
            };
            ensure!(
                (1..=max).contains(&limit),
                "limit must be between 1 and {max}"
            );

            let catalog = catalog_service(&config)?;
            let request = TopRequest::new(country_or_default(&config, country), limit)
                .with_filter(TitleFilter::default().with_min_rating(min_rating));
            match service {
                Some(service) => print_json(&catalog.get_top_movies(service, &request).await?),
                None => print_json(&catalog.get_top_movies_all(&request).await?),
            }
        }
        Commands::Compare { services, country } => {
            let services = StreamingService::parse_list(&services)?;
            let catalog = catalog_service(&config)?;
            let country = country_or_default(&config, country);
            print_json(&catalog.compare_services(&services, &country).await?)
        }
        Commands::Stats { service, country } => {
            let catalog = catalog_service(&config)?;
            let country = country_or_default(&config, country);
            print_json(&catalog.get_service_stats(service, &country).await?)
        }
        Commands::Search {
            query,
            country,
            services,
            content_type,
        } => {
            let mut request = SearchRequest::new(query, country_or_default(&config, country));
            if let Some(services) = services {
                request.services = StreamingService::parse_list(&services)?;
            }
            request.content_type = content_type;

            let catalog = catalog_service(&config)?;
            print_json(&catalog.search_titles(&request).await?)
        }
        Commands::Title { imdb_id, country } => {
            let catalog = catalog_service(&config)?;
            let country = country_or_default(&config, country);
            print_json(&catalog.get_title_by_imdb_id(&imdb_id, &country).await?)
        }
    }
}

fn catalog_service(config: &StreamscopeConfig) -> anyhow::Result<CatalogService> {
    config.validate()?;
    if config.provider.uses_demo_data() {
        tracing::warn!("RAPIDAPI_KEY is not set, answering from the demo catalog");
    }

    let provider = build_provider(&config.provider)?;
    Ok(CatalogService::new(
        provider,
        Arc::new(CatalogCache::new()),
        config.fetch_policy(),
    ))
}

fn country_or_default(config: &StreamscopeConfig, country: Option<String>) -> String {
    country.unwrap_or_else(|| config.catalog.default_country.clone())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
