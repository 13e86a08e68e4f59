//! Command handlers for `search` and `providers`.
//!
//! Empty results and provider exhaustion are reported differently: the
//! former exits 0, the latter exits 2. A Ctrl-C during the search exits 130.

use std::process::ExitCode;
use std::time::Duration;

use nearcare_core::{
    default_endpoints, in_try_order, load_providers, AppConfig, Coordinate, FacilityKind,
    ProviderEndpoint,
};
use nearcare_locator::{
    build_http_client, CancellationToken, FacilitySearchService, FixedPosition, IpGeolocation,
    LocationResolver, ProviderGateway, RankedFacilityList, RenderSession, Renderer, SearchError,
    SearchSettings, UnsupportedPlatform,
};
use reqwest::Client;

use crate::render::{JsonRenderer, TableRenderer};
use crate::OutputFormat;

const EXIT_EXHAUSTED: u8 = 2;
const EXIT_CANCELLED: u8 = 130;

pub(crate) struct SearchArgs {
    pub position: Option<(f64, f64)>,
    pub radius: Option<u32>,
    pub kinds: Vec<FacilityKind>,
    pub format: OutputFormat,
}

/// Endpoints from `NEARCARE_PROVIDERS_PATH`, or the built-in mirrors.
///
/// # Errors
///
/// Returns an error if the providers file cannot be read or fails validation.
pub(crate) fn configured_endpoints(config: &AppConfig) -> anyhow::Result<Vec<ProviderEndpoint>> {
    match &config.providers_path {
        Some(path) => Ok(load_providers(path)?.providers),
        None => Ok(default_endpoints()),
    }
}

/// Print provider endpoints in try order.
///
/// # Errors
///
/// Returns an error if the providers file cannot be loaded.
pub(crate) fn run_providers(config: &AppConfig) -> anyhow::Result<()> {
    let endpoints = in_try_order(&configured_endpoints(config)?);
    println!("{:<10}URL", "PRIORITY");
    for endpoint in &endpoints {
        println!("{:<10}{}", endpoint.priority, endpoint.url);
    }
    Ok(())
}

/// Resolve the origin, run one search and render it.
///
/// # Errors
///
/// Returns an error for invalid flags, an unreadable providers file, HTTP
/// client construction failure or render failure. Exhaustion and
/// cancellation are reported through the exit code instead.
pub(crate) async fn run_search(config: &AppConfig, args: SearchArgs) -> anyhow::Result<ExitCode> {
    let client = build_http_client(&config.user_agent)?;
    let endpoints = configured_endpoints(config)?;

    let origin = resolve_origin(config, &client, args.position).await?;

    let mut settings = SearchSettings::from_app_config(config);
    if let Some(radius) = args.radius {
        settings.radius_meters = radius;
    }
    if !args.kinds.is_empty() {
        settings.kinds = args.kinds.into_iter().collect();
    }

    let gateway = ProviderGateway::new(
        client,
        &endpoints,
        Duration::from_secs(config.provider_timeout_secs),
    );
    let service = FacilitySearchService::new(gateway, settings);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received; cancelling search");
            on_interrupt.cancel();
        }
    });

    let outcome = service.search(origin, &cancel).await;
    interrupt.abort();

    match outcome {
        Ok(list) => {
            match args.format {
                OutputFormat::Table => render(TableRenderer::new(std::io::stdout()), &list)?,
                OutputFormat::Json => render(JsonRenderer::new(std::io::stdout()), &list)?,
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(SearchError::AllExhausted {
            attempts,
            classification,
            ..
        }) => {
            eprintln!(
                "error: facility service unavailable after {attempts} provider attempts \
                 (last failure: {classification}); try again later"
            );
            Ok(ExitCode::from(EXIT_EXHAUSTED))
        }
        Err(SearchError::Cancelled) => {
            eprintln!("search cancelled");
            Ok(ExitCode::from(EXIT_CANCELLED))
        }
        Err(err) => Err(err.into()),
    }
}

fn render<R: Renderer>(renderer: R, list: &RankedFacilityList) -> anyhow::Result<()> {
    let mut session = RenderSession::new(renderer);
    session.render(list.origin, &list.facilities)?;
    Ok(())
}

async fn resolve_origin(
    config: &AppConfig,
    client: &Client,
    position: Option<(f64, f64)>,
) -> anyhow::Result<Coordinate> {
    let timeout = Duration::from_secs(config.location_timeout_secs);
    let fallback = config.fallback_location;

    if let Some((lat, lon)) = position {
        let fixed = Coordinate::new(lat, lon)?;
        return Ok(LocationResolver::new(FixedPosition(fixed), fallback)
            .resolve(timeout)
            .await);
    }

    let coordinate = match &config.geolocate_url {
        Some(url) => {
            LocationResolver::new(IpGeolocation::new(client.clone(), url.clone()), fallback)
                .resolve(timeout)
                .await
        }
        None => {
            LocationResolver::new(UnsupportedPlatform, fallback)
                .resolve(timeout)
                .await
        }
    };
    Ok(coordinate)
}
