use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryStore, InMemorySyncFailures};
use crate::routes::with_intake_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use faces_intake::config::{AppConfig, CrmConfig};
use faces_intake::error::AppError;
use faces_intake::telemetry;
use faces_intake::workflows::registration::{
    ContactApi, CrmGateway, CrmProxy, CrmProxyClient, CrmSyncPolicy, HubSpotClient,
    LocationCatalog, PrimaryStore, RegistrationService, RestStore, StepRegistry,
    SubmissionPipeline, WebhookClient,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let sync_failures = Arc::new(InMemorySyncFailures::default());
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        sync_failures: sync_failures.clone(),
    };

    let http = reqwest::Client::builder()
        .timeout(config.http.timeout)
        .build()?;

    let store: Arc<dyn PrimaryStore> = match config.store.remote() {
        Some((url, key)) => Arc::new(RestStore::new(http.clone(), url, key, &config.store.table)),
        None => {
            warn!("APP_STORE_URL not set; submitted applications are kept in memory");
            Arc::new(InMemoryStore::default())
        }
    };

    let crm = submission_gateway(&config.crm, &http);
    let mut pipeline = SubmissionPipeline::new(store, crm, config.crm.sync, sync_failures);
    if let Some(url) = &config.webhook_url {
        pipeline = pipeline.with_webhook(Arc::new(WebhookClient::new(http.clone(), url)));
    }
    let pipeline = Arc::new(pipeline);

    let catalog = match &config.locations_path {
        Some(path) => LocationCatalog::from_path(path)?,
        None => LocationCatalog::lebanon(),
    };

    let service = Arc::new(
        RegistrationService::new(
            Arc::new(StepRegistry::standard()),
            Arc::new(catalog),
            pipeline.clone(),
        )
        .with_session_policy(config.sessions),
    );
    service.spawn_sweeper(SESSION_SWEEP_INTERVAL);
    let proxy = Arc::new(CrmProxy::new(proxy_backend(&config.crm, &http)));

    let app = with_intake_routes(service, proxy)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        crm_sync = %pipeline.policy(),
        webhook = config.webhook_url.is_some(),
        "talent registration service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

/// CRM used by submissions: the proxy when configured, else HubSpot with the token.
fn submission_gateway(crm: &CrmConfig, http: &reqwest::Client) -> Option<Arc<dyn CrmGateway>> {
    if crm.sync == CrmSyncPolicy::Disabled {
        return None;
    }
    if let Some(endpoint) = &crm.proxy_url {
        return Some(Arc::new(CrmProxyClient::new(http.clone(), endpoint)));
    }
    match &crm.access_token {
        Some(token) => Some(Arc::new(HubSpotClient::new(
            http.clone(),
            &crm.api_url,
            token,
        ))),
        None => {
            warn!("no HubSpot token configured; CRM sync is disabled");
            None
        }
    }
}

fn proxy_backend(crm: &CrmConfig, http: &reqwest::Client) -> Option<Arc<dyn ContactApi>> {
    crm.access_token.as_ref().map(|token| {
        Arc::new(HubSpotClient::new(http.clone(), &crm.api_url, token)) as Arc<dyn ContactApi>
    })
}
