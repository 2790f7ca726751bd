//! Service runtime
//!
//! [`ServerHandle`] owns the full lifecycle: store (database + migrations
//! or in-memory), services, notification worker, REST API, metrics and
//! graceful shutdown. [`AppServices`] wires the application services and is
//! shared with the router tests.

use std::sync::{Arc, OnceLock};
use std::time::Instant;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sea_orm::DatabaseConnection;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::application::events::{create_event_bus, SharedEventBus};
use crate::application::ports::EmailSender;
use crate::application::services::{
    BookingService, CatalogService, CheckoutService, NotificationService, NotificationWorker,
    PaymentService,
};
use crate::config::{AppConfig, DatabaseDriver};
use crate::domain::station::StationDirectory;
use crate::domain::RepositoryProvider;
use crate::infrastructure::crypto::JwtConfig;
use crate::infrastructure::{
    init_database, run_migrations, sample_stations, sender_from_config, DatabaseConfig,
    InMemoryRepositoryProvider, OpenChargeMapClient, SeaOrmRepositoryProvider,
};
use crate::interfaces::http::middleware::AuthState;
use crate::interfaces::http::modules::health::HealthState;
use crate::interfaces::http::modules::metrics::MetricsState;
use crate::interfaces::http::{create_api_router, ApiState};
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};

// ── Options ────────────────────────────────────────────────────────

/// Options for starting the service.
pub struct ServerOptions {
    /// Application configuration.
    pub config: AppConfig,
    /// Run database migrations on startup (default: true).
    pub auto_migrate: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
        }
    }
}

// ── Store ──────────────────────────────────────────────────────────

/// Repository provider plus the connection backing it (`None` for memory)
pub struct Store {
    pub repos: Arc<dyn RepositoryProvider>,
    pub db: Option<DatabaseConnection>,
}

/// Connect the configured store, migrating the database when asked.
pub async fn open_store(config: &AppConfig, auto_migrate: bool) -> Result<Store, sea_orm::DbErr> {
    if config.database.driver == DatabaseDriver::Memory {
        warn!("Using in-memory storage, nothing will be persisted");
        return Ok(Store {
            repos: Arc::new(InMemoryRepositoryProvider::new()),
            db: None,
        });
    }

    let db = init_database(&DatabaseConfig::new(config.database.connection_url())).await?;
    if auto_migrate {
        run_migrations(&db).await?;
    }
    Ok(Store {
        repos: Arc::new(SeaOrmRepositoryProvider::new(db.clone())),
        db: Some(db),
    })
}

// ── Services ───────────────────────────────────────────────────────

/// Application services sharing one repository provider and event bus
#[derive(Clone)]
pub struct AppServices {
    pub repos: Arc<dyn RepositoryProvider>,
    pub events: SharedEventBus,
    pub catalog: Arc<CatalogService>,
    pub payments: Arc<PaymentService>,
    pub bookings: Arc<BookingService>,
    pub checkout: Arc<CheckoutService>,
    pub notifications: Arc<NotificationService>,
}

impl AppServices {
    pub fn new(
        config: &AppConfig,
        repos: Arc<dyn RepositoryProvider>,
        directory: Arc<dyn StationDirectory>,
        email: Arc<dyn EmailSender>,
    ) -> Self {
        let events = create_event_bus();
        let currency = config.pricing.currency.clone();

        let catalog = Arc::new(CatalogService::new(
            directory,
            sample_stations(),
            config.catalog.clone(),
        ));
        let payments = Arc::new(PaymentService::new(repos.clone(), events.clone(), currency.clone()));
        let bookings = Arc::new(BookingService::new(
            repos.clone(),
            payments.clone(),
            events.clone(),
            config.pricing.policy(),
        ));
        let checkout = Arc::new(CheckoutService::new(
            catalog.clone(),
            bookings.clone(),
            payments.clone(),
            events.clone(),
        ));
        let notifications = Arc::new(NotificationService::new(
            repos.clone(),
            email,
            &config.email,
            currency,
        ));

        Self {
            repos,
            events,
            catalog,
            payments,
            bookings,
            checkout,
            notifications,
        }
    }

    /// Worker consuming `BookingConfirmed`; subscribes immediately
    pub fn notification_worker(&self) -> NotificationWorker {
        NotificationWorker::new(
            self.notifications.clone(),
            self.repos.clone(),
            self.events.subscribe(),
        )
    }

    pub fn api_state(&self, config: &AppConfig, health: HealthState, metrics: MetricsState) -> ApiState {
        ApiState {
            catalog: self.catalog.clone(),
            bookings: self.bookings.clone(),
            checkout: self.checkout.clone(),
            payments: self.payments.clone(),
            notifications: self.notifications.clone(),
            currency: config.pricing.currency.clone(),
            auth: AuthState {
                jwt_config: JwtConfig::from(&config.security),
            },
            health,
            metrics,
        }
    }
}

/// Global Prometheus recorder; installed once per process and reused on restart.
fn prometheus_handle() -> Option<PrometheusHandle> {
    static PROM_HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();
    PROM_HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                info!("📊 Prometheus metrics recorder installed");
                Some(handle)
            }
            Err(e) => {
                warn!("Prometheus recorder not installed, /metrics disabled: {}", e);
                None
            }
        })
        .clone()
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running service.
///
/// # Examples
///
/// ```rust,no_run
/// use takecharge::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     handle.install_signal_handler();
///     handle.wait().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    /// Application services.
    pub services: AppServices,
    /// The configuration the server was started with.
    pub config: AppConfig,
    /// API port the server is listening on.
    pub api_port: u16,

    db: Option<DatabaseConnection>,
    shutdown: ShutdownCoordinator,
    api_task: JoinHandle<()>,
    worker_task: Option<JoinHandle<()>>,
}

impl ServerHandle {
    /// Start the service.
    ///
    /// 1. Install the Prometheus recorder
    /// 2. Open the store (connect + migrate, or in-memory)
    /// 3. Build services and start the notification worker
    /// 4. Serve the REST API (with Swagger UI)
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let app_cfg = opts.config;
        info!("Starting TakeCharge service...");

        let metrics = MetricsState {
            handle: prometheus_handle(),
        };

        // ── Store ──────────────────────────────────────────────
        let store = open_store(&app_cfg, opts.auto_migrate).await?;

        // ── Outbound adapters ──────────────────────────────────
        let directory: Arc<dyn StationDirectory> = Arc::new(OpenChargeMapClient::new(&app_cfg.catalog)?);
        if app_cfg.catalog.api_key.is_none() {
            warn!("Open Charge Map API key not configured, station searches use the sample catalog");
        }
        let email = sender_from_config(&app_cfg.email)?;

        // ── Services ───────────────────────────────────────────
        let services = AppServices::new(&app_cfg, store.repos.clone(), directory, email);

        // ── Shutdown coordinator ───────────────────────────────
        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
        let shutdown_signal = shutdown.signal();

        // ── Notification worker ────────────────────────────────
        let worker = services.notification_worker();
        let worker_task = worker.start(shutdown_signal.clone()).await;

        // ── REST API server ────────────────────────────────────
        let health = HealthState {
            db: store.db.clone(),
            started_at: Arc::new(Instant::now()),
        };
        let api_router = create_api_router(services.api_state(&app_cfg, health, metrics));

        let api_port = app_cfg.server.api_port;
        let api_addr = format!("{}:{}", app_cfg.server.api_host, api_port);
        let listener = tokio::net::TcpListener::bind(&api_addr).await?;
        info!("REST API server listening on http://{}", api_addr);
        info!("Swagger UI available at http://{}/docs/", api_addr);

        let api_shutdown = shutdown_signal.clone();
        let api_server = axum::serve(listener, api_router).with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("🛑 REST API server received shutdown signal");
        });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("REST API server error: {}", e);
            }
        });

        info!("🚀 TakeCharge service started");

        Ok(Self {
            services,
            config: app_cfg,
            api_port,
            db: store.db,
            shutdown,
            api_task,
            worker_task,
        })
    }

    /// Get a cloneable shutdown signal.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    /// Trigger graceful shutdown (non-blocking).
    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for the API server to stop, then stop the worker and close the database.
    pub async fn wait(self) {
        match self.api_task.await {
            Ok(()) => info!("REST API server stopped"),
            Err(e) => error!("REST API server task panicked: {}", e),
        }

        // The API can also stop on its own (listener error); make sure the worker follows
        self.shutdown.signal().trigger();
        if let Some(worker) = self.worker_task {
            let finished = self
                .shutdown
                .run_cleanup(|| async move {
                    if let Err(e) = worker.await {
                        error!("Notification worker task panicked: {}", e);
                    }
                })
                .await;
            if !finished {
                warn!("Notification worker did not stop within the shutdown timeout");
            }
        }

        if let Some(db) = self.db {
            if let Err(e) = db.close().await {
                warn!("Error closing database connection: {}", e);
            } else {
                info!("✅ Database connection closed");
            }
        }

        info!("👋 TakeCharge service shutdown complete");
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        info!("🛑 Shutting down TakeCharge service...");
        self.trigger_shutdown();
        self.wait().await;
    }

    /// Check if the API server is still running.
    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

/// Initialize tracing (logging) from the application config.
///
/// Call this once at process startup (before [`ServerHandle::start`]).
/// `RUST_LOG` wins over the configured level; `log` records are bridged.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    let result = match config.logging.format.to_lowercase().as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init(),
    };
    if let Err(e) = result {
        eprintln!("tracing already initialized: {}", e);
    }
}
