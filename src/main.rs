use std::{process, sync::Arc, time::Duration};

use sqlx::PgPool;
use taskdesk::{
    application::{
        error::AppError,
        repos::{HealthRepo, TodosRepo, TodosWriteRepo, UsersRepo},
        todos::TodoService,
        users::UserService,
    },
    cache::{CacheAside, CacheConfig, CacheInvalidator, CacheStore, MemoryStore},
    config::{self, CacheBackend},
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{ApiState, build_api_router},
        redis::RedisCache,
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match cli_args.command {
        None | Some(config::Command::Serve(_)) => run_serve(settings).await,
        Some(config::Command::Migrate(_)) => run_migrate(settings).await,
    }
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect_database(&settings).await?;
    info!(target = "taskdesk::migrate", "migrations applied");
    pool.close().await;
    Ok(())
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect_database(&settings).await?;
    let repositories = Arc::new(PostgresRepositories::new(pool));
    let store = init_cache_store(&settings).await?;
    let state = build_api_state(repositories, store, &settings);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "taskdesk::serve",
        addr = %settings.server.addr,
        "listening"
    );

    let router = build_api_router(state);
    let grace = settings.server.graceful_shutdown;
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal());

    // The drain window only starts once a signal arrives.
    let drained = async move {
        server.await?;
        Ok::<_, std::io::Error>(())
    };
    tokio::pin!(drained);

    tokio::select! {
        result = &mut drained => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        _ = drain_deadline(grace) => {
            warn!(
                target = "taskdesk::serve",
                grace_seconds = grace.as_secs(),
                "graceful shutdown window elapsed; dropping open connections"
            );
        }
    }

    info!(target = "taskdesk::serve", "server stopped");
    Ok(())
}

async fn connect_database(settings: &config::Settings) -> Result<PgPool, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| {
            InfraError::configuration(
                "database url is not configured (set TASKDESK__DATABASE__URL or --database-url)",
            )
        })
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(pool)
}

async fn init_cache_store(settings: &config::Settings) -> Result<Arc<dyn CacheStore>, AppError> {
    let cache_config = CacheConfig::from(&settings.cache);
    match settings.cache.backend {
        CacheBackend::Redis => {
            let redis = RedisCache::connect(&settings.cache.redis_url)
                .map_err(|err| AppError::from(InfraError::from(err)))?;
            redis
                .ping()
                .await
                .map_err(|err| AppError::from(InfraError::from(err)))?;
            info!(
                target = "taskdesk::cache",
                backend = "redis",
                ttl_seconds = cache_config.ttl.as_secs(),
                "cache store ready"
            );
            Ok(Arc::new(redis))
        }
        CacheBackend::Memory => {
            info!(
                target = "taskdesk::cache",
                backend = "memory",
                capacity = cache_config.memory_capacity.get(),
                ttl_seconds = cache_config.ttl.as_secs(),
                "cache store ready"
            );
            Ok(Arc::new(MemoryStore::new(&cache_config)))
        }
    }
}

fn build_api_state(
    repositories: Arc<PostgresRepositories>,
    store: Arc<dyn CacheStore>,
    settings: &config::Settings,
) -> ApiState {
    let todos_repo: Arc<dyn TodosRepo> = repositories.clone();
    let todos_write_repo: Arc<dyn TodosWriteRepo> = repositories.clone();
    let users_repo: Arc<dyn UsersRepo> = repositories.clone();
    let health_repo: Arc<dyn HealthRepo> = repositories;

    let cache_config = CacheConfig::from(&settings.cache);
    let cache = CacheAside::new(store.clone(), &cache_config);
    let invalidator = CacheInvalidator::new(store);

    let todos = TodoService::new(
        todos_repo,
        todos_write_repo,
        users_repo.clone(),
        cache,
        invalidator,
    );
    let users = UserService::new(users_repo);

    ApiState {
        todos: Arc::new(todos),
        users: Arc::new(users),
        health: health_repo,
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(target = "taskdesk::serve", error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(target = "taskdesk::serve", error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!(target = "taskdesk::serve", "shutdown signal received");
}

async fn drain_deadline(grace: Duration) {
    shutdown_signal().await;
    tokio::time::sleep(grace).await;
}
