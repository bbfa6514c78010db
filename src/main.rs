use std::sync::Arc;

use craft_studio::{app, config::Config, AppState};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_logging().expect("Failed to initialize logging");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = std::fs::create_dir_all(&config.video.output_dir) {
        tracing::warn!("Failed to create outputs directory: {}", e);
    } else {
        tracing::info!("Outputs directory ready: {}", config.video.output_dir.display());
    }

    tracing::info!(
        "Gemini models - text: {}, video: {}",
        config.gemini.text_model,
        config.gemini.video_model
    );
    tracing::info!(
        "Video jobs poll every {}s, at most {} times",
        config.video.poll_interval.as_secs(),
        config.video.max_polls
    );

    let bind_addr = config.bind_addr.clone();
    let shared_state = Arc::new(AppState::from_config(config));

    // Drop finished video jobs after a day
    let cleanup_state = shared_state.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(tokio::time::Duration::from_secs(3600)).await;
            cleanup_state.job_manager.cleanup_old_jobs(24).await;
        }
    });

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind listener");
    tracing::info!("listening on {}", bind_addr);
    axum::serve(listener, app(shared_state))
        .await
        .expect("Server error");
}

// Production-grade logging configuration
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "debug,craft_studio=trace,reqwest=info,hyper=info,tower=info".to_string()
        } else {
            "info,craft_studio=info,reqwest=warn,hyper=warn,tower=warn".to_string()
        }
    });

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))?;

    let fmt_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        // JSON logging for log aggregation
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("🧵 Craft Studio starting up...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    let build_mode = if cfg!(debug_assertions) { "development" } else { "production" };
    tracing::info!("Build mode: {}", build_mode);
    tracing::info!("Log level: {}", log_level);

    Ok(())
}
