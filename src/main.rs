use chrono::Utc;
use clap::Parser;
use grade_processor::{
    args::Args,
    database::db::DbClient,
    messaging::{RabbitMqConfig, RabbitMqPublisher},
    model::{rating_processor::BatchOptions, structures::grade_change::GradeChange, GradeSystem}
};
use std::{
    process,
    sync::{atomic::Ordering, Arc}
};
use tracing::{error, info, warn};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let indicatif_layer = IndicatifLayer::new();
    tracing_subscriber::registry()
        .with(EnvFilter::new(&args.log_level))
        .with(fmt::layer().with_writer(indicatif_layer.get_stderr_writer()))
        .with(indicatif_layer)
        .init();

    let policy = match args.policy() {
        Ok(policy) => policy,
        Err(e) => {
            error!("Invalid rating configuration: {}", e);
            process::exit(1);
        }
    };

    let client = match DbClient::connect_pool(&args.connection_string, args.concurrency).await {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            error!("Application cannot start without a valid database connection");
            process::exit(1);
        }
    };

    if args.init_schema {
        if let Err(e) = client.ensure_schema().await {
            error!("Failed to create database schema: {}", e);
            process::exit(1);
        }
    }

    let system = GradeSystem::with_policy(policy);
    let options = BatchOptions {
        concurrency: args.concurrency,
        ..BatchOptions::default()
    };

    let stop = Arc::clone(&options.stop);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing players in progress");
            stop.store(true, Ordering::SeqCst);
        }
    });

    let mut grade_changes: Vec<GradeChange> = Vec::new();

    if args.task.updates_ratings() {
        match system.update_players_rating(&client, &options).await {
            Ok(report) => grade_changes.extend(report.grade_changes),
            Err(e) => {
                error!("Rating batch failed: {}", e);
                process::exit(1);
            }
        }
    }

    if args.task.downgrades_inactive() && !options.stop.load(Ordering::SeqCst) {
        match system.downgrade_inactive_players(&client, args.inactive_days, Utc::now()).await {
            Ok(report) => grade_changes.extend(report.grade_changes),
            Err(e) => {
                error!("Inactivity sweep failed: {}", e);
                process::exit(1);
            }
        }
    }

    info!(changes = grade_changes.len(), "Processing complete");

    if args.publish {
        publish(&grade_changes).await;
    }
}

async fn publish(changes: &[GradeChange]) {
    if changes.is_empty() {
        return;
    }

    let config = match RabbitMqConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            warn!("RabbitMQ is not configured, grade changes were not published: {}", e);
            return;
        }
    };

    let mut publisher = match RabbitMqPublisher::connect_from_config(&config).await {
        Ok(publisher) => publisher,
        Err(e) => {
            error!("Failed to connect to RabbitMQ: {}", e);
            return;
        }
    };

    let correlation_id = Some(Uuid::new_v4().to_string());
    match publisher.publish_all(changes, correlation_id).await {
        Ok(sent) => info!(sent, "Published grade changes"),
        Err(e) => error!("Failed to publish grade changes: {}", e)
    }

    if let Err(e) = publisher.close().await {
        warn!("Failed to close RabbitMQ connection: {}", e);
    }
}
