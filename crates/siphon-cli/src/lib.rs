pub mod types;

use crate::types::*;
use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use siphon_core::{
    new_db_pool,
    subscription::SubscribeRequest,
    EventProducer, HeliusClient, SubscriptionService, Worker,
};
use siphon_server::{start, AppState, Config as ServerConfig};
use siphon_types::{
    repository::{
        ensure_control_plane_schema, get_subscriptions_by_user, get_webhook_receivers,
        insert_webhook_receiver, upsert_database_credential,
    },
    DbPool, SubscriptionModel, UserDatabaseCredential, WebhookReceiverModel,
};
use std::{fs, path::Path, sync::Arc};
use tracing_subscriber::EnvFilter;
use utoipa_axum::router::OpenApiRouter;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // a subscriber may already be installed by an embedding binary
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

async fn control_plane_from_config(config: &Config) -> Result<Arc<DbPool>> {
    let db_pool = new_db_pool(config.database_url()?, config.database.pool_size).await?;
    ensure_control_plane_schema(&db_pool).await?;
    Ok(db_pool)
}

pub async fn new_server_config_from_config(config: &Config) -> Result<(ServerConfig, Arc<EventProducer>)> {
    let db_pool = control_plane_from_config(config).await?;
    let producer = Arc::new(EventProducer::new(&config.kafka_options())?);

    let server_config = ServerConfig {
        db_client: db_pool,
        publisher: producer.clone(),
        api_host: config.server.host.clone(),
        api_port: config.server.port,
    };
    Ok((server_config, producer))
}

pub async fn new_worker_from_config(config: &Config) -> Result<Worker> {
    Worker::new(config.database_url()?, config.database.pool_size, config.worker_options()).await
}

async fn run_server(config: &Config, router: Option<OpenApiRouter<AppState>>) -> Result<()> {
    let (server_config, producer) = new_server_config_from_config(config).await?;

    println!("Server is ready and running on http://{}", server_config.api_endpoint());
    println!("Swagger UI is available at http://{}/swagger-ui", server_config.api_endpoint());

    let served = start(server_config, router).await;
    tracing::info!("Flushing queue producer");
    producer.close()?;
    served
}

/// Entry point of the `siphon` binary.
///
/// * `run server` - webhook ingress publishing to the queue
/// * `run consumer` - queue consumer writing matched events to tenant databases
/// * `run standalone` - both of the above in one process
/// * `subscribe`, `receiver`, `tenant` - control plane administration
///
/// `router` is merged into the ingress API when given.
pub async fn run_command(router: Option<OpenApiRouter<AppState>>) -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(run) => match run.mode {
            RunMode::Server(args) => {
                let config = Config::try_from(&args)?;
                println!("Starting server...");
                run_server(&config, router).await?;
            }
            RunMode::Consumer(args) => {
                let config = Config::try_from(&args)?;
                println!("Running consumer with config: {}", args.config_path);

                let worker = new_worker_from_config(&config).await?;
                worker.run().await?;
            }
            RunMode::Standalone(args) => {
                let config = Config::try_from(&args)?;
                println!("Running ingress and consumer with config: {}", args.config_path);

                let worker = new_worker_from_config(&config).await?;
                tokio::try_join!(run_server(&config, router), worker.run())?;
            }
        },
        Commands::Subscribe(args) => {
            let config = Config::load(&args.config_path)?;
            let service = subscription_service_from_config(&config).await?;

            let subscription = service
                .subscribe(SubscribeRequest {
                    user_id: args.user,
                    token_address: args.address,
                    strategies: args.strategies,
                    receiver: args.receiver,
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&subscription)?);
        }
        Commands::Subscription(SubscriptionCommand::List(args)) => {
            let config = Config::load(&args.config_path)?;
            let db_pool = control_plane_from_config(&config).await?;
            let subscriptions = get_subscriptions_by_user(&db_pool, &args.user).await?;
            println!("{}", serde_json::to_string_pretty(&subscriptions)?);
        }
        Commands::Subscription(SubscriptionCommand::Strategies(args)) => {
            let config = Config::load(&args.config_path)?;
            let service = subscription_service_from_config(&config).await?;
            let updated = service.change_strategies(&args.id, &args.strategies).await?;
            print_updated(&args.id, updated)?;
        }
        Commands::Subscription(SubscriptionCommand::Status(args)) => {
            let config = Config::load(&args.config_path)?;
            let service = subscription_service_from_config(&config).await?;
            let updated = service.set_active(&args.id, args.active).await?;
            print_updated(&args.id, updated)?;
        }
        Commands::Subscription(SubscriptionCommand::Receiver(args)) => {
            let config = Config::load(&args.config_path)?;
            let service = subscription_service_from_config(&config).await?;
            let updated = service.reassign_receiver(&args.id, &args.receiver).await?;
            print_updated(&args.id, updated)?;
        }
        Commands::Receiver(ReceiverCommand::Add(args)) => {
            let config = Config::load(&args.config_path)?;
            let db_pool = control_plane_from_config(&config).await?;
            insert_webhook_receiver(
                &db_pool,
                &WebhookReceiverModel {
                    webhook_name: args.name.clone(),
                    webhook_id: args.webhook_id.clone(),
                    address_count: 0,
                    created_at: Utc::now().naive_utc(),
                },
            )
            .await?;
            println!("Receiver {} now routes webhook {}", args.name, args.webhook_id);
        }
        Commands::Receiver(ReceiverCommand::List(args)) => {
            let config = Config::try_from(&args)?;
            let db_pool = control_plane_from_config(&config).await?;
            let receivers = get_webhook_receivers(&db_pool).await?;
            println!("{}", serde_json::to_string_pretty(&receivers)?);
        }
        Commands::Tenant(TenantCommand::Set(args)) => {
            let config = Config::load(&args.config_path)?;
            let db_pool = control_plane_from_config(&config).await?;
            upsert_database_credential(&db_pool, &tenant_credential(&args)).await?;
            println!(
                "Stored database credential for {}; running consumers switch over within {}s",
                args.user, config.tenants.credential_ttl_secs
            );
        }
    }
    Ok(())
}

async fn subscription_service_from_config(config: &Config) -> Result<SubscriptionService> {
    let db_pool = control_plane_from_config(config).await?;
    let metadata = HeliusClient::new(&config.metadata.rpc_url, config.metadata.api_key.as_deref())?;
    Ok(SubscriptionService::new(db_pool, Arc::new(metadata)))
}

fn print_updated(id: &str, updated: Option<SubscriptionModel>) -> Result<()> {
    let subscription = updated.with_context(|| format!("Subscription {id} not found"))?;
    println!("{}", serde_json::to_string_pretty(&subscription)?);
    Ok(())
}

fn tenant_credential(args: &TenantSetArgs) -> UserDatabaseCredential {
    UserDatabaseCredential {
        user_id: args.user.clone(),
        connection_string: Some(args.url.clone()),
        host: None,
        port: None,
        db_name: None,
        db_user: None,
        db_password: None,
        ssl_mode: None,
        connection_limit: args.connection_limit,
        created_at: Utc::now().naive_utc(),
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = fs::read_to_string(path).context("Failed to read config file")?;
    let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
    Ok(config)
}
