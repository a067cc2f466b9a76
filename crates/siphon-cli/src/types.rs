use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use siphon_core::{
    metadata::DEFAULT_RPC_URL,
    queue::{DEFAULT_GROUP_ID, DEFAULT_TOPIC},
    KafkaOptions, TenantPoolOptions, WorkerOptions,
};
use siphon_types::IndexingStrategy;

use crate::load_config;

#[derive(Parser)]
#[command(name = "siphon")]
#[command(about = "Webhook ingress, matcher and tenant writer for Solana events", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    Run(RunCommand),
    /// Start indexing a token address for a user
    Subscribe(SubscribeArgs),
    /// Inspect and change existing subscriptions
    #[command(subcommand)]
    Subscription(SubscriptionCommand),
    /// Manage webhook receivers
    #[command(subcommand)]
    Receiver(ReceiverCommand),
    /// Manage tenant database credentials
    #[command(subcommand)]
    Tenant(TenantCommand),
}

#[derive(Args)]
pub struct RunCommand {
    #[command(subcommand)]
    pub mode: RunMode,
}

#[derive(Subcommand)]
pub enum RunMode {
    /// HTTP ingress only
    Server(CliArgs),
    /// Queue consumer only
    Consumer(CliArgs),
    /// Ingress and consumer in one process
    Standalone(CliArgs),
}

#[derive(Args, Clone)]
pub struct CliArgs {
    /// Path to the config file
    #[arg(short, long, default_value = "config.toml")]
    pub config_path: String,
}

#[derive(Args, Clone)]
pub struct SubscribeArgs {
    /// Path to the config file
    #[arg(short, long, default_value = "config.toml")]
    pub config_path: String,

    #[arg(long)]
    pub user: String,

    /// Base58 token mint address
    #[arg(long)]
    pub address: String,

    /// Comma separated, e.g. nft_current_prices,nft_current_bids
    #[arg(long, value_delimiter = ',', required = true)]
    pub strategies: Vec<IndexingStrategy>,

    /// Receiver name the upstream webhook posts to
    #[arg(long)]
    pub receiver: String,
}

#[derive(Subcommand)]
pub enum SubscriptionCommand {
    /// List the subscriptions of a user
    List(SubscriptionListArgs),
    /// Replace the indexing strategies of a subscription
    Strategies(SubscriptionStrategiesArgs),
    /// Activate or deactivate a subscription
    Status(SubscriptionStatusArgs),
    /// Route a subscription through another receiver
    Receiver(SubscriptionReceiverArgs),
}

#[derive(Args, Clone)]
pub struct SubscriptionListArgs {
    #[arg(short, long, default_value = "config.toml")]
    pub config_path: String,

    #[arg(long)]
    pub user: String,
}

#[derive(Args, Clone)]
pub struct SubscriptionStrategiesArgs {
    #[arg(short, long, default_value = "config.toml")]
    pub config_path: String,

    #[arg(long)]
    pub id: String,

    #[arg(long, value_delimiter = ',', required = true)]
    pub strategies: Vec<IndexingStrategy>,
}

#[derive(Args, Clone)]
pub struct SubscriptionStatusArgs {
    #[arg(short, long, default_value = "config.toml")]
    pub config_path: String,

    #[arg(long)]
    pub id: String,

    /// `false` stops matching until reactivated
    #[arg(long, action = clap::ArgAction::Set)]
    pub active: bool,
}

#[derive(Args, Clone)]
pub struct SubscriptionReceiverArgs {
    #[arg(short, long, default_value = "config.toml")]
    pub config_path: String,

    #[arg(long)]
    pub id: String,

    #[arg(long)]
    pub receiver: String,
}

#[derive(Subcommand)]
pub enum ReceiverCommand {
    Add(ReceiverAddArgs),
    List(CliArgs),
}

#[derive(Args, Clone)]
pub struct ReceiverAddArgs {
    #[arg(short, long, default_value = "config.toml")]
    pub config_path: String,

    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub webhook_id: String,
}

#[derive(Subcommand)]
pub enum TenantCommand {
    Set(TenantSetArgs),
}

#[derive(Args, Clone)]
pub struct TenantSetArgs {
    #[arg(short, long, default_value = "config.toml")]
    pub config_path: String,

    #[arg(long)]
    pub user: String,

    /// Full `postgres://` connection string
    #[arg(long)]
    pub url: String,

    /// Upper bound on pooled connections to this database
    #[arg(long)]
    pub connection_limit: Option<i32>,
}

impl TryFrom<&CliArgs> for Config {
    type Error = anyhow::Error;

    fn try_from(args: &CliArgs) -> Result<Self> {
        Config::load(&args.config_path)
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub kafka: KafkaConfig,
    pub server: ServerConfig,
    pub tenants: TenantsConfig,
    pub writer: WriterConfig,
    pub metadata: MetadataConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct KafkaConfig {
    pub brokers: String,
    pub topic: String,
    pub group_id: String,
    pub produce_timeout_secs: u64,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            brokers: "localhost:9092".to_string(),
            topic: DEFAULT_TOPIC.to_string(),
            group_id: DEFAULT_GROUP_ID.to_string(),
            produce_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8080 }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct TenantsConfig {
    pub default_pool_size: u32,
    pub max_pool_size: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub credential_ttl_secs: u64,
    pub max_tenants: usize,
}

impl Default for TenantsConfig {
    fn default() -> Self {
        let defaults = TenantPoolOptions::default();
        Self {
            default_pool_size: defaults.default_pool_size,
            max_pool_size: defaults.max_pool_size,
            connect_timeout_secs: defaults.connect_timeout.as_secs(),
            idle_timeout_secs: defaults.idle_timeout.as_secs(),
            credential_ttl_secs: defaults.credential_ttl.as_secs(),
            max_tenants: defaults.max_tenants,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Also split events into the shared `normalized_*` tables.
    pub normalized: bool,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct MetadataConfig {
    pub rpc_url: String,
    pub api_key: Option<String>,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self { rpc_url: DEFAULT_RPC_URL.to_string(), api_key: None }
    }
}

impl Config {
    /// Read the TOML file, then let the process environment override it.
    pub fn load(path: &str) -> Result<Self> {
        let mut config = load_config(path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn apply_env_overrides<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(url) = var("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(brokers) = var("KAFKA_URL") {
            self.kafka.brokers = brokers;
        }
        if let Some(topic) = var("KAFKA_TOPIC") {
            self.kafka.topic = topic;
        }
        if let Some(group_id) = var("KAFKA_GROUP_ID") {
            self.kafka.group_id = group_id;
        }
        if let Some(api_key) = var("HELIUS_API_KEY") {
            self.metadata.api_key = Some(api_key);
        }
        if let Some(rpc_url) = var("HELIUS_RPC_URL") {
            self.metadata.rpc_url = rpc_url;
        }
    }

    pub fn database_url(&self) -> Result<&str> {
        if self.database.url.trim().is_empty() {
            anyhow::bail!("database url is not configured; set [database].url or DATABASE_URL");
        }
        Ok(&self.database.url)
    }

    pub fn kafka_options(&self) -> KafkaOptions {
        KafkaOptions {
            brokers: self.kafka.brokers.clone(),
            topic: self.kafka.topic.clone(),
            group_id: self.kafka.group_id.clone(),
            produce_timeout: Duration::from_secs(self.kafka.produce_timeout_secs),
        }
    }

    pub fn tenant_options(&self) -> TenantPoolOptions {
        TenantPoolOptions {
            default_pool_size: self.tenants.default_pool_size,
            max_pool_size: self.tenants.max_pool_size,
            connect_timeout: Duration::from_secs(self.tenants.connect_timeout_secs),
            idle_timeout: Duration::from_secs(self.tenants.idle_timeout_secs),
            credential_ttl: Duration::from_secs(self.tenants.credential_ttl_secs),
            max_tenants: self.tenants.max_tenants,
        }
    }

    pub fn worker_options(&self) -> WorkerOptions {
        WorkerOptions {
            kafka: self.kafka_options(),
            tenants: self.tenant_options(),
            normalized: self.writer.normalized,
        }
    }
}
