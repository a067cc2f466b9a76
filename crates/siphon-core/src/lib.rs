pub mod control;
pub mod db;
pub mod delivery;
pub mod matcher;
pub mod metadata;
pub mod queue;
pub mod subscription;
pub mod tenant;
pub mod worker;
pub mod writer;

pub use control::ControlPlane;
pub use db::new_db_pool;
pub use delivery::TenantDelivery;
pub use matcher::{BatchReport, Matcher};
pub use metadata::HeliusClient;
pub use queue::{EventConsumer, EventProducer, KafkaOptions};
pub use subscription::{SubscriptionError, SubscriptionService};
pub use tenant::{RouteError, TenantPoolOptions, TenantRouter};
pub use worker::{Worker, WorkerOptions};
pub use writer::PayloadWriter;
