pub mod credential;
pub mod receiver;
pub mod registry;
pub mod subscription;

pub use credential::UserDatabaseCredential;
pub use receiver::WebhookReceiverModel;
pub use registry::AddressRegistryModel;
pub use subscription::{NewSubscription, SubscriptionLookupModel, SubscriptionModel};
