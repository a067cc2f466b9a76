pub mod handler;
pub mod metadata;
pub mod publisher;
pub mod sink;
pub mod source;

pub use handler::RecordHandler;
pub use metadata::{AssetMetadata, MetadataProvider};
pub use publisher::EventPublisher;
pub use sink::TenantSink;
pub use source::{CredentialSource, SubscriptionSource};

#[cfg(any(test, feature = "mock"))]
pub use handler::MockRecordHandler;
#[cfg(any(test, feature = "mock"))]
pub use metadata::MockMetadataProvider;
#[cfg(any(test, feature = "mock"))]
pub use publisher::MockEventPublisher;
#[cfg(any(test, feature = "mock"))]
pub use sink::MockTenantSink;
#[cfg(any(test, feature = "mock"))]
pub use source::{MockCredentialSource, MockSubscriptionSource};
