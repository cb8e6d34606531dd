pub mod admin_seed;
pub mod email_service;
pub mod storage;
pub mod subscriptions;
pub mod tiers;

pub use email_service::EmailService;
pub use storage::StorageService;
pub use subscriptions::SubscriptionService;
pub use tiers::TierService;
