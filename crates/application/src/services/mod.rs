mod identity_registry;
mod inbox_reader;
mod message_router;
mod subscription_manager;

pub use identity_registry::{
    IdentityRegistry, IdentityRegistryDependencies, RegisterUserRequest, VerifiedLocation,
};
pub use inbox_reader::{InboxReader, InboxReaderDependencies};
pub use message_router::{Ack, MessageRouter, MessageRouterDependencies};
pub use subscription_manager::{
    JoinOutcome, LeaveOutcome, SubscriptionManager, SubscriptionManagerDependencies,
};
