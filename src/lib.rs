//! Client-side core for a cafeteria ordering application: session
//! resolution over a pluggable identity provider, document persistence
//! with local-file and DynamoDB backends, domain repositories for users,
//! menu and orders, and a cart/checkout engine.

pub mod auth;
pub mod config;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod services;
pub mod stores;

pub use auth::{CredentialFlow, IdentityProvider, SessionResolver};
pub use config::Config;
pub use models::{Cart, MenuItem, Order, OrderStatus, Role, ServiceError, Session, User};
pub use repositories::{MenuRepository, OrderRepository, UserRepository};
pub use services::CheckoutService;
pub use stores::{from_config, DocumentStore, LocalBlobStore, RemoteDocumentStore};
