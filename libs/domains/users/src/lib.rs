//! Users Domain
//!
//! Create, list, fetch, update and soft-delete users, addressed by message
//! pattern rather than HTTP route.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← pattern name → operation, payload binding
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← validation, active-only reads, soft delete
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← storage port (in-memory, PostgreSQL)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │    Fault    │  ← storage errors → caller-facing faults
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_users::{handlers::UserDispatcher, InMemoryUserRepository, UserService};
//!
//! # async fn run() {
//! let service = UserService::new(InMemoryUserRepository::new());
//! let dispatcher = UserDispatcher::new(service);
//!
//! let reply = dispatcher
//!     .dispatch("find_all_users", serde_json::json!({"page": 1}))
//!     .await;
//! # }
//! ```

pub mod entity;
pub mod error;
pub mod fault;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{RepositoryError, RpcFault, UserError, UserResult};
pub use handlers::{PATTERNS, UserDispatcher};
pub use models::{CreateUser, Page, PageMetadata, Pagination, UpdateUser, User, UserId};
pub use postgres::PgUserRepository;
pub use repository::{InMemoryUserRepository, UserRepository};
pub use service::UserService;
