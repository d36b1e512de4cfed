//! Credential store: ports consumed by the auth workflows and their
//! PostgreSQL / in-memory implementations.

pub mod memory;
pub mod ports;

#[cfg(feature = "database")]
#[cfg_attr(docsrs, doc(cfg(feature = "database")))]
pub mod postgres;

pub use memory::MemoryStore;
pub use ports::{
    ConfirmationTokenRecord, ConfirmationTokenStore, IssuedTokenStore,
    NewConfirmationToken, RoleStore, UserStore,
};

#[cfg(feature = "database")]
pub use postgres::{
    PgConfirmationTokenStore, PgIssuedTokenStore, PgRoleStore, PgUserStore,
};
