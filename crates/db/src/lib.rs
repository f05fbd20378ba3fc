pub mod connection;
pub mod repositories;
pub mod schema;

pub use connection::{connect, connect_lazy, connect_with_settings, DbPool};
pub use repositories::{
    InMemoryOrderRepository, OrderRepository, RepositoryError, SqlOrderRepository,
};
