pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod persister;
pub mod repositories;

pub use connection::{connect, connect_with_settings, DbPool};
pub use fixtures::{parse_loads, seed_loads, DemoLoadDataset, SeedResult};
pub use persister::CallRecordPersister;
pub use repositories::{
    CallRecordRepository, InMemoryCallRecordRepository, RepositoryError,
    SqlCallRecordRepository, SqlLoadRepository,
};
