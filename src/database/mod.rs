pub mod connection;
pub mod maintenance;
pub mod product_repo;
pub mod review_repo;
pub mod schema;

pub use connection::DatabaseManager;
pub use maintenance::{preview_purge, purge_by_date, PurgeReport};
pub use product_repo::ProductRepository;
pub use review_repo::ReviewRepository;
pub use schema::{
    ensure_schema, schema_statements, schema_status, SchemaOptions, SchemaReport, SchemaStatus,
    TextSearchIndex,
};
