pub mod audit;
pub mod provisioning;
pub mod qdrant;

pub use audit::{
    find_duplicate_reviews, find_missing_products, render_insert_sql, DuplicateGroup,
    DuplicateReport, ReviewKey,
};
pub use provisioning::{
    inspect, provision, ClearOutcome, InspectReport, ProvisionError, ProvisionReport,
    ProvisionState, Provisioner, ProvisioningLock,
};
pub use qdrant::{CollectionApi, QdrantClient, QdrantError};
