pub mod dump;
pub mod product;
pub mod review;

pub use dump::{load_dump, DumpProduct, DumpReview};
pub use product::{NewProduct, Product};
pub use review::{NewReview, Review, ReviewScore};
