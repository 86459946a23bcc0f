//! Default category tree shipped with the application.
//!
//! The tree is static configuration data, embedded as a JSON asset rather
//! than built up in code. It is seeded for every new user at registration
//! and by the import-default endpoint.

mod defaults;

pub use defaults::{CategoryGroup, DefaultCategoryTree, default_category_tree};
