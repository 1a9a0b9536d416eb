pub mod config;
pub mod listing;
pub mod metrics;
pub mod orbit;
pub mod resolver;
pub mod storage;
pub mod sync;
pub mod testing;
pub mod upstream;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use listing::{CatalogListing, ListingError};
pub use orbit::{adjust_window, Granule, OrbitFile, OrbitType, ParseError, WindowMode};
pub use resolver::{OrbitResolver, ResolveError, ResolverOptions};
pub use storage::{ObjectStore, S3Store, StorageError};
pub use sync::{Reconciler, SyncError, SyncOptions, SyncReport};
pub use upstream::{CdseClient, Credentials, SessionApi, UpstreamCatalog};
