// Adapters layer: network, HTML and filesystem implementations of the domain ports.

pub mod companies;
pub mod html;
pub mod http;
pub mod registry;
pub mod search;
pub mod storage;
pub mod website;

pub use registry::RegistryFetcher;
pub use search::SearchFetcher;
pub use storage::LocalStorage;
pub use website::WebsiteFetcher;
