//! Configuration module

mod site;

pub use site::FallbackPolicy;
pub use site::RevalidateConfig;
pub use site::SiteConfig;
pub use site::StoreConfig;
