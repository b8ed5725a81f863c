pub mod client;
#[cfg(feature = "memory")]
pub mod memory;
mod record;
pub mod store;
