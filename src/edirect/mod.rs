//! Entrez Direct retrieval path
//!
//! Delegates the search to NCBI's official command-line toolkit, which has no
//! ceiling on result count. [`EDirectInstaller`] provisions the toolkit;
//! [`EDirectClient`] runs it.

mod client;
mod platform;
mod setup;

pub use client::EDirectClient;
pub use platform::HostPlatform;
pub use setup::EDirectInstaller;
