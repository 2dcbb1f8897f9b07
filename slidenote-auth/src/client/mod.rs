pub mod config;
mod credential_store;
mod device_id;
pub mod identity;

pub use self::config::Settings;
pub use credential_store::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use device_id::DeviceIdStore;
pub use identity::{IdentityProvider, RelayIdentityProvider};
