// Types shared by every consumer of the session
pub mod common;

mod client;
mod error;

pub use client::{
    CredentialStore, DeviceIdStore, FileCredentialStore, IdentityProvider, MemoryCredentialStore,
    RelayIdentityProvider, Settings,
};
pub use client::config::{CheckoutSettings, PollingSettings};
pub use common::{IdentityAssertion, Session, StoredCredentials};
pub use error::AuthError;
