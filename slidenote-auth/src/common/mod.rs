mod models;

pub use models::{IdentityAssertion, Session, StoredCredentials};
