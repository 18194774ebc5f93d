pub mod descriptor;
pub mod store;

pub use descriptor::{ApplicationCredentials, CredentialKind};
pub use store::CredentialStore;
