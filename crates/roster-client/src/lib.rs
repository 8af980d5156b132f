mod loader;

pub use loader::{LoadError, RemoteLoader, UserSource};
