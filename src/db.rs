pub mod collection;
pub mod local_store;
pub mod remote_sync;
pub mod school_store;

pub use collection::{Collection, LoadSource, Mutation, Snapshot, StoredEntity};
pub use local_store::{LocalStore, MemoryLocalStore, SqliteLocalStore};
pub use remote_sync::{HttpRemoteSync, OfflineRemote, RemoteChange, RemoteSync, SyncGateway, SyncPolicy};
pub use school_store::SchoolStore;
