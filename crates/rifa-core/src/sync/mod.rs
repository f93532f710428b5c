//! Remote synchronization: one-sale pushes, periodic sweeps and the initial
//! bulk load from the remote sheet.

mod engine;
mod remote;
mod sheet;

pub use engine::{
    load_remote, push_sale, spawn_sync_loop, sync_pending, PushOutcome, SharedLedger, SyncReport,
};
pub use remote::{HttpRemote, RemoteSalePayload, RemoteSink, RemoteSource};
pub use sheet::parse_remote_csv;
