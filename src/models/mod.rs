// Domain models: producer snapshots in, window summaries out

pub mod lenient;
mod network;
mod storage;
mod summary;
mod system;

pub use network::{InterfaceSample, NetworkSample};
pub use storage::{DiskSample, FilesystemSample, UNKNOWN_MOUNT};
pub use summary::{CpuStats, DiskUsageStats, InterfaceRates, MemoryStats, Summary};
pub use system::{CpuSample, MemorySample, Snapshot, SystemIdentity};
