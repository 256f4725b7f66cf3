pub mod loader;

pub use loader::{ArchiveEntry, ModpackArchive};
