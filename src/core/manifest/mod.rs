pub mod curseforge;
pub mod detect;
pub mod model;
pub mod modrinth;

pub use curseforge::CurseForgeManifest;
pub use detect::{detect_format, parse_manifest, read_descriptor};
pub use model::{
    ExternalId, FileReference, FileStatus, ManifestDescriptor, ModLoader, ParsedManifest,
    ParsedModpackData, SourceFormat,
};
pub use modrinth::ModrinthIndex;
