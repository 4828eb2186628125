//! Stage-option synthesis for declarative OS image builds.
//!
//! This crate is the backend of an image-building service: it turns a
//! target-environment descriptor (distro, version, architecture), a disk
//! partition layout and a set of declarative OS customizations into the
//! per-stage option records an external declarative build engine consumes.
//!
//! - **Inputs** come from external collaborators: a [`disk::PartitionTable`]
//!   from the layout planner, [`blueprint::Customizations`] from request
//!   validation, distro/arch identifiers from the distro catalog.
//! - **Outputs** are one flat, serializable record per stage kind
//!   ([`stages::StageOptions`]), shaped exactly as the engine expects them.
//!   The surrounding service assembles them into an ordered manifest.
//!
//! Everything here is pure and deterministic: no I/O, no shared state, no
//! stage execution. Failures are typed ([`error::StageError`]): malformed
//! request data is recoverable, while inconsistent catalog data (a missing
//! boot partition, an unsupported architecture) is fatal and aborts the
//! whole generation. A partial manifest is never produced.

pub mod arch;
pub mod blueprint;
pub mod crypt;
pub mod disk;
pub mod error;
pub mod stages;

pub use blueprint::Customizations;
pub use disk::{Filesystem, FilesystemType, Partition, PartitionTable};
pub use error::StageError;
pub use stages::StageOptions;
