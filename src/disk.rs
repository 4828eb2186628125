//! Partition-table description consumed by the stage generators.
//!
//! The table is an input here: partition layout planning happens upstream.
//! These types only need to answer the questions the generators ask — which
//! partition boots, which carry filesystems, and where each one lives in the
//! backing image file.

use serde::{Deserialize, Serialize};

/// Filesystem types the mount resolver knows how to emit.
///
/// This is a closed set: the distro catalog must not describe a filesystem
/// outside it, so there is no catch-all variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilesystemType {
    Xfs,
    Vfat,
    Ext4,
    Btrfs,
}

impl FilesystemType {
    /// The type tag as the build engine spells it.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilesystemType::Xfs => "xfs",
            FilesystemType::Vfat => "vfat",
            FilesystemType::Ext4 => "ext4",
            FilesystemType::Btrfs => "btrfs",
        }
    }
}

/// A filesystem carried by exactly one partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filesystem {
    #[serde(rename = "type")]
    pub fs_type: FilesystemType,
    pub uuid: String,
    pub mountpoint: String,
}

/// One partition of the image's partition table.
///
/// A partition without a filesystem (e.g. a BIOS boot partition) takes part
/// in the layout but never in mounting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub bootable: bool,
    /// Size in sectors.
    pub size: u64,
    /// Start offset in sectors.
    pub start: u64,
    #[serde(rename = "type")]
    pub part_type: String,
    pub uuid: String,
    pub filesystem: Option<Filesystem>,
}

/// The partition table of the image being built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionTable {
    /// Partition-table label scheme, e.g. "gpt" or "dos".
    pub label: String,
    pub uuid: String,
    pub partitions: Vec<Partition>,
}

impl PartitionTable {
    /// Index of the partition the bootloader lives on.
    ///
    /// The first partition mounted at "/boot" wins; without a dedicated boot
    /// partition the root partition is the boot partition. `None` means the
    /// table has neither, which callers that need a boot partition treat as
    /// a fatal catalog defect.
    pub fn boot_partition_index(&self) -> Option<usize> {
        let mut root = None;
        for (idx, partition) in self.partitions.iter().enumerate() {
            match partition.filesystem.as_ref().map(|fs| fs.mountpoint.as_str()) {
                Some("/boot") => return Some(idx),
                Some("/") if root.is_none() => root = Some(idx),
                _ => {}
            }
        }
        root
    }

    /// The partition mounted at the given path, if any.
    pub fn partition_at(&self, mountpoint: &str) -> Option<&Partition> {
        self.partitions.iter().find(|p| {
            p.filesystem
                .as_ref()
                .is_some_and(|fs| fs.mountpoint == mountpoint)
        })
    }

    /// The root ("/") partition, if the table has one.
    pub fn root_partition(&self) -> Option<&Partition> {
        self.partition_at("/")
    }

    /// The dedicated "/boot" partition, if the table has one.
    pub fn boot_partition(&self) -> Option<&Partition> {
        self.partition_at("/boot")
    }
}

#[cfg(test)]
pub(crate) mod testdata {
    use super::*;

    pub fn filesystem(fs_type: FilesystemType, uuid: &str, mountpoint: &str) -> Filesystem {
        Filesystem {
            fs_type,
            uuid: uuid.into(),
            mountpoint: mountpoint.into(),
        }
    }

    /// GPT layout with BIOS-boot, EFI, /boot and / partitions.
    pub fn gpt_table() -> PartitionTable {
        PartitionTable {
            label: "gpt".into(),
            uuid: "d209c89e-ea5e-4fbd-b161-b461cce297e0".into(),
            partitions: vec![
                Partition {
                    bootable: true,
                    size: 2048,
                    start: 2048,
                    part_type: "21686148-6449-6E6F-744E-656564454649".into(),
                    uuid: "fa1bcdb4-9167-4286-a699-a5d34779fd33".into(),
                    filesystem: None,
                },
                Partition {
                    bootable: false,
                    size: 409600,
                    start: 4096,
                    part_type: "C12A7328-F81F-11D2-BA4B-00A0C93EC93B".into(),
                    uuid: "68b2905b-df3e-4fb3-80fa-49d1e773aa33".into(),
                    filesystem: Some(filesystem(
                        FilesystemType::Vfat,
                        "7B77-95E7",
                        "/boot/efi",
                    )),
                },
                Partition {
                    bootable: false,
                    size: 1048576,
                    start: 413696,
                    part_type: "0FC63DAF-8483-4772-8E79-3D69D8477DE4".into(),
                    uuid: "61b2905b-df3e-4fb3-80fa-49d1e773aa32".into(),
                    filesystem: Some(filesystem(
                        FilesystemType::Ext4,
                        "0194fdc2-fa2f-4cc0-81d3-ff12045b73c8",
                        "/boot",
                    )),
                },
                Partition {
                    bootable: false,
                    size: 10485760,
                    start: 1462272,
                    part_type: "0FC63DAF-8483-4772-8E79-3D69D8477DE4".into(),
                    uuid: "6264d520-3fb9-423f-8ab8-7a0a8e3d3562".into(),
                    filesystem: Some(filesystem(
                        FilesystemType::Xfs,
                        "6e4ff95f-f662-45ee-a82a-bdf44a2d0b75",
                        "/",
                    )),
                },
            ],
        }
    }

    /// DOS layout with a single root partition and no dedicated /boot.
    pub fn dos_root_only_table() -> PartitionTable {
        PartitionTable {
            label: "dos".into(),
            uuid: "0x14fc63d2".into(),
            partitions: vec![Partition {
                bootable: true,
                size: 12582912,
                start: 2048,
                part_type: "83".into(),
                uuid: "".into(),
                filesystem: Some(filesystem(
                    FilesystemType::Xfs,
                    "efe8afea-c0a8-45dc-8e6e-499279f6fa5d",
                    "/",
                )),
            }],
        }
    }
}
