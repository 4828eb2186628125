//! Partition/mount resolution for the filesystem-copy stage.
//!
//! Turns a partition table plus a backing image file into the devices and
//! mounts the copy stage needs: one loopback device per filesystem-bearing
//! partition and one typed mount per filesystem, ordered so that every
//! mount's parent directory is mounted before it.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::disk::{FilesystemType, PartitionTable};

/// A byte range of a backing file presented as a block device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoopbackDeviceOptions {
    pub filename: String,
    pub start: u64,
    pub size: u64,
}

/// One device declaration of the copy stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    #[serde(rename = "type")]
    pub device_type: &'static str,
    pub options: LoopbackDeviceOptions,
}

impl Device {
    /// A loopback device over the given byte range.
    pub fn loopback(options: LoopbackDeviceOptions) -> Self {
        Device {
            device_type: "org.osbuild.loopback",
            options,
        }
    }
}

/// One mount declaration of the copy stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mount {
    pub name: String,
    #[serde(rename = "type")]
    pub mount_type: &'static str,
    pub source: String,
    pub target: String,
}

impl Mount {
    fn new(fs_type: FilesystemType, name: &str, source: &str, target: &str) -> Self {
        let mount_type = match fs_type {
            FilesystemType::Xfs => "org.osbuild.xfs",
            FilesystemType::Vfat => "org.osbuild.fat",
            FilesystemType::Ext4 => "org.osbuild.ext4",
            FilesystemType::Btrfs => "org.osbuild.btrfs",
        };
        Mount {
            name: name.into(),
            mount_type,
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Device map of a copy stage, keyed by logical device name.
pub type Devices = BTreeMap<String, Device>;

/// Ordered mount list of a copy stage.
pub type Mounts = Vec<Mount>;

/// One from→to mapping of the copy stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyStagePath {
    pub from: String,
    pub to: String,
}

/// Options for the filesystem-copy stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyStageOptions {
    pub paths: Vec<CopyStagePath>,
}

/// Resolve the copy-stage options, devices and mounts for a partition table.
///
/// `input_name` is the name of the tree input being copied; `image` is the
/// loopback descriptor of the backing image file. Every filesystem-bearing
/// partition contributes one loopback device spanning exactly its
/// [start, start+size) range and one mount; partitions without a filesystem
/// (e.g. BIOS boot) are skipped. The logical device name is the mountpoint's
/// final path segment, with "/" mapping to "root".
///
/// Mounts are sorted by target path. Plain lexicographic order suffices:
/// a parent directory is always a prefix of its children ("/" < "/boot"),
/// and sibling order does not matter to the engine.
pub fn copy_fs_tree_options(
    input_name: &str,
    pt: &PartitionTable,
    image: &LoopbackDeviceOptions,
) -> (CopyStageOptions, Devices, Mounts) {
    let mut devices = Devices::new();
    let mut mounts = Mounts::new();

    for partition in &pt.partitions {
        let Some(fs) = partition.filesystem.as_ref() else {
            continue;
        };
        let name = if fs.mountpoint == "/" {
            "root".to_string()
        } else {
            Path::new(&fs.mountpoint)
                .file_name()
                .map(|segment| segment.to_string_lossy().into_owned())
                .unwrap_or_else(|| fs.mountpoint.clone())
        };
        devices.insert(
            name.clone(),
            Device::loopback(LoopbackDeviceOptions {
                filename: image.filename.clone(),
                start: partition.start,
                size: partition.size,
            }),
        );
        mounts.push(Mount::new(fs.fs_type, &name, &name, &fs.mountpoint));
    }

    mounts.sort_by(|a, b| a.target.cmp(&b.target));
    debug!(
        devices = devices.len(),
        mounts = mounts.len(),
        "resolved copy-stage devices and mounts"
    );

    let options = CopyStageOptions {
        paths: vec![CopyStagePath {
            from: format!("input://{input_name}/"),
            to: "mount://root/".to_string(),
        }],
    };

    (options, devices, mounts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::testdata::{dos_root_only_table, gpt_table};

    fn image() -> LoopbackDeviceOptions {
        LoopbackDeviceOptions {
            filename: "disk.img".into(),
            start: 0,
            size: 12582912,
        }
    }

    #[test]
    fn mounts_are_sorted_parent_first() {
        let (_, _, mounts) = copy_fs_tree_options("tree", &gpt_table(), &image());
        let targets: Vec<&str> = mounts.iter().map(|m| m.target.as_str()).collect();
        assert_eq!(targets, ["/", "/boot", "/boot/efi"]);
        for (idx, mount) in mounts.iter().enumerate() {
            for earlier in &mounts[..idx] {
                assert!(earlier.target <= mount.target);
            }
        }
    }

    #[test]
    fn root_partition_is_named_root() {
        let (_, devices, mounts) = copy_fs_tree_options("tree", &dos_root_only_table(), &image());
        assert!(devices.contains_key("root"));
        assert_eq!(mounts[0].name, "root");
        assert_eq!(mounts[0].mount_type, "org.osbuild.xfs");
    }

    #[test]
    fn filesystem_less_partitions_are_skipped() {
        let (_, devices, _) = copy_fs_tree_options("tree", &gpt_table(), &image());
        // The GPT fixture has 4 partitions but only 3 filesystems.
        assert_eq!(devices.len(), 3);
        assert!(!devices.contains_key("bios-boot"));
    }

    #[test]
    fn table_without_filesystems_yields_empty_sets() {
        let mut table = gpt_table();
        for partition in &mut table.partitions {
            partition.filesystem = None;
        }
        let (options, devices, mounts) = copy_fs_tree_options("tree", &table, &image());
        assert!(devices.is_empty());
        assert!(mounts.is_empty());
        assert_eq!(options.paths.len(), 1);
    }

    #[test]
    fn devices_span_their_partition_exactly() {
        let table = gpt_table();
        let (_, devices, _) = copy_fs_tree_options("tree", &table, &image());
        let boot = &devices["boot"];
        assert_eq!(boot.options.filename, "disk.img");
        assert_eq!(boot.options.start, 413696);
        assert_eq!(boot.options.size, 1048576);
    }

    #[test]
    fn copy_path_maps_input_to_root_mount() {
        let (options, _, _) = copy_fs_tree_options("root-tree", &gpt_table(), &image());
        let value = serde_json::to_value(&options).unwrap();
        assert_eq!(
            value["paths"][0]["from"].as_str().unwrap(),
            "input://root-tree/"
        );
        assert_eq!(value["paths"][0]["to"].as_str().unwrap(), "mount://root/");
    }
}
