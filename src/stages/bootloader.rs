//! Bootloader installation stages: grub2 configuration, the boot-sector
//! core-image installer, the zipl installer for s390x, and the plain kernel
//! command line.
//!
//! Every generator here insists on a boot-capable partition. An image
//! without one cannot boot, so its absence is a catalog defect and aborts
//! generation instead of producing a best-effort record.

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::blueprint::KernelCustomization;
use crate::disk::{Filesystem, PartitionTable};
use crate::error::{Result, StageError};

/// Saved-boot-entry marker prefix. The bootloader machinery recognizes this
/// exact 32-character placeholder and resolves it to the most recently
/// installed kernel, which makes that kernel the default at next boot.
const SAVED_ENTRY_PLACEHOLDER: &str = "ffffffffffffffffffffffffffffffff";

/// Firmware boot path targeted by the grub2 stage. The two modes are
/// mutually exclusive by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootFirmware {
    /// UEFI boot: vendor directory under the EFI system partition, plus
    /// whether the bootloader binaries are installed (as opposed to already
    /// shipped by packages).
    Uefi { vendor: String, install: bool },
    /// Legacy BIOS boot: grub2 platform identifier, e.g. "i386-pc".
    Legacy(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grub2Uefi {
    pub vendor: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub install: bool,
}

/// Options for the grub2 configuration stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grub2StageOptions {
    pub root_fs_uuid: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boot_fs_uuid: Option<Uuid>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub kernel_opts: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legacy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uefi: Option<Grub2Uefi>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_entry: Option<String>,
}

fn parse_fs_uuid(what: &'static str, fs: &Filesystem) -> Result<Uuid> {
    Uuid::parse_str(&fs.uuid).map_err(|source| StageError::MalformedUuid {
        what,
        value: fs.uuid.clone(),
        source,
    })
}

/// Options for the primary bootloader stage.
///
/// Fails fatally when the table has no root partition. When a kernel
/// customization is supplied, its append string extends the kernel command
/// line and a saved-entry marker for `kernel_ver` is recorded.
pub fn grub2_stage_options(
    pt: &PartitionTable,
    kernel_options: &str,
    kernel: Option<&KernelCustomization>,
    kernel_ver: &str,
    firmware: &BootFirmware,
) -> Result<Grub2StageOptions> {
    let root = pt
        .root_partition()
        .and_then(|p| p.filesystem.as_ref())
        .ok_or_else(|| StageError::invariant("root partition must exist for the grub2 stage"))?;

    let mut options = Grub2StageOptions {
        root_fs_uuid: parse_fs_uuid("root filesystem", root)?,
        boot_fs_uuid: None,
        kernel_opts: kernel_options.to_string(),
        legacy: None,
        uefi: None,
        saved_entry: None,
    };

    if let Some(boot) = pt.boot_partition().and_then(|p| p.filesystem.as_ref()) {
        options.boot_fs_uuid = Some(parse_fs_uuid("boot filesystem", boot)?);
    }

    match firmware {
        BootFirmware::Uefi { vendor, install } => {
            options.uefi = Some(Grub2Uefi {
                vendor: vendor.clone(),
                install: *install,
            });
        }
        BootFirmware::Legacy(platform) => {
            options.legacy = Some(platform.clone());
        }
    }

    if let Some(kernel) = kernel {
        if !kernel.append.is_empty() {
            options.kernel_opts.push(' ');
            options.kernel_opts.push_str(&kernel.append);
        }
        options.saved_entry = Some(format!("{SAVED_ENTRY_PLACEHOLDER}-{kernel_ver}"));
    }

    debug!(kernel_ver, "generated grub2 stage options");
    Ok(options)
}

/// Core-image descriptor of the boot-sector installer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoreMkImage {
    #[serde(rename = "type")]
    pub core_type: &'static str,
    pub partlabel: String,
    pub filesystem: &'static str,
}

/// Prefix descriptor: where the bootloader finds its second stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrefixPartition {
    #[serde(rename = "type")]
    pub prefix_type: &'static str,
    pub partlabel: String,
    pub number: usize,
    pub path: String,
}

/// Options for the boot-sector/core-image installer stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grub2InstStageOptions {
    pub filename: String,
    pub platform: String,
    pub location: u64,
    pub core: CoreMkImage,
    pub prefix: PrefixPartition,
}

/// Options for installing the grub2 core image into the boot sector.
///
/// The prefix path is "/grub2" exactly when the boot partition is mounted at
/// "/boot" (a dedicated boot partition); otherwise the boot files live under
/// the root filesystem at "/boot/grub2".
pub fn grub2_inst_stage_options(
    filename: &str,
    pt: &PartitionTable,
    platform: &str,
) -> Result<Grub2InstStageOptions> {
    let boot_index = pt.boot_partition_index().ok_or_else(|| {
        StageError::invariant("failed to find boot or root partition for the grub2.inst stage")
    })?;
    let boot_fs = pt.partitions[boot_index]
        .filesystem
        .as_ref()
        .ok_or_else(|| StageError::invariant("boot partition carries no filesystem"))?;

    let prefix_path = if boot_fs.mountpoint == "/boot" {
        "/grub2"
    } else {
        "/boot/grub2"
    };

    Ok(Grub2InstStageOptions {
        filename: filename.to_string(),
        platform: platform.to_string(),
        location: pt.partitions[0].start,
        core: CoreMkImage {
            core_type: "mkimage",
            partlabel: pt.label.clone(),
            filesystem: boot_fs.fs_type.as_str(),
        },
        prefix: PrefixPartition {
            prefix_type: "partition",
            partlabel: pt.label.clone(),
            number: boot_index,
            path: prefix_path.to_string(),
        },
    })
}

/// Options for the zipl bootloader installer stage (s390x).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZiplInstStageOptions {
    pub kernel: String,
    pub location: u64,
}

/// Options for installing the zipl bootloader: kernel path plus the boot
/// partition's start offset.
pub fn zipl_inst_stage_options(kernel: &str, pt: &PartitionTable) -> Result<ZiplInstStageOptions> {
    let boot_index = pt.boot_partition_index().ok_or_else(|| {
        StageError::invariant("failed to find boot or root partition for the zipl.inst stage")
    })?;

    Ok(ZiplInstStageOptions {
        kernel: kernel.to_string(),
        location: pt.partitions[boot_index].start,
    })
}

/// Options for the kernel-cmdline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KernelCmdlineStageOptions {
    pub root_fs_uuid: String,
    pub kernel_opts: String,
}

pub fn kernel_cmdline_stage_options(
    root_fs_uuid: &str,
    kernel_options: &str,
) -> KernelCmdlineStageOptions {
    KernelCmdlineStageOptions {
        root_fs_uuid: root_fs_uuid.to_string(),
        kernel_opts: kernel_options.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::testdata::{dos_root_only_table, gpt_table};

    fn uefi() -> BootFirmware {
        BootFirmware::Uefi {
            vendor: "distro".into(),
            install: true,
        }
    }

    #[test]
    fn grub2_requires_root_partition() {
        let mut table = gpt_table();
        for partition in &mut table.partitions {
            partition.filesystem = None;
        }
        let err = grub2_stage_options(&table, "ro", None, "", &uefi()).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn grub2_embeds_root_and_boot_uuids() {
        let options = grub2_stage_options(&gpt_table(), "ro", None, "", &uefi()).unwrap();
        assert_eq!(
            options.root_fs_uuid.to_string(),
            "6e4ff95f-f662-45ee-a82a-bdf44a2d0b75"
        );
        assert_eq!(
            options.boot_fs_uuid.unwrap().to_string(),
            "0194fdc2-fa2f-4cc0-81d3-ff12045b73c8"
        );
    }

    #[test]
    fn grub2_without_dedicated_boot_has_no_boot_uuid() {
        let options = grub2_stage_options(&dos_root_only_table(), "ro", None, "", &uefi()).unwrap();
        assert!(options.boot_fs_uuid.is_none());
    }

    #[test]
    fn grub2_malformed_uuid_is_recoverable() {
        let mut table = dos_root_only_table();
        table.partitions[0].filesystem.as_mut().unwrap().uuid = "not-a-uuid".into();
        let err = grub2_stage_options(&table, "ro", None, "", &uefi()).unwrap_err();
        assert!(!err.is_fatal());
    }

    #[test]
    fn grub2_firmware_modes_are_exclusive() {
        let uefi_options = grub2_stage_options(&gpt_table(), "ro", None, "", &uefi()).unwrap();
        assert!(uefi_options.uefi.is_some());
        assert!(uefi_options.legacy.is_none());

        let legacy = BootFirmware::Legacy("i386-pc".into());
        let legacy_options = grub2_stage_options(&gpt_table(), "ro", None, "", &legacy).unwrap();
        assert!(legacy_options.uefi.is_none());
        assert_eq!(legacy_options.legacy.as_deref(), Some("i386-pc"));
    }

    #[test]
    fn grub2_kernel_append_and_saved_entry() {
        let kernel = KernelCustomization {
            name: None,
            append: "quiet splash".into(),
        };
        let options = grub2_stage_options(
            &gpt_table(),
            "ro biosdevname=0",
            Some(&kernel),
            "5.14.0-70.13.1.el9_0.x86_64",
            &uefi(),
        )
        .unwrap();
        assert_eq!(options.kernel_opts, "ro biosdevname=0 quiet splash");
        assert_eq!(
            options.saved_entry.as_deref(),
            Some("ffffffffffffffffffffffffffffffff-5.14.0-70.13.1.el9_0.x86_64")
        );
    }

    #[test]
    fn grub2_inst_prefix_with_dedicated_boot() {
        let options = grub2_inst_stage_options("disk.img", &gpt_table(), "i386-pc").unwrap();
        assert_eq!(options.prefix.path, "/grub2");
        assert_eq!(options.prefix.number, 2);
        assert_eq!(options.core.filesystem, "ext4");
        assert_eq!(options.core.core_type, "mkimage");
        assert_eq!(options.location, 2048);
    }

    #[test]
    fn grub2_inst_prefix_without_dedicated_boot() {
        let options =
            grub2_inst_stage_options("disk.img", &dos_root_only_table(), "i386-pc").unwrap();
        assert_eq!(options.prefix.path, "/boot/grub2");
        assert_eq!(options.prefix.number, 0);
        assert_eq!(options.core.filesystem, "xfs");
    }

    #[test]
    fn grub2_inst_fails_without_boot_partition() {
        let mut table = gpt_table();
        for partition in &mut table.partitions {
            partition.filesystem = None;
        }
        let err = grub2_inst_stage_options("disk.img", &table, "i386-pc").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn zipl_uses_boot_partition_start() {
        let options = zipl_inst_stage_options("/boot/vmlinuz", &gpt_table()).unwrap();
        assert_eq!(options.location, 413696);
        assert_eq!(options.kernel, "/boot/vmlinuz");
    }

    #[test]
    fn grub2_serializes_engine_field_names() {
        let options = grub2_stage_options(&gpt_table(), "ro", None, "", &uefi()).unwrap();
        let value = serde_json::to_value(&options).unwrap();
        assert!(value.get("root_fs_uuid").is_some());
        assert!(value.get("boot_fs_uuid").is_some());
        assert!(value.get("saved_entry").is_none());
        assert_eq!(value["uefi"]["vendor"].as_str().unwrap(), "distro");
    }
}
