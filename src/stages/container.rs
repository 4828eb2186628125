//! Small literal emitters for container- and OSTree-based image variants,
//! plus the partition-table write stage.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::disk::PartitionTable;

/// Server block of the generated nginx config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NginxConfig {
    pub listen: String,
    pub root: String,
    pub daemon: bool,
    pub pid: String,
}

/// Options for the nginx configuration stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NginxConfigStageOptions {
    pub path: String,
    pub config: NginxConfig,
}

/// Nginx config for serving the image from an unprivileged container:
/// foreground process, pid file in /tmp.
pub fn nginx_config_stage_options(
    path: &str,
    html_root: &str,
    listen: &str,
) -> NginxConfigStageOptions {
    NginxConfigStageOptions {
        path: path.to_string(),
        config: NginxConfig {
            listen: listen.to_string(),
            root: html_root.to_string(),
            daemon: false,
            pid: "/tmp/nginx.pid".to_string(),
        },
    }
}

/// Mode change for one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChmodPathOptions {
    pub mode: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub recursive: bool,
}

/// Options for the chmod stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChmodStageOptions {
    pub items: BTreeMap<String, ChmodPathOptions>,
}

pub fn chmod_stage_options(path: &str, mode: &str, recursive: bool) -> ChmodStageOptions {
    let mut items = BTreeMap::new();
    items.insert(
        path.to_string(),
        ChmodPathOptions {
            mode: mode.to_string(),
            recursive,
        },
    );
    ChmodStageOptions { items }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SysrootOptions {
    pub readonly: bool,
    pub bootloader: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OstreeConfig {
    pub sysroot: SysrootOptions,
}

/// Options for the ostree repository configuration stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OstreeConfigStageOptions {
    pub repo: String,
    pub config: OstreeConfig,
}

/// Sysroot configuration for an OSTree repo. The bootloader is always
/// "none": bootloader configuration is handled by this engine's own stages,
/// not by ostree.
pub fn ostree_config_stage_options(repo: &str, read_only: bool) -> OstreeConfigStageOptions {
    OstreeConfigStageOptions {
        repo: repo.to_string(),
        config: OstreeConfig {
            sysroot: SysrootOptions {
                readonly: read_only,
                bootloader: "none",
            },
        },
    }
}

/// One directory to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MkdirPath {
    pub path: String,
    pub mode: u32,
}

/// Options for the mkdir stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MkdirStageOptions {
    pub paths: Vec<MkdirPath>,
}

/// Create the EFI system partition mountpoint, root-only.
pub fn efi_mkdir_stage_options() -> MkdirStageOptions {
    MkdirStageOptions {
        paths: vec![MkdirPath {
            path: "/boot/efi".to_string(),
            mode: 0o700,
        }],
    }
}

/// One partition entry of the sfdisk stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SfdiskPartition {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub bootable: bool,
    pub size: u64,
    pub start: u64,
    #[serde(rename = "type")]
    pub part_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub uuid: String,
}

/// Options for the partition-table write stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SfdiskStageOptions {
    pub label: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub uuid: String,
    pub partitions: Vec<SfdiskPartition>,
}

/// Project the partition table into the partition-table write stage.
pub fn sfdisk_stage_options(pt: &PartitionTable) -> SfdiskStageOptions {
    SfdiskStageOptions {
        label: pt.label.clone(),
        uuid: pt.uuid.clone(),
        partitions: pt
            .partitions
            .iter()
            .map(|p| SfdiskPartition {
                bootable: p.bootable,
                size: p.size,
                start: p.start,
                part_type: p.part_type.clone(),
                uuid: p.uuid.clone(),
            })
            .collect(),
    }
}
