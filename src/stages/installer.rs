//! Unattended-install and initramfs stages: kickstart, anaconda, lorax,
//! dracut and the installer buildstamp.

use serde::Serialize;

use crate::arch::ARCH_X86_64;
use crate::stages::KICKSTART_PATH;

/// OS name recorded in OSTree kickstarts.
const OSTREE_OS_NAME: &str = "rhel";

/// Installer modules anaconda loads. Nothing at this layer makes the set
/// configurable.
const ANACONDA_MODULES: &[&str] = &[
    "org.fedoraproject.Anaconda.Modules.Network",
    "org.fedoraproject.Anaconda.Modules.Payloads",
    "org.fedoraproject.Anaconda.Modules.Storage",
];

/// Lorax post-install template run inside the installer runtime tree.
const LORAX_TEMPLATE: &str = "99-generic/runtime-postinstall.tmpl";

/// Baseline dracut modules for installer initramfs images: storage,
/// networking, crypto, live-boot and UEFI support. Order is preserved in the
/// output for stability.
const DRACUT_BASE_MODULES: &[&str] = &[
    "bash",
    "systemd",
    "fips",
    "systemd-initrd",
    "modsign",
    "nss-softokn",
    "rdma",
    "rngd",
    "i18n",
    "convertfs",
    "network-manager",
    "network",
    "ifcfg",
    "url-lib",
    "drm",
    "plymouth",
    "prefixdevname",
    "prefixdevname-tools",
    "crypt",
    "dm",
    "dmsquash-live",
    "kernel-modules",
    "kernel-modules-extra",
    "kernel-network-modules",
    "livenet",
    "lvm",
    "mdraid",
    "multipath",
    "qemu",
    "qemu-net",
    "fcoe",
    "fcoe-uefi",
    "iscsi",
    "lunmask",
    "nfs",
    "resume",
    "rootfs-block",
    "terminfo",
    "udev-rules",
    "dracut-systemd",
    "pollcdrom",
    "usrmount",
    "base",
    "fs-lib",
    "img-lib",
    "shutdown",
    "uefi-lib",
];

/// Options for the buildstamp stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildstampStageOptions {
    pub arch: String,
    pub product: String,
    pub version: String,
    pub variant: String,
    pub r#final: bool,
}

pub fn buildstamp_stage_options(
    arch: &str,
    product: &str,
    os_version: &str,
    variant: &str,
) -> BuildstampStageOptions {
    BuildstampStageOptions {
        arch: arch.to_string(),
        product: product.to_string(),
        version: os_version.to_string(),
        variant: variant.to_string(),
        r#final: true,
    }
}

/// Options for the anaconda stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnacondaStageOptions {
    #[serde(rename = "kickstart-modules")]
    pub kickstart_modules: Vec<String>,
}

pub fn anaconda_stage_options() -> AnacondaStageOptions {
    AnacondaStageOptions {
        kickstart_modules: ANACONDA_MODULES.iter().map(|m| m.to_string()).collect(),
    }
}

/// Options for the lorax-script stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoraxScriptStageOptions {
    pub path: String,
    pub basearch: String,
}

pub fn lorax_script_stage_options(arch: &str) -> LoraxScriptStageOptions {
    LoraxScriptStageOptions {
        path: LORAX_TEMPLATE.to_string(),
        basearch: arch.to_string(),
    }
}

/// Options for the dracut initramfs stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DracutStageOptions {
    pub kernel: Vec<String>,
    pub modules: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub install: Vec<String>,
}

/// Compose the initramfs module list.
///
/// Starts from the fixed baseline; x86_64 additionally gets `biosdevname`
/// for its legacy NIC naming scheme; caller-supplied extras are appended
/// last, in the order given. The generated buildstamp is always installed
/// into the image.
pub fn dracut_stage_options(
    kernel_ver: &str,
    arch: &str,
    additional_modules: &[String],
) -> DracutStageOptions {
    let mut modules: Vec<String> = DRACUT_BASE_MODULES.iter().map(|m| m.to_string()).collect();
    if arch == ARCH_X86_64 {
        modules.push("biosdevname".to_string());
    }
    modules.extend(additional_modules.iter().cloned());

    DracutStageOptions {
        kernel: vec![kernel_ver.to_string()],
        modules,
        install: vec!["/.buildstamp".to_string()],
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveImg {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OstreeKickstart {
    pub osname: String,
    pub url: String,
    #[serde(rename = "ref")]
    pub reference: String,
    pub gpg: bool,
}

/// Options for the kickstart stage. Exactly one of the two install sources
/// is set, depending on which generator produced the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KickstartStageOptions {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liveimg: Option<LiveImg>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ostree: Option<OstreeKickstart>,
}

/// Kickstart installing from a live/tar image URL.
pub fn tar_kickstart_stage_options(tar_url: &str) -> KickstartStageOptions {
    KickstartStageOptions {
        path: KICKSTART_PATH.to_string(),
        liveimg: Some(LiveImg {
            url: tar_url.to_string(),
        }),
        ostree: None,
    }
}

/// Kickstart deploying an OSTree commit. GPG verification is disabled; the
/// ref is verified by the surrounding service before it gets here.
pub fn ostree_kickstart_stage_options(ostree_url: &str, ostree_ref: &str) -> KickstartStageOptions {
    KickstartStageOptions {
        path: KICKSTART_PATH.to_string(),
        liveimg: None,
        ostree: Some(OstreeKickstart {
            osname: OSTREE_OS_NAME.to_string(),
            url: ostree_url.to_string(),
            reference: ostree_ref.to_string(),
            gpg: false,
        }),
    }
}
