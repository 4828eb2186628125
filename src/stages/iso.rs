//! Bootable-ISO stages: the hybrid BIOS/UEFI installer ISO, the
//! network/live-boot ISO, disc-info metadata and final ISO assembly.

use serde::Serialize;

use crate::arch::{bcj_filter, efi_architectures, supports_isolinux};
use crate::error::Result;
use crate::stages::{Product, KICKSTART_PATH};

/// Size of the compressed installer root filesystem, in MiB.
const ISO_ROOTFS_SIZE: u32 = 9216;

/// Release identifier stamped into .discinfo.
// TODO: externalize into the distro catalog; its derivation is not visible
// at this layer.
const DISCINFO_RELEASE: &str = "202010217.n.0";

/// Location of the hybrid-boot MBR image on the build host.
const ISOHYBRID_MBR: &str = "/usr/share/syslinux/isohdpfx.bin";

/// EFI boot image path inside the ISO.
const EFI_BOOT_IMAGE: &str = "images/efiboot.img";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Efi {
    pub architectures: Vec<String>,
    pub vendor: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IsoLinux {
    pub enabled: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub debug: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FsCompressionOptions {
    pub bcj: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FsCompression {
    pub method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<FsCompressionOptions>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IsoRootFs {
    pub size: u32,
    pub compression: FsCompression,
}

/// Options for the hybrid BIOS/UEFI installer-ISO tree stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootIsoMonoStageOptions {
    pub product: Product,
    pub kernel: String,
    pub isolabel: String,
    pub kernel_opts: String,
    pub efi: Efi,
    pub isolinux: IsoLinux,
    pub templates: String,
    pub rootfs: IsoRootFs,
}

/// Options for the installer ISO tree.
///
/// Fails fatally for architectures without EFI ISO support. ISOLINUX rides
/// along only on x86_64; the root filesystem is squashed with xz plus the
/// architecture's BCJ filter where one exists.
pub fn boot_iso_mono_stage_options(
    kernel_ver: &str,
    arch: &str,
    vendor: &str,
    product: &str,
    os_version: &str,
    isolabel: &str,
) -> Result<BootIsoMonoStageOptions> {
    let compression_options = bcj_filter(arch).map(|bcj| FsCompressionOptions { bcj: bcj.into() });

    Ok(BootIsoMonoStageOptions {
        product: Product {
            name: product.to_string(),
            version: os_version.to_string(),
        },
        kernel: kernel_ver.to_string(),
        isolabel: isolabel.to_string(),
        kernel_opts: format!("inst.ks=hd:LABEL={isolabel}:{KICKSTART_PATH}"),
        efi: Efi {
            architectures: efi_architectures(arch)?,
            vendor: vendor.to_string(),
        },
        isolinux: IsoLinux {
            enabled: supports_isolinux(arch),
            debug: false,
        },
        templates: "80-rhel".to_string(),
        rootfs: IsoRootFs {
            size: ISO_ROOTFS_SIZE,
            compression: FsCompression {
                method: "xz",
                options: compression_options,
            },
        },
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IsoKernel {
    pub dir: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub opts: Vec<String>,
}

/// Options for the network/live-boot ISO tree stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrubIsoStageOptions {
    pub product: Product,
    pub kernel: IsoKernel,
    pub isolabel: String,
    pub architectures: Vec<String>,
    pub vendor: String,
}

/// Options for the grub2-booted live-install ISO tree.
///
/// Same architecture gating as the installer ISO. The kernel options are a
/// fixed console/logging baseline plus the live-ISO label and the target
/// device the embedded image gets written to.
pub fn grub_iso_stage_options(
    install_device: &str,
    kernel_ver: &str,
    arch: &str,
    vendor: &str,
    product: &str,
    os_version: &str,
    isolabel: &str,
) -> Result<GrubIsoStageOptions> {
    Ok(GrubIsoStageOptions {
        product: Product {
            name: product.to_string(),
            version: os_version.to_string(),
        },
        kernel: IsoKernel {
            dir: "/images/pxeboot".to_string(),
            opts: vec![
                "rd.neednet=1".to_string(),
                "console=tty0".to_string(),
                "console=ttyS0".to_string(),
                "systemd.log_target=console".to_string(),
                "systemd.journald.forward_to_console=1".to_string(),
                format!("edge.liveiso={isolabel}"),
                format!("coreos.inst.install_dev={install_device}"),
                "coreos.inst.image_file=/run/media/iso/disk.img.xz".to_string(),
                "coreos.inst.insecure".to_string(),
            ],
        },
        isolabel: isolabel.to_string(),
        architectures: efi_architectures(arch)?,
        vendor: vendor.to_string(),
    })
}

/// Options for the discinfo stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscinfoStageOptions {
    pub basearch: String,
    pub release: String,
}

pub fn discinfo_stage_options(arch: &str) -> DiscinfoStageOptions {
    DiscinfoStageOptions {
        basearch: arch.to_string(),
        release: DISCINFO_RELEASE.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XorrisofsBoot {
    pub image: String,
    pub catalog: String,
}

/// Options for the final ISO assembly stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XorrisofsStageOptions {
    pub filename: String,
    pub volid: String,
    pub sysid: String,
    pub efi: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boot: Option<XorrisofsBoot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isohybridmbr: Option<String>,
}

/// Assemble the final ISO.
///
/// `isolabel_template` contains an `{arch}` placeholder that becomes the
/// volume identifier's architecture part. Legacy boot adds the ISOLINUX
/// boot catalog/image and the hybrid MBR so the ISO also boots from BIOS
/// and from a raw-copied USB stick.
pub fn xorrisofs_stage_options(
    filename: &str,
    isolabel_template: &str,
    arch: &str,
    isolinux: bool,
) -> XorrisofsStageOptions {
    let mut options = XorrisofsStageOptions {
        filename: filename.to_string(),
        volid: isolabel_template.replace("{arch}", arch),
        sysid: "LINUX".to_string(),
        efi: EFI_BOOT_IMAGE.to_string(),
        boot: None,
        isohybridmbr: None,
    };

    if isolinux {
        options.boot = Some(XorrisofsBoot {
            image: "isolinux/isolinux.bin".to_string(),
            catalog: "isolinux/boot.cat".to_string(),
        });
        options.isohybridmbr = Some(ISOHYBRID_MBR.to_string());
    }

    options
}
