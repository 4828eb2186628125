//! Per-stage option generators.
//!
//! Each submodule covers one family of stages of the external build engine.
//! Generators are pure: they take the partition table, blueprint
//! customizations and distro/arch identifiers, and return one flat,
//! serializable option record shaped exactly as the engine expects it. The
//! surrounding service assembles the records into a manifest; nothing here
//! executes stages or touches the disk.

pub mod bootloader;
pub mod container;
pub mod fscopy;
pub mod installer;
pub mod iso;
pub mod osconfig;
pub mod qemu;

use serde::Serialize;

/// Fixed path of the generated kickstart file inside installer media.
pub const KICKSTART_PATH: &str = "/osbuild.ks";

/// Product identity stamped into installer media.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub name: String,
    pub version: String,
}

/// Options for one stage, tagged by stage kind.
///
/// Serializes untagged: the engine carries the stage identifier separately
/// (see [`StageOptions::name`]) and expects the options object to be the
/// bare payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StageOptions {
    Rpm(osconfig::RpmStageOptions),
    Selinux(osconfig::SelinuxStageOptions),
    Users(osconfig::UsersStageOptions),
    Groups(osconfig::GroupsStageOptions),
    FirstBoot(osconfig::FirstBootStageOptions),
    Firewall(osconfig::FirewallStageOptions),
    Systemd(osconfig::SystemdStageOptions),
    Buildstamp(installer::BuildstampStageOptions),
    Anaconda(installer::AnacondaStageOptions),
    LoraxScript(installer::LoraxScriptStageOptions),
    Dracut(installer::DracutStageOptions),
    Kickstart(installer::KickstartStageOptions),
    BootIsoMono(iso::BootIsoMonoStageOptions),
    GrubIso(iso::GrubIsoStageOptions),
    Discinfo(iso::DiscinfoStageOptions),
    Xorrisofs(iso::XorrisofsStageOptions),
    Grub2(bootloader::Grub2StageOptions),
    Grub2Inst(bootloader::Grub2InstStageOptions),
    ZiplInst(bootloader::ZiplInstStageOptions),
    KernelCmdline(bootloader::KernelCmdlineStageOptions),
    Qemu(qemu::QemuStageOptions),
    Copy(fscopy::CopyStageOptions),
    Sfdisk(container::SfdiskStageOptions),
    NginxConfig(container::NginxConfigStageOptions),
    Chmod(container::ChmodStageOptions),
    OstreeConfig(container::OstreeConfigStageOptions),
    Mkdir(container::MkdirStageOptions),
}

impl StageOptions {
    /// The engine's identifier for the stage these options configure.
    pub fn name(&self) -> &'static str {
        match self {
            StageOptions::Rpm(_) => "org.osbuild.rpm",
            StageOptions::Selinux(_) => "org.osbuild.selinux",
            StageOptions::Users(_) => "org.osbuild.users",
            StageOptions::Groups(_) => "org.osbuild.groups",
            StageOptions::FirstBoot(_) => "org.osbuild.first-boot",
            StageOptions::Firewall(_) => "org.osbuild.firewall",
            StageOptions::Systemd(_) => "org.osbuild.systemd",
            StageOptions::Buildstamp(_) => "org.osbuild.buildstamp",
            StageOptions::Anaconda(_) => "org.osbuild.anaconda",
            StageOptions::LoraxScript(_) => "org.osbuild.lorax-script",
            StageOptions::Dracut(_) => "org.osbuild.dracut",
            StageOptions::Kickstart(_) => "org.osbuild.kickstart",
            StageOptions::BootIsoMono(_) => "org.osbuild.bootiso.mono",
            StageOptions::GrubIso(_) => "org.osbuild.grub2.iso",
            StageOptions::Discinfo(_) => "org.osbuild.discinfo",
            StageOptions::Xorrisofs(_) => "org.osbuild.xorrisofs",
            StageOptions::Grub2(_) => "org.osbuild.grub2",
            StageOptions::Grub2Inst(_) => "org.osbuild.grub2.inst",
            StageOptions::ZiplInst(_) => "org.osbuild.zipl.inst",
            StageOptions::KernelCmdline(_) => "org.osbuild.kernel-cmdline",
            StageOptions::Qemu(_) => "org.osbuild.qemu",
            StageOptions::Copy(_) => "org.osbuild.copy",
            StageOptions::Sfdisk(_) => "org.osbuild.sfdisk",
            StageOptions::NginxConfig(_) => "org.osbuild.nginx.conf",
            StageOptions::Chmod(_) => "org.osbuild.chmod",
            StageOptions::OstreeConfig(_) => "org.osbuild.ostree.config",
            StageOptions::Mkdir(_) => "org.osbuild.mkdir",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::{
        Customizations, KernelCustomization, ServicesCustomization, UserCustomization,
    };
    use crate::disk::testdata::gpt_table;

    #[test]
    fn untagged_options_serialize_as_bare_payload() {
        let options = StageOptions::Anaconda(installer::anaconda_stage_options());
        let value = serde_json::to_value(&options).unwrap();
        assert!(value.get("kickstart-modules").is_some());
        assert_eq!(options.name(), "org.osbuild.anaconda");
    }

    #[test]
    fn one_customization_bundle_feeds_independent_generators() {
        let customizations = Customizations {
            users: Some(vec![UserCustomization {
                name: "admin".into(),
                key: Some("ssh-ed25519 AAAA".into()),
                ..Default::default()
            }]),
            services: Some(ServicesCustomization {
                enabled: Some(vec!["cockpit.socket".into()]),
                disabled: None,
            }),
            kernel: Some(KernelCustomization {
                name: None,
                append: "nosmt=force".into(),
            }),
            ..Default::default()
        };
        let table = gpt_table();

        let users = osconfig::users_stage_options(customizations.users.as_deref().unwrap_or(&[]))
            .unwrap();
        let first_boot = osconfig::users_first_boot_options(&users);
        let systemd = osconfig::systemd_stage_options(
            &["sshd.service".to_string()],
            &[],
            customizations.services.as_ref(),
            None,
        );
        let grub2 = bootloader::grub2_stage_options(
            &table,
            "ro",
            customizations.kernel.as_ref(),
            "5.14.0",
            &bootloader::BootFirmware::Legacy("i386-pc".into()),
        )
        .unwrap();

        assert!(users.users.contains_key("admin"));
        assert!(first_boot.commands[0].contains("/var/home/admin/.ssh"));
        assert_eq!(
            systemd.enabled_services,
            ["sshd.service", "cockpit.socket"]
        );
        assert_eq!(grub2.kernel_opts, "ro nosmt=force");
    }
}
