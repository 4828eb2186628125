//! OS configuration stages: package verification keys, SELinux relabeling,
//! user/group provisioning, the first-boot SSH-key workaround, firewall and
//! systemd service enablement.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::blueprint::{
    FirewallCustomization, GroupCustomization, ServicesCustomization, UserCustomization,
};
use crate::crypt::{crypt_sha512, password_is_crypted};
use crate::error::Result;

/// Options for the rpm stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RpmStageOptions {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub gpgkeys: Vec<String>,
}

/// Collect the GPG keys of the build's package repositories. Repositories
/// without a key contribute nothing.
pub fn rpm_stage_options(repo_gpg_keys: &[String]) -> RpmStageOptions {
    RpmStageOptions {
        gpgkeys: repo_gpg_keys
            .iter()
            .filter(|key| !key.is_empty())
            .cloned()
            .collect(),
    }
}

/// Options for the selinux relabel stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelinuxStageOptions {
    pub file_contexts: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

/// Options for relabeling the tree with the targeted policy.
///
/// `label_install_tools` relabels the cp and tar binaries with
/// `install_exec_t`; set it for the build root, where those binaries write
/// the image's files.
pub fn selinux_stage_options(label_install_tools: bool) -> SelinuxStageOptions {
    let mut labels = BTreeMap::new();
    if label_install_tools {
        labels.insert(
            "/usr/bin/cp".to_string(),
            "system_u:object_r:install_exec_t:s0".to_string(),
        );
        labels.insert(
            "/usr/bin/tar".to_string(),
            "system_u:object_r:install_exec_t:s0".to_string(),
        );
    }
    SelinuxStageOptions {
        file_contexts: "etc/selinux/targeted/contexts/files/file_contexts".to_string(),
        labels,
    }
}

/// One user record of the users stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gid: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// Options for the users stage, keyed by user name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UsersStageOptions {
    pub users: BTreeMap<String, User>,
}

/// Project blueprint users into the users stage.
///
/// Passwords that are not already in crypted form are hashed here; plaintext
/// never reaches the output record. An uncryptable password is a recoverable
/// request error.
pub fn users_stage_options(users: &[UserCustomization]) -> Result<UsersStageOptions> {
    let mut options = UsersStageOptions::default();

    for customization in users {
        let password = match customization.password.as_deref() {
            Some(password) if !password_is_crypted(password) => {
                debug!(user = %customization.name, "hashing plaintext password");
                Some(crypt_sha512(&customization.name, password)?)
            }
            other => other.map(str::to_string),
        };

        options.users.insert(
            customization.name.clone(),
            User {
                uid: customization.uid,
                gid: customization.gid,
                groups: customization.groups.clone(),
                description: customization.description.clone(),
                home: customization.home.clone(),
                shell: customization.shell.clone(),
                password,
                key: customization.key.clone(),
            },
        );
    }

    Ok(options)
}

/// Options for the first-boot command stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirstBootStageOptions {
    pub commands: Vec<String>,
    pub wait_for_network: bool,
}

/// First-boot script injecting SSH keys into each user's authorized_keys.
///
/// The declarative users stage cannot create authorized_keys itself, so for
/// every user carrying a public key this emits mkdir/append/chown commands
/// under /var/home, followed by one security-context relabel of the whole
/// tree.
pub fn users_first_boot_options(users_options: &UsersStageOptions) -> FirstBootStageOptions {
    let mut commands = Vec::with_capacity(3 * users_options.users.len() + 1);
    for (name, user) in &users_options.users {
        if let Some(key) = user.key.as_deref() {
            let ssh_dir = format!("/var/home/{name}/.ssh");
            commands.push(format!("mkdir -p {ssh_dir}"));
            commands.push(format!(
                "sh -c 'echo {key:?} >> \"{ssh_dir}/authorized_keys\"'"
            ));
            commands.push(format!("chown {name}:{name} -Rc {ssh_dir}"));
        }
    }
    commands.push("restorecon -rvF /var/home".to_string());

    FirstBootStageOptions {
        commands,
        wait_for_network: false,
    }
}

/// One group record of the groups stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gid: Option<i64>,
}

/// Options for the groups stage, keyed by group name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupsStageOptions {
    pub groups: BTreeMap<String, Group>,
}

pub fn groups_stage_options(groups: &[GroupCustomization]) -> GroupsStageOptions {
    let mut options = GroupsStageOptions::default();
    for group in groups {
        options.groups.insert(
            group.name.clone(),
            Group {
                name: group.name.clone(),
                gid: group.gid,
            },
        );
    }
    options
}

/// Options for the firewall stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FirewallStageOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ports: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled_services: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled_services: Option<Vec<String>>,
}

pub fn firewall_stage_options(firewall: &FirewallCustomization) -> FirewallStageOptions {
    let mut options = FirewallStageOptions {
        ports: firewall.ports.clone(),
        ..Default::default()
    };
    if let Some(services) = firewall.services.as_ref() {
        options.enabled_services = services.enabled.clone();
        options.disabled_services = services.disabled.clone();
    }
    options
}

/// Options for the systemd stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SystemdStageOptions {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enabled_services: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub disabled_services: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_target: Option<String>,
}

/// Merge the image type's baseline service lists with the blueprint's.
/// Blueprint entries come after the baseline.
pub fn systemd_stage_options(
    enabled_services: &[String],
    disabled_services: &[String],
    services: Option<&ServicesCustomization>,
    default_target: Option<&str>,
) -> SystemdStageOptions {
    let mut enabled = enabled_services.to_vec();
    let mut disabled = disabled_services.to_vec();
    if let Some(services) = services {
        enabled.extend(services.enabled.iter().flatten().cloned());
        disabled.extend(services.disabled.iter().flatten().cloned());
    }
    SystemdStageOptions {
        enabled_services: enabled,
        disabled_services: disabled,
        default_target: default_target.map(str::to_string),
    }
}
