//! Blueprint customizations: the declarative OS configuration a build
//! request carries.
//!
//! These records arrive from request validation upstream; the generators
//! project them into engine stage options without normalizing them further.

use serde::{Deserialize, Serialize};

/// One user to provision in the image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCustomization {
    pub name: String,
    /// Either plaintext (hashed during generation) or an already crypted
    /// string, which passes through untouched.
    pub password: Option<String>,
    /// SSH public key, injected via the first-boot script.
    pub key: Option<String>,
    pub description: Option<String>,
    pub home: Option<String>,
    pub shell: Option<String>,
    pub groups: Option<Vec<String>>,
    pub uid: Option<i64>,
    pub gid: Option<i64>,
}

/// One group to provision in the image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCustomization {
    pub name: String,
    pub gid: Option<i64>,
}

/// Firewall services to toggle, by service name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallServicesCustomization {
    pub enabled: Option<Vec<String>>,
    pub disabled: Option<Vec<String>>,
}

/// Firewall configuration: open ports plus service toggles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallCustomization {
    /// Entries like "8080:tcp" or a bare port/range.
    pub ports: Option<Vec<String>>,
    pub services: Option<FirewallServicesCustomization>,
}

/// Systemd units to enable or disable beyond the image-type baseline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicesCustomization {
    pub enabled: Option<Vec<String>>,
    pub disabled: Option<Vec<String>>,
}

/// Kernel selection and command-line additions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelCustomization {
    pub name: Option<String>,
    /// Extra kernel command-line options, appended verbatim.
    pub append: String,
}

/// The customization bundle of one build request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customizations {
    pub users: Option<Vec<UserCustomization>>,
    pub groups: Option<Vec<GroupCustomization>>,
    pub firewall: Option<FirewallCustomization>,
    pub services: Option<ServicesCustomization>,
    pub kernel: Option<KernelCustomization>,
}
