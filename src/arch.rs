//! Architecture names and the firmware tables keyed on them.

use crate::error::{Result, StageError};

pub const ARCH_X86_64: &str = "x86_64";
pub const ARCH_AARCH64: &str = "aarch64";
pub const ARCH_PPC64LE: &str = "ppc64le";
pub const ARCH_S390X: &str = "s390x";

/// EFI architecture tokens for the bootable-ISO stages.
///
/// Only the two EFI-bootable ISO architectures have entries; anything else is
/// a catalog defect and generation aborts.
pub fn efi_architectures(arch: &str) -> Result<Vec<String>> {
    match arch {
        ARCH_X86_64 => Ok(vec!["IA32".into(), "X64".into()]),
        ARCH_AARCH64 => Ok(vec!["AA64".into()]),
        _ => Err(StageError::invariant(format!(
            "unsupported architecture '{arch}' for EFI bootable ISO"
        ))),
    }
}

/// Branch-call-jump filter for xz squashfs compression, where the
/// architecture has one. Improves compression of native machine code.
pub fn bcj_filter(arch: &str) -> Option<&'static str> {
    match arch {
        ARCH_X86_64 => Some("x86"),
        ARCH_AARCH64 => Some("arm"),
        ARCH_PPC64LE => Some("powerpc"),
        _ => None,
    }
}

/// Whether the hybrid installer ISO carries the legacy ISOLINUX loader.
pub fn supports_isolinux(arch: &str) -> bool {
    arch == ARCH_X86_64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x86_64_has_two_efi_tokens() {
        assert_eq!(efi_architectures(ARCH_X86_64).unwrap(), ["IA32", "X64"]);
    }

    #[test]
    fn aarch64_has_one_efi_token() {
        assert_eq!(efi_architectures(ARCH_AARCH64).unwrap(), ["AA64"]);
    }

    #[test]
    fn other_arches_are_fatal_for_efi() {
        let err = efi_architectures(ARCH_S390X).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn isolinux_only_on_x86_64() {
        assert!(supports_isolinux(ARCH_X86_64));
        assert!(!supports_isolinux(ARCH_AARCH64));
    }

    #[test]
    fn bcj_filter_table() {
        assert_eq!(bcj_filter(ARCH_X86_64), Some("x86"));
        assert_eq!(bcj_filter(ARCH_AARCH64), Some("arm"));
        assert_eq!(bcj_filter(ARCH_S390X), None);
    }
}
