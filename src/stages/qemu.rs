//! Disk-image format conversion stage: raw image to a distributable format.

use serde::Serialize;

use crate::error::{Result, StageError};

/// Target format of the conversion. Only qcow2 carries an extra parameter,
/// the compatibility version understood by older hypervisors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum QemuFormatOptions {
    Qcow2 { compat: String },
    Vpc,
    Vmdk,
}

/// Options for the qemu image-conversion stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QemuStageOptions {
    pub filename: String,
    pub format: QemuFormatOptions,
}

/// Options for converting the raw image into `format`.
///
/// The format identifier comes from the static image-type catalog; an
/// unknown one is a catalog defect and fails fatally.
pub fn qemu_stage_options(filename: &str, format: &str, compat: &str) -> Result<QemuStageOptions> {
    let format = match format {
        "qcow2" => QemuFormatOptions::Qcow2 {
            compat: compat.to_string(),
        },
        "vpc" => QemuFormatOptions::Vpc,
        "vmdk" => QemuFormatOptions::Vmdk,
        other => {
            return Err(StageError::invariant(format!(
                "unknown image format '{other}' in the qemu stage"
            )))
        }
    };

    Ok(QemuStageOptions {
        filename: filename.to_string(),
        format,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qcow2_carries_compat() {
        let options = qemu_stage_options("disk.qcow2", "qcow2", "0.10").unwrap();
        let value = serde_json::to_value(&options).unwrap();
        assert_eq!(value["format"]["type"].as_str(), Some("qcow2"));
        assert_eq!(value["format"]["compat"].as_str(), Some("0.10"));
    }

    #[test]
    fn vpc_and_vmdk_carry_only_the_type_tag() {
        for format in ["vpc", "vmdk"] {
            let options = qemu_stage_options("disk.img", format, "").unwrap();
            let value = serde_json::to_value(&options).unwrap();
            assert_eq!(value["format"]["type"].as_str(), Some(format));
            assert_eq!(value["format"].as_object().unwrap().len(), 1);
        }
    }

    #[test]
    fn unknown_format_is_fatal() {
        let err = qemu_stage_options("disk.img", "vdi", "").unwrap_err();
        assert!(err.is_fatal());
    }
}
