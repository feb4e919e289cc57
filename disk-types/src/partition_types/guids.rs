// SPDX-License-Identifier: GPL-3.0-only

// GPT partition type GUIDs. The SD_GPT name next to a constant is the type
// shown by systemd-gpt-auto-generator(8).
pub const BIOS_BOOT_PARTITION_GUID: &str = "21686148-6449-6E6F-744E-656564454649";
pub const FILESYSTEM_DATA_GUID: &str = "0FC63DAF-8483-4772-8E79-3D69D8477DE4"; // SD_GPT_LINUX_GENERIC
pub const EFI_SYSTEM_PARTITION_GUID: &str = "C12A7328-F81F-11D2-BA4B-00A0C93EC93B"; // SD_GPT_ESP
pub const LVM_PARTITION_GUID: &str = "E6D6D379-F507-44C2-A23C-238F2A3DF928";
pub const PREP_PARTITION_GUID: &str = "9E1A2D38-C612-4316-AA26-8B49521E5A8B";
pub const SWAP_PARTITION_GUID: &str = "0657FD6D-A4AB-43C4-84E5-0933C84B4F4F"; // SD_GPT_SWAP
pub const XBOOTLDR_PARTITION_GUID: &str = "BC13C2FF-59E6-4262-A352-B275FD6F7172"; // SD_GPT_XBOOTLDR

pub const ROOT_PARTITION_X86_64_GUID: &str = "4F68BCE3-E8CD-4DB1-96E7-FBCAF984B709"; // SD_GPT_ROOT_X86_64
pub const ROOT_PARTITION_AARCH64_GUID: &str = "B921B045-1DF0-41C3-AF44-4C6F280D3FAE"; // SD_GPT_ROOT_ARM64
pub const ROOT_PARTITION_PPC64LE_GUID: &str = "C31C45E6-3F39-412E-80FB-4809C4980599"; // SD_GPT_ROOT_PPC64_LE
pub const ROOT_PARTITION_S390X_GUID: &str = "5EEAD9A9-FE09-4A1E-A1D7-520D00531306"; // SD_GPT_ROOT_S390X

pub const USR_PARTITION_X86_64_GUID: &str = "8484680C-9521-48C6-9C11-B0720656F69E"; // SD_GPT_USR_X86_64
pub const USR_PARTITION_AARCH64_GUID: &str = "B0E01050-EE5F-4390-949A-9101B17104E9"; // SD_GPT_USR_ARM64
pub const USR_PARTITION_PPC64LE_GUID: &str = "15BB03AF-77E7-4D4A-B12B-C0D084F7491C"; // SD_GPT_USR_PPC64_LE
pub const USR_PARTITION_S390X_GUID: &str = "8A4F5770-50AA-4ED3-874A-99B710DB6FEA"; // SD_GPT_USR_S390X

// DOS partition type bytes

/// BIOS boot on dos is the 'empty' type
pub const BIOS_BOOT_PARTITION_DOS_ID: &str = "00";
pub const FILESYSTEM_LINUX_DOS_ID: &str = "83";
pub const FAT16B_DOS_ID: &str = "06";
pub const LVM_PARTITION_DOS_ID: &str = "8e";
pub const EFI_SYSTEM_PARTITION_DOS_ID: &str = "ef";
pub const SWAP_PARTITION_DOS_ID: &str = "82";
pub const PREP_PARTITION_DOS_ID: &str = "41";

// Well-known identifiers used by templates

pub const BIOS_BOOT_PARTITION_UUID: &str = "FAC7F1FB-3E8D-4137-A512-961DE09A5549";
pub const ROOT_PARTITION_UUID: &str = "6264D520-3FB9-423F-8AB8-7A0A8E3D3562";
pub const DATA_PARTITION_UUID: &str = "CB07C243-BC44-4717-853E-28852021225B";
pub const EFI_SYSTEM_PARTITION_UUID: &str = "68B2905B-DF3E-4FB3-80FA-49D1E773AA33";

/// Volume ID of the EFI system filesystem
pub const EFI_FILESYSTEM_UUID: &str = "7B77-95E7";

pub const ESP_FSTAB_OPTIONS: &str = "defaults,uid=0,gid=0,umask=077,shortname=winnt";
