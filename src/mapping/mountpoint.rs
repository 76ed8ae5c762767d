//! Synthetic mount directories for source mountpoints on the target.
//!
//! Names are derived with BLAKE3 in key-derivation mode under a fixed context
//! string, so the same source path yields the same directory in every process.
//! Changing [`MOUNTPOINT_HASH_CONTEXT`] changes every derived name.

use crate::constants::TARGET_MOUNT_ROOT;

/// Key-derivation context; versioned so a future naming scheme cannot collide
pub const MOUNTPOINT_HASH_CONTEXT: &str = "migrator-core-rs 2024-06-01 target mountpoint v1";

/// Hex characters kept from the derived hash (128 bits)
const HASH_HEX_LEN: usize = 32;

/// Target mount directory for a source mountpoint.
///
/// Returns an empty string for devices without a mountpoint and for swap.
pub fn target_mountpoint(source_mountpoint: Option<&str>, is_swap: bool) -> String {
    match source_mountpoint {
        Some(mountpoint) if !is_swap && !mountpoint.is_empty() && mountpoint != "[SWAP]" => {
            format!("{TARGET_MOUNT_ROOT}/{}", mountpoint_hash(mountpoint))
        }
        _ => String::new(),
    }
}

fn mountpoint_hash(mountpoint: &str) -> String {
    let derived = blake3::derive_key(MOUNTPOINT_HASH_CONTEXT, mountpoint.as_bytes());
    let mut hex = String::with_capacity(HASH_HEX_LEN);
    for byte in &derived[..HASH_HEX_LEN / 2] {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_mountpoint_is_stable_and_distinct() {
        let root = target_mountpoint(Some("/"), false);
        assert!(root.starts_with("/mnt/"));
        assert_eq!(root.len(), "/mnt/".len() + HASH_HEX_LEN);
        assert_eq!(root, target_mountpoint(Some("/"), false));
        assert_ne!(root, target_mountpoint(Some("/boot"), false));
        assert!(root["/mnt/".len()..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_swap_and_missing_mountpoints_map_to_empty() {
        assert_eq!(target_mountpoint(None, false), "");
        assert_eq!(target_mountpoint(Some(""), false), "");
        assert_eq!(target_mountpoint(Some("[SWAP]"), false), "");
        assert_eq!(target_mountpoint(Some("/data"), true), "");
    }
}
