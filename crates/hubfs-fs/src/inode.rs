//! Stable inode derivation.
//!
//! The remote tree has no numeric identifiers, so every inode is derived
//! from the parent inode and the entry name with a well-distributed hash.
//! The same `(parent, name)` pair maps to the same inode for the life of a
//! mount, which is all the kernel's entry cache requires; nothing is
//! allocated and nothing has to be remembered. Collisions among siblings
//! are possible in principle but vanishingly rare at 64 bits, and the
//! kernel recovers from them by invalidating cached entries.

/// Inode of the filesystem root, fixed by the FUSE protocol.
pub const ROOT_INODE: u64 = 1;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

const fn fnv1a_step(hash: u64, byte: u8) -> u64 {
    (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
}

/// Derives the inode for the entry `name` under `parent`.
///
/// FNV-1a over the little-endian parent inode followed by the name bytes.
/// Pure and deterministic. The reserved values `0` (protocol-invalid) and
/// [`ROOT_INODE`] are never returned: while the digest lands on one, an
/// extra byte is folded into the state and the digest retaken.
#[must_use]
pub fn derive_inode(parent: u64, name: &str) -> u64 {
    let mut hash = FNV_OFFSET;
    for byte in parent.to_le_bytes() {
        hash = fnv1a_step(hash, byte);
    }
    for &byte in name.as_bytes() {
        hash = fnv1a_step(hash, byte);
    }
    while hash == 0 || hash == ROOT_INODE {
        hash = fnv1a_step(hash, b'x');
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_derivation_is_deterministic() {
        assert_eq!(
            derive_inode(ROOT_INODE, "README.md"),
            derive_inode(ROOT_INODE, "README.md")
        );
        assert_eq!(derive_inode(99, "src"), derive_inode(99, "src"));
    }

    #[test]
    fn test_name_changes_the_inode() {
        assert_ne!(
            derive_inode(ROOT_INODE, "README.md"),
            derive_inode(ROOT_INODE, "README.me")
        );
        assert_ne!(derive_inode(ROOT_INODE, "a"), derive_inode(ROOT_INODE, "b"));
    }

    #[test]
    fn test_parent_changes_the_inode() {
        assert_ne!(derive_inode(2, "main.rs"), derive_inode(3, "main.rs"));
    }

    #[test]
    fn test_no_collisions_among_many_siblings() {
        let inodes: HashSet<u64> = (0..1000)
            .map(|i| derive_inode(ROOT_INODE, &format!("entry-{i}")))
            .collect();
        assert_eq!(inodes.len(), 1000);
    }

    #[test]
    fn test_reserved_values_never_produced() {
        for i in 0..1000 {
            let ino = derive_inode(ROOT_INODE, &format!("entry-{i}"));
            assert_ne!(ino, 0);
            assert_ne!(ino, ROOT_INODE);
        }
        // Deep parents as well as the root.
        for parent in [2u64, 1 << 20, u64::MAX] {
            let ino = derive_inode(parent, "x");
            assert_ne!(ino, 0);
            assert_ne!(ino, ROOT_INODE);
        }
    }

    #[test]
    fn test_empty_name_is_valid_input() {
        let ino = derive_inode(ROOT_INODE, "");
        assert_ne!(ino, 0);
        assert_ne!(ino, ROOT_INODE);
    }
}
