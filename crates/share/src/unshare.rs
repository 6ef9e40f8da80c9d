//! Removing mirrored entries from a share without losing content.

use std::fs;
use std::path::{Path, PathBuf};

use acl::{AccessControlList, AclBackend};
use tracing::{debug, error, warn};
use walk::{WalkBuilder, WalkOrder};

use crate::guard::{LinkCounter, RemovalCheck};
use crate::{Share, ShareError};

impl<A: AclBackend, L: LinkCounter> Share<A, L> {
    /// Un-shares the whole share tree and removes the share directory.
    ///
    /// Files whose only link lives in the share are kept unless `force` is
    /// set; they and the directories containing them stay in place and are
    /// listed in [`ShareError::Retained`] once everything else is gone. A
    /// locked share should be unlocked first, since the lock entry denies
    /// deletion.
    pub fn self_destruct(&self, force: bool) -> Result<(), ShareError> {
        debug!(target: "share::unshare", directory = %self.directory.display(), force, "self destructing");
        let ambient = self.permissions()?;
        self.unshare_tree(&self.directory, force, &ambient)
    }

    /// Removes the subtree at `root` bottom-up, un-sharing every file in it.
    pub(crate) fn unshare_tree(
        &self,
        root: &Path,
        force: bool,
        ambient: &AccessControlList,
    ) -> Result<(), ShareError> {
        debug!(target: "share::unshare", root = %root.display(), "un-sharing tree");
        let walker = WalkBuilder::new(root)
            .order(WalkOrder::PostOrder)
            .follow_symlinks(false)
            .build()?;

        let mut retained: Vec<PathBuf> = Vec::new();
        for entry in walker {
            let entry = entry?;
            let path = entry.full_path();

            if entry.is_dir() {
                if retained.iter().any(|kept| kept.starts_with(path)) {
                    debug!(target: "share::unshare", path = %path.display(), "keeping directory holding retained files");
                    continue;
                }
                fs::remove_dir(path)
                    .map_err(|error| ShareError::io("remove directory", path, error))?;
            } else if entry.is_file() {
                match self.unshare_file(path, force, ambient) {
                    Ok(()) => {}
                    Err(ShareError::WouldDestroyContent { path }) => retained.push(path),
                    Err(error) => return Err(error),
                }
            } else {
                fs::remove_file(path).map_err(|error| ShareError::io("remove", path, error))?;
            }
        }

        if retained.is_empty() {
            Ok(())
        } else {
            warn!(target: "share::unshare", count = retained.len(), "files kept because the share holds their only link");
            Err(ShareError::Retained { paths: retained })
        }
    }

    /// Drops the share's link at `target` after stripping the ambient
    /// permissions from the file's ACL.
    pub(crate) fn unshare_file(
        &self,
        target: &Path,
        force: bool,
        ambient: &AccessControlList,
    ) -> Result<(), ShareError> {
        let nlink = self
            .links
            .link_count(target)
            .map_err(|error| ShareError::io("count links of", target, error))?;

        if !RemovalCheck::evaluate(nlink, force).is_permitted() {
            error!(target: "share::unshare", path = %target.display(), "file has a single link; removing it would destroy its content");
            return Err(ShareError::WouldDestroyContent {
                path: target.to_path_buf(),
            });
        }

        let restored = AccessControlList::from_file(&self.acls, target)? - ambient;
        debug!(target: "share::unshare", path = %target.display(), nlink, acl = %restored.to_spec(), "un-sharing file");
        if !restored.is_empty() {
            restored.set(&self.acls, target)?;
        }

        fs::remove_file(target).map_err(|error| ShareError::io("remove", target, error))
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use test_support::{MemoryAcls, Scratch};

    use super::*;
    use crate::ShareBuilder;

    struct FixedLinks(u64);

    impl LinkCounter for FixedLinks {
        fn link_count(&self, _path: &Path) -> io::Result<u64> {
            Ok(self.0)
        }
    }

    fn share_with(scratch: &Scratch, links: u64) -> Share<MemoryAcls, FixedLinks> {
        let default: AccessControlList = "A::OWNER@:rwatTnNcCy".parse().expect("acl");
        ShareBuilder::new(scratch.path().join("share"))
            .acl_backend(MemoryAcls::new(default))
            .link_counter(FixedLinks(links))
            .open()
            .expect("open share")
    }

    #[test]
    fn single_link_without_force_is_refused() {
        let scratch = Scratch::new().expect("scratch");
        let share = share_with(&scratch, 1);
        let file = share.directory().join("only");
        fs::write(&file, b"content").expect("write");

        let error = share
            .unshare_file(&file, false, &AccessControlList::default())
            .expect_err("refused");

        assert!(matches!(error, ShareError::WouldDestroyContent { .. }));
        assert!(file.exists());
    }

    #[test]
    fn single_link_with_force_is_removed() {
        let scratch = Scratch::new().expect("scratch");
        let share = share_with(&scratch, 1);
        let file = share.directory().join("only");
        fs::write(&file, b"content").expect("write");

        share
            .unshare_file(&file, true, &AccessControlList::default())
            .expect("forced removal");

        assert!(!file.exists());
    }

    #[test]
    fn shared_link_is_removed_and_acl_restored() {
        let scratch = Scratch::new().expect("scratch");
        let share = share_with(&scratch, 2);
        let file = share.directory().join("linked");
        fs::write(&file, b"content").expect("write");

        let ambient: AccessControlList = "A::GROUP@:rtncy".parse().expect("acl");
        ambient
            .append(share.acl_backend(), &file, acl::Recursion::Single)
            .expect("append");

        share.unshare_file(&file, false, &ambient).expect("removal");

        assert!(!file.exists());
        let written = share.acl_backend().writes();
        assert!(written.contains(&file));
    }

    #[test]
    fn tree_keeps_directories_of_retained_files() {
        let scratch = Scratch::new().expect("scratch");
        let share = share_with(&scratch, 1);
        let nested = share.directory().join("tree/inner");
        fs::create_dir_all(&nested).expect("mkdir");
        fs::write(nested.join("last"), b"only copy").expect("write");
        fs::create_dir_all(share.directory().join("empty")).expect("mkdir");

        let error = share.self_destruct(false).expect_err("retained");

        match error {
            ShareError::Retained { paths } => assert_eq!(paths, vec![nested.join("last")]),
            other => panic!("unexpected error {other:?}"),
        }
        assert!(nested.join("last").exists());
        assert!(!share.directory().join("empty").exists());
    }

    #[test]
    fn symlinks_are_removed_without_following() {
        let scratch = Scratch::new().expect("scratch");
        let outside = scratch
            .write_file("outside/keep", b"keep")
            .expect("write");
        let share = share_with(&scratch, 2);
        let target = outside.parent().expect("parent");
        std::os::unix::fs::symlink(target, share.directory().join("link")).expect("symlink");

        share.self_destruct(false).expect("destroy");

        assert!(outside.exists());
        assert!(!share.directory().exists());
    }
}
