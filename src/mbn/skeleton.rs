//! Bone forest built from decoded records.

use std::collections::HashMap;

use tracing::warn;

use super::BoneRecord;
use crate::util::{ContentHash, Error, Mat4, Result};

/// Bones linked by parent hash.
///
/// Records keep the order they were given in (archive order). A parent hash
/// that names no record makes its bone a root; such bones are listed by
/// [`unresolved_parents`](Self::unresolved_parents).
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    bones: Vec<BoneRecord>,
    parents: Vec<Option<usize>>,
    by_hash: HashMap<ContentHash, usize>,
    unresolved: Vec<usize>,
}

impl Skeleton {
    /// Link records into a forest. Duplicate bone hashes and parent cycles
    /// are format errors.
    pub fn new(bones: Vec<BoneRecord>) -> Result<Self> {
        let mut by_hash = HashMap::with_capacity(bones.len());
        for (i, bone) in bones.iter().enumerate() {
            if by_hash.insert(bone.hash, i).is_some() {
                return Err(Error::invalid(format!("bone hash {} appears twice", bone.hash)));
            }
        }

        let mut unresolved = Vec::new();
        let parents: Vec<Option<usize>> = bones
            .iter()
            .enumerate()
            .map(|(i, bone)| {
                if bone.parent.is_none() {
                    return None;
                }
                let parent = by_hash.get(&bone.parent).copied();
                if parent.is_none() {
                    warn!("bone {} has unknown parent {}; treating as root", bone.hash, bone.parent);
                    unresolved.push(i);
                }
                parent
            })
            .collect();

        // Any chain longer than the bone count revisits a bone
        for start in 0..bones.len() {
            let mut current = parents[start];
            let mut steps = 0;
            while let Some(p) = current {
                steps += 1;
                if steps > bones.len() {
                    return Err(Error::invalid(format!(
                        "bone {} is part of a parent cycle",
                        bones[start].hash
                    )));
                }
                current = parents[p];
            }
        }

        Ok(Self {
            bones,
            parents,
            by_hash,
            unresolved,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn bones(&self) -> &[BoneRecord] {
        &self.bones
    }

    pub fn index_of(&self, hash: ContentHash) -> Option<usize> {
        self.by_hash.get(&hash).copied()
    }

    pub fn get(&self, hash: ContentHash) -> Option<&BoneRecord> {
        self.index_of(hash).map(|i| &self.bones[i])
    }

    /// Parent index, `None` for roots.
    pub fn parent(&self, index: usize) -> Option<usize> {
        self.parents.get(index).copied().flatten()
    }

    /// Bones whose parent hash names no record.
    pub fn unresolved_parents(&self) -> &[usize] {
        &self.unresolved
    }

    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).filter(|&i| self.parents[i].is_none())
    }

    pub fn children(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).filter(move |&i| self.parents[i] == Some(index))
    }

    /// Parent chain from the direct parent up to the root.
    pub fn ancestors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.parent(index), |&i| self.parent(i))
    }

    /// Number of ancestors; 0 for roots.
    pub fn depth(&self, index: usize) -> usize {
        self.ancestors(index).count()
    }

    /// Indices ordered so every parent precedes its children.
    pub fn topological_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by_key(|&i| self.depth(i));
        order
    }

    /// Model-space matrix of a bone, `None` when the index is out of range.
    pub fn world_matrix(&self, index: usize) -> Option<Mat4> {
        let local = self.bones.get(index)?.transform().to_matrix();
        Some(match self.parent(index) {
            Some(parent) => self.world_matrix(parent)? * local,
            None => local,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::{hash_name, Transform, Vec3};

    fn bone(name: &str, parent: Option<&str>) -> BoneRecord {
        BoneRecord::from_named(name, parent, Transform::IDENTITY)
    }

    #[test]
    fn test_forest() {
        let skeleton = Skeleton::new(vec![
            bone("spine", Some("pelvis")),
            bone("pelvis", None),
            bone("head", Some("spine")),
            bone("prop", None),
        ])
        .unwrap();

        assert_eq!(skeleton.roots().collect::<Vec<_>>(), [1, 3]);
        assert_eq!(skeleton.parent(0), Some(1));
        assert_eq!(skeleton.ancestors(2).collect::<Vec<_>>(), [0, 1]);
        assert_eq!(skeleton.depth(2), 2);
        assert_eq!(skeleton.children(1).collect::<Vec<_>>(), [0]);
        assert_eq!(skeleton.index_of(hash_name("head")), Some(2));
        assert!(skeleton.unresolved_parents().is_empty());

        let order = skeleton.topological_order();
        let pos = |i: usize| order.iter().position(|&o| o == i).unwrap();
        assert!(pos(1) < pos(0) && pos(0) < pos(2));
    }

    #[test]
    fn test_cycle_rejected() {
        let err = Skeleton::new(vec![bone("a", Some("b")), bone("b", Some("a"))]).unwrap_err();
        assert!(err.is_format_error());

        let err = Skeleton::new(vec![bone("self", Some("self"))]).unwrap_err();
        assert!(err.is_format_error());
    }

    #[test]
    fn test_duplicate_hash() {
        assert!(Skeleton::new(vec![bone("a", None), bone("a", None)]).is_err());
    }

    #[test]
    fn test_unknown_parent_is_root() {
        let skeleton = Skeleton::new(vec![bone("arm", Some("missing"))]).unwrap();
        assert_eq!(skeleton.parent(0), None);
        assert_eq!(skeleton.unresolved_parents(), [0]);
    }

    #[test]
    fn test_world_matrix() {
        let root = BoneRecord::from_named(
            "root",
            None,
            Transform::new(Vec3::new(0.0, 1.0, 0.0), Default::default(), Vec3::ONE),
        );
        let child = BoneRecord::from_named(
            "child",
            Some("root"),
            Transform::new(Vec3::new(0.0, 2.0, 0.0), Default::default(), Vec3::ONE),
        );
        let skeleton = Skeleton::new(vec![root, child]).unwrap();
        let p = skeleton.world_matrix(1).unwrap().transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(0.0, 3.0, 0.0)).length() < 1e-6);
        assert!(skeleton.world_matrix(2).is_none());
    }
}
