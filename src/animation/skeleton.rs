//! Skeletal bone hierarchy and validation

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::bone::Bone;
use crate::core::error::Error;
use crate::core::types::Result;

/// A skeleton shared between its owner, animations and transformers.
///
/// Structural edits take the write lock; per-frame evaluation only reads.
pub type SharedSkeleton = Arc<RwLock<Skeleton>>;

/// Stable handle of a bone inside one [`Skeleton`].
///
/// Handles survive replacement via [`Skeleton::set_bone`]; a removed bone's
/// handle is never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoneId(pub u32);

impl BoneId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
struct BoneSlot {
    name: String,
    bone: Bone,
}

/// Resolved hierarchy, present only while the skeleton is valid.
#[derive(Clone, Debug)]
struct Hierarchy {
    parents: Vec<Option<BoneId>>,
    depths: Vec<usize>,
    render_order: Vec<BoneId>,
}

/// A named collection of bones with a validated evaluation order.
#[derive(Clone, Debug, Default)]
pub struct Skeleton {
    slots: Vec<Option<BoneSlot>>,
    bone_names: HashMap<String, BoneId>,
    version: u64,
    hierarchy: Option<Hierarchy>,
}

impl Skeleton {
    /// Create an empty skeleton
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap into a [`SharedSkeleton`].
    pub fn into_shared(self) -> SharedSkeleton {
        Arc::new(RwLock::new(self))
    }

    /// Insert or replace a bone. Invalidates the skeleton.
    pub fn set_bone(&mut self, name: impl Into<String>, bone: Bone) -> BoneId {
        let name = name.into();
        let id = match self.bone_names.get(&name) {
            Some(&id) => {
                if let Some(slot) = self.slots[id.index()].as_mut() {
                    slot.bone = bone;
                }
                id
            }
            None => {
                let id = BoneId(self.slots.len() as u32);
                self.slots.push(Some(BoneSlot {
                    name: name.clone(),
                    bone,
                }));
                self.bone_names.insert(name, id);
                id
            }
        };
        self.invalidate();
        id
    }

    /// Insert a bone under a name that must not exist yet. Invalidates the skeleton.
    pub fn add_bone(&mut self, name: impl Into<String>, bone: Bone) -> Result<BoneId> {
        let name = name.into();
        if self.bone_names.contains_key(&name) {
            return Err(Error::DuplicateBone(name));
        }
        Ok(self.set_bone(name, bone))
    }

    /// Remove a bone. Children keep their parent reference and will fail
    /// validation until re-parented.
    pub fn remove_bone(&mut self, name: &str) -> Result<Bone> {
        let id = self
            .bone_names
            .remove(name)
            .ok_or_else(|| Error::UnknownBone(name.to_owned()))?;
        let slot = self.slots[id.index()]
            .take()
            .ok_or_else(|| Error::UnknownBone(name.to_owned()))?;
        self.invalidate();
        Ok(slot.bone)
    }

    /// Get a bone by name.
    pub fn get_bone(&self, name: &str) -> Result<&Bone> {
        self.find_bone(name)
            .and_then(|id| self.bone(id))
            .ok_or_else(|| Error::UnknownBone(name.to_owned()))
    }

    /// Find a bone handle by name.
    pub fn find_bone(&self, name: &str) -> Option<BoneId> {
        self.bone_names.get(name).copied()
    }

    /// Get a bone by handle.
    pub fn bone(&self, id: BoneId) -> Option<&Bone> {
        self.slot(id).map(|slot| &slot.bone)
    }

    /// Name of the bone behind a handle.
    pub fn bone_name(&self, id: BoneId) -> Option<&str> {
        self.slot(id).map(|slot| slot.name.as_str())
    }

    /// Get the number of bones in the skeleton.
    pub fn bone_count(&self) -> usize {
        self.bone_names.len()
    }

    /// Upper bound (exclusive) of [`BoneId::index`] for this skeleton.
    pub fn id_capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bone_names.contains_key(name)
    }

    /// Bumped by every structural mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_valid(&self) -> bool {
        self.hierarchy.is_some()
    }

    /// Names of `name` and all of its descendants (breadth-first), or every
    /// bone name (insertion order) when `name` is `None`.
    pub fn bone_list(&self, name: Option<&str>) -> Result<Vec<String>> {
        let Some(name) = name else {
            return Ok(self.live_slots().map(|(_, slot)| slot.name.clone()).collect());
        };

        let start = self
            .find_bone(name)
            .ok_or_else(|| Error::UnknownBone(name.to_owned()))?;

        let children = self.child_map();
        let mut visited = vec![false; self.slots.len()];
        visited[start.index()] = true;
        let mut queue = vec![start];
        let mut i = 0;
        while i < queue.len() {
            let current = queue[i];
            for &child in children.get(&current).map(Vec::as_slice).unwrap_or(&[]) {
                if !visited[child.index()] {
                    visited[child.index()] = true;
                    queue.push(child);
                }
            }
            i += 1;
        }

        Ok(queue
            .into_iter()
            .filter_map(|id| self.bone_name(id).map(str::to_owned))
            .collect())
    }

    /// Direct children of a bone, by parent name (works on unvalidated skeletons).
    pub fn children(&self, id: BoneId) -> Vec<BoneId> {
        self.child_map().remove(&id).unwrap_or_default()
    }

    /// Check the hierarchy and compute the evaluation order.
    ///
    /// Fails on a missing parent or a cycle and leaves the skeleton invalid.
    /// On success bones are ordered by depth, then layer, then name, so every
    /// parent precedes its children.
    pub fn validate(&mut self) -> Result<()> {
        self.hierarchy = None;
        match self.resolve_hierarchy() {
            Ok(hierarchy) => {
                log::debug!(
                    "Skeleton validated: {} bones, version {}",
                    hierarchy.render_order.len(),
                    self.version
                );
                self.hierarchy = Some(hierarchy);
                Ok(())
            }
            Err(e) => {
                log::warn!("Skeleton validation failed: {}", e);
                Err(e)
            }
        }
    }

    /// Evaluation order, parents first. `None` while invalid.
    pub fn render_order(&self) -> Option<&[BoneId]> {
        self.hierarchy.as_ref().map(|h| h.render_order.as_slice())
    }

    /// Evaluation order as names. Empty while invalid.
    pub fn render_order_names(&self) -> Vec<String> {
        self.render_order()
            .unwrap_or(&[])
            .iter()
            .filter_map(|&id| self.bone_name(id).map(str::to_owned))
            .collect()
    }

    /// Resolved parent handle. `None` for roots or while invalid.
    pub fn parent_id(&self, id: BoneId) -> Option<BoneId> {
        self.hierarchy
            .as_ref()
            .and_then(|h| h.parents.get(id.index()).copied().flatten())
    }

    /// Depth below the root set (roots are 0). `None` while invalid.
    pub fn depth(&self, id: BoneId) -> Option<usize> {
        self.hierarchy
            .as_ref()
            .and_then(|h| h.depths.get(id.index()).copied())
    }

    fn slot(&self, id: BoneId) -> Option<&BoneSlot> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    fn live_slots(&self) -> impl Iterator<Item = (BoneId, &BoneSlot)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|s| (BoneId(idx as u32), s)))
    }

    fn invalidate(&mut self) {
        self.version += 1;
        self.hierarchy = None;
    }

    fn child_map(&self) -> HashMap<BoneId, Vec<BoneId>> {
        let mut children: HashMap<BoneId, Vec<BoneId>> = HashMap::new();
        for (id, slot) in self.live_slots() {
            if let Some(parent) = slot.bone.parent.as_deref().and_then(|p| self.find_bone(p)) {
                children.entry(parent).or_default().push(id);
            }
        }
        children
    }

    fn order_key<'a>(&'a self, id: BoneId, depths: &[Option<usize>]) -> (Option<usize>, i32, &'a str) {
        let (layer, name) = self
            .slot(id)
            .map(|slot| (slot.bone.layer, slot.name.as_str()))
            .unwrap_or((0, ""));
        (depths[id.index()], layer, name)
    }

    fn resolve_hierarchy(&self) -> Result<Hierarchy> {
        let n = self.slots.len();

        // Resolve parent names
        let mut parents = vec![None; n];
        for (id, slot) in self.live_slots() {
            if let Some(parent_name) = &slot.bone.parent {
                let parent = self.find_bone(parent_name).ok_or_else(|| Error::MissingParent {
                    bone: slot.name.clone(),
                    parent: parent_name.clone(),
                })?;
                parents[id.index()] = Some(parent);
            }
        }

        // Walk each parent chain once, memoizing depths
        let mut depths: Vec<Option<usize>> = vec![None; n];
        let mut on_path = vec![false; n];
        let mut path = Vec::new();
        for (start, _) in self.live_slots() {
            path.clear();
            let mut current = Some(start);
            let mut depth = 0;
            while let Some(id) = current {
                if let Some(known) = depths[id.index()] {
                    depth = known + 1;
                    break;
                }
                if on_path[id.index()] {
                    return Err(Error::Cycle {
                        bone: self.bone_name(id).unwrap_or_default().to_owned(),
                    });
                }
                on_path[id.index()] = true;
                path.push(id);
                current = parents[id.index()];
            }
            for &id in path.iter().rev() {
                depths[id.index()] = Some(depth);
                on_path[id.index()] = false;
                depth += 1;
            }
        }

        let mut render_order: Vec<BoneId> = self.live_slots().map(|(id, _)| id).collect();
        render_order.sort_by(|&a, &b| {
            self.order_key(a, &depths).cmp(&self.order_key(b, &depths))
        });

        Ok(Hierarchy {
            parents,
            depths: depths.into_iter().map(Option::unwrap_or_default).collect(),
            render_order,
        })
    }
}
