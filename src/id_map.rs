//! Bidirectional name <-> id index.
//!
//! Both directions are unique: a name maps to at most one id and an id to at
//! most one name. The two underlying maps are only mutated in pairs, so the
//! index can never be observed in a half-updated state.

use std::collections::HashMap;

/// A pair that could not be inserted because one side is already bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    /// The name is already bound to `id`.
    Name { id: i32 },
    /// The id is already bound to `name`.
    Id { name: String },
}

/// Name <-> id mapping with O(1) lookup in either direction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdMap {
    by_name: HashMap<String, i32>,
    by_id: HashMap<i32, String>,
}

impl IdMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Binds `name` to `id`.
    ///
    /// # Errors
    ///
    /// Fails without touching the index if either side is already bound.
    pub fn insert(&mut self, name: impl Into<String>, id: i32) -> Result<(), Conflict> {
        let name = name.into();
        if let Some(&bound) = self.by_name.get(&name) {
            return Err(Conflict::Name { id: bound });
        }
        if let Some(bound) = self.by_id.get(&id) {
            return Err(Conflict::Id {
                name: bound.clone(),
            });
        }
        self.by_id.insert(id, name.clone());
        self.by_name.insert(name, id);
        Ok(())
    }

    pub fn id_of(&self, name: &str) -> Option<i32> {
        self.by_name.get(name).copied()
    }

    pub fn name_of(&self, id: i32) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn contains_id(&self, id: i32) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Removes the pair keyed by `name`, returning its id.
    pub fn remove_by_name(&mut self, name: &str) -> Option<i32> {
        let id = self.by_name.remove(name)?;
        self.by_id.remove(&id);
        Some(id)
    }

    /// Removes the pair keyed by `id`, returning its name.
    pub fn remove_by_id(&mut self, id: i32) -> Option<String> {
        let name = self.by_id.remove(&id)?;
        self.by_name.remove(&name);
        Some(name)
    }

    pub fn clear(&mut self) {
        self.by_name.clear();
        self.by_id.clear();
    }

    /// Iterates `(name, id)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> + '_ {
        self.by_name.iter().map(|(name, &id)| (name.as_str(), id))
    }

    /// Pairs ordered by id, used wherever output must be deterministic.
    pub fn sorted_by_id(&self) -> Vec<(&str, i32)> {
        let mut pairs: Vec<_> = self.iter().collect();
        pairs.sort_unstable_by_key(|&(_, id)| id);
        pairs
    }
}
