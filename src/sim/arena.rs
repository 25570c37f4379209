//! Generational arena for enemies
//!
//! Slots are reused through a free list; each reuse bumps the slot's
//! generation so a stale id never resolves to the new occupant.

use std::fmt;

/// Stable handle to an arena slot
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnemyId {
    index: u32,
    generation: u32,
}

impl EnemyId {
    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for EnemyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EnemyId({}:{})", self.index, self.generation)
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Dense storage with free-list reuse
#[derive(Debug, Clone)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    pub fn insert(&mut self, value: T) -> EnemyId {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.value = Some(value);
            return EnemyId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        EnemyId {
            index,
            generation: 0,
        }
    }

    pub fn remove(&mut self, id: EnemyId) -> Option<T> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation {
            return None;
        }
        let value = slot.value.take()?;
        self.free.push(id.index);
        self.len -= 1;
        Some(value)
    }

    pub fn get(&self, id: EnemyId) -> Option<&T> {
        self.slots
            .get(id.index())
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.value.as_ref())
    }

    pub fn get_mut(&mut self, id: EnemyId) -> Option<&mut T> {
        self.slots
            .get_mut(id.index())
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.value.as_mut())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots ever allocated (live + free)
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.take().is_some() {
                self.free.push(index as u32);
            }
        }
        self.len = 0;
    }

    /// Live entries in slot order
    pub fn iter(&self) -> impl Iterator<Item = (EnemyId, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.value.as_ref().map(|v| {
                (
                    EnemyId {
                        index: i as u32,
                        generation: s.generation,
                    },
                    v,
                )
            })
        })
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(|s| s.value.as_ref())
    }

    /// Visit every live entry; entries for which `keep` returns false are removed
    pub fn retain_mut<F>(&mut self, mut keep: F)
    where
        F: FnMut(EnemyId, &mut T) -> bool,
    {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            let id = EnemyId {
                index: i as u32,
                generation: slot.generation,
            };
            let remove = match slot.value.as_mut() {
                Some(v) => !keep(id, v),
                None => false,
            };
            if remove {
                slot.value = None;
                self.free.push(i as u32);
                self.len -= 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_remove() {
        let mut arena = Arena::new();
        let a = arena.insert("a");
        let b = arena.insert("b");
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(a), Some(&"a"));
        assert_eq!(arena.remove(a), Some("a"));
        assert_eq!(arena.get(a), None);
        assert_eq!(arena.remove(a), None);
        assert_eq!(arena.get(b), Some(&"b"));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_stale_id_does_not_resolve_after_reuse() {
        let mut arena = Arena::new();
        let old = arena.insert(1);
        arena.remove(old);
        let new = arena.insert(2);
        assert_eq!(old.index(), new.index());
        assert_ne!(old.generation(), new.generation());
        assert_eq!(arena.get(old), None);
        assert_eq!(arena.get(new), Some(&2));
        assert_eq!(arena.capacity(), 1);
    }

    #[test]
    fn test_retain_mut_frees_slots() {
        let mut arena = Arena::new();
        for i in 0..5 {
            arena.insert(i);
        }
        arena.retain_mut(|_, v| {
            *v *= 10;
            *v < 30
        });
        assert_eq!(arena.len(), 3);
        assert_eq!(arena.values().copied().collect::<Vec<_>>(), vec![0, 10, 20]);
        arena.insert(99);
        arena.insert(98);
        assert_eq!(arena.capacity(), 5);
    }

    #[test]
    fn test_clear() {
        let mut arena = Arena::new();
        let id = arena.insert('x');
        arena.insert('y');
        arena.clear();
        assert!(arena.is_empty());
        assert_eq!(arena.get(id), None);
        assert_eq!(arena.iter().count(), 0);
    }
}
