use std::collections::BTreeSet;

use wave_director_core::EnemyId;

/// Live set of enemies that have been born and not yet died.
///
/// Both mutations are idempotent: inserting a present enemy and removing an
/// absent one leave the set untouched. Handles whose death has been recorded
/// are retired and never tracked again, so a late duplicate birth cannot
/// resurrect them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActiveEnemyRegistry {
    live: BTreeSet<EnemyId>,
    retired: BTreeSet<EnemyId>,
}

impl ActiveEnemyRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a birth. Returns `false` when the enemy was already tracked or
    /// has already died.
    pub fn insert(&mut self, enemy: EnemyId) -> bool {
        if self.retired.contains(&enemy) {
            return false;
        }
        self.live.insert(enemy)
    }

    /// Records a death. Returns `false` when the enemy was not tracked.
    pub fn remove(&mut self, enemy: EnemyId) -> bool {
        if !self.live.remove(&enemy) {
            return false;
        }
        let _ = self.retired.insert(enemy);
        true
    }

    /// Reports whether the enemy's death has already been recorded.
    #[must_use]
    pub fn is_retired(&self, enemy: EnemyId) -> bool {
        self.retired.contains(&enemy)
    }

    /// Reports whether the enemy is alive.
    #[must_use]
    pub fn contains(&self, enemy: EnemyId) -> bool {
        self.live.contains(&enemy)
    }

    /// Number of live enemies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Reports whether no enemies are alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Live enemies in ascending identifier order.
    pub fn iter(&self) -> impl Iterator<Item = EnemyId> + '_ {
        self.live.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::ActiveEnemyRegistry;
    use wave_director_core::EnemyId;

    #[test]
    fn duplicate_birth_is_ignored() {
        let mut registry = ActiveEnemyRegistry::new();
        assert!(registry.insert(EnemyId::new(4)));
        let once = registry.clone();
        assert!(!registry.insert(EnemyId::new(4)));
        assert_eq!(registry, once);
    }

    #[test]
    fn duplicate_death_is_ignored() {
        let mut registry = ActiveEnemyRegistry::new();
        let _ = registry.insert(EnemyId::new(1));
        let _ = registry.insert(EnemyId::new(2));
        assert!(registry.remove(EnemyId::new(1)));
        let once = registry.clone();
        assert!(!registry.remove(EnemyId::new(1)));
        assert_eq!(registry, once);
        assert_eq!(registry.iter().collect::<Vec<_>>(), vec![EnemyId::new(2)]);
    }

    #[test]
    fn birth_after_death_does_not_resurrect() {
        let mut registry = ActiveEnemyRegistry::new();
        assert!(registry.insert(EnemyId::new(7)));
        assert!(registry.remove(EnemyId::new(7)));
        assert!(!registry.insert(EnemyId::new(7)));

        assert!(!registry.contains(EnemyId::new(7)));
        assert!(registry.is_retired(EnemyId::new(7)));
        assert!(registry.is_empty());
    }

    #[test]
    fn unknown_death_leaves_registry_empty() {
        let mut registry = ActiveEnemyRegistry::new();
        assert!(!registry.remove(EnemyId::new(9)));
        assert!(registry.is_empty());
        assert!(!registry.contains(EnemyId::new(9)));
        assert!(!registry.is_retired(EnemyId::new(9)));
    }
}
