//! Material-indexed piecewise maps.

use lithos_types::{LithosError, LithosResult, MaterialId};

/// Per-material table with an optional fallback entry.
///
/// Evaluating a particle whose material has no entry and no fallback is
/// an [`LithosError::UndefinedProperty`].
#[derive(Debug, Clone)]
pub struct PiecewiseMap<T> {
    property: &'static str,
    /// Sorted by material id.
    entries: Vec<(MaterialId, T)>,
    default: Option<T>,
}

impl<T> PiecewiseMap<T> {
    pub fn new(property: &'static str) -> Self {
        Self { property, entries: Vec::new(), default: None }
    }

    pub fn with_default(property: &'static str, default: T) -> Self {
        Self { property, entries: Vec::new(), default: Some(default) }
    }

    /// Sets the entry of `id`, replacing any previous one.
    pub fn insert(&mut self, id: MaterialId, value: T) {
        match self.entries.binary_search_by_key(&id, |(k, _)| *k) {
            Ok(pos) => self.entries[pos].1 = value,
            Err(pos) => self.entries.insert(pos, (id, value)),
        }
    }

    pub fn get(&self, id: MaterialId) -> LithosResult<&T> {
        match self.entries.binary_search_by_key(&id, |(k, _)| *k) {
            Ok(pos) => Ok(&self.entries[pos].1),
            Err(_) => self
                .default
                .as_ref()
                .ok_or(LithosError::UndefinedProperty { material: id, property: self.property }),
        }
    }

    pub fn contains(&self, id: MaterialId) -> bool {
        self.entries.binary_search_by_key(&id, |(k, _)| *k).is_ok()
    }

    pub fn property(&self) -> &'static str {
        self.property
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dispatches every particle on its material and collects `f`.
    pub fn evaluate<R>(
        &self,
        materials: &[MaterialId],
        mut f: impl FnMut(usize, &T) -> LithosResult<R>,
    ) -> LithosResult<Vec<R>> {
        materials.iter().enumerate().map(|(i, &m)| f(i, self.get(m)?)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_and_missing_entries() {
        let mut with_default = PiecewiseMap::with_default("diffusivity", 1.0);
        with_default.insert(MaterialId(2), 3.0);
        assert_eq!(*with_default.get(MaterialId(2)).unwrap(), 3.0);
        assert_eq!(*with_default.get(MaterialId(7)).unwrap(), 1.0);

        let mut strict: PiecewiseMap<f64> = PiecewiseMap::new("density");
        strict.insert(MaterialId(0), 3300.0);
        match strict.get(MaterialId(1)) {
            Err(LithosError::UndefinedProperty { material, property }) => {
                assert_eq!(material, MaterialId(1));
                assert_eq!(property, "density");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn insert_keeps_entries_sorted_and_replaces() {
        let mut map = PiecewiseMap::new("x");
        map.insert(MaterialId(3), 'c');
        map.insert(MaterialId(1), 'a');
        map.insert(MaterialId(3), 'd');
        assert_eq!(map.len(), 2);
        let out = map.evaluate(&[MaterialId(1), MaterialId(3)], |_, v| Ok(*v)).unwrap();
        assert_eq!(out, vec!['a', 'd']);
    }
}
