//! Ordered collection of live materials.

use lithos_types::{LithosError, LithosResult, MaterialId};

use crate::material::{Capability, Material};

/// Live materials in insertion order, each with a unique index.
///
/// The background material always exists and always carries index 0.
/// Indices are never reused or changed once assigned.
#[derive(Debug, Clone)]
pub struct MaterialRegistry {
    materials: Vec<Material>,
}

impl MaterialRegistry {
    /// Creates a registry holding only the background material.
    pub fn new(mut background: Material) -> Self {
        background.index = MaterialId::BACKGROUND;
        Self { materials: vec![background] }
    }

    /// Adds a material and returns its assigned index.
    ///
    /// With `index = None` the next free index (one past the largest in use)
    /// is assigned. Thermal properties the material leaves undeclared are
    /// inherited from the background material.
    pub fn add(&mut self, mut material: Material, index: Option<MaterialId>) -> LithosResult<MaterialId> {
        let id = match index {
            Some(id) => {
                if self.contains(id) {
                    return Err(LithosError::DuplicateMaterial(id));
                }
                id
            }
            None => self.next_free_index(),
        };
        material.index = id;

        let bg = self.background();
        material.diffusivity = material.diffusivity.or(bg.diffusivity);
        material.capacity = material.capacity.or(bg.capacity);
        material.radiogenic_heat_production =
            material.radiogenic_heat_production.or(bg.radiogenic_heat_production);

        self.materials.push(material);
        Ok(id)
    }

    /// One past the largest index in use.
    pub fn next_free_index(&self) -> MaterialId {
        let max = self.materials.iter().map(|m| m.index.0).max().unwrap_or(0);
        MaterialId(max + 1)
    }

    /// Looks up a material by index.
    pub fn get(&self, id: MaterialId) -> LithosResult<&Material> {
        self.materials
            .iter()
            .find(|m| m.index == id)
            .ok_or(LithosError::MaterialNotFound(id))
    }

    /// Mutable lookup by index.
    pub fn get_mut(&mut self, id: MaterialId) -> LithosResult<&mut Material> {
        self.materials
            .iter_mut()
            .find(|m| m.index == id)
            .ok_or(LithosError::MaterialNotFound(id))
    }

    /// Looks up a material by name (first match in insertion order).
    pub fn by_name(&self, name: &str) -> Option<&Material> {
        self.materials.iter().find(|m| m.name == name)
    }

    pub fn contains(&self, id: MaterialId) -> bool {
        self.materials.iter().any(|m| m.index == id)
    }

    pub fn background(&self) -> &Material {
        &self.materials[0]
    }

    /// Materials in insertion order, background first.
    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        self.materials.iter()
    }

    /// Whether any live material declares `capability`.
    pub fn any(&self, capability: Capability) -> bool {
        self.materials.iter().any(|m| m.has(capability))
    }

    /// Validates every material.
    pub fn validate(&self) -> LithosResult<()> {
        self.materials.iter().try_for_each(Material::validate)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Always false: the background material is never removed.
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

impl Default for MaterialRegistry {
    fn default() -> Self {
        Self::new(Material::new("Model"))
    }
}
