use std::collections::HashMap;

use super::domain::{ClassNumber, SectionSnapshot};

/// Latest known snapshot per tracked section. Holds no timing logic.
#[derive(Debug, Default, Clone)]
pub struct SectionRegistry {
    sections: HashMap<ClassNumber, SectionSnapshot>,
}

impl SectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the snapshot stored under its class number.
    pub fn upsert(&mut self, snapshot: SectionSnapshot) -> Result<(), RegistryError> {
        if snapshot.class_number.is_blank() {
            return Err(RegistryError::InvalidEntity);
        }
        self.sections
            .insert(snapshot.class_number.clone(), snapshot);
        Ok(())
    }

    pub fn get(&self, class_number: &ClassNumber) -> Option<&SectionSnapshot> {
        self.sections.get(class_number)
    }

    pub fn contains(&self, class_number: &ClassNumber) -> bool {
        self.sections.contains_key(class_number)
    }

    pub fn remove(&mut self, class_number: &ClassNumber) -> Option<SectionSnapshot> {
        self.sections.remove(class_number)
    }

    pub fn all(&self) -> Vec<SectionSnapshot> {
        self.sections.values().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.sections.clear();
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("classNumber is required")]
    InvalidEntity,
}
