//! Selected items
//!
//! The selection stores `{kind, id}` references in insertion order. Callers
//! resolve them against the database on every use.

use super::ItemRef;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    items: Vec<ItemRef>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single select replaces the selection; multi select toggles membership by id
    pub fn select(&mut self, item: ItemRef, multi: bool) {
        if !multi {
            self.items = vec![item];
            return;
        }
        match self.items.iter().position(|i| i.id == item.id) {
            Some(index) => {
                self.items.remove(index);
            }
            None => self.items.push(item),
        }
    }

    pub fn set(&mut self, items: Vec<ItemRef>) {
        self.items = items;
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|i| i.id == id)
    }

    pub fn items(&self) -> &[ItemRef] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn take(&mut self) -> Vec<ItemRef> {
        std::mem::take(&mut self.items)
    }
}
