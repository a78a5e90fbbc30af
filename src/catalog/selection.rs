use crate::catalog::{CatalogIndex, Product, ProductId};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
    Ignored,
}

/// Products picked for a routine, in the order they were picked.
#[derive(Debug, Default, Clone)]
pub struct SelectionSet {
    members: Vec<Arc<Product>>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids that no longer resolve against `catalog` are ignored; they only come from stale UI state.
    pub fn toggle(&mut self, product_id: ProductId, catalog: &CatalogIndex) -> ToggleOutcome {
        let Some(product) = catalog.get(product_id) else {
            tracing::debug!(product_id, "toggle ignored for unknown product");
            return ToggleOutcome::Ignored;
        };

        if let Some(position) = self
            .members
            .iter()
            .position(|member| member.id == product_id)
        {
            self.members.remove(position);
            tracing::debug!(product_id, "product deselected");
            ToggleOutcome::Removed
        } else {
            self.members.push(Arc::clone(product));
            tracing::debug!(product_id, "product selected");
            ToggleOutcome::Added
        }
    }

    pub fn members(&self) -> &[Arc<Product>] {
        &self.members
    }

    pub fn is_selected(&self, product_id: ProductId) -> bool {
        self.members.iter().any(|member| member.id == product_id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::sample_catalog;

    fn member_ids(selection: &SelectionSet) -> Vec<ProductId> {
        selection.members().iter().map(|member| member.id).collect()
    }

    #[test]
    fn toggle_appends_in_selection_order() {
        let catalog = sample_catalog();
        let mut selection = SelectionSet::new();

        assert_eq!(selection.toggle(3, &catalog), ToggleOutcome::Added);
        assert_eq!(selection.toggle(1, &catalog), ToggleOutcome::Added);
        assert_eq!(member_ids(&selection), vec![3, 1]);
        assert!(selection.is_selected(3));
        assert!(!selection.is_selected(2));
    }

    #[test]
    fn toggle_twice_restores_membership() {
        let catalog = sample_catalog();
        let mut selection = SelectionSet::new();
        selection.toggle(2, &catalog);

        let before = member_ids(&selection);
        assert_eq!(selection.toggle(4, &catalog), ToggleOutcome::Added);
        assert_eq!(selection.toggle(4, &catalog), ToggleOutcome::Removed);
        assert_eq!(member_ids(&selection), before);

        assert_eq!(selection.toggle(2, &catalog), ToggleOutcome::Removed);
        assert_eq!(selection.toggle(2, &catalog), ToggleOutcome::Added);
        assert_eq!(member_ids(&selection), before);
    }

    #[test]
    fn unknown_product_is_ignored() {
        let catalog = sample_catalog();
        let mut selection = SelectionSet::new();
        selection.toggle(1, &catalog);

        assert_eq!(selection.toggle(999, &catalog), ToggleOutcome::Ignored);
        assert_eq!(member_ids(&selection), vec![1]);
    }

    #[test]
    fn removal_keeps_remaining_order() {
        let catalog = sample_catalog();
        let mut selection = SelectionSet::new();
        for id in [4, 2, 1] {
            selection.toggle(id, &catalog);
        }
        selection.toggle(2, &catalog);
        assert_eq!(member_ids(&selection), vec![4, 1]);
        assert_eq!(selection.len(), 2);
    }

    #[test]
    fn members_share_catalog_handles() {
        let catalog = sample_catalog();
        let mut selection = SelectionSet::new();
        selection.toggle(1, &catalog);

        let from_catalog = catalog.get(1).expect("product 1 should exist");
        assert!(Arc::ptr_eq(&selection.members()[0], from_catalog));
    }

    #[test]
    fn empty_catalog_ignores_every_toggle() {
        let catalog = CatalogIndex::new();
        let mut selection = SelectionSet::new();
        assert_eq!(selection.toggle(1, &catalog), ToggleOutcome::Ignored);
        assert!(selection.is_empty());
    }
}
