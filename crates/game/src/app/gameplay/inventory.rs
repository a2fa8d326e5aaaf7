use std::collections::BTreeMap;

use tracing::warn;

/// Item id -> quantity. An entry exists only while its quantity is positive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Inventory {
    items: BTreeMap<String, u32>,
}

impl Inventory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn count(&self, item_id: &str) -> u32 {
        self.items.get(item_id).copied().unwrap_or(0)
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, item_id: &str) -> bool {
        self.items.contains_key(item_id)
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn add(&mut self, item_id: &str, quantity: u32) {
        if quantity == 0 {
            return;
        }
        let entry = self.items.entry(item_id.to_string()).or_insert(0);
        *entry = entry.saturating_add(quantity);
    }

    /// Removes `quantity` units, deleting the entry at zero. Asking for more
    /// than is held clamps to zero and logs.
    pub(crate) fn remove(&mut self, item_id: &str, quantity: u32) {
        let Some(held) = self.items.get_mut(item_id) else {
            if quantity > 0 {
                warn!(item = %item_id, requested = quantity, held = 0, "inventory_underflow_clamped");
            }
            return;
        };
        if quantity > *held {
            warn!(item = %item_id, requested = quantity, held = *held, "inventory_underflow_clamped");
        }
        *held = held.saturating_sub(quantity);
        if *held == 0 {
            self.items.remove(item_id);
        }
    }

    /// Entries sorted by item id.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.items.iter().map(|(id, qty)| (id.as_str(), *qty))
    }

    pub(crate) fn item_ids(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }
}

impl<'a> FromIterator<(&'a str, u32)> for Inventory {
    fn from_iter<I: IntoIterator<Item = (&'a str, u32)>>(iter: I) -> Self {
        let mut inventory = Inventory::new();
        for (item_id, quantity) in iter {
            inventory.add(item_id, quantity);
        }
        inventory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_deletes_entry_at_zero() {
        let mut inventory: Inventory = [("potion", 5)].into_iter().collect();
        inventory.remove("potion", 3);
        assert_eq!(inventory.count("potion"), 2);

        inventory.remove("potion", 2);
        assert!(!inventory.contains("potion"));
        assert!(inventory.is_empty());
    }

    #[test]
    fn underflow_clamps_and_removes() {
        let mut inventory: Inventory = [("planche", 1)].into_iter().collect();
        inventory.remove("planche", 4);
        assert!(!inventory.contains("planche"));

        inventory.remove("absent", 1);
        assert!(inventory.is_empty());
    }

    #[test]
    fn adding_zero_never_creates_an_entry() {
        let mut inventory = Inventory::new();
        inventory.add("Blé", 0);
        assert!(!inventory.contains("Blé"));

        inventory.add("Blé", 2);
        inventory.add("Blé", 1);
        assert_eq!(inventory.count("Blé"), 3);
    }

    #[test]
    fn iteration_is_sorted_by_id() {
        let inventory: Inventory = [("potion", 1), ("cle", 2), ("Blé", 3)].into_iter().collect();
        let ids: Vec<&str> = inventory.item_ids().collect();
        assert_eq!(ids, vec!["Blé", "cle", "potion"]);
    }
}
