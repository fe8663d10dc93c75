//! Delivery addresses and the customer address book.
//!
//! Addresses are persisted through the gateway when it is reachable; a
//! failed remote create keeps the address in the local list (with a
//! negative, locally-assigned id) so the customer can still check out.
//! At most one address is flagged default; assigning a new default clears
//! the previous one in the same operation.

use serde::{Deserialize, Serialize};
use tracing::warn;

use marigold_core::AddressId;

use crate::error::{CheckoutError, Result};
use crate::gateway::Gateway;

/// A delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    /// Customer-facing label ("Home", "Work").
    pub label: String,
    pub full_name: String,
    pub phone: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub is_default: bool,
}

/// Form data for creating an address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressDraft {
    pub label: String,
    pub full_name: String,
    pub phone: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    /// Make this the default address once created.
    pub set_default: bool,
}

impl AddressDraft {
    fn into_address(self, id: AddressId) -> Address {
        Address {
            id,
            label: self.label,
            full_name: self.full_name,
            phone: self.phone,
            line1: self.line1,
            line2: self.line2,
            city: self.city,
            state: self.state,
            pincode: self.pincode,
            is_default: false,
        }
    }
}

/// The customer's address list, backed by the gateway with a local fallback.
pub struct AddressBook {
    gateway: Gateway,
    addresses: Vec<Address>,
    /// Ids for addresses the gateway never saw. Negative so they can never
    /// collide with server-assigned ids.
    next_local: i64,
}

impl AddressBook {
    /// Create an empty address book.
    #[must_use]
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway,
            addresses: Vec::new(),
            next_local: -1,
        }
    }

    /// Addresses currently known locally.
    #[must_use]
    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    /// Look up an address by id.
    #[must_use]
    pub fn get(&self, id: AddressId) -> Option<&Address> {
        self.addresses.iter().find(|a| a.id == id)
    }

    /// The current default address, if one is set.
    #[must_use]
    pub fn default_address(&self) -> Option<&Address> {
        self.addresses.iter().find(|a| a.is_default)
    }

    /// Reload the list from the gateway.
    ///
    /// A gateway failure keeps the local list untouched; an unreachable
    /// backend must not make existing addresses disappear mid-checkout.
    pub async fn refresh(&mut self) -> &[Address] {
        match self.gateway.list_addresses().await {
            Ok(remote) => {
                // Locally-created fallback addresses (negative ids) survive
                // a refresh; the gateway does not know about them.
                let mut merged = remote;
                merged.extend(
                    self.addresses
                        .iter()
                        .filter(|a| a.id.as_i64() < 0)
                        .cloned(),
                );
                self.addresses = merged;
            }
            Err(e) => {
                warn!(error = %e, "address refresh failed, keeping local list");
            }
        }
        &self.addresses
    }

    /// Create an address, remotely when possible.
    ///
    /// A failed remote create falls back to the local list so the action is
    /// never lost; the fallback is logged.
    pub async fn create(&mut self, draft: AddressDraft) -> AddressId {
        let set_default = draft.set_default;
        let address = match self.gateway.create_address(&draft).await {
            Ok(address) => address,
            Err(e) => {
                warn!(error = %e, "address not persisted remotely, keeping it locally");
                let id = AddressId::new(self.next_local);
                self.next_local -= 1;
                draft.into_address(id)
            }
        };
        let id = address.id;
        self.addresses.push(address);
        if set_default {
            self.apply_default(id);
        }
        id
    }

    /// Mark an address as the default.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::AddressMissing`] if the id is unknown.
    /// Afterwards exactly one address is flagged default.
    pub fn set_default(&mut self, id: AddressId) -> Result<()> {
        if self.get(id).is_none() {
            return Err(CheckoutError::AddressMissing);
        }
        self.apply_default(id);
        Ok(())
    }

    fn apply_default(&mut self, id: AddressId) {
        for address in &mut self.addresses {
            address.is_default = address.id == id;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn draft(label: &str, set_default: bool) -> AddressDraft {
        AddressDraft {
            label: label.to_string(),
            full_name: "Asha Rao".to_string(),
            phone: "9876543210".to_string(),
            line1: "12 Gandhi Road".to_string(),
            line2: None,
            city: "Bengaluru".to_string(),
            state: "Karnataka".to_string(),
            pincode: "560001".to_string(),
            set_default,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_lists() {
        let mut book = AddressBook::new(Gateway::offline());
        let id = book.create(draft("Home", false)).await;
        assert_eq!(book.addresses().len(), 1);
        assert_eq!(book.get(id).unwrap().label, "Home");
    }

    #[tokio::test]
    async fn test_at_most_one_default() {
        let mut book = AddressBook::new(Gateway::offline());
        let first = book.create(draft("Home", true)).await;
        let second = book.create(draft("Work", true)).await;

        let defaults: Vec<_> = book.addresses().iter().filter(|a| a.is_default).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults.first().unwrap().id, second);

        book.set_default(first).unwrap();
        let defaults: Vec<_> = book.addresses().iter().filter(|a| a.is_default).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults.first().unwrap().id, first);
    }

    #[tokio::test]
    async fn test_set_default_unknown_id() {
        let mut book = AddressBook::new(Gateway::offline());
        let err = book.set_default(AddressId::new(99)).unwrap_err();
        assert!(matches!(err, CheckoutError::AddressMissing));
    }
}
