use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::product::ProductId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CampaignId(pub String);

impl CampaignId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for CampaignId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named promotional discount over an exclusive set of products.
///
/// Campaigns are never hard-deleted; `deleted` flags them out of every
/// query. Exclusivity (a product belongs to at most one non-deleted
/// campaign) is enforced by the campaign service, not here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    pub discount_percent: u32,
    pub description: Option<String>,
    pub product_ids: HashSet<ProductId>,
    pub deleted: bool,
}

impl Campaign {
    pub fn new(name: impl Into<String>, discount_percent: u32, description: Option<String>) -> Self {
        Self {
            id: CampaignId::generate(),
            name: name.into(),
            discount_percent,
            description,
            product_ids: HashSet::new(),
            deleted: false,
        }
    }

    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.product_ids.contains(product_id)
    }

    /// Union the given ids into the product set. Ids already present are
    /// skipped, so repeating an assignment is a no-op.
    pub fn assign(&mut self, product_ids: &[ProductId]) {
        for product_id in product_ids {
            self.product_ids.insert(product_id.clone());
        }
    }

    pub fn unassign(&mut self, product_ids: &[ProductId]) {
        for product_id in product_ids {
            self.product_ids.remove(product_id);
        }
    }

    pub fn unassign_all(&mut self) {
        self.product_ids.clear();
    }
}
