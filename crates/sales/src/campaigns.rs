//! Campaign store: promotional campaigns and the single-active-campaign-
//! per-product invariant.

use std::sync::Arc;

use tracing::{info, warn};

use salespoint_core::domain::campaign::{Campaign, CampaignId};
use salespoint_core::domain::product::ProductId;
use salespoint_db::repositories::{CampaignRepository, RepositoryError};

use crate::errors::CampaignError;
use crate::keyed_lock::KeyedMutex;

pub struct CampaignService {
    campaigns: Arc<dyn CampaignRepository>,
    locks: KeyedMutex,
    // Claim checks serialize per product id, not just per campaign:
    // two campaigns assigning the same product contend on its key.
    product_locks: KeyedMutex,
}

impl CampaignService {
    pub fn new(campaigns: Arc<dyn CampaignRepository>) -> Self {
        Self { campaigns, locks: KeyedMutex::default(), product_locks: KeyedMutex::default() }
    }

    pub async fn create(
        &self,
        name: &str,
        discount_percent: u32,
        description: Option<String>,
    ) -> Result<Campaign, CampaignError> {
        if self.campaigns.active_name_exists(name, None).await? {
            warn!(name, "campaign create rejected: name already exists");
            return Err(CampaignError::AlreadyExists(name.to_string()));
        }

        let campaign = Campaign::new(name, discount_percent, description);
        self.campaigns.save(campaign.clone()).await?;
        info!(campaign_id = %campaign.id, name, "campaign created");
        Ok(campaign)
    }

    pub async fn rename(&self, id: &CampaignId, name: &str) -> Result<Campaign, CampaignError> {
        let _guard = self.locks.lock(&id.0).await;
        let mut campaign = self.require(id).await?;

        if self.campaigns.active_name_exists(name, Some(id)).await? {
            return Err(CampaignError::AlreadyExists(name.to_string()));
        }

        campaign.name = name.to_string();
        self.campaigns.save(campaign.clone()).await?;
        info!(campaign_id = %id, name, "campaign renamed");
        Ok(campaign)
    }

    /// Flags the campaign deleted. Deleted campaigns vanish from every
    /// lookup, which also releases their product claims.
    pub async fn soft_delete(&self, id: &CampaignId) -> Result<Campaign, CampaignError> {
        let _guard = self.locks.lock(&id.0).await;
        let mut campaign = self.require(id).await?;

        campaign.deleted = true;
        self.campaigns.save(campaign.clone()).await?;
        info!(campaign_id = %id, "campaign soft-deleted");
        Ok(campaign)
    }

    /// Best discount for the product across non-deleted campaigns, `None`
    /// if no campaign claims it. Returns a value, not an identity, so
    /// ties need no tie-break.
    pub async fn resolve_discount(
        &self,
        product_id: &ProductId,
    ) -> Result<Option<u32>, RepositoryError> {
        let campaigns = self.campaigns.find_active_by_product(product_id).await?;
        Ok(campaigns.iter().map(|campaign| campaign.discount_percent).max())
    }

    /// Name of a campaign claiming the product. Under the exclusivity
    /// invariant at most one matches; if the data is ever in violation
    /// this still answers with one of them rather than failing.
    pub async fn campaign_name_for(
        &self,
        product_id: &ProductId,
    ) -> Result<Option<String>, RepositoryError> {
        let campaigns = self.campaigns.find_active_by_product(product_id).await?;
        Ok(campaigns.into_iter().next().map(|campaign| campaign.name))
    }

    /// Adds products to the campaign's set. Every incoming id is checked
    /// against all OTHER non-deleted campaigns first; one conflict fails
    /// the whole batch with the full conflicting list and changes nothing.
    ///
    /// The check-then-save runs under the campaign's lock AND a lock per
    /// incoming product id (taken in sorted order), so two campaigns
    /// racing to claim the same product serialize and the loser sees the
    /// winner's save.
    pub async fn assign_products(
        &self,
        id: &CampaignId,
        product_ids: &[ProductId],
    ) -> Result<Campaign, CampaignError> {
        let _guard = self.locks.lock(&id.0).await;

        let mut keys: Vec<&str> = product_ids.iter().map(|product_id| product_id.0.as_str()).collect();
        keys.sort_unstable();
        keys.dedup();
        let mut product_guards = Vec::with_capacity(keys.len());
        for key in keys {
            product_guards.push(self.product_locks.lock(key).await);
        }

        let mut campaign = self.require(id).await?;

        let mut conflicting = Vec::new();
        for product_id in product_ids {
            let owners = self.campaigns.find_active_by_product(product_id).await?;
            if owners.iter().any(|owner| owner.id != campaign.id) {
                conflicting.push(product_id.clone());
            }
        }
        if !conflicting.is_empty() {
            warn!(campaign_id = %id, ?conflicting, "assign rejected: products already claimed");
            return Err(CampaignError::ProductsAlreadyClaimed(conflicting));
        }

        campaign.assign(product_ids);
        self.campaigns.save(campaign.clone()).await?;
        info!(campaign_id = %id, count = product_ids.len(), "products assigned to campaign");
        Ok(campaign)
    }

    /// Removes products from the campaign's set, all-or-nothing: the whole
    /// batch is validated against a snapshot before anything is removed,
    /// so a single unknown id leaves the set untouched.
    pub async fn unassign_products(
        &self,
        id: &CampaignId,
        product_ids: &[ProductId],
    ) -> Result<Campaign, CampaignError> {
        let _guard = self.locks.lock(&id.0).await;
        let mut campaign = self.require(id).await?;

        if campaign.product_ids.is_empty() {
            return Err(CampaignError::NoProductsAssigned(id.clone()));
        }

        let missing: Vec<ProductId> = product_ids
            .iter()
            .filter(|product_id| !campaign.contains(product_id))
            .cloned()
            .collect();
        if !missing.is_empty() {
            warn!(campaign_id = %id, ?missing, "unassign rejected: products not in campaign");
            return Err(CampaignError::ProductsNotAssigned(missing));
        }

        campaign.unassign(product_ids);
        self.campaigns.save(campaign.clone()).await?;
        info!(campaign_id = %id, count = product_ids.len(), "products unassigned from campaign");
        Ok(campaign)
    }

    pub async fn unassign_all(&self, id: &CampaignId) -> Result<Campaign, CampaignError> {
        let _guard = self.locks.lock(&id.0).await;
        let mut campaign = self.require(id).await?;

        if campaign.product_ids.is_empty() {
            return Err(CampaignError::NoProductsAssigned(id.clone()));
        }

        campaign.unassign_all();
        self.campaigns.save(campaign.clone()).await?;
        info!(campaign_id = %id, "all products unassigned from campaign");
        Ok(campaign)
    }

    pub async fn get(&self, id: &CampaignId) -> Result<Campaign, CampaignError> {
        self.require(id).await
    }

    async fn require(&self, id: &CampaignId) -> Result<Campaign, CampaignError> {
        self.campaigns
            .find_by_id(id)
            .await?
            .ok_or_else(|| CampaignError::NotFound(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use salespoint_core::domain::campaign::{Campaign, CampaignId};
    use salespoint_core::domain::product::ProductId;
    use salespoint_db::repositories::{
        CampaignRepository, InMemoryCampaignRepository, RepositoryError,
    };

    use super::CampaignService;
    use crate::errors::CampaignError;

    /// Wraps the in-memory repository and widens the gap between the
    /// claim check and the save, so an unserialized race would be caught
    /// reliably instead of depending on scheduler timing.
    #[derive(Default)]
    struct SlowClaimLookupRepository {
        inner: InMemoryCampaignRepository,
    }

    #[async_trait::async_trait]
    impl CampaignRepository for SlowClaimLookupRepository {
        async fn find_by_id(&self, id: &CampaignId) -> Result<Option<Campaign>, RepositoryError> {
            self.inner.find_by_id(id).await
        }

        async fn find_all_active(&self) -> Result<Vec<Campaign>, RepositoryError> {
            self.inner.find_all_active().await
        }

        async fn find_active_by_product(
            &self,
            product_id: &ProductId,
        ) -> Result<Vec<Campaign>, RepositoryError> {
            let owners = self.inner.find_active_by_product(product_id).await;
            tokio::time::sleep(Duration::from_millis(50)).await;
            owners
        }

        async fn active_name_exists(
            &self,
            name: &str,
            excluding: Option<&CampaignId>,
        ) -> Result<bool, RepositoryError> {
            self.inner.active_name_exists(name, excluding).await
        }

        async fn save(&self, campaign: Campaign) -> Result<(), RepositoryError> {
            self.inner.save(campaign).await
        }
    }

    fn service() -> CampaignService {
        CampaignService::new(Arc::new(InMemoryCampaignRepository::default()))
    }

    fn pid(raw: &str) -> ProductId {
        ProductId(raw.to_string())
    }

    #[tokio::test]
    async fn duplicate_active_name_is_rejected() {
        let service = service();
        service.create("summer", 10, None).await.expect("create");

        let error = service.create("summer", 20, None).await.unwrap_err();

        assert!(matches!(error, CampaignError::AlreadyExists(name) if name == "summer"));
    }

    #[tokio::test]
    async fn soft_deleted_name_can_be_reused() {
        let service = service();
        let campaign = service.create("summer", 10, None).await.expect("create");
        service.soft_delete(&campaign.id).await.expect("delete");

        service.create("summer", 15, None).await.expect("recreate");
    }

    #[tokio::test]
    async fn assign_conflict_lists_every_claimed_product_and_changes_nothing() {
        let service = service();
        let a = service.create("a", 10, None).await.expect("create a");
        let b = service.create("b", 20, None).await.expect("create b");
        service.assign_products(&a.id, &[pid("p1"), pid("p2")]).await.expect("assign a");

        let error =
            service.assign_products(&b.id, &[pid("p1"), pid("p2"), pid("p3")]).await.unwrap_err();

        match error {
            CampaignError::ProductsAlreadyClaimed(mut conflicting) => {
                conflicting.sort_by(|x, y| x.0.cmp(&y.0));
                assert_eq!(conflicting, vec![pid("p1"), pid("p2")]);
            }
            other => panic!("expected ProductsAlreadyClaimed, got {other:?}"),
        }

        let b = service.get(&b.id).await.expect("reload b");
        assert!(b.product_ids.is_empty());
    }

    #[tokio::test]
    async fn reassigning_owned_products_is_idempotent() {
        let service = service();
        let a = service.create("a", 10, None).await.expect("create");
        service.assign_products(&a.id, &[pid("p1")]).await.expect("assign");

        let a = service.assign_products(&a.id, &[pid("p1"), pid("p2")]).await.expect("reassign");

        assert_eq!(a.product_ids.len(), 2);
    }

    #[tokio::test]
    async fn concurrent_assigns_of_one_product_leave_a_single_claimant() {
        let service = Arc::new(CampaignService::new(Arc::new(
            SlowClaimLookupRepository::default(),
        )));
        let a = service.create("a", 10, None).await.expect("create a");
        let b = service.create("b", 20, None).await.expect("create b");

        let first = {
            let service = Arc::clone(&service);
            let id = a.id.clone();
            tokio::spawn(async move { service.assign_products(&id, &[pid("p1")]).await })
        };
        let second = {
            let service = Arc::clone(&service);
            let id = b.id.clone();
            tokio::spawn(async move { service.assign_products(&id, &[pid("p1")]).await })
        };

        let outcomes = [first.await.expect("join"), second.await.expect("join")];
        let successes = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
        assert_eq!(successes, 1, "exactly one campaign may claim the product");

        let a = service.get(&a.id).await.expect("reload a");
        let b = service.get(&b.id).await.expect("reload b");
        assert!(a.product_ids.is_disjoint(&b.product_ids));
        assert_eq!(a.product_ids.len() + b.product_ids.len(), 1);
    }

    #[tokio::test]
    async fn exclusivity_holds_after_assign_and_unassign_sequences() {
        let service = service();
        let a = service.create("a", 10, None).await.expect("create a");
        let b = service.create("b", 20, None).await.expect("create b");

        service.assign_products(&a.id, &[pid("p1"), pid("p2")]).await.expect("assign a");
        assert!(service.assign_products(&b.id, &[pid("p1")]).await.is_err());
        service.unassign_products(&a.id, &[pid("p1")]).await.expect("unassign p1");
        service.assign_products(&b.id, &[pid("p1")]).await.expect("now assignable");

        let active_a = service.get(&a.id).await.expect("reload a");
        let active_b = service.get(&b.id).await.expect("reload b");
        assert!(active_a.product_ids.is_disjoint(&active_b.product_ids));
    }

    #[tokio::test]
    async fn unassign_unknown_product_removes_nothing() {
        let service = service();
        let a = service.create("a", 10, None).await.expect("create");
        service.assign_products(&a.id, &[pid("p1"), pid("p3")]).await.expect("assign");

        let error = service.unassign_products(&a.id, &[pid("p1"), pid("p2")]).await.unwrap_err();

        assert!(matches!(
            error,
            CampaignError::ProductsNotAssigned(missing) if missing == vec![pid("p2")]
        ));
        let a = service.get(&a.id).await.expect("reload");
        assert_eq!(a.product_ids.len(), 2, "no partial removal of the valid ids");
    }

    #[tokio::test]
    async fn unassign_from_empty_campaign_fails() {
        let service = service();
        let a = service.create("a", 10, None).await.expect("create");

        assert!(matches!(
            service.unassign_products(&a.id, &[pid("p1")]).await.unwrap_err(),
            CampaignError::NoProductsAssigned(_)
        ));
        assert!(matches!(
            service.unassign_all(&a.id).await.unwrap_err(),
            CampaignError::NoProductsAssigned(_)
        ));
    }

    #[tokio::test]
    async fn unassign_all_clears_the_set() {
        let service = service();
        let a = service.create("a", 10, None).await.expect("create");
        service.assign_products(&a.id, &[pid("p1"), pid("p2")]).await.expect("assign");

        let a = service.unassign_all(&a.id).await.expect("unassign all");

        assert!(a.product_ids.is_empty());
    }

    #[tokio::test]
    async fn resolve_discount_takes_the_maximum_across_campaigns() {
        // Exclusivity should make multiple matches unreachable, but the
        // resolver must still answer if the data is in violation.
        let repo = Arc::new(InMemoryCampaignRepository::default());
        let service = CampaignService::new(Arc::clone(&repo) as _);
        let mut low = salespoint_core::Campaign::new("low", 5, None);
        low.assign(&[pid("p1")]);
        let mut high = salespoint_core::Campaign::new("high", 25, None);
        high.assign(&[pid("p1")]);
        repo.save(low).await.expect("save low");
        repo.save(high).await.expect("save high");

        assert_eq!(service.resolve_discount(&pid("p1")).await.expect("resolve"), Some(25));
        assert!(service.campaign_name_for(&pid("p1")).await.expect("name").is_some());
    }

    #[tokio::test]
    async fn resolve_discount_is_none_when_no_campaign_claims_the_product() {
        let service = service();
        service.create("a", 10, None).await.expect("create");

        assert_eq!(service.resolve_discount(&pid("p1")).await.expect("resolve"), None);
        assert_eq!(service.campaign_name_for(&pid("p1")).await.expect("name"), None);
    }

    #[tokio::test]
    async fn deleted_campaign_discount_no_longer_applies() {
        let service = service();
        let a = service.create("a", 10, None).await.expect("create");
        service.assign_products(&a.id, &[pid("p1")]).await.expect("assign");
        service.soft_delete(&a.id).await.expect("delete");

        assert_eq!(service.resolve_discount(&pid("p1")).await.expect("resolve"), None);
        assert!(matches!(
            service.rename(&a.id, "b").await.unwrap_err(),
            CampaignError::NotFound(_)
        ));
    }
}
