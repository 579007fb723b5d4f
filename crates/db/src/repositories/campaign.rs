use std::collections::{HashMap, HashSet};

use sqlx::{sqlite::SqliteRow, Row};

use salespoint_core::domain::campaign::{Campaign, CampaignId};
use salespoint_core::domain::product::ProductId;

use super::{CampaignRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCampaignRepository {
    pool: DbPool,
}

impl SqlCampaignRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load_product_ids(
        &self,
        campaign_id: &CampaignId,
    ) -> Result<HashSet<ProductId>, RepositoryError> {
        let rows = sqlx::query("SELECT product_id FROM campaign_product WHERE campaign_id = ?")
            .bind(&campaign_id.0)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|row| ProductId(row.get("product_id"))).collect())
    }
}

fn campaign_from_row(
    row: &SqliteRow,
    product_ids: HashSet<ProductId>,
) -> Result<Campaign, RepositoryError> {
    let id: String = row.get("id");
    let discount: i64 = row.get("discount_percent");
    let discount_percent = u32::try_from(discount).map_err(|_| {
        RepositoryError::Decode(format!("negative discount_percent for campaign `{id}`"))
    })?;

    Ok(Campaign {
        id: CampaignId(id),
        name: row.get("name"),
        discount_percent,
        description: row.get("description"),
        product_ids,
        deleted: row.get::<i64, _>("deleted") != 0,
    })
}

#[async_trait::async_trait]
impl CampaignRepository for SqlCampaignRepository {
    async fn find_by_id(&self, id: &CampaignId) -> Result<Option<Campaign>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, discount_percent, description, deleted
             FROM campaign
             WHERE id = ? AND deleted = 0",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let product_ids = self.load_product_ids(id).await?;
                campaign_from_row(&row, product_ids).map(Some)
            }
            None => Ok(None),
        }
    }

    async fn find_all_active(&self) -> Result<Vec<Campaign>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, name, discount_percent, description, deleted
             FROM campaign
             WHERE deleted = 0
             ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let membership_rows = sqlx::query(
            "SELECT cp.campaign_id, cp.product_id
             FROM campaign_product cp
             JOIN campaign c ON c.id = cp.campaign_id
             WHERE c.deleted = 0",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut membership: HashMap<String, HashSet<ProductId>> = HashMap::new();
        for row in &membership_rows {
            membership
                .entry(row.get("campaign_id"))
                .or_default()
                .insert(ProductId(row.get("product_id")));
        }

        rows.iter()
            .map(|row| {
                let id: String = row.get("id");
                let product_ids = membership.remove(&id).unwrap_or_default();
                campaign_from_row(row, product_ids)
            })
            .collect()
    }

    async fn find_active_by_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<Campaign>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT c.id, c.name, c.discount_percent, c.description, c.deleted
             FROM campaign c
             JOIN campaign_product cp ON cp.campaign_id = c.id
             WHERE cp.product_id = ? AND c.deleted = 0",
        )
        .bind(&product_id.0)
        .fetch_all(&self.pool)
        .await?;

        let mut campaigns = Vec::with_capacity(rows.len());
        for row in &rows {
            let id = CampaignId(row.get("id"));
            let product_ids = self.load_product_ids(&id).await?;
            campaigns.push(campaign_from_row(row, product_ids)?);
        }
        Ok(campaigns)
    }

    async fn active_name_exists(
        &self,
        name: &str,
        excluding: Option<&CampaignId>,
    ) -> Result<bool, RepositoryError> {
        let row = match excluding {
            Some(excluded) => {
                sqlx::query(
                    "SELECT EXISTS(
                         SELECT 1 FROM campaign WHERE name = ? AND deleted = 0 AND id != ?
                     ) AS present",
                )
                .bind(name)
                .bind(&excluded.0)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT EXISTS(
                         SELECT 1 FROM campaign WHERE name = ? AND deleted = 0
                     ) AS present",
                )
                .bind(name)
                .fetch_one(&self.pool)
                .await?
            }
        };

        Ok(row.get::<i64, _>("present") != 0)
    }

    async fn save(&self, campaign: Campaign) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO campaign (id, name, discount_percent, description, deleted)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 discount_percent = excluded.discount_percent,
                 description = excluded.description,
                 deleted = excluded.deleted",
        )
        .bind(&campaign.id.0)
        .bind(&campaign.name)
        .bind(i64::from(campaign.discount_percent))
        .bind(&campaign.description)
        .bind(i64::from(campaign.deleted))
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM campaign_product WHERE campaign_id = ?")
            .bind(&campaign.id.0)
            .execute(&mut *tx)
            .await?;

        for product_id in &campaign.product_ids {
            sqlx::query("INSERT INTO campaign_product (campaign_id, product_id) VALUES (?, ?)")
                .bind(&campaign.id.0)
                .bind(&product_id.0)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
