//! Catalog backfills: enrich already-stored places with fields that were not
//! collected when they were first discovered.
//!
//! Progress is tracked in a per-field `migration:{field}` set, so reruns are
//! idempotent and pick up where the previous batch stopped.

use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use crate::cache::keys::parse_place_detail_key;
use crate::cache::PlaceCache;
use crate::maps::models::DetailsResult;
use crate::maps::{DetailField, SearchClient};
use crate::poi::Place;

use super::{PoiSearcher, SearchError};

/// Places updated per migration call.
pub const MIGRATION_BATCH_SIZE: usize = 300;

#[derive(Debug, Serialize)]
pub struct MigrationSummary {
    pub field: &'static str,
    pub updated: usize,
    pub remaining: usize,
    pub total_places: usize,
}

impl PoiSearcher {
    /// Backfills `user_ratings_total` on one batch of places.
    pub async fn add_user_ratings_total(&self) -> Result<MigrationSummary, SearchError> {
        self.add_data_field(DetailField::UserRatingsTotal, MIGRATION_BATCH_SIZE, |place, details| {
            if let Some(total) = details.user_ratings_total {
                place.set_user_ratings_total(total);
            }
        })
        .await
    }

    /// Backfills `url` on one batch of places.
    pub async fn add_url(&self) -> Result<MigrationSummary, SearchError> {
        self.add_data_field(DetailField::Url, MIGRATION_BATCH_SIZE, |place, details| {
            if !details.url.is_empty() {
                place.set_url(details.url.clone());
            }
        })
        .await
    }

    /// Generic backfill: find places not yet migrated for `field`, fetch the
    /// detail record for a batch of them concurrently and apply the update.
    /// Detail or write failures skip the place; the migration set already
    /// marks it, so a failed place is retried only by clearing the set.
    async fn add_data_field(
        &self,
        field: DetailField,
        batch_size: usize,
        apply: fn(&mut Place, &DetailsResult),
    ) -> Result<MigrationSummary, SearchError> {
        let detail_keys = self.cache().place_detail_keys().await?;
        let total_places = detail_keys.len();

        let mut pending = Vec::new();
        for key in detail_keys {
            let Some((category, place_id)) = parse_place_detail_key(&key) else {
                continue;
            };
            let place_id = place_id.to_string();
            if !self.cache().is_place_migrated(field.as_str(), &place_id).await? {
                pending.push((key, category, place_id));
            }
        }
        info!(
            field = field.as_str(),
            pending = pending.len(),
            batch = batch_size,
            "data migration starting"
        );

        let batch = &pending[..pending.len().min(batch_size)];
        for (_, _, place_id) in batch {
            self.cache()
                .mark_place_migrated(field.as_str(), place_id)
                .await?;
        }

        let fields = [field];
        let lookups = batch
            .iter()
            .map(|(_, _, place_id)| self.maps().place_details(place_id, &fields));
        let details = join_all(lookups).await;

        let writes = batch.iter().zip(details).map(|((key, category, place_id), result)| {
            let category = *category;
            async move {
                let details = match result {
                    Ok(details) => details,
                    Err(err) => {
                        warn!(place_id = %place_id, error = %err, "migration detail lookup failed");
                        return false;
                    }
                };
                let place = match self.cache().get_place_by_key(key).await {
                    Ok(Some(place)) => place,
                    Ok(None) => return false,
                    Err(err) => {
                        warn!(place_id = %place_id, error = %err, "migration read failed");
                        return false;
                    }
                };
                let mut place = place;
                apply(&mut place, &details);
                match self.cache().set_place(category, &place).await {
                    Ok(()) => true,
                    Err(err) => {
                        warn!(place_id = %place_id, error = %err, "migration write failed");
                        false
                    }
                }
            }
        });
        let updated = join_all(writes).await.into_iter().filter(|ok| *ok).count();

        let remaining = pending.len().saturating_sub(batch.len());
        info!(
            field = field.as_str(),
            updated,
            remaining,
            total_places,
            "data migration batch complete"
        );
        Ok(MigrationSummary {
            field: field.as_str(),
            updated,
            remaining,
            total_places,
        })
    }
}
