use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::domain::kol::{KolFilters, KolProfile};
use crate::services::error_handling::ErrorContext;

const KOL_COLUMNS_SQL: &str = "id, name, account, platform, region, category, followers, \
     avg_views, engagement_rate, cpm, created_at";

#[derive(Clone)]
pub struct KolRepository {
    pool: Arc<SqlitePool>,
}

impl KolRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    pub async fn create(&self, kol: &KolProfile) -> Result<()> {
        insert_kol(kol).execute(self.pool.as_ref()).await?;
        Ok(())
    }

    /// Inserts every profile in one transaction.
    pub async fn create_many(&self, kols: &[KolProfile]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for kol in kols {
            insert_kol(kol).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<KolProfile>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM kol_accounts WHERE id = ?",
            KOL_COLUMNS_SQL
        ))
        .bind(id.to_string())
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(row_to_kol).transpose()
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM kol_accounts WHERE id = ?")
            .bind(id.to_string())
            .execute(self.pool.as_ref())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// One page of KOLs matching `filters`, largest audience first.
    #[instrument(skip(self))]
    pub async fn list_page(
        &self,
        filters: &KolFilters,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<KolProfile>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM kol_accounts WHERE 1=1",
            KOL_COLUMNS_SQL
        ));
        push_filters(&mut query, filters);
        query.push(" ORDER BY followers DESC, id ASC LIMIT ");
        query.push_bind(limit as i64);
        query.push(" OFFSET ");
        query.push_bind(offset as i64);

        let rows = ErrorContext::new("list_kol_page")
            .with_detail("offset", offset)
            .with_detail("limit", limit)
            .wrap(
                query
                    .build()
                    .fetch_all(self.pool.as_ref())
                    .await
                    .map_err(anyhow::Error::from),
            )?;

        rows.into_iter().map(row_to_kol).collect()
    }

    #[instrument(skip(self))]
    pub async fn count(&self, filters: &KolFilters) -> Result<usize> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM kol_accounts WHERE 1=1");
        push_filters(&mut query, filters);

        let total: i64 = query
            .build_query_scalar()
            .fetch_one(self.pool.as_ref())
            .await?;
        Ok(total.max(0) as usize)
    }
}

fn insert_kol(kol: &KolProfile) -> sqlx::query::Query<'_, Sqlite, sqlx::sqlite::SqliteArguments<'_>> {
    sqlx::query(
        r#"
        INSERT INTO kol_accounts (
            id, name, account, platform, region, category, followers,
            avg_views, engagement_rate, cpm, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(kol.id.to_string())
    .bind(&kol.name)
    .bind(&kol.account)
    .bind(&kol.platform)
    .bind(&kol.region)
    .bind(&kol.category)
    .bind(kol.followers)
    .bind(kol.avg_views)
    .bind(kol.engagement_rate)
    .bind(kol.cpm)
    .bind(kol.created_at.to_rfc3339())
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filters: &KolFilters) {
    if let Some(platform) = &filters.platform {
        query.push(" AND platform = ");
        query.push_bind(platform.clone());
    }

    if let Some(region) = &filters.region {
        query.push(" AND region = ");
        query.push_bind(region.clone());
    }

    if let Some(search) = &filters.search {
        let pattern = format!("%{}%", escape_like(search.trim()));
        query.push(" AND (name LIKE ");
        query.push_bind(pattern.clone());
        query.push(" ESCAPE '\\' OR account LIKE ");
        query.push_bind(pattern);
        query.push(" ESCAPE '\\')");
    }
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn row_to_kol(row: sqlx::sqlite::SqliteRow) -> Result<KolProfile> {
    Ok(KolProfile {
        id: Uuid::parse_str(row.get("id"))?,
        name: row.get("name"),
        account: row.get("account"),
        platform: row.get("platform"),
        region: row.get("region"),
        category: row.get("category"),
        followers: row.get("followers"),
        avg_views: row.get("avg_views"),
        engagement_rate: row.get("engagement_rate"),
        cpm: row.get("cpm"),
        created_at: DateTime::parse_from_rfc3339(row.get("created_at"))?.with_timezone(&Utc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::database::init_test_database;

    async fn setup() -> KolRepository {
        let pool = init_test_database().await.unwrap();
        KolRepository::new(Arc::new(pool))
    }

    fn kol(name: &str, platform: &str, region: &str, followers: i64) -> KolProfile {
        let mut kol = KolProfile::new(
            name.to_string(),
            format!("@{}", name.to_lowercase()),
            platform.to_string(),
        );
        kol.region = region.to_string();
        kol.category = "Beauty".to_string();
        kol.followers = followers;
        kol
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = setup().await;
        let mut profile = kol("Mina", "TikTok", "TW", 120_000);
        profile.engagement_rate = 0.061;
        profile.cpm = 11.25;

        repo.create(&profile).await.unwrap();

        let loaded = repo.get(profile.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Mina");
        assert_eq!(loaded.account, "@mina");
        assert_eq!(loaded.followers, 120_000);
        assert_eq!(loaded.engagement_rate, 0.061);
        assert_eq!(loaded.created_at.timestamp(), profile.created_at.timestamp());

        assert!(repo.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = setup().await;
        let profile = kol("Leo", "YouTube", "US", 10);
        repo.create(&profile).await.unwrap();

        assert!(repo.delete(profile.id).await.unwrap());
        assert!(!repo.delete(profile.id).await.unwrap());
        assert_eq!(repo.count(&KolFilters::default()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_page_orders_by_followers() {
        let repo = setup().await;
        repo.create_many(&[
            kol("Small", "TikTok", "TW", 1_000),
            kol("Large", "YouTube", "US", 900_000),
            kol("Medium", "Instagram", "TW", 50_000),
        ])
        .await
        .unwrap();

        let all = KolFilters::default();
        let first = repo.list_page(&all, 0, 2).await.unwrap();
        let names: Vec<_> = first.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, vec!["Large", "Medium"]);

        let second = repo.list_page(&all, 2, 2).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].name, "Small");

        assert!(repo.list_page(&all, 10, 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_filters() {
        let repo = setup().await;
        repo.create_many(&[
            kol("Ada", "TikTok", "TW", 3_000),
            kol("Adam", "YouTube", "US", 2_000),
            kol("Bea", "TikTok", "US", 1_000),
        ])
        .await
        .unwrap();

        let tiktok = KolFilters::default().with_platform("TikTok");
        assert_eq!(repo.count(&tiktok).await.unwrap(), 2);

        let tiktok_us = tiktok.clone().with_region("US");
        let rows = repo.list_page(&tiktok_us, 0, 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Bea");

        let search = KolFilters::default().with_search("ADA");
        assert_eq!(repo.count(&search).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let repo = setup().await;
        repo.create_many(&[kol("100%Real", "TikTok", "TW", 5), kol("Other", "TikTok", "TW", 4)])
            .await
            .unwrap();

        let search = KolFilters::default().with_search("%");
        let rows = repo.list_page(&search, 0, 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "100%Real");
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("a_b%c\\d"), "a\\_b\\%c\\\\d");
        assert_eq!(escape_like("plain"), "plain");
    }
}
