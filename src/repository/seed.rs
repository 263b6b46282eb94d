use anyhow::Result;
use chrono::{Duration, Utc};

use crate::domain::kol::KolProfile;
use crate::repository::Repository;

const PLATFORMS: [&str; 4] = ["TikTok", "YouTube", "Instagram", "Facebook"];
const REGIONS: [&str; 5] = ["TW", "US", "JP", "SG", "MY"];
const CATEGORIES: [&str; 6] = ["Beauty", "Tech", "Food", "Travel", "Gaming", "Fitness"];
const FIRST_NAMES: [&str; 8] = ["Ada", "Ben", "Chloe", "Dev", "Emi", "Finn", "Gia", "Hugo"];

/// Deterministic sample profiles, `index` numbering starting at `start`.
pub fn sample_profiles(start: usize, count: usize) -> Vec<KolProfile> {
    (start..start + count).map(sample_profile).collect()
}

fn sample_profile(index: usize) -> KolProfile {
    let first = FIRST_NAMES[index % FIRST_NAMES.len()];
    let mut kol = KolProfile::new(
        format!("{} {}", first, index),
        format!("@{}{}", first.to_lowercase(), index),
        PLATFORMS[index % PLATFORMS.len()].to_string(),
    );
    kol.region = REGIONS[index % REGIONS.len()].to_string();
    kol.category = CATEGORIES[index % CATEGORIES.len()].to_string();
    kol.followers = (10_000_000 / (index as i64 + 1)) + (index as i64 * 7919) % 1000;
    kol.avg_views = kol.followers / (3 + (index as i64 % 7));
    kol.engagement_rate = 0.01 + (index % 90) as f64 / 1000.0;
    kol.cpm = 4.0 + (index % 25) as f64 * 0.75;
    kol.created_at = Utc::now() - Duration::days((index % 365) as i64);
    kol
}

/// Inserts `count` sample profiles after the rows already present.
pub async fn seed_kol_accounts(repository: &Repository, count: usize) -> Result<usize> {
    let existing = repository.kols.count(&Default::default()).await?;
    let profiles = sample_profiles(existing, count);
    for chunk in profiles.chunks(500) {
        repository.kols.create_many(chunk).await?;
    }
    Ok(profiles.len())
}
