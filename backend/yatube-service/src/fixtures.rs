/// Out-of-band seeding of users and groups
///
/// Groups and accounts have no HTTP write path. A JSON fixture file named by
/// `YATUBE_FIXTURES` is applied once at startup; entries that already exist
/// are skipped.
use crate::db::ContentStore;
use crate::error::AppError;
use crate::models::NewGroup;
use crate::services::AuthService;
use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
pub struct Fixtures {
    #[serde(default)]
    pub users: Vec<UserFixture>,
    #[serde(default)]
    pub groups: Vec<NewGroup>,
}

#[derive(Debug, Deserialize)]
pub struct UserFixture {
    pub username: String,
    pub password: String,
}

/// Counts of what a fixture run actually inserted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub groups: usize,
    pub skipped: usize,
}

impl Fixtures {
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        serde_json::from_str(raw).context("invalid fixture document")
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fixtures from {}", path.display()))?;
        Self::from_json(&raw)
    }

    pub async fn apply(
        &self,
        auth: &AuthService,
        content: &dyn ContentStore,
    ) -> anyhow::Result<SeedReport> {
        let mut report = SeedReport::default();

        for user in &self.users {
            match auth.register(&user.username, &user.password).await {
                Ok(actor) => {
                    tracing::info!(user_id = actor.id, username = %actor.username, "seeded user");
                    report.users += 1;
                }
                Err(AppError::Conflict(_)) => {
                    tracing::info!(username = %user.username, "user already exists, skipping");
                    report.skipped += 1;
                }
                Err(e) => {
                    return Err(anyhow::Error::new(e)
                        .context(format!("failed to seed user {}", user.username)))
                }
            }
        }

        for group in &self.groups {
            match content.create_group(group.clone()).await {
                Ok(created) => {
                    tracing::info!(group_id = created.id, slug = %created.slug, "seeded group");
                    report.groups += 1;
                }
                Err(AppError::Conflict(_)) => {
                    tracing::info!(slug = %group.slug, "group already exists, skipping");
                    report.skipped += 1;
                }
                Err(e) => {
                    return Err(anyhow::Error::new(e)
                        .context(format!("failed to seed group {}", group.slug)))
                }
            }
        }

        Ok(report)
    }
}
