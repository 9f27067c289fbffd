/// Group service - read-only access to topical groups
use crate::db::ContentStore;
use crate::error::{AppError, Result};
use crate::middleware::permissions::{require, Action, ResourceKind, Target};
use crate::models::{Actor, Group};
use std::sync::Arc;

const GROUPS: Target<'static> = Target::Collection(ResourceKind::Group);

pub struct GroupService {
    store: Arc<dyn ContentStore>,
}

impl GroupService {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, actor: Option<&Actor>) -> Result<Vec<Group>> {
        require(actor, Action::List, &GROUPS)?;
        self.store.list_groups().await
    }

    pub async fn get(&self, actor: Option<&Actor>, group_id: i64) -> Result<Group> {
        require(actor, Action::Read, &GROUPS)?;
        let group = self
            .store
            .get_group(group_id)
            .await?
            .ok_or(AppError::NotFound)?;
        require(actor, Action::Read, &Target::group(&group))?;
        Ok(group)
    }

    /// Any write through the API. Anonymous callers still get 401 first;
    /// everyone else is refused because groups are managed out of band.
    pub async fn write(&self, actor: Option<&Actor>, action: Action) -> Result<()> {
        require(actor, action, &GROUPS)?;
        // The policy never allows a group write; reaching here is a bug.
        Err(AppError::MethodNotAllowed)
    }
}
