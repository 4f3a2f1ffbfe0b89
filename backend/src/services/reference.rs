//! Reference data: the lookup collections every page loads

use sqlx::PgPool;

use crate::error::AppResult;
use crate::feed::ChangeFeed;
use crate::models::ReferenceData;
use crate::services::{BeverageTypeService, RoleService, SiteService};

#[derive(Clone)]
pub struct ReferenceService {
    roles: RoleService,
    sites: SiteService,
    beverage_types: BeverageTypeService,
}

impl ReferenceService {
    pub fn new(db: PgPool, feed: ChangeFeed) -> Self {
        Self {
            roles: RoleService::new(db.clone(), feed.clone()),
            sites: SiteService::new(db.clone(), feed.clone()),
            beverage_types: BeverageTypeService::new(db, feed),
        }
    }

    /// Load roles, sites and beverage types concurrently
    pub async fn load(&self) -> AppResult<ReferenceData> {
        let (roles, sites, beverage_types) = tokio::try_join!(
            self.roles.get_roles(),
            self.sites.get_sites(),
            self.beverage_types.get_beverage_types(),
        )?;

        Ok(ReferenceData {
            roles,
            sites,
            beverage_types,
        })
    }
}
