//! Service wiring
//!
//! Builds the shared [`BaseResource`] and one channel per resource once, and
//! hands them to the facades.

use crate::client::{BaseResource, HttpClient};
use crate::config::ApiConfig;
use crate::resources::{
    system, taxonomy_terms, user, views, Endpoint, SystemChannel, SystemResource, TaxonomyTermsChannel,
    TaxonomyTermsResource, UserChannel, UserResource, ViewsChannel, ViewsResource,
};
use anyhow::Result;
use std::sync::Arc;

/// All resource facades of one Services endpoint
#[derive(Clone)]
pub struct Services {
    pub system: SystemResource,
    pub user: UserResource,
    pub taxonomy_terms: TaxonomyTermsResource,
    pub views: ViewsResource,
}

impl Services {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        config.validate()?;
        let http = HttpClient::new(config.timeout(), &config.user_agent)?;
        tracing::debug!("Services endpoint: {}", config.base_url());
        Ok(Self::from_parts(BaseResource::new(http), Endpoint::new(&config.base_url())))
    }

    pub fn from_parts(base: BaseResource, endpoint: Endpoint) -> Self {
        Self {
            system: SystemResource::new(
                base.clone(),
                endpoint.clone(),
                Arc::new(SystemChannel::new(system::RESOURCE_PATH)),
            ),
            user: UserResource::new(
                base.clone(),
                endpoint.clone(),
                Arc::new(UserChannel::new(user::RESOURCE_PATH)),
            ),
            taxonomy_terms: TaxonomyTermsResource::new(
                base.clone(),
                endpoint.clone(),
                Arc::new(TaxonomyTermsChannel::new(taxonomy_terms::RESOURCE_PATH)),
            ),
            views: ViewsResource::new(base, endpoint, Arc::new(ViewsChannel::new(views::RESOURCE_PATH))),
        }
    }
}
