//! Plan Resolver: service name to application plan id.

use super::{ProvisionError, Provisioner};
use crate::gateway::{Feature, Plan};
use crate::observability::metrics;
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, info_span, warn, Instrument};

const OPERATION: &str = "plan";

impl Provisioner {
    /// Resolve the plan that serves `service_name`
    ///
    /// A pinned plan id wins outright. Otherwise the first plan, in gateway list order,
    /// with a visible feature named exactly `service_name` is returned.
    ///
    /// # Errors
    /// Returns [`ProvisionError::ServiceNotConfigured`] when no plan matches, or a gateway
    /// error if listing plans or fetching features fails
    pub async fn resolve_plan_id_for_service(
        &self,
        service_name: &str,
    ) -> Result<String, ProvisionError> {
        if let Some(plan_id) = self.pinned_plans.get(service_name) {
            debug!(service = service_name, plan_id = %plan_id, "Using pinned plan");
            metrics::record_provisioning(OPERATION, "pinned");
            return Ok(plan_id.clone());
        }

        let span = info_span!("maas.provision.plan", service = service_name);
        async {
            let result = self.discover_plan(service_name).await;
            let outcome = match &result {
                Ok(_) => "resolved",
                Err(ProvisionError::ServiceNotConfigured { .. }) => "not_configured",
                Err(_) => "error",
            };
            metrics::record_provisioning(OPERATION, outcome);
            result
        }
        .instrument(span)
        .await
    }

    async fn discover_plan(&self, service_name: &str) -> Result<String, ProvisionError> {
        let plans = self.api.list_plans().await?;
        let features = self.fetch_features(&plans).await?;

        let mut matches = plans
            .iter()
            .zip(&features)
            .filter(|(_, features)| offers_service(features, service_name))
            .map(|(plan, _)| plan.id.as_str());

        let Some(plan_id) = matches.next() else {
            return Err(ProvisionError::ServiceNotConfigured {
                service: service_name.to_string(),
            });
        };

        let others: Vec<&str> = matches.collect();
        if !others.is_empty() {
            warn!(
                plan_id,
                ignored = ?others,
                "Several plans expose this service; using the first in list order"
            );
        }
        debug!(plan_id, "Resolved plan");
        Ok(plan_id.to_string())
    }

    /// Fetch features for every plan concurrently, joined back by plan index
    async fn fetch_features(&self, plans: &[Plan]) -> Result<Vec<Vec<Feature>>, ProvisionError> {
        let mut pending: FuturesUnordered<_> = plans
            .iter()
            .enumerate()
            .map(|(index, plan)| async move {
                (index, self.api.list_plan_features(&plan.id).await)
            })
            .collect();

        let mut by_index: Vec<Vec<Feature>> = vec![Vec::new(); plans.len()];
        while let Some((index, result)) = pending.next().await {
            let features = match result {
                Ok(features) => features,
                Err(e) if e.is_not_found() => Vec::new(),
                Err(e) => return Err(e.into()),
            };
            if let Some(slot) = by_index.get_mut(index) {
                *slot = features;
            }
        }
        Ok(by_index)
    }
}

fn offers_service(features: &[Feature], service_name: &str) -> bool {
    features
        .iter()
        .any(|feature| feature.visible && feature.name == service_name)
}
