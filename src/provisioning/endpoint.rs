//! Endpoint Resolver: service name to the public proxy endpoint.

use super::{EndpointOutcome, ProvisionError, Provisioner};
use crate::gateway::GatewayError;
use crate::observability::metrics;
use tracing::{debug, info_span, warn, Instrument};

const OPERATION: &str = "endpoint";

impl Provisioner {
    /// Resolve the proxy endpoint URL of the service behind `service_name`
    ///
    /// The plan list is fetched again after plan resolution; nothing is cached.
    ///
    /// # Errors
    /// Returns an error when the service has no plan, on gateway failures, or when the
    /// plan or proxy lacks the service id or endpoint
    pub async fn resolve_endpoint_for_service(
        &self,
        service_name: &str,
    ) -> Result<EndpointOutcome, ProvisionError> {
        let span = info_span!("maas.provision.endpoint", service = service_name);

        async {
            let result = self.lookup_endpoint(service_name).await;
            let outcome = match &result {
                Ok(EndpointOutcome::Endpoint(_)) => "resolved",
                Ok(EndpointOutcome::PlanNotFound) => "plan_not_found",
                Err(_) => "error",
            };
            metrics::record_provisioning(OPERATION, outcome);
            result
        }
        .instrument(span)
        .await
    }

    async fn lookup_endpoint(&self, service_name: &str) -> Result<EndpointOutcome, ProvisionError> {
        let plan_id = self.resolve_plan_id_for_service(service_name).await?;

        let plans = self.api.list_plans().await?;
        let Some(plan) = plans.into_iter().find(|plan| plan.id == plan_id) else {
            warn!(plan_id = %plan_id, "Resolved plan is missing from the plan list");
            return Ok(EndpointOutcome::PlanNotFound);
        };

        let service_id = plan.service_id.ok_or_else(|| {
            GatewayError::malformed("list_plans", format!("plan {plan_id} has no service_id"))
        })?;

        let proxy = self.api.get_service_proxy(&service_id).await?;
        let endpoint = proxy.endpoint.ok_or_else(|| {
            GatewayError::malformed(
                "get_service_proxy",
                format!("proxy of service {service_id} has no endpoint"),
            )
        })?;

        debug!(service_id = %service_id, endpoint = %endpoint, "Resolved endpoint");
        Ok(EndpointOutcome::Endpoint(endpoint))
    }
}
