//! Application Provisioner and Deprovisioner.

use super::{DeletionOutcome, ProvisionError, Provisioner};
use crate::gateway::Application;
use crate::observability::metrics;
use tracing::{debug, info, info_span, warn, Instrument};

impl Provisioner {
    /// Return the key of application `app_name` for `username`, creating it on a miss
    ///
    /// Re-running with the same arguments never creates a second application once the
    /// first one is listed, whether or not it carries a key. `Ok(None)` means no key could
    /// be produced: the account is unresolvable, the application list is missing, or the
    /// application exists (or was created) without a key.
    ///
    /// # Errors
    /// Returns an error on hard gateway failures or when the service has no plan
    pub async fn resolve_or_create_application(
        &self,
        username: &str,
        app_name: &str,
        service_name: &str,
    ) -> Result<Option<String>, ProvisionError> {
        let span = info_span!(
            "maas.provision.application",
            username = %username,
            app_name = %app_name,
            service = %service_name,
        );

        self.provision_application(username, app_name, service_name)
            .instrument(span)
            .await
    }

    async fn provision_application(
        &self,
        username: &str,
        app_name: &str,
        service_name: &str,
    ) -> Result<Option<String>, ProvisionError> {
        const OPERATION: &str = "application";

        let Some(account_id) = self.resolve_or_create_account(username).await? else {
            metrics::record_provisioning(OPERATION, "no_account");
            return Ok(None);
        };

        let Some(applications) = self.applications_of(&account_id).await? else {
            metrics::record_provisioning(OPERATION, "unresolved");
            return Ok(None);
        };

        if let Some(existing) = find_by_name(applications, app_name) {
            if existing.user_key.is_none() {
                warn!(application_id = %existing.id, "Existing application carries no user key");
                metrics::record_provisioning(OPERATION, "unresolved");
            } else {
                debug!(application_id = %existing.id, "Application already exists");
                metrics::record_provisioning(OPERATION, "found");
            }
            return Ok(existing.user_key);
        }

        let plan_id = self.resolve_plan_id_for_service(service_name).await?;
        let created = self
            .api
            .create_application(&account_id, app_name, &plan_id)
            .await?;
        info!(application_id = %created.id, plan_id = %plan_id, "Created application");

        if created.user_key.is_none() {
            warn!(application_id = %created.id, "Created application carries no user key");
            metrics::record_provisioning(OPERATION, "unresolved");
        } else {
            metrics::record_provisioning(OPERATION, "created");
        }
        Ok(created.user_key)
    }

    /// Delete application `app_name` of `username`
    ///
    /// The account lookup shares find-or-create semantics, so an unknown username gets an
    /// account before the (empty) application list is read.
    ///
    /// # Errors
    /// Returns an error on hard gateway failures, including any failure of the delete call
    pub async fn delete_application(
        &self,
        username: &str,
        app_name: &str,
    ) -> Result<DeletionOutcome, ProvisionError> {
        let span = info_span!(
            "maas.provision.delete_application",
            username = %username,
            app_name = %app_name,
        );
        self.deprovision_application(username, app_name)
            .instrument(span)
            .await
    }

    async fn deprovision_application(
        &self,
        username: &str,
        app_name: &str,
    ) -> Result<DeletionOutcome, ProvisionError> {
        const OPERATION: &str = "delete_application";

        let Some(account_id) = self.resolve_or_create_account(username).await? else {
            metrics::record_provisioning(OPERATION, "no_account");
            return Ok(DeletionOutcome::UserNotFound);
        };

        let target = self
            .applications_of(&account_id)
            .await?
            .and_then(|apps| find_by_name(apps, app_name));
        let Some(application) = target else {
            metrics::record_provisioning(OPERATION, "not_found");
            return Ok(DeletionOutcome::ApplicationNotFound);
        };

        self.api
            .delete_application(&account_id, &application.id)
            .await?;
        info!(application_id = %application.id, "Deleted application");
        metrics::record_provisioning(OPERATION, "deleted");
        Ok(DeletionOutcome::Deleted)
    }

    /// List applications, mapping a 404 to `None`
    async fn applications_of(
        &self,
        account_id: &str,
    ) -> Result<Option<Vec<Application>>, ProvisionError> {
        match self.api.list_applications(account_id).await {
            Ok(applications) => Ok(Some(applications)),
            Err(e) if e.is_not_found() => {
                warn!(account_id, "Application list not found for account");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn find_by_name(applications: Vec<Application>, app_name: &str) -> Option<Application> {
    applications.into_iter().find(|app| app.name == app_name)
}
