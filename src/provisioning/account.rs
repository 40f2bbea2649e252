//! Account Resolver: find-or-create a gateway account per platform username.
//!
//! Lookup and creation keep separate error paths. A failed lookup (other than 404) is a
//! hard error; a failed creation is logged and reported as "no account".

use super::{ProvisionError, Provisioner};
use crate::gateway::{Account, Signup};
use crate::observability::metrics;
use tracing::{debug, info, info_span, warn, Instrument};

const OPERATION: &str = "account";

impl Provisioner {
    /// Return the account id for `username`, signing the user up on a lookup miss
    ///
    /// `Ok(None)` means the account could not be resolved: the lookup answered without an
    /// id, or the signup failed.
    ///
    /// # Errors
    /// Returns an error if the lookup fails with anything other than 404
    pub async fn resolve_or_create_account(
        &self,
        username: &str,
    ) -> Result<Option<String>, ProvisionError> {
        let span = info_span!("maas.provision.account", username = %username);

        async {
            match self.api.find_account_by_username(username).await {
                Ok(Account { id: Some(id) }) => {
                    debug!(account_id = %id, "Found existing gateway account");
                    metrics::record_provisioning(OPERATION, "found");
                    Ok(Some(id))
                }
                Ok(Account { id: None }) => {
                    warn!("Account lookup succeeded without an account id");
                    metrics::record_provisioning(OPERATION, "unresolved");
                    Ok(None)
                }
                Err(e) if e.is_not_found() => Ok(self.sign_up(username).await),
                Err(e) => {
                    metrics::record_provisioning(OPERATION, "error");
                    Err(ProvisionError::from(e))
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn sign_up(&self, username: &str) -> Option<String> {
        let signup = Signup::for_username(username);
        match self.api.create_account(&signup).await {
            Ok(Account { id: Some(id) }) => {
                info!(account_id = %id, "Created gateway account");
                metrics::record_provisioning(OPERATION, "created");
                Some(id)
            }
            Ok(Account { id: None }) => {
                warn!("Signup response carried no user account id");
                metrics::record_provisioning(OPERATION, "unresolved");
                None
            }
            Err(e) => {
                warn!(error = %e, "Failed to create gateway account");
                metrics::record_provisioning(OPERATION, "unresolved");
                None
            }
        }
    }
}
