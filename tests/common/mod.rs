//! Common test utilities
//!
//! Provides rustls setup, configuration builders and an in-memory admin API that
//! behaves like the gateway for the calls the provisioning chain makes.

#![allow(dead_code, reason = "Each test binary uses a different subset of helpers")]

use async_trait::async_trait;
use maas_provisioner::config::AppConfig;
use maas_provisioner::gateway::{
    Account, AdminApi, Application, Feature, GatewayError, Plan, ServiceProxy, Signup,
};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, Once};
use std::time::Duration;

static RUSTLS_INIT: Once = Once::new();

/// Initialize rustls crypto provider for tests
///
/// Uses a `Once` to ensure it's only called once per test binary.
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        // Another test helper may have installed it already
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Configuration for tests, on top of the two required gateway variables
pub fn test_config(api_url: &str, extra: &[(&str, &str)]) -> AppConfig {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("MAAS_API_URL".to_string(), api_url.to_string()),
        ("MAAS_API_KEY".to_string(), "test-access-token".to_string()),
        ("MAAS_REQUEST_TIMEOUT_SECS".to_string(), "5".to_string()),
    ]);
    for (key, value) in extra {
        vars.insert((*key).to_string(), (*value).to_string());
    }
    AppConfig::from_lookup(move |key| vars.get(key).cloned()).expect("valid test configuration")
}

#[derive(Default)]
struct FakeState {
    next_id: u64,
    accounts: HashMap<String, String>,
    applications: HashMap<String, Vec<Application>>,
    plans: Vec<Plan>,
    features: HashMap<String, Vec<Feature>>,
    proxies: HashMap<String, String>,

    fail_lookup: bool,
    lookup_without_id: bool,
    fail_signup: bool,
    signup_without_id: bool,
    applications_missing: bool,
    keyless_creations: bool,
    fail_features_of: Option<String>,
    feature_delays: HashMap<String, Duration>,

    create_account_calls: usize,
    create_application_calls: usize,
    feature_calls: usize,
}

impl FakeState {
    fn next_id(&mut self) -> String {
        self.next_id += 1;
        (1000 + self.next_id).to_string()
    }
}

/// In-memory gateway
#[derive(Default)]
pub struct FakeGateway {
    state: Mutex<FakeState>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake gateway state poisoned")
    }

    /// Plan whose features are `(name, visible)` pairs
    pub fn with_plan(self, plan_id: &str, service_id: &str, features: &[(&str, bool)]) -> Self {
        {
            let mut state = self.state();
            state.plans.push(Plan {
                id: plan_id.to_string(),
                name: Some(format!("plan-{plan_id}")),
                service_id: Some(service_id.to_string()),
            });
            let features = features
                .iter()
                .enumerate()
                .map(|(i, (name, visible))| Feature {
                    id: Some(format!("{plan_id}{i}")),
                    name: (*name).to_string(),
                    system_name: Some((*name).to_string()),
                    visible: *visible,
                })
                .collect();
            state.features.insert(plan_id.to_string(), features);
        }
        self
    }

    /// Plan whose feature listing answers 404
    pub fn with_featureless_plan(self, plan_id: &str, service_id: &str) -> Self {
        self.state().plans.push(Plan {
            id: plan_id.to_string(),
            name: None,
            service_id: Some(service_id.to_string()),
        });
        self
    }

    pub fn with_proxy(self, service_id: &str, endpoint: &str) -> Self {
        self.state()
            .proxies
            .insert(service_id.to_string(), endpoint.to_string());
        self
    }

    pub fn with_account(self, username: &str, account_id: &str) -> Self {
        self.state()
            .accounts
            .insert(username.to_string(), account_id.to_string());
        self
    }

    pub fn with_application(self, account_id: &str, id: &str, name: &str, key: &str) -> Self {
        self.seed_application(account_id, id, name, Some(key))
    }

    /// Application created under a plan that does not use key authentication
    pub fn with_keyless_application(self, account_id: &str, id: &str, name: &str) -> Self {
        self.seed_application(account_id, id, name, None)
    }

    fn seed_application(self, account_id: &str, id: &str, name: &str, key: Option<&str>) -> Self {
        self.state()
            .applications
            .entry(account_id.to_string())
            .or_default()
            .push(Application {
                id: id.to_string(),
                name: name.to_string(),
                user_key: key.map(str::to_string),
                plan_id: None,
            });
        self
    }

    pub fn failing_lookup(self) -> Self {
        self.state().fail_lookup = true;
        self
    }

    /// Lookup answers 200 with an account document lacking an id
    pub fn lookup_without_id(self) -> Self {
        self.state().lookup_without_id = true;
        self
    }

    pub fn failing_signup(self) -> Self {
        self.state().fail_signup = true;
        self
    }

    pub fn signup_without_id(self) -> Self {
        self.state().signup_without_id = true;
        self
    }

    pub fn missing_application_lists(self) -> Self {
        self.state().applications_missing = true;
        self
    }

    /// Created applications carry no user key
    pub fn keyless_creations(self) -> Self {
        self.state().keyless_creations = true;
        self
    }

    /// Delay the feature listing of one plan
    pub fn with_feature_delay(self, plan_id: &str, delay: Duration) -> Self {
        self.state()
            .feature_delays
            .insert(plan_id.to_string(), delay);
        self
    }

    pub fn failing_features_of(self, plan_id: &str) -> Self {
        self.state().fail_features_of = Some(plan_id.to_string());
        self
    }

    /// Drop a plan after setup, e.g. between plan resolution and endpoint lookup
    pub fn remove_plan(&self, plan_id: &str) {
        self.state().plans.retain(|plan| plan.id != plan_id);
    }

    pub fn create_account_calls(&self) -> usize {
        self.state().create_account_calls
    }

    pub fn create_application_calls(&self) -> usize {
        self.state().create_application_calls
    }

    pub fn feature_calls(&self) -> usize {
        self.state().feature_calls
    }

    pub fn applications_of(&self, account_id: &str) -> Vec<Application> {
        self.state()
            .applications
            .get(account_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn account_of(&self, username: &str) -> Option<String> {
        self.state().accounts.get(username).cloned()
    }
}

#[async_trait]
impl AdminApi for FakeGateway {
    async fn find_account_by_username(&self, username: &str) -> Result<Account, GatewayError> {
        let state = self.state();
        if state.fail_lookup {
            return Err(GatewayError::Status {
                operation: "find_account",
                status: 500,
                body: "Internal Server Error".to_string(),
            });
        }
        if state.lookup_without_id {
            return Ok(Account { id: None });
        }
        state
            .accounts
            .get(username)
            .map(|id| Account { id: Some(id.clone()) })
            .ok_or(GatewayError::NotFound {
                operation: "find_account",
            })
    }

    async fn create_account(&self, signup: &Signup) -> Result<Account, GatewayError> {
        let mut state = self.state();
        state.create_account_calls += 1;
        if state.fail_signup {
            return Err(GatewayError::Status {
                operation: "create_account",
                status: 503,
                body: "Service Unavailable".to_string(),
            });
        }
        if state.signup_without_id {
            return Ok(Account { id: None });
        }
        let id = state.next_id();
        state.accounts.insert(signup.username.clone(), id.clone());
        Ok(Account { id: Some(id) })
    }

    async fn list_applications(&self, account_id: &str) -> Result<Vec<Application>, GatewayError> {
        let state = self.state();
        if state.applications_missing {
            return Err(GatewayError::NotFound {
                operation: "list_applications",
            });
        }
        Ok(state
            .applications
            .get(account_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_application(
        &self,
        account_id: &str,
        name: &str,
        plan_id: &str,
    ) -> Result<Application, GatewayError> {
        let mut state = self.state();
        state.create_application_calls += 1;
        let id = state.next_id();
        let application = Application {
            id: id.clone(),
            name: name.to_string(),
            user_key: (!state.keyless_creations).then(|| format!("key-{id}")),
            plan_id: Some(plan_id.to_string()),
        };
        state
            .applications
            .entry(account_id.to_string())
            .or_default()
            .push(application.clone());
        Ok(application)
    }

    async fn delete_application(
        &self,
        account_id: &str,
        application_id: &str,
    ) -> Result<(), GatewayError> {
        let mut state = self.state();
        let apps = state.applications.entry(account_id.to_string()).or_default();
        let before = apps.len();
        apps.retain(|app| app.id != application_id);
        if apps.len() == before {
            return Err(GatewayError::NotFound {
                operation: "delete_application",
            });
        }
        Ok(())
    }

    async fn list_plans(&self) -> Result<Vec<Plan>, GatewayError> {
        Ok(self.state().plans.clone())
    }

    async fn list_plan_features(&self, plan_id: &str) -> Result<Vec<Feature>, GatewayError> {
        let delay = self.state().feature_delays.get(plan_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        state.feature_calls += 1;
        if state.fail_features_of.as_deref() == Some(plan_id) {
            return Err(GatewayError::Status {
                operation: "list_plan_features",
                status: 500,
                body: String::new(),
            });
        }
        state
            .features
            .get(plan_id)
            .cloned()
            .ok_or(GatewayError::NotFound {
                operation: "list_plan_features",
            })
    }

    async fn get_service_proxy(&self, service_id: &str) -> Result<ServiceProxy, GatewayError> {
        self.state()
            .proxies
            .get(service_id)
            .map(|endpoint| ServiceProxy {
                service_id: Some(service_id.to_string()),
                endpoint: Some(endpoint.clone()),
                sandbox_endpoint: None,
            })
            .ok_or(GatewayError::NotFound {
                operation: "get_service_proxy",
            })
    }
}
