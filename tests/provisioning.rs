//! Provisioning workflow tests against the in-memory gateway.

mod common;

use common::{test_config, FakeGateway};
use maas_provisioner::gateway::{AdminApi, GatewayError};
use maas_provisioner::provisioning::{
    DeletionOutcome, EndpointOutcome, ProvisionError, Provisioner,
};
use std::sync::Arc;
use std::time::Duration;

fn provisioner(gateway: &Arc<FakeGateway>) -> Provisioner {
    let config = test_config("http://gateway.invalid", &[]);
    Provisioner::new(Arc::clone(gateway) as Arc<dyn AdminApi>, &config.gateway)
}

fn granite_gateway() -> FakeGateway {
    FakeGateway::new()
        .with_plan("10", "100", &[("sdxl", true)])
        .with_plan("11", "110", &[("granite", true), ("code", true)])
        .with_proxy("110", "https://granite.example:443")
}

mod account {
    use super::*;

    #[tokio::test]
    async fn existing_account_is_returned_without_signup() {
        let gateway = Arc::new(FakeGateway::new().with_account("alice", "42"));
        let id = provisioner(&gateway)
            .resolve_or_create_account("alice")
            .await
            .unwrap();
        assert_eq!(id.as_deref(), Some("42"));
        assert_eq!(gateway.create_account_calls(), 0);
    }

    #[tokio::test]
    async fn find_or_create_twice_returns_same_id() {
        let gateway = Arc::new(FakeGateway::new());
        let provisioner = provisioner(&gateway);

        let first = provisioner.resolve_or_create_account("bob").await.unwrap();
        let second = provisioner.resolve_or_create_account("bob").await.unwrap();

        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(gateway.create_account_calls(), 1);
    }

    #[tokio::test]
    async fn lookup_miss_then_signup_returns_new_account_id() {
        let gateway = Arc::new(FakeGateway::new());
        let id = provisioner(&gateway)
            .resolve_or_create_account("carol")
            .await
            .unwrap();
        assert_eq!(id, gateway.account_of("carol"));
    }

    #[tokio::test]
    async fn failed_signup_yields_none_not_error() {
        let gateway = Arc::new(FakeGateway::new().failing_signup());
        let id = provisioner(&gateway)
            .resolve_or_create_account("dave")
            .await
            .unwrap();
        assert_eq!(id, None);
        assert_eq!(gateway.create_account_calls(), 1);
    }

    #[tokio::test]
    async fn signup_without_user_id_yields_none() {
        let gateway = Arc::new(FakeGateway::new().signup_without_id());
        let id = provisioner(&gateway)
            .resolve_or_create_account("erin")
            .await
            .unwrap();
        assert_eq!(id, None);
    }

    #[tokio::test]
    async fn lookup_without_id_yields_none_without_signup() {
        let gateway = Arc::new(FakeGateway::new().lookup_without_id());
        let id = provisioner(&gateway)
            .resolve_or_create_account("gina")
            .await
            .unwrap();
        assert_eq!(id, None);
        assert_eq!(gateway.create_account_calls(), 0);
    }

    #[tokio::test]
    async fn lookup_failure_other_than_not_found_propagates() {
        let gateway = Arc::new(FakeGateway::new().failing_lookup());
        let err = provisioner(&gateway)
            .resolve_or_create_account("frank")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::Gateway(GatewayError::Status { status: 500, .. })
        ));
        assert_eq!(gateway.create_account_calls(), 0);
    }
}

mod plan {
    use super::*;

    #[tokio::test]
    async fn first_plan_in_list_order_wins() {
        let gateway = Arc::new(
            FakeGateway::new()
                .with_plan("1", "100", &[("docling", true)])
                .with_plan("2", "200", &[("granite", true)])
                .with_plan("3", "300", &[("granite", true)]),
        );
        let plan_id = provisioner(&gateway)
            .resolve_plan_id_for_service("granite")
            .await
            .unwrap();
        assert_eq!(plan_id, "2");
        assert_eq!(gateway.feature_calls(), 3);
    }

    #[tokio::test]
    async fn list_order_wins_when_feature_fetches_finish_out_of_order() {
        let gateway = Arc::new(
            FakeGateway::new()
                .with_plan("1", "100", &[("docling", true)])
                .with_plan("2", "200", &[("granite", true)])
                .with_plan("3", "300", &[("granite", true)])
                .with_feature_delay("1", Duration::from_millis(300))
                .with_feature_delay("2", Duration::from_millis(150)),
        );
        let plan_id = provisioner(&gateway)
            .resolve_plan_id_for_service("granite")
            .await
            .unwrap();
        assert_eq!(plan_id, "2");
        assert_eq!(gateway.feature_calls(), 3);
    }

    #[tokio::test]
    async fn invisible_feature_never_matches() {
        let gateway = Arc::new(
            FakeGateway::new()
                .with_plan("1", "100", &[("guard", false)])
                .with_plan("2", "200", &[("guard", true)]),
        );
        let plan_id = provisioner(&gateway)
            .resolve_plan_id_for_service("guard")
            .await
            .unwrap();
        assert_eq!(plan_id, "2");
    }

    #[tokio::test]
    async fn feature_name_must_match_exactly() {
        let gateway = Arc::new(FakeGateway::new().with_plan("1", "100", &[("granite-large", true)]));
        let err = provisioner(&gateway)
            .resolve_plan_id_for_service("granite")
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::ServiceNotConfigured { service } if service == "granite"));
    }

    #[tokio::test]
    async fn features_not_found_counts_as_no_features() {
        let gateway = Arc::new(
            FakeGateway::new()
                .with_featureless_plan("1", "100")
                .with_plan("2", "200", &[("sdxl", true)]),
        );
        let plan_id = provisioner(&gateway)
            .resolve_plan_id_for_service("sdxl")
            .await
            .unwrap();
        assert_eq!(plan_id, "2");
    }

    #[tokio::test]
    async fn other_feature_failures_propagate() {
        let gateway = Arc::new(
            FakeGateway::new()
                .with_plan("1", "100", &[("sdxl", true)])
                .with_plan("2", "200", &[("granite", true)])
                .failing_features_of("2"),
        );
        let err = provisioner(&gateway)
            .resolve_plan_id_for_service("sdxl")
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::Gateway(GatewayError::Status { .. })));
    }

    #[tokio::test]
    async fn pinned_plan_skips_discovery() {
        let gateway = Arc::new(FakeGateway::new().with_plan("1", "100", &[("guard", true)]));
        let config = test_config("http://gateway.invalid", &[("MAAS_GUARD_PLAN_ID", "77")]);
        let provisioner = Provisioner::new(Arc::clone(&gateway) as Arc<dyn AdminApi>, &config.gateway);

        let plan_id = provisioner.resolve_plan_id_for_service("guard").await.unwrap();
        assert_eq!(plan_id, "77");
        assert_eq!(gateway.feature_calls(), 0);
    }

    #[tokio::test]
    async fn empty_plan_list_is_not_configured() {
        let gateway = Arc::new(FakeGateway::new());
        let err = provisioner(&gateway)
            .resolve_plan_id_for_service("granite")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "service_not_configured");
    }
}

mod application {
    use super::*;

    #[tokio::test]
    async fn repeated_check_create_never_duplicates() {
        let gateway = Arc::new(granite_gateway());
        let provisioner = provisioner(&gateway);

        let first = provisioner
            .resolve_or_create_application("alice", "parasol-demo-nb", "granite")
            .await
            .unwrap();
        let second = provisioner
            .resolve_or_create_application("alice", "parasol-demo-nb", "granite")
            .await
            .unwrap();

        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(gateway.create_application_calls(), 1);

        let account_id = gateway.account_of("alice").unwrap();
        let apps = gateway.applications_of(&account_id);
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].plan_id.as_deref(), Some("11"));
    }

    #[tokio::test]
    async fn existing_application_key_is_returned() {
        let gateway = Arc::new(
            granite_gateway()
                .with_account("alice", "42")
                .with_application("42", "7", "parasol-demo-nb", "existing-key"),
        );
        let key = provisioner(&gateway)
            .resolve_or_create_application("alice", "parasol-demo-nb", "granite")
            .await
            .unwrap();
        assert_eq!(key.as_deref(), Some("existing-key"));
        assert_eq!(gateway.create_application_calls(), 0);
        assert_eq!(gateway.feature_calls(), 0);
    }

    #[tokio::test]
    async fn keyless_existing_application_is_never_duplicated() {
        let gateway = Arc::new(
            granite_gateway()
                .keyless_creations()
                .with_account("alice", "42")
                .with_keyless_application("42", "7", "parasol-demo-nb"),
        );
        let provisioner = provisioner(&gateway);

        for _ in 0..3 {
            let key = provisioner
                .resolve_or_create_application("alice", "parasol-demo-nb", "granite")
                .await
                .unwrap();
            assert_eq!(key, None);
        }

        assert_eq!(gateway.create_application_calls(), 0);
        assert_eq!(gateway.feature_calls(), 0);
        assert_eq!(gateway.applications_of("42").len(), 1);
    }

    #[tokio::test]
    async fn keyless_created_application_is_reused() {
        let gateway = Arc::new(
            granite_gateway()
                .keyless_creations()
                .with_account("alice", "42"),
        );
        let provisioner = provisioner(&gateway);

        for _ in 0..3 {
            let key = provisioner
                .resolve_or_create_application("alice", "parasol-demo-nb", "granite")
                .await
                .unwrap();
            assert_eq!(key, None);
        }

        assert_eq!(gateway.create_application_calls(), 1);
        let apps = gateway.applications_of("42");
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].name, "parasol-demo-nb");
    }

    #[tokio::test]
    async fn unresolvable_account_short_circuits() {
        let gateway = Arc::new(granite_gateway().failing_signup());
        let key = provisioner(&gateway)
            .resolve_or_create_application("zoe", "parasol-demo-nb", "granite")
            .await
            .unwrap();
        assert_eq!(key, None);
        assert_eq!(gateway.create_application_calls(), 0);
    }

    #[tokio::test]
    async fn missing_application_list_yields_none() {
        let gateway = Arc::new(
            granite_gateway()
                .with_account("alice", "42")
                .missing_application_lists(),
        );
        let key = provisioner(&gateway)
            .resolve_or_create_application("alice", "parasol-demo-nb", "granite")
            .await
            .unwrap();
        assert_eq!(key, None);
        assert_eq!(gateway.create_application_calls(), 0);
    }

    #[tokio::test]
    async fn unknown_service_is_a_hard_error() {
        let gateway = Arc::new(granite_gateway().with_account("alice", "42"));
        let err = provisioner(&gateway)
            .resolve_or_create_application("alice", "parasol-demo-nb-guard", "guard")
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::ServiceNotConfigured { .. }));
        assert_eq!(gateway.create_application_calls(), 0);
    }

    #[tokio::test]
    async fn delete_then_check_create_issues_new_application() {
        let gateway = Arc::new(granite_gateway());
        let provisioner = provisioner(&gateway);

        let first = provisioner
            .resolve_or_create_application("alice", "parasol-demo-nb", "granite")
            .await
            .unwrap();
        let account_id = gateway.account_of("alice").unwrap();
        let first_id = gateway.applications_of(&account_id)[0].id.clone();

        let outcome = provisioner
            .delete_application("alice", "parasol-demo-nb")
            .await
            .unwrap();
        assert_eq!(outcome, DeletionOutcome::Deleted);
        assert!(gateway.applications_of(&account_id).is_empty());

        let second = provisioner
            .resolve_or_create_application("alice", "parasol-demo-nb", "granite")
            .await
            .unwrap();
        let second_id = gateway.applications_of(&account_id)[0].id.clone();

        assert_ne!(first, second);
        assert_ne!(first_id, second_id);
        assert_eq!(gateway.create_application_calls(), 2);
    }

    #[tokio::test]
    async fn delete_reports_missing_user_and_application() {
        let gateway = Arc::new(FakeGateway::new().failing_signup());
        let outcome = provisioner(&gateway)
            .delete_application("ghost", "parasol-demo-nb")
            .await
            .unwrap();
        assert_eq!(outcome, DeletionOutcome::UserNotFound);
        assert_eq!(outcome.message(), "user not found");

        let gateway = Arc::new(FakeGateway::new().with_account("alice", "42"));
        let outcome = provisioner(&gateway)
            .delete_application("alice", "parasol-demo-nb")
            .await
            .unwrap();
        assert_eq!(outcome, DeletionOutcome::ApplicationNotFound);

        let gateway = Arc::new(
            FakeGateway::new()
                .with_account("alice", "42")
                .missing_application_lists(),
        );
        let outcome = provisioner(&gateway)
            .delete_application("alice", "parasol-demo-nb")
            .await
            .unwrap();
        assert_eq!(outcome, DeletionOutcome::ApplicationNotFound);
    }
}

mod endpoint {
    use super::*;

    #[tokio::test]
    async fn resolves_proxy_endpoint_of_matching_plan() {
        let gateway = Arc::new(granite_gateway());
        let outcome = provisioner(&gateway)
            .resolve_endpoint_for_service("granite")
            .await
            .unwrap();
        assert_eq!(
            outcome,
            EndpointOutcome::Endpoint("https://granite.example:443".to_string())
        );
    }

    #[tokio::test]
    async fn no_visible_feature_is_a_hard_error() {
        let gateway = Arc::new(
            granite_gateway().with_plan("12", "120", &[("guard", false)]),
        );
        let err = provisioner(&gateway)
            .resolve_endpoint_for_service("guard")
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::ServiceNotConfigured { .. }));
    }

    #[tokio::test]
    async fn pinned_plan_missing_from_list_is_plan_not_found() {
        let gateway = Arc::new(granite_gateway());
        let config = test_config("http://gateway.invalid", &[("MAAS_GRANITE_PLAN_ID", "999")]);
        let provisioner = Provisioner::new(Arc::clone(&gateway) as Arc<dyn AdminApi>, &config.gateway);

        let outcome = provisioner
            .resolve_endpoint_for_service("granite")
            .await
            .unwrap();
        assert_eq!(outcome, EndpointOutcome::PlanNotFound);
        assert_eq!(outcome.into_message(), "ApplicationPlan not found");
    }

    #[tokio::test]
    async fn missing_proxy_propagates() {
        let gateway = Arc::new(FakeGateway::new().with_plan("1", "100", &[("docling", true)]));
        let err = provisioner(&gateway)
            .resolve_endpoint_for_service("docling")
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::Gateway(GatewayError::NotFound { .. })));
    }

    #[tokio::test]
    async fn removed_plan_stops_resolving() {
        let gateway = Arc::new(granite_gateway());
        let provisioner = provisioner(&gateway);

        assert!(provisioner
            .resolve_endpoint_for_service("granite")
            .await
            .unwrap()
            .endpoint()
            .is_some());
        assert_eq!(gateway.feature_calls(), 2);

        gateway.remove_plan("11");
        let err = provisioner
            .resolve_endpoint_for_service("granite")
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::ServiceNotConfigured { .. }));
    }
}
