mod common;

use common::{Call, FakeClient, context, context_with_policy, controller};
use telflow_provider::{
    ApiError, ConfigStore, LookupQuery, LookupResolver, ProviderError, ResourceKind,
    SelectionPolicy,
};

fn three_numbers() -> std::sync::Arc<FakeClient> {
    let client = FakeClient::new();
    client.add_phone_number("PN1", "+15005550001", "first");
    client.add_phone_number("PN2", "+15005550002", "second");
    client.add_phone_number("PN3", "+15005550003", "third");
    client
}

#[tokio::test]
async fn test_lookup_by_number_picks_the_matching_candidate() {
    let client = three_numbers();
    let ctx = context(client.clone());

    let data = LookupResolver::new(&ctx)
        .resolve(
            ResourceKind::PhoneNumber,
            &LookupQuery::new().number("+15005550002"),
        )
        .await
        .unwrap();

    assert_eq!(data.id(), Some("PN2"));
    assert_eq!(data.get_str("friendly_name").as_deref(), Some("second"));
    // decoded like any other read
    assert!(data.get_block("voice").is_some());

    match client.calls().as_slice() {
        [Call::ListPhoneNumbers(filter)] => {
            assert_eq!(filter.get("PhoneNumber"), Some("+15005550002"));
        }
        other => panic!("unexpected calls {:?}", other),
    }
}

#[tokio::test]
async fn test_lookup_by_number_without_match_names_only_number() {
    let client = three_numbers();
    let ctx = context(client);

    let err = LookupResolver::new(&ctx)
        .resolve(
            ResourceKind::PhoneNumber,
            &LookupQuery::new().number("+19999999999"),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::NotFound { .. }));
    let message = err.to_string();
    assert!(message.contains("number: +19999999999"));
    assert!(!message.contains("friendly_name"));
}

#[tokio::test]
async fn test_lookup_by_both_criteria_requires_both_to_match() {
    let client = three_numbers();
    let ctx = context(client);

    let err = LookupResolver::new(&ctx)
        .resolve(
            ResourceKind::PhoneNumber,
            &LookupQuery::new().number("+15005550001").friendly_name("second"),
        )
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "unable to find phone number with number: +15005550001 and friendly_name: second"
    );
}

#[tokio::test]
async fn test_lookup_without_required_criteria_makes_no_remote_call() {
    let client = three_numbers();
    let ctx = context(client.clone());
    let resolver = LookupResolver::new(&ctx);

    let err = resolver
        .resolve(ResourceKind::PhoneNumber, &LookupQuery::new().area_code("415"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Validation { .. }));

    let err = resolver
        .resolve(ResourceKind::MessagingService, &LookupQuery::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Validation { .. }));

    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn test_lookup_api_failure_is_not_found() {
    let client = three_numbers();
    client.fail_next("list_phone_numbers", ApiError::other("upstream exploded"));
    let ctx = context(client);

    let err = LookupResolver::new(&ctx)
        .resolve(
            ResourceKind::PhoneNumber,
            &LookupQuery::new().friendly_name("first"),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::NotFound { .. }));
    assert!(err.to_string().contains("upstream exploded"));
}

#[tokio::test]
async fn test_lookup_selection_policy() {
    let client = FakeClient::new();
    client.add_service("MG1", "alerts");
    client.add_service("MG2", "alerts");

    let first = LookupResolver::new(&context(client.clone()))
        .resolve(
            ResourceKind::MessagingService,
            &LookupQuery::new().friendly_name("alerts"),
        )
        .await
        .unwrap();
    assert_eq!(first.id(), Some("MG1"));

    let strict = context_with_policy(client, SelectionPolicy::FailOnMultiple);
    let err = LookupResolver::new(&strict)
        .resolve(
            ResourceKind::MessagingService,
            &LookupQuery::new().friendly_name("alerts"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Ambiguous { .. }));
}

#[tokio::test]
async fn test_lookup_subaccount_exact_name() {
    let client = FakeClient::new();
    client.add_account("AC1", "team");
    client.add_account("AC2", "team-a");

    let data = controller(&client)
        .lookup(
            ResourceKind::Subaccount,
            &LookupQuery::new().friendly_name("team-a"),
        )
        .await
        .unwrap();

    assert_eq!(data.id(), Some("AC2"));
    assert_eq!(data.get_str("status").as_deref(), Some("active"));
}

#[tokio::test]
async fn test_lookup_api_key_is_unsupported() {
    let client = FakeClient::new();
    let err = controller(&client)
        .lookup(ResourceKind::ApiKey, &LookupQuery::new().friendly_name("deploy"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "lookup is not supported for twilio_api_key");
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn test_lookup_checks_criteria_left_out_of_the_filter() {
    let client = FakeClient::new();
    client.add_phone_number("PN1", "+12125550100", "main");
    let ctx = context(client.clone());

    let err = LookupResolver::new(&ctx)
        .resolve(
            ResourceKind::PhoneNumber,
            &LookupQuery::new()
                .friendly_name("main")
                .search("555")
                .area_code("415"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::NotFound { .. }));

    match client.calls().as_slice() {
        [Call::ListPhoneNumbers(filter)] => {
            assert_eq!(filter.get("FriendlyName"), Some("main"));
            assert_eq!(filter.get("PhoneNumber"), Some("555"));
        }
        other => panic!("unexpected calls {:?}", other),
    }

    client.add_phone_number("PN2", "+14155550100", "main");
    let data = LookupResolver::new(&ctx)
        .resolve(
            ResourceKind::PhoneNumber,
            &LookupQuery::new()
                .friendly_name("main")
                .search("555")
                .area_code("415"),
        )
        .await
        .unwrap();
    assert_eq!(data.id(), Some("PN2"));
}

#[tokio::test]
async fn test_lookup_by_number_still_checks_search() {
    let client = FakeClient::new();
    client.add_phone_number("PN9", "+14155550100", "main");
    let ctx = context(client);

    let err = LookupResolver::new(&ctx)
        .resolve(
            ResourceKind::PhoneNumber,
            &LookupQuery::new().number("+14155550100").search("999"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::NotFound { .. }));
}
