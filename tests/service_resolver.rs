use eventgate::{DiscoveredWorkload, ServiceKeyResolver};
use std::sync::Arc;
use std::thread;

fn resolver_with(workloads: Vec<DiscoveredWorkload>) -> ServiceKeyResolver {
    let resolver = ServiceKeyResolver::new();
    for workload in workloads {
        resolver.record_workload(workload);
    }
    resolver
}

#[test]
fn service_key_is_namespace_kind_name() {
    let workload = DiscoveredWorkload::new("Deployment", "api", "prod");
    assert_eq!(workload.service_key(), "prod/Deployment/api");
}

#[test]
fn exact_name_match_wins() {
    let resolver = resolver_with(vec![
        DiscoveredWorkload::new("Deployment", "payments", "prod"),
        DiscoveredWorkload::new("Deployment", "payments-api", "prod"),
    ]);
    assert_eq!(
        resolver.guess_service_key("payments-api", "prod"),
        Some("prod/Deployment/payments-api".to_string())
    );
}

#[test]
fn longest_claiming_workload_wins_for_derived_names() {
    let resolver = resolver_with(vec![
        DiscoveredWorkload::new("Deployment", "payments", "prod"),
        DiscoveredWorkload::new("Deployment", "payments-api", "prod"),
    ]);
    assert_eq!(
        resolver.guess_service_key("payments-api-7d9f5-xkq2w", "prod"),
        Some("prod/Deployment/payments-api".to_string())
    );
}

#[test]
fn derived_names_must_extend_across_a_dash() {
    let resolver = resolver_with(vec![DiscoveredWorkload::new(
        "Deployment",
        "payments",
        "prod",
    )]);
    assert_eq!(resolver.guess_service_key("paymentsapi", "prod"), None);
    assert_eq!(
        resolver.guess_service_key("payments-7d9f5", "prod"),
        Some("prod/Deployment/payments".to_string())
    );
}

#[test]
fn namespaces_are_isolated() {
    let resolver = resolver_with(vec![DiscoveredWorkload::new(
        "Deployment",
        "payments",
        "prod",
    )]);
    assert_eq!(resolver.guess_service_key("payments", "staging"), None);
}

#[test]
fn unknown_objects_resolve_to_none() {
    let resolver = ServiceKeyResolver::new();
    assert_eq!(resolver.guess_service_key("pod-1", "ns-a"), None);
}

#[test]
fn forget_removes_the_workload() {
    let resolver = resolver_with(vec![DiscoveredWorkload::new(
        "StatefulSet",
        "etcd",
        "kube-system",
    )]);
    assert_eq!(resolver.workload_count(), 1);

    resolver.forget_workload("etcd", "kube-system");
    assert_eq!(resolver.workload_count(), 0);
    assert_eq!(resolver.guess_service_key("etcd-0", "kube-system"), None);
}

#[test]
fn recording_the_same_name_replaces_the_entry() {
    let resolver = resolver_with(vec![DiscoveredWorkload::new("Deployment", "api", "prod")]);
    resolver.record_workload(DiscoveredWorkload::new("StatefulSet", "api", "prod"));

    assert_eq!(resolver.workload_count(), 1);
    assert_eq!(
        resolver.guess_service_key("api", "prod"),
        Some("prod/StatefulSet/api".to_string())
    );
}

#[test]
fn lookups_race_safely_with_discovery_updates() {
    let resolver = Arc::new(ServiceKeyResolver::new());
    resolver.record_workload(DiscoveredWorkload::new("Deployment", "stable", "prod"));

    let writer = {
        let resolver = Arc::clone(&resolver);
        thread::spawn(move || {
            for idx in 0..200u32 {
                let name = format!("churn-{}", idx % 4);
                resolver.record_workload(DiscoveredWorkload::new("Deployment", &name, "prod"));
                resolver.forget_workload(&name, "prod");
            }
        })
    };
    let reader = {
        let resolver = Arc::clone(&resolver);
        thread::spawn(move || {
            for _ in 0..200 {
                assert_eq!(
                    resolver.guess_service_key("stable-7d9f5", "prod"),
                    Some("prod/Deployment/stable".to_string())
                );
            }
        })
    };

    writer.join().unwrap();
    reader.join().unwrap();
    assert_eq!(resolver.workload_count(), 1);
}
