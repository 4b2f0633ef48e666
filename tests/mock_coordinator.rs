//! Exercises the [`Coordinator`] public contract against
//! [`MockCoordinator`] — everything that doesn't require a live
//! coordination service.

use std::collections::HashMap;

use kgc_core::config::ZookeeperConfig;
use kgc_core::coordinator::mock::MockCoordinator;
use kgc_core::coordinator::{Coordinator, INVALID_OFFSET};
use kgc_core::model::{ConsumerThreadId, DeployedTopics, Subscription, TopicAndPartition};

fn mock() -> MockCoordinator {
    MockCoordinator::new(ZookeeperConfig::default())
}

#[tokio::test]
async fn register_then_read_back_consumer_info() {
    let coord = mock();
    let mut subscription = HashMap::new();
    subscription.insert("orders".to_string(), 2);

    coord.register_consumer("c0", "g", subscription.clone(), Subscription::Static).await.unwrap();

    let info = coord.get_consumer_info("c0", "g").await.unwrap();
    assert_eq!(info.subscription, subscription);
    assert_eq!(info.pattern, Subscription::Static);
    assert_eq!(info.version, 1);
}

#[tokio::test]
async fn deregister_removes_the_registration() {
    let coord = mock();
    coord.register_consumer("c0", "g", HashMap::new(), Subscription::Static).await.unwrap();
    coord.deregister_consumer("c0", "g").await.unwrap();
    assert!(coord.get_consumer_info("c0", "g").await.is_err());
}

#[tokio::test]
async fn get_consumers_in_group_is_sorted() {
    let coord = mock();
    for id in ["c2", "c0", "c1"] {
        coord.register_consumer(id, "g", HashMap::new(), Subscription::Static).await.unwrap();
    }
    let members = coord.get_consumers_in_group("g").await.unwrap();
    assert_eq!(members, vec!["c0", "c1", "c2"]);
}

#[tokio::test]
async fn get_consumers_per_topic_folds_and_sorts_by_thread_id() {
    let coord = mock();
    let mut sub0 = HashMap::new();
    sub0.insert("orders".to_string(), 2);
    let mut sub1 = HashMap::new();
    sub1.insert("orders".to_string(), 1);

    coord.register_consumer("c1", "g", sub0, Subscription::Static).await.unwrap();
    coord.register_consumer("c0", "g", sub1, Subscription::Static).await.unwrap();

    let per_topic = coord.get_consumers_per_topic("g", false).await.unwrap();
    let threads = &per_topic["orders"];

    assert_eq!(
        threads,
        &vec![
            ConsumerThreadId::new("c0", 0),
            ConsumerThreadId::new("c1", 0),
            ConsumerThreadId::new("c1", 1),
        ]
    );
}

#[tokio::test]
async fn get_consumers_per_topic_excludes_internal_consumers() {
    let coord = mock();
    let mut sub = HashMap::new();
    sub.insert("orders".to_string(), 1);

    coord.register_consumer("__internal", "g", sub.clone(), Subscription::Static).await.unwrap();
    coord.register_consumer("c0", "g", sub, Subscription::Static).await.unwrap();

    let per_topic = coord.get_consumers_per_topic("g", true).await.unwrap();
    assert_eq!(per_topic["orders"], vec![ConsumerThreadId::new("c0", 0)]);
}

// Two sessions race the same ownership node; exactly one wins.
#[tokio::test]
async fn claim_contention_exactly_one_winner() {
    let a = mock();
    let b = a.fork();

    let thread_a = ConsumerThreadId::new("c0", 0);
    let thread_b = ConsumerThreadId::new("c1", 0);

    let won_a = a.claim_partition_ownership("g", "orders", 0, &thread_a).await.unwrap();
    let won_b = b.claim_partition_ownership("g", "orders", 0, &thread_b).await.unwrap();

    assert!(won_a);
    assert!(!won_b);
}

// Claim is idempotent-up-to-contention: a second call from the same
// thread after the first win reports contention, not a second success.
#[tokio::test]
async fn second_claim_from_same_thread_reports_contention() {
    let coord = mock();
    let thread = ConsumerThreadId::new("c0", 0);

    assert!(coord.claim_partition_ownership("g", "orders", 0, &thread).await.unwrap());
    assert!(!coord.claim_partition_ownership("g", "orders", 0, &thread).await.unwrap());
}

#[tokio::test]
async fn release_then_reclaim_by_a_different_thread_succeeds() {
    let coord = mock();
    let thread_a = ConsumerThreadId::new("c0", 0);
    let thread_b = ConsumerThreadId::new("c1", 0);

    assert!(coord.claim_partition_ownership("g", "orders", 0, &thread_a).await.unwrap());
    coord.release_partition_ownership("g", "orders", 0).await.unwrap();
    assert!(coord.claim_partition_ownership("g", "orders", 0, &thread_b).await.unwrap());
}

#[tokio::test]
async fn releasing_an_already_missing_ownership_node_is_a_success() {
    let coord = mock();
    coord.release_partition_ownership("g", "orders", 0).await.unwrap();
}

// Missing offset returns the sentinel with no error.
#[tokio::test]
async fn missing_offset_returns_invalid_offset_sentinel() {
    let coord = mock();
    let tp = TopicAndPartition::new("t", 7);
    let offset = coord.get_offset_for_topic_partition("g", &tp).await.unwrap();
    assert_eq!(offset, INVALID_OFFSET);
}

#[tokio::test]
async fn commit_offset_then_read_back_round_trips_exactly() {
    let coord = mock();
    let tp = TopicAndPartition::new("t", 3);
    coord.commit_offset("g", &tp, 12345).await.unwrap();
    assert_eq!(coord.get_offset_for_topic_partition("g", &tp).await.unwrap(), 12345);

    // Last-writer-wins: a second commit overwrites, no monotonicity check.
    coord.commit_offset("g", &tp, 1).await.unwrap();
    assert_eq!(coord.get_offset_for_topic_partition("g", &tp).await.unwrap(), 1);
}

// Deploy+notify roundtrip.
#[tokio::test]
async fn deploy_topics_then_get_new_deployed_topics_roundtrips() {
    let coord = mock();
    let mut payload = serde_json::Map::new();
    payload.insert("topics".to_string(), serde_json::json!(["new-topic"]));
    let deployed = DeployedTopics::new(payload.clone());

    coord.deploy_topics("g", &deployed).await.unwrap();

    let all = coord.get_new_deployed_topics("g").await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all.values().next().unwrap().payload, payload);
}

#[tokio::test]
async fn purge_notification_removes_it_purge_of_missing_succeeds() {
    let coord = mock();
    coord.notify_consumer_group("g", "c0").await.unwrap();
    let ids = coord.get_new_deployed_topics("g").await.unwrap();
    assert_eq!(ids.len(), 1);
    let notif_id = ids.keys().next().unwrap().clone();

    coord.purge_notification_for_group("g", &notif_id).await.unwrap();
    assert!(coord.get_new_deployed_topics("g").await.unwrap().is_empty());

    // Purging again (already gone) is still a success.
    coord.purge_notification_for_group("g", &notif_id).await.unwrap();
}

#[tokio::test]
async fn get_all_topics_and_partitions_and_brokers() {
    let coord = mock();

    coord.raw_create("/brokers/topics/orders", br#"{"partitions":{"1":[0],"0":[0]}}"#, kgc_core::CreateMode::Persistent).await.unwrap();
    coord.raw_create("/brokers/ids/0", br#"{"host":"broker0","port":9092}"#, kgc_core::CreateMode::Persistent).await.unwrap();

    let topics = coord.get_all_topics().await.unwrap();
    assert_eq!(topics, vec!["orders".to_string()]);

    let partitions = coord.get_partitions_for_topics(&topics).await.unwrap();
    assert_eq!(partitions["orders"], vec![0, 1]);

    let brokers = coord.get_all_brokers().await.unwrap();
    assert_eq!(brokers.len(), 1);
    assert_eq!(brokers[0].id, 0);
    assert_eq!(brokers[0].host, "broker0");
}

// Upserting the same (path, empty) twice both succeed.
#[tokio::test]
async fn upsert_same_empty_path_twice_is_idempotent() {
    let coord = mock();
    kgc_core::coordinator::upsert::upsert(&coord, "/consumers/g/ids", b"", kgc_core::CreateMode::Persistent)
        .await
        .unwrap();
    kgc_core::coordinator::upsert::upsert(&coord, "/consumers/g/ids", b"", kgc_core::CreateMode::Persistent)
        .await
        .unwrap();
}
