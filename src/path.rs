//! Path Layout: pure functions deriving canonical node paths
//! for a group/topic/partition. No I/O, no state.

use crate::constants::CONSUMERS_PATH;

pub fn consumer_group_dir(group: &str) -> String {
    format!("{CONSUMERS_PATH}/{group}")
}

pub fn consumer_registry_dir(group: &str) -> String {
    format!("{}/ids", consumer_group_dir(group))
}

pub fn consumer_registration_path(group: &str, consumer_id: &str) -> String {
    format!("{}/{}", consumer_registry_dir(group), consumer_id)
}

pub fn consumer_changes_dir(group: &str) -> String {
    format!("{}/changes", consumer_group_dir(group))
}

pub fn consumer_change_path(group: &str, notification_id: &str) -> String {
    format!("{}/{}", consumer_changes_dir(group), notification_id)
}

pub fn consumer_sync_dir(group: &str) -> String {
    format!("{}/sync", consumer_group_dir(group))
}

pub fn consumer_offset_dir(group: &str, topic: &str) -> String {
    format!("{}/offsets/{}", consumer_group_dir(group), topic)
}

pub fn consumer_owner_dir(group: &str, topic: &str) -> String {
    format!("{}/owners/{}", consumer_group_dir(group), topic)
}
