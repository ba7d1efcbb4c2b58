mod helpers;

use concord::memory::MemorySettings;
use concord::memory::UnifiedMemory;
use concord::store::MemoryStore;
use helpers::{memory_with, message, message_at, sqlite_store, test_memory};
use std::sync::Arc;

#[test]
fn same_literal_message_synced_twice_is_stored_once() {
    let memory = test_memory();
    let hi = [message("user", "hi")];

    let first = memory.sync_conversation_state("u1", "whatsapp", &hi, None).unwrap();
    let second = memory.sync_conversation_state("u1", "whatsapp", &hi, None).unwrap();

    assert_eq!((first.synced, first.added), (1, 1));
    assert_eq!((second.synced, second.added), (1, 0));
    assert_eq!(memory.get_unified_context("u1", None, true).unwrap().message_count, 1);
}

#[test]
fn different_timestamp_makes_a_distinct_message() {
    let memory = test_memory();
    memory
        .sync_conversation_state("u1", "terminal", &[message_at("user", "hi", "2024-01-01T00:00:00Z")], None)
        .unwrap();
    memory
        .sync_conversation_state("u1", "terminal", &[message_at("user", "hi", "2024-01-01T00:00:01Z")], None)
        .unwrap();

    assert_eq!(memory.get_unified_context("u1", None, true).unwrap().message_count, 2);
}

#[test]
fn same_content_from_another_interface_is_distinct() {
    let memory = test_memory();
    let hi = [message_at("user", "hi", "t")];
    memory.sync_conversation_state("u1", "terminal", &hi, None).unwrap();
    memory.sync_conversation_state("u1", "whatsapp", &hi, None).unwrap();

    let context = memory.get_unified_context("u1", None, true).unwrap();
    assert_eq!(context.message_count, 2);
    let interfaces: Vec<&str> = context.recent_messages.iter().map(|m| m.interface.as_str()).collect();
    assert_eq!(interfaces, vec!["terminal", "whatsapp"]);
}

#[test]
fn duplicates_within_one_batch_collapse() {
    let memory = test_memory();
    let batch = [message_at("user", "hi", "t"), message_at("user", "hi", "t")];
    let report = memory.sync_conversation_state("u1", "terminal", &batch, None).unwrap();

    assert_eq!(report.synced, 2);
    assert_eq!(report.added, 1);
}

#[test]
fn users_are_isolated() {
    let memory = test_memory();
    memory.sync_conversation_state("u1", "terminal", &[message("user", "mine")], None).unwrap();

    assert_eq!(memory.get_unified_context("u2", None, true).unwrap().message_count, 0);
}

#[test]
fn concurrent_syncs_from_different_interfaces_keep_every_message() {
    let memory = Arc::new(memory_with(sqlite_store(), MemorySettings::default()));

    let handles: Vec<_> = ["terminal", "whatsapp", "telegram", "email"]
        .into_iter()
        .map(|interface| {
            let memory: Arc<UnifiedMemory> = Arc::clone(&memory);
            std::thread::spawn(move || {
                for i in 0..25 {
                    let msg = message_at("user", &format!("{interface} #{i}"), "t");
                    memory
                        .sync_conversation_state("u1", interface, &[msg], None)
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(memory.get_unified_context("u1", None, true).unwrap().message_count, 100);
}

#[test]
fn unstamped_resync_deduplicates_under_system_clock() {
    let memory = UnifiedMemory::new(Arc::new(MemoryStore::new()), MemorySettings::default());
    let hi = [message("user", "hi")];

    // A millisecond boundary can fall between the two syncs; then the stamps
    // genuinely differ and a fresh user is tried.
    for attempt in 0..5 {
        let user = format!("u{attempt}");
        memory.sync_conversation_state(&user, "whatsapp", &hi, None).unwrap();
        memory.sync_conversation_state(&user, "whatsapp", &hi, None).unwrap();

        let context = memory.get_unified_context(&user, None, true).unwrap();
        let stamps: Vec<&str> = context.recent_messages.iter().map(|m| m.timestamp.as_str()).collect();
        assert!(stamps.iter().all(|t| t.len() == "2024-03-01T12:00:00.000Z".len()));
        if context.message_count == 1 {
            return;
        }
        assert_ne!(stamps[0], stamps[1]);
    }
    panic!("every re-sync landed in a different millisecond");
}
