//! Error reporting acceptance tests.
//!
//! # Acceptance Criteria
//!
//! - Unknown clock indices report NOT_FOUND and change no clock
//! - Malformed payloads report INVALID_PARAMETERS
//! - Unknown message ids report NOT_SUPPORTED with a status-only reply
//! - Backend refusals are translated (fixed clocks, range, busy, faults)
//! - Agents only reach the clocks in their own device table

use super::common::{default_config, default_service, rate_words, send, send_raw, service_for};
use scmi_clock::{BackendError, MessageId, ProtocolStatus, ResourceRef};
use std::time::Duration;

#[test]
fn test_rate_set_unknown_clock_changes_nothing() {
    let service = default_service();
    let clock_count = default_config().clocks.len();
    let before: Vec<_> = (0..clock_count)
        .map(|i| service.backend().snapshot(ResourceRef(i as u32)))
        .collect();

    let [low, high] = rate_words(100_000_000);
    let reply = send(&service, "ospm", MessageId::RateSet, &[0, 99, low, high]);

    assert_eq!(reply.status, -4);
    assert_eq!(reply.len, 4);
    let after: Vec<_> = (0..clock_count)
        .map(|i| service.backend().snapshot(ResourceRef(i as u32)))
        .collect();
    assert_eq!(before, after);
}

#[test]
fn test_reserved_slot_not_found() {
    let service = default_service();

    // ospm indices 10..16 are reserved
    assert_eq!(send(&service, "ospm", MessageId::ConfigSet, &[10, 1]).status, -4);
    let reply = send(&service, "ospm", MessageId::RateGet, &[15]);
    assert_eq!(reply.status, -4);
    assert_eq!(reply.words, vec![0, 0]);
}

#[test]
fn test_agent_isolation() {
    let service = default_service();

    // psci sees no clocks at all
    assert_eq!(send(&service, "psci", MessageId::RateGet, &[0]).status, -4);
    // trusted has three clocks; ospm's index 4 does not exist for it
    assert_eq!(send(&service, "trusted", MessageId::ConfigSet, &[4, 1]).status, -4);
    // unconfigured agents are served by an empty registry
    assert_eq!(send(&service, "intruder", MessageId::ConfigSet, &[0, 1]).status, -4);
}

#[test]
fn test_malformed_payloads() {
    let service = default_service();

    assert_eq!(send_raw(&service, "ospm", 0x5, &[0; 12]).status, -2);
    assert_eq!(send_raw(&service, "ospm", 0x7, &[0; 4]).status, -2);
    assert_eq!(send_raw(&service, "ospm", 0x1, &[0; 1]).status, -2);

    let reply = send_raw(&service, "ospm", 0x6, &[0; 7]);
    assert_eq!(reply.status, -2);
    assert_eq!(reply.len, 12);
}

#[test]
fn test_unknown_message_id() {
    let service = default_service();

    for id in [0x8, 0xB, 0x100] {
        let reply = send_raw(&service, "ospm", id, &[0; 8]);
        assert_eq!(reply.status, -1);
        assert_eq!(reply.len, 4);
    }
}

#[test]
fn test_fixed_clock_not_supported() {
    let service = default_service();
    let [low, high] = rate_words(100_000_000);

    // SYS_CLK cannot change rate
    let reply = send(&service, "trusted", MessageId::RateSet, &[0, 0, low, high]);
    assert_eq!(reply.status, -1);
}

#[test]
fn test_rate_out_of_range() {
    let service = default_service();
    let [low, high] = rate_words(2_500_000_000);

    let reply = send(&service, "ospm", MessageId::RateSet, &[0, 0, low, high]);
    assert_eq!(reply.status, -5);
    assert_eq!(
        send(&service, "ospm", MessageId::RateGet, &[0]).words,
        rate_words(1_200_000_000).to_vec()
    );
}

#[test]
fn test_busy_while_pll_relocks() {
    let mut config = default_config();
    let gpu = config
        .clocks
        .iter_mut()
        .find(|c| c.name == "GPU_CORE_CLK")
        .unwrap();
    gpu.lock_time = Duration::from_secs(3600);
    let service = service_for(&config);

    let [low, high] = rate_words(600_000_000);
    assert_eq!(send(&service, "ospm", MessageId::RateSet, &[0, 4, low, high]).status, 0);

    let [low, high] = rate_words(700_000_000);
    assert_eq!(send(&service, "ospm", MessageId::RateSet, &[0, 4, low, high]).status, -6);
}

#[test]
fn test_unbounded_lock_time_keeps_clock_usable() {
    let mut config = default_config();
    config.clocks[4].lock_time = Duration::MAX;
    let service = service_for(&config);

    let [low, high] = rate_words(600_000_000);
    let reply = send(&service, "ospm", MessageId::RateSet, &[0, 4, low, high]);
    assert_eq!(reply.status, ProtocolStatus::GenericError.code());

    let reply = send(&service, "ospm", MessageId::RateGet, &[4]);
    assert_eq!(reply.status, 0);
    assert_eq!(reply.words, rate_words(500_000_000).to_vec());
}

#[test]
fn test_hardware_fault_reported() {
    let service = default_service();
    assert!(service
        .backend()
        .inject_fault(ResourceRef(4), BackendError::Hardware("PLL lost lock".into())));

    let reply = send(&service, "ospm", MessageId::RateGet, &[4]);
    assert_eq!(reply.status, -8);
    assert_eq!(reply.words, vec![0, 0]);

    // The fault is consumed by the failed request
    assert_eq!(send(&service, "ospm", MessageId::RateGet, &[4]).status, 0);
}

#[test]
fn test_statistics_count_every_reply() {
    let service = default_service();

    send(&service, "ospm", MessageId::ProtocolVersion, &[]);
    send(&service, "ospm", MessageId::RateGet, &[99]);
    send_raw(&service, "ospm", 0x42, &[]);

    let stats = service.stats();
    assert_eq!(stats.total(), 3);
    assert_eq!(stats.count(ProtocolStatus::Success), 1);
    assert_eq!(stats.count(ProtocolStatus::NotFound), 1);
    assert_eq!(stats.count(ProtocolStatus::NotSupported), 1);
}
