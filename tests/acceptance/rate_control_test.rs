//! Rate and state control acceptance tests.
//!
//! # Acceptance Criteria
//!
//! - A rate set on a configured clock succeeds and is visible to rate get
//! - Rate get returns the 64-bit rate split low word first
//! - Config set starts and stops a clock
//! - Rates are rounded to the nearest supported rate
//! - Multiple agents share one backend

use super::common::{default_config, default_service, rate_words, send, service_for};
use scmi_clock::{MessageId, ResourceRef};
use scmi_common::ClockState;

/// Protocol clock index of CPU0_CLK for the ospm agent.
const OSPM_CPU0: u32 = 0;
/// Protocol clock index of CPU2_CLK for the ospm agent.
const OSPM_CPU2: u32 = 2;
/// Protocol clock index of GPU_CORE_CLK for the ospm agent.
const OSPM_GPU: u32 = 4;
/// Protocol clock index of UART0_CLK for the ospm agent.
const OSPM_UART0: u32 = 7;

#[test]
fn test_rate_set_then_get() {
    let service = default_service();
    let [low, high] = rate_words(100_000_000);

    let reply = send(&service, "ospm", MessageId::RateSet, &[0, OSPM_CPU0, low, high]);
    assert_eq!(reply.status, 0);
    assert_eq!(reply.len, 4, "rate set replies with the status only");

    let reply = send(&service, "ospm", MessageId::RateGet, &[OSPM_CPU0]);
    assert_eq!(reply.status, 0);
    assert_eq!(reply.words, vec![100_000_000, 0]);
}

#[test]
fn test_rate_get_boot_rate() {
    let service = default_service();

    // CPU2 boots from its PLL defaults: 24 MHz x 50
    let reply = send(&service, "ospm", MessageId::RateGet, &[OSPM_CPU2]);

    assert_eq!(reply.status, 0);
    assert_eq!(reply.len, 12);
    assert_eq!(reply.words, rate_words(1_200_000_000).to_vec());
}

#[test]
fn test_config_set_enable_disable() {
    let service = default_service();
    let uart = ResourceRef(8);

    let reply = send(&service, "ospm", MessageId::ConfigSet, &[OSPM_GPU, 0x1]);
    assert_eq!(reply.status, 0);
    assert_eq!(
        service.backend().snapshot(ResourceRef(4)).map(|(_, s)| s),
        Some(ClockState::Running)
    );

    // UART0 was enabled at startup
    assert_eq!(
        service.backend().snapshot(uart).map(|(_, s)| s),
        Some(ClockState::Running)
    );
    let reply = send(&service, "ospm", MessageId::ConfigSet, &[OSPM_UART0, 0x0]);
    assert_eq!(reply.status, 0);
    assert_eq!(
        service.backend().snapshot(uart).map(|(_, s)| s),
        Some(ClockState::Stopped)
    );
}

#[test]
fn test_clock_attributes_follow_config_set() {
    let service = default_service();

    let running_bit = || {
        let reply = send(&service, "ospm", MessageId::ClockAttributes, &[OSPM_GPU]);
        assert_eq!(reply.status, 0);
        reply.words[0] & 1
    };

    assert_eq!(running_bit(), 0);

    send(&service, "ospm", MessageId::ConfigSet, &[OSPM_GPU, 0x1]);
    assert_eq!(running_bit(), 1);

    send(&service, "ospm", MessageId::ConfigSet, &[OSPM_GPU, 0x0]);
    assert_eq!(running_bit(), 0);
}

#[test]
fn test_rate_set_rounds_to_nearest() {
    let service = default_service();

    // GPU steps are 50 MHz; 530 MHz is nearer 550 MHz than 500 MHz
    let [low, high] = rate_words(530_000_000);
    let reply = send(&service, "ospm", MessageId::RateSet, &[0, OSPM_GPU, low, high]);
    assert_eq!(reply.status, 0);

    let reply = send(&service, "ospm", MessageId::RateGet, &[OSPM_GPU]);
    assert_eq!(reply.words, rate_words(550_000_000).to_vec());

    // UART0 has a discrete list with 12 MHz spacing
    let [low, high] = rate_words(40_000_000);
    assert_eq!(
        send(&service, "ospm", MessageId::RateSet, &[0, OSPM_UART0, low, high]).status,
        0
    );
    assert_eq!(
        send(&service, "ospm", MessageId::RateGet, &[OSPM_UART0]).words,
        rate_words(36_000_000).to_vec()
    );
}

#[test]
fn test_rate_above_32_bits_round_trip() {
    let mut config = default_config();
    let gpu = config
        .clocks
        .iter_mut()
        .find(|c| c.name == "GPU_CORE_CLK")
        .unwrap();
    gpu.rates = scmi_common::RateConfig::Range {
        min: 1_000_000_000,
        max: 10_000_000_000,
        step: 1_000_000_000,
    };
    gpu.initial_rate = Some(1_000_000_000);
    let service = service_for(&config);

    let rate = 6_000_000_000u64;
    let [low, high] = rate_words(rate);
    assert_eq!(high, 1);

    let reply = send(&service, "ospm", MessageId::RateSet, &[0, OSPM_GPU, low, high]);
    assert_eq!(reply.status, 0);
    assert_eq!(
        send(&service, "ospm", MessageId::RateGet, &[OSPM_GPU]).words,
        vec![low, high]
    );
}

#[test]
fn test_agents_share_backend() {
    let mut config = default_config();
    let trusted = config
        .agents
        .iter_mut()
        .find(|a| a.name == "trusted")
        .unwrap();
    trusted.devices.push(scmi_common::AgentDeviceConfig {
        clock: Some("GPU_CORE_CLK".into()),
        starts_enabled: false,
    });
    let service = service_for(&config);

    let [low, high] = rate_words(300_000_000);
    assert_eq!(
        send(&service, "ospm", MessageId::RateSet, &[0, OSPM_GPU, low, high]).status,
        0
    );

    // The same physical clock is index 3 for the trusted agent
    assert_eq!(
        send(&service, "trusted", MessageId::RateGet, &[3]).words,
        vec![low, high]
    );
}
