//! Protocol discovery acceptance tests.
//!
//! # Acceptance Criteria
//!
//! - Protocol version is 1.0
//! - Protocol attributes report the agent's clock count
//! - Message attributes distinguish implemented messages
//! - Clock attributes report name and run state
//! - Rate descriptions cover range and discrete clocks, paging discrete lists

use super::common::{default_service, name_from_words, rate_words, send};
use scmi_clock::MessageId;

#[test]
fn test_protocol_version() {
    let service = default_service();
    let reply = send(&service, "psci", MessageId::ProtocolVersion, &[]);
    assert_eq!(reply.status, 0);
    assert_eq!(reply.words, vec![0x0001_0000]);
}

#[test]
fn test_protocol_attributes_per_agent() {
    let service = default_service();

    let count = |agent| send(&service, agent, MessageId::ProtocolAttributes, &[]).words[0] & 0xFFFF;
    assert_eq!(count("ospm"), 16);
    assert_eq!(count("trusted"), 3);
    assert_eq!(count("psci"), 0);
    assert_eq!(count("unknown-agent"), 0);
}

#[test]
fn test_protocol_message_attributes() {
    let service = default_service();

    for message in MessageId::ALL {
        let reply = send(
            &service,
            "ospm",
            MessageId::ProtocolMessageAttributes,
            &[message.id()],
        );
        assert_eq!(reply.status, 0, "{message}");
        assert_eq!(reply.words, vec![0]);
    }

    let reply = send(&service, "ospm", MessageId::ProtocolMessageAttributes, &[0x8]);
    assert_eq!(reply.status, -4);
    assert!(reply.words.is_empty());
}

#[test]
fn test_clock_attributes_names() {
    let service = default_service();

    let name = |agent, clock_id| {
        let reply = send(&service, agent, MessageId::ClockAttributes, &[clock_id]);
        assert_eq!(reply.status, 0);
        assert_eq!(reply.len, 24);
        name_from_words(&reply.words[1..])
    };

    assert_eq!(name("ospm", 0), "CPU0_CLK");
    assert_eq!(name("ospm", 4), "GPU_CORE_CLK");
    // 17 characters, truncated to 15 on the wire
    assert_eq!(name("ospm", 5), "DISPLAY_PIXEL_C");
    assert_eq!(name("trusted", 0), "SYS_CLK");
}

#[test]
fn test_clock_attributes_startup_state() {
    let service = default_service();
    let running = |clock_id| send(&service, "ospm", MessageId::ClockAttributes, &[clock_id]).words[0] & 1;

    // CPU2 is configured stopped but enabled for ospm at startup
    assert_eq!(running(2), 1);
    // GPU is neither running at boot nor enabled at startup
    assert_eq!(running(4), 0);
}

#[test]
fn test_describe_rates_range_clock() {
    let service = default_service();

    let reply = send(&service, "ospm", MessageId::DescribeRates, &[0, 0]);

    assert_eq!(reply.status, 0);
    let mut expected = vec![(1 << 12) | 3];
    expected.extend(rate_words(100_000_000));
    expected.extend(rate_words(2_000_000_000));
    expected.extend(rate_words(25_000_000));
    assert_eq!(reply.words, expected);
}

#[test]
fn test_describe_rates_discrete_paging() {
    let service = default_service();
    let uart = 7;

    let first = send(&service, "ospm", MessageId::DescribeRates, &[uart, 0]);
    assert_eq!(first.status, 0);
    assert_eq!(first.words[0], (2 << 16) | 8);
    assert_eq!(first.words.len(), 1 + 8 * 2);
    assert_eq!(&first.words[1..3], &rate_words(12_000_000));

    let second = send(&service, "ospm", MessageId::DescribeRates, &[uart, 8]);
    assert_eq!(second.status, 0);
    assert_eq!(second.words[0], 2);
    assert_eq!(&second.words[1..3], &rate_words(108_000_000));
    assert_eq!(&second.words[3..5], &rate_words(120_000_000));

    let past_end = send(&service, "ospm", MessageId::DescribeRates, &[uart, 10]);
    assert_eq!(past_end.status, -5);
    assert!(past_end.words.is_empty());
}
