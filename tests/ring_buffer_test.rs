use soundrec::audio::{CircularBuffer, DEFAULT_REPORT_INTERVAL};
use soundrec::config::{OverrunPolicy, UnderrunPolicy};

#[test]
fn test_interleaved_push_pop_scenario() {
    let mut buffer = CircularBuffer::new(4).unwrap();

    buffer.push_back(1);
    buffer.push_back(2);
    buffer.push_back(3);
    assert_eq!(buffer.pop_front(), 1);

    buffer.push_back(4);
    buffer.push_back(5);
    assert_eq!(buffer.len(), 4);
    assert!(buffer.is_full());

    for expected in 2..=5 {
        assert_eq!(buffer.pop_front(), expected);
        assert_eq!(buffer.overrun_count(), 0);
    }

    assert_eq!(buffer.len(), 0);
    assert!(buffer.is_empty());
    assert_eq!(buffer.overrun_count(), 0);
    assert_eq!(buffer.underrun_count(), 0);
}

#[test]
fn test_overrun_scenario_overwrites_head_slot() {
    let mut buffer = CircularBuffer::new(2).unwrap();
    buffer.push_back(1);
    buffer.push_back(2);
    buffer.push_back(3);

    assert_eq!(buffer.len(), 2);
    assert_eq!(buffer.overrun_count(), 1);
    // Head was not advanced, so the slot holding 1 now holds 3
    assert_eq!(buffer.pop_front(), 3);
}

#[test]
fn test_full_buffer_for_various_capacities() {
    for capacity in [1usize, 2, 3, 7, 64, 1000] {
        let mut buffer = CircularBuffer::new(capacity).unwrap();
        for i in 0..capacity {
            buffer.push_back(i);
        }
        assert_eq!(buffer.len(), capacity);
        assert!(!buffer.is_empty());
        assert_eq!(buffer.overrun_count(), 0);

        buffer.push_back(usize::MAX);
        assert_eq!(buffer.overrun_count(), 1, "capacity {}", capacity);
        assert_eq!(buffer.len(), capacity);
    }
}

#[test]
fn test_fifo_for_partial_fills() {
    for count in 0..=16 {
        let mut buffer = CircularBuffer::new(16).unwrap();
        for i in 0..count {
            buffer.push_back(i as f32 * 0.5);
        }
        assert_eq!(buffer.len(), count);
        for i in 0..count {
            assert_eq!(buffer.pop_front(), i as f32 * 0.5);
        }
        assert_eq!(buffer.underrun_count(), 0);
    }
}

fn full_buffer() -> CircularBuffer<i16> {
    let mut buffer = CircularBuffer::new(8).unwrap();
    for i in 0..8 {
        buffer.push_back(i);
    }
    buffer
}

#[test]
fn test_exactly_one_overrun_report_per_interval() {
    let mut buffer = full_buffer();
    for _ in 0..DEFAULT_REPORT_INTERVAL {
        buffer.push_back(1);
    }
    assert_eq!(buffer.overrun_count(), 100_000);
    assert_eq!(buffer.overrun_reports(), 1);

    buffer.push_back(1);
    assert_eq!(buffer.overrun_count(), 100_001);
    assert_eq!(buffer.overrun_reports(), 2);
}

#[test]
fn test_exactly_one_underrun_report_per_interval() {
    let mut buffer = CircularBuffer::<i16>::new(8).unwrap();
    for _ in 0..DEFAULT_REPORT_INTERVAL {
        buffer.pop_front();
    }
    assert_eq!(buffer.underrun_count(), 100_000);
    assert_eq!(buffer.underrun_reports(), 1);
    assert_eq!(buffer.len(), 0);

    buffer.pop_front();
    assert_eq!(buffer.underrun_count(), 100_001);
    assert_eq!(buffer.underrun_reports(), 2);
}

#[test]
fn test_custom_report_interval() {
    let mut buffer =
        CircularBuffer::with_policies(1, OverrunPolicy::DropOldest, UnderrunPolicy::Silence, 10)
            .unwrap();
    buffer.push_back(0u32);
    for i in 0..25 {
        buffer.push_back(i);
    }
    // Boundaries at occurrences 1, 11, 21
    assert_eq!(buffer.overrun_reports(), 3);
    assert_eq!(buffer.pop_front(), 24);
}
