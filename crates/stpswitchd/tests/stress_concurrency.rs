//! Stress testing: concurrent arrivals and topology changes
//!
//! Drives many switches from many threads at once and checks that every
//! table ends up consistent with the per-switch event order.

use std::sync::Arc;
use std::thread;

use sonic_stpswitchd::ethernet::EthernetHeader;
use sonic_stpswitchd::{
    Controller, ControllerEvent, DatapathId, MacAddress, MemorySink, PortNo,
};

// ============================================================================
// UTILITY FUNCTIONS
// ============================================================================

fn host(switch: u64, n: u16) -> MacAddress {
    let [hi, lo] = n.to_be_bytes();
    MacAddress::new([0x02, 0x00, 0x00, switch as u8, hi, lo])
}

fn arrival(dpid: u64, in_port: u32, src: MacAddress, dst: MacAddress) -> ControllerEvent {
    ControllerEvent::PacketIn {
        dpid: DatapathId::new(dpid),
        in_port: Some(PortNo::new(in_port)),
        buffer_id: None,
        data: EthernetHeader {
            dst,
            src,
            ethertype: 0x0800,
        }
        .build_frame(&[]),
    }
}

// ============================================================================
// CONCURRENCY TESTS
// ============================================================================

#[test]
fn test_parallel_switches_stay_consistent() {
    const SWITCHES: u64 = 8;
    const HOSTS: u16 = 200;

    let sink = Arc::new(MemorySink::new());
    let controller = Arc::new(Controller::new(sink.clone()));

    let workers: Vec<_> = (1..=SWITCHES)
        .map(|dpid| {
            let controller = Arc::clone(&controller);
            thread::spawn(move || {
                for n in 0..HOSTS {
                    let port = u32::from(n % 4) + 1;
                    controller.dispatch(arrival(dpid, port, host(dpid, n), host(dpid, n + 1)));
                    if n % 50 == 49 {
                        controller.dispatch(ControllerEvent::TopologyChange {
                            dpid: DatapathId::new(dpid),
                        });
                    }
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().expect("worker panicked");
    }

    // Last flush happened after host 199, so every table is empty
    for dpid in 1..=SWITCHES {
        assert!(!controller.fdb().has_table(DatapathId::new(dpid)));
    }

    let stats = controller.stats();
    assert_eq!(stats.packets_in, SWITCHES * u64::from(HOSTS));
    assert_eq!(stats.table_flushes, SWITCHES * 4);
    assert_eq!(stats.command_failures, 0);
    assert_eq!(stats.rules_deleted, SWITCHES * u64::from(HOSTS));
}

#[test]
fn test_concurrent_flush_and_learning_on_one_switch() {
    const ROUNDS: u16 = 500;
    let dpid = DatapathId::new(1);

    let sink = Arc::new(MemorySink::new());
    let controller = Arc::new(Controller::new(sink.clone()));

    let learner = {
        let controller = Arc::clone(&controller);
        thread::spawn(move || {
            for n in 0..ROUNDS {
                controller.dispatch(arrival(1, 1, host(1, n), host(1, 0xffff)));
            }
        })
    };
    let flusher = {
        let controller = Arc::clone(&controller);
        thread::spawn(move || {
            for _ in 0..ROUNDS {
                controller.dispatch(ControllerEvent::TopologyChange { dpid });
            }
        })
    };

    learner.join().expect("learner panicked");
    flusher.join().expect("flusher panicked");

    // Every learned entry was either flushed with a matching delete or
    // is still in the table.
    let remaining = controller.fdb().snapshot(dpid).len() as u64;
    let stats = controller.stats();
    assert_eq!(stats.rules_deleted + remaining, u64::from(ROUNDS));
    for (_, port) in controller.fdb().snapshot(dpid).iter() {
        assert_eq!(*port, PortNo::new(1));
    }
}
