//! Property tests for subscription and dispatch semantics.

use std::cell::RefCell;
use std::collections::BTreeSet;

use ph_eventhub::{
    BareMetalPort, Clock, Context, Event, EventType, Hub, HubConfig, HubError, NoTrace, Timeout,
    mask_words,
};
use proptest::prelude::*;

const TYPES: u32 = 64;

type WideHub = Hub<BareMetalPort, NoTrace, 8, { mask_words(TYPES) }>;

thread_local! {
    static HITS: RefCell<Vec<(usize, u32, u32)>> = const { RefCell::new(Vec::new()) };
}

fn record(who: usize, ev: &Event) {
    HITS.with(|h| {
        h.borrow_mut()
            .push((who, ev.kind.get(), ev.timestamp.as_millis()))
    });
}

fn cb0(ev: &Event, _ctx: Context) {
    record(0, ev);
}
fn cb1(ev: &Event, _ctx: Context) {
    record(1, ev);
}
fn cb2(ev: &Event, _ctx: Context) {
    record(2, ev);
}
fn cb3(ev: &Event, _ctx: Context) {
    record(3, ev);
}

const CALLBACKS: [fn(&Event, Context); 4] = [cb0, cb1, cb2, cb3];

fn take_hits() -> Vec<(usize, u32, u32)> {
    HITS.with(|h| std::mem::take(&mut *h.borrow_mut()))
}

fn wide_hub(max_slots: usize) -> WideHub {
    take_hits();
    let config = HubConfig::default()
        .with_max_event_types(TYPES)
        .with_max_slots(max_slots);
    Hub::new(config, BareMetalPort::new()).unwrap()
}

#[derive(Clone, Debug)]
enum Op {
    Subscribe(usize, u32),
    Unsubscribe(usize, u32),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..4usize, 0..8u32).prop_map(|(who, kind)| Op::Subscribe(who, kind)),
        (0..4usize, 0..8u32).prop_map(|(who, kind)| Op::Unsubscribe(who, kind)),
    ]
}

proptest! {
    #[test]
    fn publish_reaches_fresh_subscriber_once(kind in 0..TYPES, skew in 0u32..10_000) {
        let hub = wide_hub(8);
        let kind = EventType::new(kind);
        hub.port().clock().advance(skew);

        hub.subscribe(kind, cb0, Context::NONE).unwrap();
        let before = hub.port().now_ms();
        hub.publish(Event::new(kind), Timeout::NONE).unwrap();

        let hits = take_hits();
        prop_assert_eq!(hits.len(), 1);
        prop_assert_eq!(hits[0].1, kind.get());
        prop_assert!(hits[0].2 >= before.as_millis());
    }

    #[test]
    fn failed_subscribe_leaves_table_unchanged(max_slots in 1usize..=8, kind in 0..TYPES) {
        let hub = wide_hub(max_slots);
        for ctx in 0..max_slots {
            hub.subscribe(EventType::new(kind), cb0, Context::new(ctx)).unwrap();
        }
        let before = hub.snapshot().unwrap();
        prop_assert_eq!(
            hub.subscribe(EventType::new(kind), cb1, Context::NONE),
            Err(HubError::ResourceExhausted)
        );
        prop_assert_eq!(hub.snapshot().unwrap(), before);
    }

    #[test]
    fn one_identity_many_types(a in 0..TYPES, b in 0..TYPES) {
        prop_assume!(a != b);
        let (a, b) = (EventType::new(a), EventType::new(b));
        let hub = wide_hub(8);

        hub.subscribe(a, cb0, Context::NONE).unwrap();
        hub.subscribe(b, cb0, Context::NONE).unwrap();
        prop_assert_eq!(hub.subscriber_count(), Ok(1));

        hub.unsubscribe(a, cb0).unwrap();
        hub.publish(Event::new(a), Timeout::NONE).unwrap();
        hub.publish(Event::new(b), Timeout::NONE).unwrap();
        let kinds: Vec<u32> = take_hits().iter().map(|h| h.1).collect();
        prop_assert_eq!(kinds, vec![b.get()]);

        hub.unsubscribe(b, cb0).unwrap();
        hub.publish(Event::new(a), Timeout::NONE).unwrap();
        hub.publish(Event::new(b), Timeout::NONE).unwrap();
        prop_assert!(take_hits().is_empty());
        prop_assert_eq!(hub.subscriber_count(), Ok(0));
    }

    #[test]
    fn dispatch_matches_model(ops in proptest::collection::vec(op(), 0..40)) {
        const MAX_SLOTS: usize = 2;
        let hub = wide_hub(MAX_SLOTS);
        let mut model: [BTreeSet<u32>; 4] = Default::default();

        for op in ops {
            match op {
                Op::Subscribe(who, kind) => {
                    let got = hub.subscribe(EventType::new(kind), CALLBACKS[who], Context::NONE);
                    let active = model.iter().filter(|s| !s.is_empty()).count();
                    if model[who].is_empty() && active == MAX_SLOTS {
                        prop_assert_eq!(got, Err(HubError::ResourceExhausted));
                    } else {
                        prop_assert_eq!(got, Ok(()));
                        model[who].insert(kind);
                    }
                }
                Op::Unsubscribe(who, kind) => {
                    let got = hub.unsubscribe(EventType::new(kind), CALLBACKS[who]);
                    if model[who].remove(&kind) {
                        prop_assert_eq!(got, Ok(()));
                    } else {
                        prop_assert_eq!(got, Err(HubError::NotFound));
                    }
                }
            }
        }

        for kind in 0..8u32 {
            hub.publish(Event::new(EventType::new(kind)), Timeout::NONE).unwrap();
            let got: BTreeSet<usize> = take_hits().iter().map(|h| h.0).collect();
            let want: BTreeSet<usize> = (0..4).filter(|w| model[*w].contains(&kind)).collect();
            prop_assert_eq!(got, want);
        }
    }
}

#[test]
fn out_of_range_type_is_rejected_everywhere() {
    let hub = wide_hub(8);
    let kind = EventType::new(TYPES);
    assert_eq!(
        hub.subscribe(kind, cb0, Context::NONE),
        Err(HubError::InvalidArgument)
    );
    assert_eq!(hub.unsubscribe(kind, cb0), Err(HubError::InvalidArgument));
    assert_eq!(
        hub.publish(Event::new(kind), Timeout::NONE),
        Err(HubError::InvalidArgument)
    );
}
