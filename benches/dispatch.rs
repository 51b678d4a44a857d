//! Dispatch micro-benchmarks.
//!
//! - direct publish with 0, 1 and 8 subscribers
//! - queued publish + process on the bare-metal ring queue
//! - raw ring push/pop

use std::hint::black_box;
use std::sync::atomic::{AtomicU32, Ordering};

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use ph_eventhub::{
    BareMetalPort, Context, Event, EventRing, EventType, Hub, HubConfig, TickCounter, Timeout,
};

static SINK: AtomicU32 = AtomicU32::new(0);

fn accumulate(ev: &Event, ctx: Context) {
    SINK.fetch_add(ev.kind.get() ^ ctx.get() as u32, Ordering::Relaxed);
}

const KIND: EventType = EventType::new(3);

fn bench_direct_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish_direct");
    for subscribers in [0usize, 1, 8] {
        let hub: Hub<BareMetalPort> = Hub::new(HubConfig::default(), BareMetalPort::new()).unwrap();
        for ctx in 0..subscribers {
            hub.subscribe(KIND, accumulate, Context::new(ctx)).unwrap();
        }
        group.bench_with_input(
            BenchmarkId::from_parameter(subscribers),
            &subscribers,
            |b, _| {
                b.iter(|| hub.publish(black_box(Event::new(KIND)), Timeout::NONE));
            },
        );
    }
    group.finish();
}

fn bench_queued_round_trip(c: &mut Criterion) {
    let config = HubConfig::queued().with_queue_capacity(16);
    let port: BareMetalPort<TickCounter, 16> = BareMetalPort::queued(TickCounter::new());
    let hub: Hub<_> = Hub::new(config, port).unwrap();
    hub.subscribe(KIND, accumulate, Context::NONE).unwrap();

    c.bench_function("publish_queued_then_process", |b| {
        b.iter(|| {
            let _ = hub.publish(black_box(Event::new(KIND)), Timeout::NONE);
            hub.process(Timeout::NONE)
        });
    });
}

fn bench_ring(c: &mut Criterion) {
    let ring: EventRing<u32, 64> = EventRing::new();
    let mut n = 0u32;

    c.bench_function("ring_push_pop", |b| {
        b.iter(|| {
            n = n.wrapping_add(1);
            let _ = ring.push(black_box(n));
            ring.pop()
        });
    });
}

criterion_group!(
    benches,
    bench_direct_fanout,
    bench_queued_round_trip,
    bench_ring
);
criterion_main!(benches);
