//! Performance benchmarks for the controller's pure core.
//!
//! Status normalization runs on every poll and `step` on every event, so both
//! sit on the paper-handling hot path.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench transition_bench
//! ```

use criterion::{BatchSize, Criterion, Throughput, criterion_group, criterion_main};
use precinct_core::{Interpretation, PageInterpretation, SheetId};
use precinct_hardware::RawStatus;
use precinct_machine::state::State;
use precinct_machine::{
    Command, Context, Event, ImageRef, Outcome, Policy, ScannedSheet, ScannerEvent, Timer,
    normalize_status, step,
};
use std::hint::black_box;
use std::path::PathBuf;

/// Every combination of sensor bits and fault flags.
fn all_statuses() -> Vec<RawStatus> {
    (0u16..4096)
        .map(|bits| {
            let bit = |n: u16| bits & (1 << n) != 0;
            RawStatus {
                front: [bit(0), bit(1), bit(2), bit(3)],
                back: [bit(4), bit(5), bit(6), bit(7)],
                is_paper_jam: bit(8),
                is_jam_paper_held_back: bit(9),
                is_double_sheet: bit(10),
                is_cover_open: bit(11),
            }
        })
        .collect()
}

/// Events for one sheet from insertion to the ballot box.
fn accept_cycle() -> Vec<Event> {
    let sheet_id = SheetId::new();
    let sheet = ScannedSheet {
        sheet_id,
        front: ImageRef::File(PathBuf::from("front.pgm")),
        back: ImageRef::File(PathBuf::from("back.pgm")),
    };
    let interpretation = Interpretation::ValidSheet {
        sheet_id,
        pages: [PageInterpretation::default(), PageInterpretation::default()],
    };

    vec![
        Event::Scanner(ScannerEvent::ReadyToScan),
        Event::Action(Outcome::ScanGate(true)),
        Event::Action(Outcome::Scanned(sheet)),
        Event::Scanner(ScannerEvent::ReadyToEject),
        Event::Action(Outcome::Interpreted(interpretation)),
        Event::Command(Command::Accept),
        Event::Action(Outcome::Done),
        Event::Scanner(ScannerEvent::NoPaper),
        Event::Action(Outcome::Done),
        Event::Timer(Timer::AcceptedReadyForNextBallot),
        Event::Scanner(ScannerEvent::NoPaper),
    ]
}

fn bench_normalize(c: &mut Criterion) {
    let statuses = all_statuses();
    let mut group = c.benchmark_group("normalize_status");
    group.throughput(Throughput::Elements(statuses.len() as u64));

    group.bench_function("all_sensor_combinations", |b| {
        b.iter(|| {
            for status in &statuses {
                black_box(normalize_status(black_box(status)));
            }
        });
    });

    group.finish();
}

fn bench_step(c: &mut Criterion) {
    let policy = Policy::default();
    let mut group = c.benchmark_group("step");
    group.throughput(Throughput::Elements(accept_cycle().len() as u64));

    group.bench_function("accept_cycle", |b| {
        b.iter_batched(
            accept_cycle,
            |events| {
                let mut state = State::NoPaper;
                let mut ctx = Context::default();
                for event in events {
                    state = step(&state, &mut ctx, event, &policy).state;
                }
                assert_eq!(state, State::NoPaper);
                black_box(ctx.ballots_counted)
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("ignored_poll", |b| {
        let mut ctx = Context::default();
        b.iter(|| {
            black_box(step(
                &State::NoPaper,
                &mut ctx,
                Event::Scanner(ScannerEvent::NoPaper),
                &policy,
            ))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_normalize, bench_step);
criterion_main!(benches);
