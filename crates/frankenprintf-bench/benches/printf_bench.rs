//! printf benchmarks: frankenprintf vs host `snprintf`.

use std::ffi::{CString, c_char};

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use frankenprintf_bench::{BenchArg, WORKLOADS, Workload};
use frankenprintf_core::{GrowableSink, RenderConfig, render, render_to_bounded_buffer_with};

const BUF_LEN: usize = 512;

/// Argument as passed through C varargs.
enum CArg {
    Int(libc::c_int),
    Long(libc::c_long),
    Double(f64),
    Str(CString),
}

impl CArg {
    fn from_bench(arg: BenchArg) -> Self {
        match arg {
            BenchArg::Int(v) => Self::Int(v),
            BenchArg::Long(v) => Self::Long(v as libc::c_long),
            BenchArg::Double(v) => Self::Double(v),
            BenchArg::Str(s) => Self::Str(CString::new(s).unwrap()),
        }
    }
}

macro_rules! c_call {
    ($buf:expr, $fmt:expr $(, $arg:expr)*) => {
        // SAFETY: `$fmt` is NUL-terminated, every conversion in it matches the
        // C type of the corresponding argument, and `$buf` is BUF_LEN bytes.
        unsafe { libc::snprintf($buf.as_mut_ptr().cast::<c_char>(), BUF_LEN, $fmt $(, $arg)*) }
    };
}

/// Host `snprintf` for one workload. Formats take at most four arguments of
/// a single C type each, which is all the workloads need.
fn host_snprintf(buf: &mut [u8; BUF_LEN], format: *const c_char, args: &[CArg]) -> libc::c_int {
    fn as_c(arg: &CArg) -> CValue {
        match arg {
            CArg::Int(v) => CValue::Int(*v),
            CArg::Long(v) => CValue::Long(*v),
            CArg::Double(v) => CValue::Double(*v),
            CArg::Str(s) => CValue::Ptr(s.as_ptr()),
        }
    }
    let values: Vec<CValue> = args.iter().map(as_c).collect();
    match values.as_slice() {
        [] => c_call!(buf, format),
        [CValue::Int(a), CValue::Int(b), CValue::Int(c), CValue::Int(d)] => {
            c_call!(buf, format, *a, *b, *c, *d)
        }
        [CValue::Long(a), CValue::Long(b)] => c_call!(buf, format, *a, *b),
        [CValue::Ptr(a), CValue::Ptr(b), CValue::Ptr(c)] => c_call!(buf, format, *a, *b, *c),
        [CValue::Double(a), CValue::Double(b), CValue::Double(c)] => {
            c_call!(buf, format, *a, *b, *c)
        }
        [CValue::Double(a), CValue::Double(b)] => c_call!(buf, format, *a, *b),
        [CValue::Double(a)] => c_call!(buf, format, *a),
        _ => panic!("no host call shape for this workload"),
    }
}

#[derive(Clone, Copy)]
enum CValue {
    Int(libc::c_int),
    Long(libc::c_long),
    Double(f64),
    Ptr(*const c_char),
}

fn bench_workloads(c: &mut Criterion) {
    let config = RenderConfig::default();
    let mut group = c.benchmark_group("snprintf");

    for workload in WORKLOADS {
        let Workload { name, format, .. } = *workload;
        let args = workload.engine_args();
        let c_format = format.as_ptr().cast::<c_char>();
        let c_args: Vec<CArg> = workload.args.iter().copied().map(CArg::from_bench).collect();

        group.bench_with_input(BenchmarkId::new("frankenprintf", name), workload, |b, w| {
            let mut buf = [0u8; BUF_LEN];
            b.iter(|| {
                let n = render_to_bounded_buffer_with(&config, &mut buf, w.format_bytes(), &args);
                black_box(n.ok());
                black_box(&buf);
            });
        });

        group.bench_with_input(BenchmarkId::new("host_libc", name), workload, |b, _| {
            let mut buf = [0u8; BUF_LEN];
            b.iter(|| {
                black_box(host_snprintf(&mut buf, c_format, &c_args));
                black_box(&buf);
            });
        });
    }
    group.finish();
}

fn bench_growable(c: &mut Criterion) {
    let config = RenderConfig::default();
    let mut group = c.benchmark_group("asprintf");
    for precision in [16usize, 256, 4096] {
        let format = format!("%.{precision}f");
        group.bench_with_input(BenchmarkId::new("fixed_precision", precision), &format, |b, f| {
            b.iter(|| {
                let mut sink = GrowableSink::<u8>::new();
                let n = render(&mut sink, f.as_bytes(), &[black_box(0.1).into()], &config);
                black_box(n.ok());
                black_box(sink.into_vec());
            });
        });
    }
    group.finish();
}

fn check_parity(_: &mut Criterion) {
    // Benchmarks are meaningless if the two sides disagree.
    let config = RenderConfig::default();
    for workload in WORKLOADS {
        let mut ours = [0u8; BUF_LEN];
        let mut host = [0u8; BUF_LEN];
        let n = render_to_bounded_buffer_with(
            &config,
            &mut ours,
            workload.format_bytes(),
            &workload.engine_args(),
        )
        .unwrap();
        let c_args: Vec<CArg> = workload.args.iter().copied().map(CArg::from_bench).collect();
        let m = host_snprintf(&mut host, workload.format.as_ptr().cast::<c_char>(), &c_args);
        assert_eq!(Ok(n), usize::try_from(m), "{}", workload.name);
        assert_eq!(ours[..n.min(BUF_LEN - 1)], host[..n.min(BUF_LEN - 1)], "{}", workload.name);
    }
}

criterion_group!(benches, check_parity, bench_workloads, bench_growable);
criterion_main!(benches);
