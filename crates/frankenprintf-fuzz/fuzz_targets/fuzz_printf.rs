#![no_main]
//! Arbitrary formats and argument lists must never panic, and a bounded
//! render must agree with the growable one.

use std::cell::Cell;

use frankenprintf_core::{
    Arg, RenderConfig, RoundingMode, render_to_bounded_buffer_with, render_to_new_buffer_with,
    u16_asprintf_with,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Layout: [control byte][arg bytes (8 per arg)] | 0xFF | [format bytes]
    let Some((&control, rest)) = data.split_first() else {
        return;
    };
    let split = rest.iter().position(|&b| b == 0xFF).unwrap_or(0);
    let (arg_bytes, format) = rest.split_at(split);
    let format = format.strip_prefix(&[0xFF]).unwrap_or(format);

    let cell = Cell::new(0i64);
    let text = "fuzz ✓";
    let wide: Vec<u32> = text.chars().map(u32::from).collect();
    let args: Vec<Arg<'_>> = arg_bytes
        .chunks(8)
        .take(16)
        .map(|chunk| {
            let mut raw = [0u8; 8];
            raw[..chunk.len()].copy_from_slice(chunk);
            let bits = u64::from_le_bytes(raw);
            match chunk[0] % 8 {
                0 => Arg::Signed(bits as i64),
                1 => Arg::Unsigned(bits),
                2 => Arg::Double(f64::from_bits(bits)),
                3 => Arg::from(text),
                4 => Arg::wide(&wide),
                5 => Arg::Char(chunk[0]),
                6 => Arg::long_double(f64::from_bits(bits)),
                _ => Arg::Count(&cell),
            }
        })
        .collect();

    let rounding = match control & 3 {
        0 => RoundingMode::NearestEven,
        1 => RoundingMode::Upward,
        2 => RoundingMode::Downward,
        _ => RoundingMode::TowardZero,
    };
    let config = RenderConfig::default()
        .with_rounding(rounding)
        .with_count_directive(control & 4 != 0)
        .with_length_limit(1 << 20);

    let full = render_to_new_buffer_with(&config, format, &args);
    let mut small = [0u8; 16];
    let bounded = render_to_bounded_buffer_with(&config, &mut small, format, &args);
    match (&full, &bounded) {
        (Ok(out), Ok(n)) => {
            assert_eq!(out.len(), *n);
            let stored = out.len().min(small.len() - 1);
            assert_eq!(&small[..stored], &out[..stored]);
            assert_eq!(small[stored], 0);
        }
        (Err(_), Err(_)) => {}
        _ => panic!("bounded and growable renders disagree: {full:?} vs {bounded:?}"),
    }

    let _ = u16_asprintf_with(&config, format, &args);
});
