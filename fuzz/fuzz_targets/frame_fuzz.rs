//! Frame fuzz target: decode arbitrary bytes as a frame and unpack its payload.
//! Neither step may panic, whatever the length prefix or format text claims.
//! Build with: cargo fuzz run frame_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    if let Ok(frame) = flatwire::Frame::decode(data) {
        let _ = flatwire::unpack(&frame.payload, &frame.format);
    }
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run frame_fuzz");
}
