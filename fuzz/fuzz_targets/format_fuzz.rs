//! Format fuzz target: feed arbitrary text to the format-string parser.
//! The parser must not panic; it should return Ok(FormatString) or Err(CodecError).
//! Build with: cargo fuzz run format_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let s = match std::str::from_utf8(data) {
        Ok(x) => x,
        Err(_) => return,
    };
    if let Ok(format) = flatwire::FormatString::parse(s) {
        // Rendering must parse back to the same codes.
        let again = flatwire::FormatString::parse(&format.packer_format()).expect("re-parse");
        assert_eq!(again, format);
    }
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run format_fuzz");
}
