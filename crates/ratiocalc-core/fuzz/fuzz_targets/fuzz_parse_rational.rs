#![no_main]
use libfuzzer_sys::fuzz_target;
use ratiocalc_core::rational::Rational;

fuzz_target!(|data: &[u8]| {
    // Any string may be rejected, but accepted values must render back to
    // themselves.
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if text.len() > 256 {
        return;
    }
    if let Ok(value) = text.parse::<Rational>() {
        let back: Rational = value.to_string().parse().unwrap();
        assert_eq!(back, value);
    }
});
