#![no_main]

use import_transformer::{Loader, Rewriter, Strategy};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let data = if data.len() > 256 * 1024 {
        &data[..256 * 1024]
    } else {
        data
    };

    let source = String::from_utf8_lossy(data);
    let Ok(rewriter) = Rewriter::new(source.as_ref()) else {
        return;
    };

    for strategy in [Strategy::Loader(Loader::Require), Strategy::Strip] {
        let Ok(out) = rewriter.rewrite(strategy) else {
            continue;
        };
        if let Ok(map) = rewriter.create_sourcemap(&out, "fuzz.js") {
            // If creation succeeds, the sourcemap must be parseable JSON.
            // Any panic here is a bug we want the fuzzer to catch.
            let _ = serde_json::from_str::<serde_json::Value>(&map)
                .expect("sourcemap must be valid JSON when create_sourcemap() returns Ok");
        }
    }
});
