#![no_main]

use import_transformer::{ImportMap, Loader, Rewriter, Strategy};
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

    // Map every specifier the module imports, so substitution always has work to do.
    let import_map = ImportMap::new(
        rewriter
            .program()
            .imports()
            .map(|decl| (decl.source.value.clone(), format!("/mapped/{}", decl.source.value))),
    );

    for strategy in [
        Strategy::ImportMap(Some(&import_map)),
        Strategy::Loader(Loader::DynamicImport),
        Strategy::Loader(Loader::Require),
        Strategy::Strip,
    ] {
        if let Ok(out) = rewriter.rewrite(strategy) {
            // Edits are in original coordinates; their deltas account for the length change.
            let delta: isize = out.edits.iter().map(|e| e.delta()).sum();
            assert_eq!(out.code.len() as isize, source.len() as isize + delta);
        }
    }

    let _ = rewriter.has_imports();
});
