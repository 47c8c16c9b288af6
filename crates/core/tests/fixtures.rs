use std::path::PathBuf;

use import_transformer::{ImportMap, Loader, Rewriter, Strategy};

fn fixtures_dir() -> PathBuf {
    #[cfg(target_os = "wasi")]
    {
        PathBuf::from("/workspace/fixtures")
    }

    #[cfg(not(target_os = "wasi"))]
    {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../fixtures")
    }
}

fn read_fixture(name: &str) -> Option<String> {
    std::fs::read_to_string(fixtures_dir().join(name)).ok()
}

fn import_map() -> ImportMap {
    ImportMap::from_json(&read_fixture("importmap.json").expect("read importmap.json"))
}

const INPUTS: [&str; 3] = ["components.js", "mixed.js", "unicode.js"];

fn strategies(import_map: &ImportMap) -> [(&'static str, Strategy<'_>); 4] {
    [
        ("import-map", Strategy::ImportMap(Some(import_map))),
        ("dynamic-import", Strategy::Loader(Loader::DynamicImport)),
        ("require", Strategy::Loader(Loader::Require)),
        ("strip", Strategy::Strip),
    ]
}

fn expected_name(input_name: &str, mode: &str) -> String {
    let basename = input_name.trim_end_matches(".js");
    format!("{basename}.{mode}.out.js")
}

/// A missing `.out.js` file means the mode must reject the input.
#[test]
fn fixtures_match_expected_output() {
    let import_map = import_map();

    for input_name in INPUTS {
        let input = read_fixture(input_name).expect("read fixture");
        let rewriter = Rewriter::new(input).unwrap();

        for (mode, strategy) in strategies(&import_map) {
            let actual = rewriter.rewrite(strategy);
            match read_fixture(&expected_name(input_name, mode)) {
                Some(expected) => {
                    let actual = actual.unwrap_or_else(|e| panic!("{input_name} ({mode}): {e}"));
                    assert_eq!(actual.code, expected, "fixture mismatch: {input_name} ({mode})");
                }
                None => assert!(
                    actual.is_err(),
                    "expected {input_name} ({mode}) to be rejected"
                ),
            }
        }
    }
}

#[test]
fn fixture_outputs_have_no_imports_left() {
    let import_map = import_map();

    for input_name in INPUTS {
        let input = read_fixture(input_name).expect("read fixture");
        let rewriter = Rewriter::new(input).unwrap();
        assert!(rewriter.has_imports(), "{input_name} should import something");

        for (mode, strategy) in strategies(&import_map) {
            let Ok(out) = rewriter.rewrite(strategy) else {
                continue;
            };
            let reparsed = Rewriter::new(out.code)
                .unwrap_or_else(|e| panic!("{input_name} ({mode}) output must parse: {e}"));
            let expect_imports = matches!(strategy, Strategy::ImportMap(_));
            assert_eq!(reparsed.has_imports(), expect_imports, "{input_name} ({mode})");
        }
    }
}

#[test]
fn fixtures_emit_parseable_sourcemaps() {
    let import_map = import_map();

    for input_name in INPUTS {
        let input = read_fixture(input_name).expect("read fixture");
        let rewriter = Rewriter::new(input).unwrap();

        for (mode, strategy) in strategies(&import_map) {
            let Ok(out) = rewriter.rewrite(strategy) else {
                continue;
            };
            let json = rewriter
                .create_sourcemap(&out, input_name)
                .unwrap_or_else(|e| panic!("{input_name} ({mode}): {e}"));
            let map = sourcemap::SourceMap::from_slice(json.as_bytes())
                .expect("sourcemap JSON must parse");
            assert_eq!(map.get_source(0), Some(input_name));
        }
    }
}
