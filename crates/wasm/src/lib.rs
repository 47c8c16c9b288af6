//! wasm-bindgen exports.
//!
//! This module exposes the import/export rewriter to JavaScript via `wasm-bindgen`.
//! The underlying logic lives in the `import-transformer` crate.

use indexmap::IndexMap;
use wasm_bindgen::prelude::*;

use import_transformer::{
    ImportMap as ImportMapInner, Loader, RewriteError, Rewriter, Strategy,
};

/// An import map; only `imports` is read.
#[derive(Debug, Clone, Default, serde::Deserialize, tsify::Tsify)]
#[tsify(from_wasm_abi)]
pub struct ImportMap {
    #[serde(default)]
    #[tsify(type = "Record<string, string>")]
    pub imports: IndexMap<String, String>,
}

impl From<ImportMap> for ImportMapInner {
    fn from(val: ImportMap) -> Self {
        ImportMapInner {
            imports: val.imports,
        }
    }
}

/// `null`/`undefined` means no map; anything that isn't an import map reads as an empty one.
fn import_map_from_js(value: JsValue) -> Option<ImportMapInner> {
    if value.is_null() || value.is_undefined() {
        return None;
    }
    let map: ImportMap = serde_wasm_bindgen::from_value(value).unwrap_or_default();
    Some(map.into())
}

fn to_js_error(err: RewriteError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Rewrite mode for [`rewrite_with_sourcemap`].
#[derive(Debug, Clone, Copy, serde::Deserialize, tsify::Tsify)]
#[tsify(from_wasm_abi)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    ImportMap,
    DynamicImport,
    Require,
    Strip,
}

/// Output of [`ImportTransformer::strip_imports_and_exports`].
#[derive(Debug, Clone, serde::Serialize, tsify::Tsify)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct StripOutput {
    /// The source with imports and exports commented out.
    pub code: String,
    /// Original text of each stripped import.
    pub imports: Vec<String>,
    /// Original text of each stripped export, or its `export { ... };` stand-in.
    pub exports: Vec<String>,
    /// Every exported name, `"default"` included.
    pub named_exports: Vec<String>,
}

/// Output from the wasm API when a sourcemap is requested.
#[derive(Debug, Clone, serde::Serialize, tsify::Tsify)]
#[tsify(into_wasm_abi)]
pub struct RewriteOutput {
    /// The rewritten module source.
    pub code: String,
    /// The generated sourcemap JSON.
    pub sourcemap: String,
}

/// A parsed module whose imports and exports can be rewritten.
#[wasm_bindgen]
pub struct ImportTransformer {
    inner: Rewriter,
}

#[wasm_bindgen]
impl ImportTransformer {
    #[wasm_bindgen(constructor)]
    pub fn new(code: String) -> Result<ImportTransformer, JsValue> {
        console_error_panic_hook::set_once();

        let inner = Rewriter::new(code).map_err(to_js_error)?;
        Ok(ImportTransformer { inner })
    }

    /// Replace import sources found in `import_map`.
    #[wasm_bindgen(js_name = transformWithImportMap)]
    pub fn transform_with_import_map(&self, import_map: JsValue) -> Result<String, JsValue> {
        let import_map = import_map_from_js(import_map);
        self.inner
            .transform_with_import_map(import_map.as_ref())
            .map(|out| out.code)
            .map_err(to_js_error)
    }

    /// Same as `transformWithImportMap`.
    pub fn transform(&self, import_map: JsValue) -> Result<String, JsValue> {
        self.transform_with_import_map(import_map)
    }

    #[wasm_bindgen(js_name = transformToDynamicImport)]
    pub fn transform_to_dynamic_import(&self) -> Result<String, JsValue> {
        self.inner
            .transform_to_dynamic_import()
            .map(|out| out.code)
            .map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = transformToRequire)]
    pub fn transform_to_require(&self) -> Result<String, JsValue> {
        self.inner
            .transform_to_require()
            .map(|out| out.code)
            .map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = stripImportsAndExports)]
    pub fn strip_imports_and_exports(&self) -> Result<StripOutput, JsValue> {
        let out = self.inner.strip_imports_and_exports().map_err(to_js_error)?;
        Ok(StripOutput {
            code: out.code,
            imports: out.imports.into_iter().collect(),
            exports: out.exports.into_iter().collect(),
            named_exports: out.named_exports.into_iter().collect(),
        })
    }

    #[wasm_bindgen(js_name = hasImports)]
    pub fn has_imports(&self) -> bool {
        self.inner.has_imports()
    }
}

/// Rewrite `code` with `mode` and create a brand-new sourcemap.
///
/// `source_name` is recorded as the sourcemap's source filename. `import_map` is only read in
/// `"import-map"` mode.
#[wasm_bindgen(js_name = rewriteWithSourcemap)]
pub fn rewrite_with_sourcemap(
    code: String,
    source_name: String,
    mode: Mode,
    import_map: JsValue,
) -> Result<RewriteOutput, JsValue> {
    console_error_panic_hook::set_once();

    let rewriter = Rewriter::new(code).map_err(to_js_error)?;
    let import_map = import_map_from_js(import_map);
    let strategy = match mode {
        Mode::ImportMap => Strategy::ImportMap(import_map.as_ref()),
        Mode::DynamicImport => Strategy::Loader(Loader::DynamicImport),
        Mode::Require => Strategy::Loader(Loader::Require),
        Mode::Strip => Strategy::Strip,
    };

    let rewritten = rewriter.rewrite(strategy).map_err(to_js_error)?;
    let sourcemap = rewriter
        .create_sourcemap(&rewritten, &source_name)
        .map_err(to_js_error)?;
    Ok(RewriteOutput {
        code: rewritten.code,
        sourcemap,
    })
}
