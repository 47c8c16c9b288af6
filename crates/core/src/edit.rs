//! Span edits, the offset-tracking edit pass, and sourcemap creation.
//!
//! An [`Edit`] replaces a byte range of the *original* source. Strategies apply edits one at a
//! time, in document order, to a string that already contains every earlier edit; the running
//! length delta (the "index offset") translates original coordinates into the current string.
//!
//! Key ideas:
//!
//! - Internal offsets are byte-based (tree-sitter's model).
//! - Each edit carries a per-output-byte origin map (see [`Edit::output_byte_to_input_byte`]) so
//!   text copied into a replacement (an import statement wrapped in a comment, a specifier list
//!   moved into a `const` binding) still maps back to where it came from.
//! - Sourcemap columns are emitted as UTF-16 code unit columns.
//!
//! Invariants:
//!
//! - Edits are applied in ascending `start` order and never overlap ([`EditPass`] enforces this).
//! - At the moment an edit is applied, the running offset equals the sum of the deltas of every
//!   edit applied before it.

use crate::{RewriteError, ast::Span, utf16::Utf16Index};

/// A replacement of `[start, end)` in the original source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    /// Start byte offset (inclusive) in the original source.
    pub start: usize,
    /// End byte offset (exclusive) in the original source.
    pub end: usize,
    /// Replacement text inserted into the output code.
    pub replacement: String,
    /// For each output byte in `replacement`, the originating byte offset in the original source.
    ///
    /// - `Some(input_byte)` means this output byte was copied from the original source.
    /// - `None` means this output byte is synthesized and should be considered unmapped.
    pub output_byte_to_input_byte: Vec<Option<usize>>,
}

impl Edit {
    pub fn builder(span: Span) -> EditBuilder {
        EditBuilder {
            span,
            replacement: String::new(),
            origins: Vec::new(),
        }
    }

    /// Net length change this edit introduces.
    pub fn delta(&self) -> isize {
        self.replacement.len() as isize - (self.end as isize - self.start as isize)
    }
}

/// Assembles an [`Edit`] replacement from synthesized and copied pieces.
#[derive(Debug, Clone)]
pub struct EditBuilder {
    span: Span,
    replacement: String,
    origins: Vec<Option<usize>>,
}

impl EditBuilder {
    /// Append synthesized text.
    pub fn insert(mut self, text: &str) -> Self {
        self.replacement.push_str(text);
        self.origins.extend(std::iter::repeat_n(None, text.len()));
        self
    }

    /// Append original source text, keeping its origin.
    pub fn copy(mut self, source: &str, span: Span) -> Result<Self, RewriteError> {
        let text = span.text(source).ok_or_else(|| {
            RewriteError::InvalidEdit(format!(
                "copied range [{},{}) is outside the source (len={})",
                span.start,
                span.end,
                source.len()
            ))
        })?;
        self.replacement.push_str(text);
        self.origins.extend((span.start..span.end).map(Some));
        Ok(self)
    }

    pub fn build(self) -> Edit {
        Edit {
            start: self.span.start,
            end: self.span.end,
            replacement: self.replacement,
            output_byte_to_input_byte: self.origins,
        }
    }
}

/// The new full string after one edit, and the length delta that edit introduced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditResult {
    pub code: String,
    pub offset: isize,
}

/// Apply `edit` to `code`, whose earlier edits have shifted original offsets by `offset`.
///
/// The caller must add the returned `offset` to its running offset before applying the next
/// edit.
pub fn apply_edit(code: &str, edit: &Edit, offset: isize) -> Result<EditResult, RewriteError> {
    let shift = |pos: usize| -> Result<usize, RewriteError> {
        usize::try_from(pos as isize + offset)
            .ok()
            .filter(|&p| p <= code.len() && code.is_char_boundary(p))
            .ok_or_else(|| {
                RewriteError::InvalidEdit(format!(
                    "offset {pos}{offset:+} does not land on a character boundary of the current \
                     code (len={})",
                    code.len()
                ))
            })
    };

    if edit.start > edit.end {
        return Err(RewriteError::InvalidEdit(format!(
            "start > end: start={}, end={}",
            edit.start, edit.end
        )));
    }
    let start = shift(edit.start)?;
    let end = shift(edit.end)?;

    let mut out = String::with_capacity(code.len() + edit.replacement.len());
    out.push_str(&code[..start]);
    out.push_str(&edit.replacement);
    out.push_str(&code[end..]);

    Ok(EditResult {
        code: out,
        offset: edit.delta(),
    })
}

/// Left-to-right fold state for one rewrite of one source.
#[derive(Debug, Clone)]
pub struct EditPass {
    code: String,
    offset: isize,
    edits: Vec<Edit>,
}

impl EditPass {
    pub fn new(source: &str) -> Self {
        Self {
            code: source.to_string(),
            offset: 0,
            edits: Vec::new(),
        }
    }

    /// Current running offset (sum of deltas of every applied edit).
    pub fn offset(&self) -> isize {
        self.offset
    }

    /// Apply the next edit. Edits must arrive in document order.
    pub fn apply(&mut self, edit: Edit) -> Result<(), RewriteError> {
        if let Some(prev) = self.edits.last()
            && edit.start < prev.end
        {
            return Err(RewriteError::OverlappingEdits {
                a_start: prev.start,
                a_end: prev.end,
                b_start: edit.start,
                b_end: edit.end,
            });
        }

        let EditResult { code, offset } = apply_edit(&self.code, &edit, self.offset)?;
        self.code = code;
        self.offset += offset;

        tracing::debug!(
            start = edit.start,
            end = edit.end,
            delta = offset,
            running_offset = self.offset,
            "applied edit"
        );

        self.edits.push(edit);
        Ok(())
    }

    pub fn finish(self) -> (String, Vec<Edit>) {
        (self.code, self.edits)
    }
}

/// Validate edit invariants required by [`create_sourcemap`].
///
/// This performs cheap structural checks only:
///
/// - `start <= end` and `end <= input_len`
/// - edits are non-overlapping (when provided in ascending `start` order)
/// - `output_byte_to_input_byte.len() == replacement.len()`
/// - any `Some(input_byte)` origin is `< input_len`
pub fn validate_edits(input_len: usize, edits: &[Edit]) -> Result<(), RewriteError> {
    let mut prev: Option<&Edit> = None;
    for (idx, e) in edits.iter().enumerate() {
        if e.start > e.end || e.end > input_len {
            return Err(RewriteError::InvalidEdit(format!(
                "edit {idx} out of bounds: [{},{}) with input_len={input_len}",
                e.start, e.end
            )));
        }
        if let Some(p) = prev
            && e.start < p.end
        {
            return Err(RewriteError::OverlappingEdits {
                a_start: p.start,
                a_end: p.end,
                b_start: e.start,
                b_end: e.end,
            });
        }
        if e.output_byte_to_input_byte.len() != e.replacement.len() {
            return Err(RewriteError::InvalidEdit(format!(
                "origin map length mismatch at index {idx}: map_len={}, replacement_len={}",
                e.output_byte_to_input_byte.len(),
                e.replacement.len()
            )));
        }
        if let Some(bad) = e
            .output_byte_to_input_byte
            .iter()
            .flatten()
            .find(|&&b| b >= input_len)
        {
            return Err(RewriteError::InvalidEdit(format!(
                "mapped input byte out of bounds at index {idx}: {bad} >= input_len={input_len}"
            )));
        }
        prev = Some(e);
    }
    Ok(())
}

/// Create a sourcemap for `output_code`, mapping back to `input_code`.
///
/// Mapping model:
///
/// - Unchanged bytes map 1:1.
/// - Bytes copied into a replacement map to their original bytes via
///   [`Edit::output_byte_to_input_byte`].
/// - Synthesized bytes are marked unmapped.
///
/// Anchors are emitted at every output line start, and at every boundary inside or right after
/// an edit where the origin run changes (synthesized <-> copied, or a copied run that jumps).
pub fn create_sourcemap(
    input_code: &str,
    output_code: &str,
    source_filename: &str,
    edits: &[Edit],
) -> Result<String, RewriteError> {
    validate_edits(input_code.len(), edits)?;

    let in_utf16 = Utf16Index::new(input_code);
    let out_utf16 = Utf16Index::new(output_code);

    let (edit_out_spans, expected_out_len) = compute_output_spans(input_code.len(), edits);
    // Best effort if `output_code` doesn't match the edit math: map the overlapping prefix.
    let map_len = output_code.len().min(expected_out_len);
    let out_to_in = build_output_to_input_map(input_code.len(), map_len, &edit_out_spans);

    let mut anchors: Vec<usize> = out_utf16
        .line_starts()
        .iter()
        .copied()
        .filter(|&b| b < map_len)
        .collect();

    for &(_, out_start, out_end) in &edit_out_spans {
        for out_byte in out_start..=out_end {
            if out_byte >= map_len {
                break;
            }
            let starts_run = out_byte == out_start
                || match (out_to_in[out_byte - 1], out_to_in[out_byte]) {
                    (Some(prev), Some(cur)) => cur != prev + 1,
                    (None, None) => false,
                    _ => true,
                };
            if starts_run {
                anchors.push(out_byte);
            }
        }
    }

    anchors.sort_unstable();
    anchors.dedup();

    let mut builder = sourcemap::SourceMapBuilder::new(None);
    builder.add_source(source_filename);
    builder.set_source_contents(0, Some(input_code));

    for out_byte in anchors {
        let (out_line, out_col) = out_utf16.byte_to_line_utf16_col(out_byte);
        match out_to_in[out_byte] {
            Some(in_byte) => {
                let (in_line, in_col) = in_utf16.byte_to_line_utf16_col(in_byte);
                builder.add(
                    out_line as u32,
                    out_col as u32,
                    in_line as u32,
                    in_col as u32,
                    Some(source_filename),
                    None,
                    false,
                );
            }
            None => {
                builder.add(
                    out_line as u32,
                    out_col as u32,
                    u32::MAX,
                    u32::MAX,
                    None,
                    None,
                    false,
                );
            }
        }
    }

    let map = builder.into_sourcemap();
    let mut buf: Vec<u8> = Vec::new();
    map.to_writer(&mut buf)?;
    String::from_utf8(buf)
        .map_err(|e| RewriteError::InvalidEdit(format!("sourcemap JSON is not utf-8: {e}")))
}

/// Compute each edit's span in the output code.
///
/// Returns `(edit, out_start, out_end)` per edit and the expected output length.
fn compute_output_spans(input_len: usize, edits: &[Edit]) -> (Vec<(&Edit, usize, usize)>, usize) {
    let mut spans = Vec::with_capacity(edits.len());
    let mut delta: isize = 0;
    for e in edits {
        let out_start = (e.start as isize + delta) as usize;
        let out_end = out_start + e.replacement.len();
        spans.push((e, out_start, out_end));
        delta += e.delta();
    }

    let expected_out_len = (input_len as isize + delta).max(0) as usize;
    (spans, expected_out_len)
}

/// Build a map from output byte offset to input byte offset, of length `output_len`.
fn build_output_to_input_map(
    input_len: usize,
    output_len: usize,
    edit_out_spans: &[(&Edit, usize, usize)],
) -> Vec<Option<usize>> {
    let mut out_to_in: Vec<Option<usize>> = vec![None; output_len];

    let mut in_cursor = 0usize;
    let mut out_cursor = 0usize;

    for &(e, out_start, out_end) in edit_out_spans {
        copy_unchanged(&mut out_to_in, in_cursor..e.start, out_cursor);

        for (j, origin) in e.output_byte_to_input_byte.iter().enumerate() {
            let Some(slot) = out_to_in.get_mut(out_start + j) else {
                break;
            };
            *slot = origin.filter(|&b| b < input_len);
        }

        in_cursor = e.end;
        out_cursor = out_end;
    }
    copy_unchanged(&mut out_to_in, in_cursor..input_len, out_cursor);

    out_to_in
}

/// Map an unchanged input range 1:1 onto output bytes starting at `out_from`.
fn copy_unchanged(out_to_in: &mut [Option<usize>], input: std::ops::Range<usize>, out_from: usize) {
    for (i, in_byte) in input.enumerate() {
        match out_to_in.get_mut(out_from + i) {
            Some(slot) => *slot = Some(in_byte),
            None => break,
        }
    }
}
