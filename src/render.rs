//! The dimension-aware text renderer.
//!
//! Inverse of the parser: re-nests a flat, row-major element sequence into
//! correctly bracketed literal text. The renderer works in a single linear
//! pass with no recursive tree construction: for each dimension axis it
//! precomputes the cumulative element count at which a group on that axis
//! opens or closes, then emits braces whenever the running flat index hits
//! one of those strides.
//!
//! For dimensions `[3,5,2]` the strides are `[30,10,2]`: a `{` opens for
//! every axis whose stride divides the element index, a `}` closes for every
//! axis whose stride divides the index plus one.

use crate::error::Result;
use crate::value::Dimension;

/// Writes the explicit `[lb:ub]...=` dimension-bound prefix, but only when
/// some dimension has a lower bound other than the default 1. Arrays with
/// all-default bounds round-trip without a prefix, matching PostgreSQL's
/// own output.
pub fn write_dimension_prefix(out: &mut String, dimensions: &[Dimension]) {
    if dimensions.iter().all(|d| d.lower_bound == 1) {
        return;
    }
    for d in dimensions {
        let upper = d.lower_bound + d.length - 1;
        out.push('[');
        out.push_str(&d.lower_bound.to_string());
        out.push(':');
        out.push_str(&upper.to_string());
        out.push(']');
    }
    out.push('=');
}

/// Whether an element body must be quoted in the literal form.
///
/// Anything that could be confused with grammar structure needs quotes:
/// the empty string, the `NULL` literal (any case), or any occurrence of a
/// brace, comma, quote, backslash, or whitespace.
fn needs_quotes(s: &str) -> bool {
    s.is_empty()
        || s.eq_ignore_ascii_case("null")
        || s.chars()
            .any(|ch| matches!(ch, '{' | '}' | ',' | '"' | '\\') || ch.is_whitespace())
}

/// Appends an element body, quoting and escaping it if the grammar requires.
pub fn append_quoted_if_needed(out: &mut String, raw: &str) {
    if !needs_quotes(raw) {
        out.push_str(raw);
        return;
    }
    out.push('"');
    for ch in raw.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
}

/// Renders a flat element sequence as nested brace syntax.
///
/// `encode` is invoked once per flat index, in order, and must append the
/// final text for that element (including quoting and the `NULL` marker —
/// the array layer owns that policy). The empty array must be handled by the
/// caller; this function expects a non-empty dimension descriptor whose
/// length product equals `element_count`.
pub fn render_nested<F>(
    out: &mut String,
    element_count: usize,
    dimensions: &[Dimension],
    mut encode: F,
) -> Result<()>
where
    F: FnMut(usize, &mut String) -> Result<()>,
{
    // Stride per axis: the innermost axis is its own length, each outer
    // axis multiplies the next-inner stride.
    let mut strides = vec![0usize; dimensions.len()];
    let innermost = dimensions.len() - 1;
    strides[innermost] = dimensions[innermost].length as usize;
    for axis in (0..innermost).rev() {
        strides[axis] = dimensions[axis].length as usize * strides[axis + 1];
    }

    for i in 0..element_count {
        if i > 0 {
            out.push(',');
        }
        for &stride in &strides {
            if i % stride == 0 {
                out.push('{');
            }
        }
        encode(i, out)?;
        for &stride in &strides {
            if (i + 1) % stride == 0 {
                out.push('}');
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(lengths: &[i32]) -> Vec<Dimension> {
        lengths
            .iter()
            .map(|&length| Dimension {
                length,
                lower_bound: 1,
            })
            .collect()
    }

    fn render(labels: &[&str], dimensions: &[Dimension]) -> String {
        let mut out = String::new();
        render_nested(&mut out, labels.len(), dimensions, |i, out| {
            out.push_str(labels[i]);
            Ok(())
        })
        .unwrap();
        out
    }

    #[test]
    fn test_single_dimension() {
        assert_eq!(render(&["a", "b", "c"], &dims(&[3])), "{a,b,c}");
    }

    #[test]
    fn test_two_by_two() {
        assert_eq!(
            render(&["a", "b", "c", "d"], &dims(&[2, 2])),
            "{{a,b},{c,d}}"
        );
    }

    #[test]
    fn test_three_dimensions() {
        let labels: Vec<String> = (0..12).map(|i| i.to_string()).collect();
        let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
        assert_eq!(
            render(&labels, &dims(&[2, 3, 2])),
            "{{{0,1},{2,3},{4,5}},{{6,7},{8,9},{10,11}}}"
        );
    }

    #[test]
    fn test_dimension_prefix_default_bounds_elided() {
        let mut out = String::new();
        write_dimension_prefix(&mut out, &dims(&[2, 2]));
        assert_eq!(out, "");
    }

    #[test]
    fn test_dimension_prefix_custom_bounds() {
        let mut out = String::new();
        write_dimension_prefix(
            &mut out,
            &[
                Dimension {
                    length: 3,
                    lower_bound: 0,
                },
                Dimension {
                    length: 2,
                    lower_bound: 1,
                },
            ],
        );
        assert_eq!(out, "[0:2][1:2]=");
    }

    #[test]
    fn test_quoting() {
        let mut out = String::new();
        append_quoted_if_needed(&mut out, "plain");
        assert_eq!(out, "plain");

        for (raw, expected) in [
            ("", "\"\""),
            ("NULL", "\"NULL\""),
            ("null", "\"null\""),
            ("a b", "\"a b\""),
            ("a,b", "\"a,b\""),
            ("{x}", "\"{x}\""),
            ("say \"hi\"", r#""say \"hi\"""#),
            ("back\\slash", r#""back\\slash""#),
        ] {
            let mut out = String::new();
            append_quoted_if_needed(&mut out, raw);
            assert_eq!(out, expected, "raw {raw:?}");
        }
    }
}
