use std::collections::BTreeMap;
use std::fmt;

use crate::{
    foundation::core::css_number,
    foundation::error::{MotionError, MotionResult},
    keyframes::model::{Keyframe, resolve_offsets},
};

/// CSS property that receives a frame's `easing`.
pub const TIMING_FUNCTION_PROPERTY: &str = "animation-timing-function";

/// Deterministic `@keyframes` body produced from a keyframe list.
///
/// Two lists that differ only in property ordering compile to byte-identical text, which is
/// what makes content-hash deduplication in the style registry work.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledRules {
    /// Blocks in ascending offset order.
    pub blocks: Vec<RuleBlock>,
}

/// One `N%{...}` block of a compiled keyframe body.
#[derive(Clone, Debug, PartialEq)]
pub struct RuleBlock {
    /// Offset as a fraction in `[0, 1]`.
    pub offset: f64,
    /// Hyphenated `(property, value)` pairs, sorted.
    pub declarations: Vec<(String, String)>,
}

impl RuleBlock {
    fn write_to(&self, out: &mut impl fmt::Write) -> fmt::Result {
        write!(out, "{}%{{", css_number(self.offset * 100.0))?;
        for (i, (name, value)) in self.declarations.iter().enumerate() {
            if i > 0 {
                out.write_char(';')?;
            }
            write!(out, "{name}:{value}")?;
        }
        out.write_char('}')
    }
}

impl CompiledRules {
    /// Render the keyframe body text (blocks joined by newlines).
    pub fn text(&self) -> String {
        self.to_string()
    }

    /// `true` when the list produced no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl fmt::Display for CompiledRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            block.write_to(f)?;
        }
        Ok(())
    }
}

/// Map key ordering non-negative offsets numerically.
///
/// Resolved offsets are finite and in `[0, 1]`, where IEEE-754 bit patterns sort the same way
/// as the values they encode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct OffsetKey(u64);

impl OffsetKey {
    fn new(offset: f64) -> Self {
        Self((offset + 0.0).to_bits())
    }

    fn offset(self) -> f64 {
        f64::from_bits(self.0)
    }
}

type Buckets = BTreeMap<OffsetKey, BTreeMap<String, serde_json::Value>>;

/// Collapse frames sharing an offset into one property bucket, last write wins.
fn group_by_offset(frames: &[Keyframe]) -> MotionResult<Buckets> {
    let offsets = resolve_offsets(frames)?;
    let mut buckets = Buckets::new();
    for (frame, offset) in frames.iter().zip(offsets) {
        let bucket = buckets.entry(OffsetKey::new(offset)).or_default();
        for (key, value) in &frame.properties {
            bucket.insert(key.clone(), value.clone());
        }
        if let Some(easing) = &frame.easing {
            bucket.insert(
                TIMING_FUNCTION_PROPERTY.to_string(),
                serde_json::Value::String(easing.clone()),
            );
        }
    }
    Ok(buckets)
}

fn css_value(property: &str, value: &serde_json::Value) -> MotionResult<Option<String>> {
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) => Ok(Some(s.clone())),
        serde_json::Value::Bool(b) => Ok(Some(b.to_string())),
        serde_json::Value::Number(n) => match n.as_f64() {
            Some(v) => Ok(Some(css_number(v))),
            None => Ok(Some(n.to_string())),
        },
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => Err(MotionError::keyframe(
            format!("property '{property}' must be a string, number, boolean or null"),
        )),
    }
}

/// Turn a camelCase property name into its hyphenated CSS form.
///
/// `msTransform` becomes `-ms-transform`, matching the vendor-prefix convention other
/// prefixes (`WebkitTransform` → `-webkit-transform`) get for free.
pub fn hyphenate(property: &str) -> String {
    let mut out = String::with_capacity(property.len() + 4);
    for c in property.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    if out.starts_with("ms-") {
        out.insert(0, '-');
    }
    out
}

/// Compile a keyframe list into a deterministic `@keyframes` body.
pub fn compile_keyframes(frames: &[Keyframe]) -> MotionResult<CompiledRules> {
    let buckets = group_by_offset(frames)?;
    let mut blocks = Vec::with_capacity(buckets.len());
    for (key, props) in buckets {
        let mut declarations = Vec::with_capacity(props.len());
        for (name, value) in &props {
            if let Some(value) = css_value(name, value)? {
                declarations.push((hyphenate(name.trim()), value));
            }
        }
        declarations.sort();
        blocks.push(RuleBlock {
            offset: key.offset(),
            declarations,
        });
    }
    Ok(CompiledRules { blocks })
}

#[cfg(test)]
#[path = "../../tests/unit/keyframes/compile.rs"]
mod tests;
