//! `srcset` attribute parsing.

use crate::variants::SizeHint;

/// Nominal edge length per unit of pixel density (`2x` → 2000×2000). A rough
/// signal only; an explicit size in the URL always takes precedence.
pub const DENSITY_UNIT_PX: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrcsetEntry {
    pub url: String,
    pub hint: Option<SizeHint>,
}

/// Split a `srcset` value into entries. Width descriptors (`640w`) give a
/// square hint of that width; density descriptors (`1.5x`) are scaled by
/// [`DENSITY_UNIT_PX`]. Unknown or malformed descriptors leave the hint empty.
pub fn parse_srcset(srcset: &str) -> Vec<SrcsetEntry> {
    srcset
        .split(',')
        .filter_map(|part| {
            let mut tokens = part.split_whitespace();
            let url = tokens.next()?.to_string();
            let hint = tokens.next().and_then(parse_descriptor);
            Some(SrcsetEntry { url, hint })
        })
        .collect()
}

fn parse_descriptor(token: &str) -> Option<SizeHint> {
    let d = token.to_ascii_lowercase();
    if let Some(w) = d.strip_suffix('w') {
        let w: u32 = w.parse().ok()?;
        return (w > 0).then(|| SizeHint::new(w, w));
    }
    if let Some(mul) = d.strip_suffix('x') {
        let mul: f64 = mul.parse().ok()?;
        if !mul.is_finite() || mul <= 0.0 {
            return None;
        }
        let edge = (mul * DENSITY_UNIT_PX) as u32;
        return Some(SizeHint::new(edge, edge));
    }
    None
}
