//! Container eligibility and output naming.

/// Default suffix of signed containers.
pub const CONTAINER_SUFFIX: &str = ".p7m";
/// Default suffix of extracted documents.
pub const OUTPUT_SUFFIX: &str = ".pdf";

/// Returns true if `name` ends with `suffix`, ignoring ASCII case.
pub fn is_eligible(name: &str, suffix: &str) -> bool {
    split_suffix(name, suffix).is_some()
}

/// Derive the output name by swapping the trailing container suffix.
///
/// Only the trailing suffix is replaced; directory components and any inner
/// extension (`invoice.pdf.p7m` → `invoice.pdf.pdf`) are kept as-is. A name
/// without the container suffix simply gets `output_suffix` appended.
pub fn output_name(name: &str, container_suffix: &str, output_suffix: &str) -> String {
    let stem = split_suffix(name, container_suffix).unwrap_or(name);
    format!("{stem}{output_suffix}")
}

fn split_suffix<'a>(name: &'a str, suffix: &str) -> Option<&'a str> {
    if suffix.is_empty() || name.len() < suffix.len() {
        return None;
    }
    let cut = name.len() - suffix.len();
    if !name.is_char_boundary(cut) {
        return None;
    }
    let (stem, tail) = name.split_at(cut);
    tail.eq_ignore_ascii_case(suffix).then_some(stem)
}
