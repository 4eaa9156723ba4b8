use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub fn short_label(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }
    let head = text
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    format!("{head}\u{2026}")
}

/// Deterministic per-id jitter in [-1, 1]^2 so layouts are reproducible.
pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_label_truncates_with_ellipsis() {
        assert_eq!(short_label("abc", 8), "abc");
        assert_eq!(short_label("abcdefghij", 6), "abcde\u{2026}");
    }

    #[test]
    fn stable_pair_is_deterministic() {
        assert_eq!(stable_pair("node-1"), stable_pair("node-1"));
        assert_ne!(stable_pair("node-1"), stable_pair("node-2"));
    }
}
