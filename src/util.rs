use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub(crate) fn stable_hash(value: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Deterministic pseudo-random triple in [-1, 1] derived from an id.
pub(crate) fn stable_triple(id: &str) -> (f32, f32, f32) {
    let hash = stable_hash(id);

    let x = ((hash & 0x1f_ffff) as f64 / 0x1f_ffff as f64) as f32;
    let y = (((hash >> 21) & 0x1f_ffff) as f64 / 0x1f_ffff as f64) as f32;
    let z = (((hash >> 42) & 0x1f_ffff) as f64 / 0x1f_ffff as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0, (z * 2.0) - 1.0)
}

/// Deterministic value in [0, 1) derived from a label, used to pick zone hues.
pub(crate) fn stable_unit(label: &str) -> f32 {
    let hash = stable_hash(label);
    ((hash & 0xffff_ffff) as f64 / (u32::MAX as f64 + 1.0)) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_values_are_deterministic() {
        assert_eq!(stable_triple("pod/nginx"), stable_triple("pod/nginx"));
        assert_eq!(stable_unit("default"), stable_unit("default"));
    }

    #[test]
    fn stable_values_stay_in_range() {
        for id in ["a", "deployment/api", "kube-system", ""] {
            let (x, y, z) = stable_triple(id);
            for value in [x, y, z] {
                assert!((-1.0..=1.0).contains(&value));
            }
            let unit = stable_unit(id);
            assert!((0.0..1.0).contains(&unit));
        }
    }
}
