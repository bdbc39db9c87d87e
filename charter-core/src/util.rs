//! Shared helpers

/// Namespace used when none is given
pub const DEFAULT_NAMESPACE: &str = "default";

/// Returns true if any input is empty or only whitespace
pub fn any_blank(inputs: &[&str]) -> bool {
    inputs.iter().any(|input| input.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_blank() {
        assert!(!any_blank(&["cluster", "default"]));
        assert!(any_blank(&["cluster", ""]));
        assert!(any_blank(&["   ", "default"]));
        assert!(!any_blank(&[]));
    }
}
