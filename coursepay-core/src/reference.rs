use rand::Rng;

const REFERENCE_PREFIX: &str = "TXN";
const RANDOM_LEN: usize = 6;

/// Generate a transaction reference: `TXN-<unix millis>-<random>`,
/// uppercased.
///
/// Unique with overwhelming probability across concurrent calls; the
/// unique constraint on `payments.reference` is the authoritative
/// backstop, and a collision there surfaces as a retryable creation
/// failure rather than a silent overwrite.
pub fn generate_reference() -> String {
    let millis = time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let suffix: String = rand::rng()
        .sample_iter(rand::distr::Alphanumeric)
        .take(RANDOM_LEN)
        .map(char::from)
        .collect();
    format!(
        "{REFERENCE_PREFIX}-{millis}-{}",
        suffix.to_ascii_uppercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_has_expected_shape() {
        let reference = generate_reference();
        let parts: Vec<&str> = reference.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "TXN");
        assert!(parts[1].parse::<i128>().is_ok());
        assert_eq!(parts[2].len(), RANDOM_LEN);
        assert_eq!(reference, reference.to_uppercase());
    }

    #[test]
    fn references_differ_across_draws() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..16 {
            assert!(seen.insert(generate_reference()));
        }
    }
}
