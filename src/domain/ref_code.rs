use rand::Rng;

pub const REF_CODE_PREFIX: &str = "RUANG";
const SUFFIX_LEN: usize = 6;
const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// `RUANG-<TYPE>-<unix millis>-<random>`. Uniqueness is enforced by the
/// store's unique index, not here.
pub fn generate_ref_code(payment_type: &str) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();

    format!(
        "{}-{}-{}-{}",
        REF_CODE_PREFIX,
        payment_type.trim().to_uppercase(),
        chrono::Utc::now().timestamp_millis(),
        suffix
    )
}

/// Rounds a requested amount to whole minor units. Returns `None` for
/// non-finite or non-positive amounts.
pub fn normalize_amount(amount: f64) -> Option<i64> {
    if !amount.is_finite() {
        return None;
    }
    let rounded = amount.round();
    if rounded < 1.0 || rounded > i64::MAX as f64 {
        return None;
    }
    Some(rounded as i64)
}
