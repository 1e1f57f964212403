use sha2::{Digest, Sha512};

/// Lowercase hex SHA-512 of `order_id || status_code || gross_amount || server_key`,
/// no separators.
pub fn compute_signature(order_id: &str, status_code: &str, gross_amount: &str, server_key: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn verify_signature(
    order_id: &str,
    status_code: &str,
    gross_amount: &str,
    signature: &str,
    server_key: &str,
) -> bool {
    let expected = compute_signature(order_id, status_code, gross_amount, server_key);
    constant_time_eq(expected.as_bytes(), signature.as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
