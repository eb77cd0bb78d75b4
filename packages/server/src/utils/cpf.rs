//! Brazilian taxpayer number (CPF) handling.

/// Strip punctuation and validate both check digits.
///
/// Returns the eleven bare digits when valid.
pub fn normalize(input: &str) -> Option<String> {
    let digits: Vec<u32> = input.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() != 11 {
        return None;
    }
    // Repeated digits pass the checksum but are never issued.
    if digits.iter().all(|&d| d == digits[0]) {
        return None;
    }
    if check_digit(&digits[..9]) != digits[9] || check_digit(&digits[..10]) != digits[10] {
        return None;
    }
    Some(digits.iter().map(|d| char::from(b'0' + *d as u8)).collect())
}

fn check_digit(digits: &[u32]) -> u32 {
    let weight = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| d * (weight - i as u32))
        .sum();
    let rem = 11 - sum % 11;
    if rem >= 10 { 0 } else { rem }
}
