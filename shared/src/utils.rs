//! Small helpers shared across crates

/// Masks a secret for logs, keeping only its first and last character.
pub fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 2 {
        return "*".repeat(chars.len());
    }
    let mut masked = String::with_capacity(secret.len());
    masked.push(chars[0]);
    masked.push_str(&"*".repeat(chars.len() - 2));
    masked.push(chars[chars.len() - 1]);
    masked
}
