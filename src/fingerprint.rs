use sha2::{Digest, Sha256};

/// Digest of the human-visible content of one date's entry: lead heading,
/// composed HTML, and the primary link. Dates, positions, result counts and
/// timestamps are deliberately excluded so cosmetic metadata never looks
/// like a content change. Fields are length-prefixed so shifting bytes
/// across a boundary can never collide.
pub fn fingerprint(heading: &str, content: &str, link: &str) -> String {
    let mut hasher = Sha256::new();
    for field in [heading, content, link] {
        hasher.update((field.len() as u64).to_be_bytes());
        hasher.update(field.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}
