//! Logistics channel derivation.

/// Derive the logistics channel from a shipping-method string.
///
/// The channel is the text after the first hyphen, trimmed. A method
/// without a hyphen is its own channel.
///
/// # Example
/// ```
/// use whx::transform::extract_channel;
///
/// assert_eq!(extract_channel("Air-Express"), "Express");
/// assert_eq!(extract_channel(" Ground "), "Ground");
/// assert_eq!(extract_channel("Sea - Slow - Bulk"), "Slow - Bulk");
/// ```
pub fn extract_channel(method: &str) -> String {
    let method = method.trim();
    match method.split_once('-') {
        Some((_, channel)) => channel.trim().to_string(),
        None => method.to_string(),
    }
}
