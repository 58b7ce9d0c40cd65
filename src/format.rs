/// Renders `value` with exactly `decimals` digits after the point.
pub fn to_fixed(value: f64, decimals: usize) -> String {
    let text = format!("{:.*}", decimals, value);
    // -0.00 reads as a sign error in a schedule
    if text.starts_with('-') && text[1..].chars().all(|c| c == '0' || c == '.') {
        text[1..].to_string()
    } else {
        text
    }
}
