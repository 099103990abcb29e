/// Map ASCII digits to their full-width forms (`0` → `０`); other chars pass through.
pub fn to_full_width_digits(s: &str) -> String {
    s.chars()
        .map(|c| match c.to_digit(10) {
            Some(d) => char::from_u32('０' as u32 + d).unwrap_or(c),
            None => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_every_digit() {
        assert_eq!(to_full_width_digits("0123456789"), "０１２３４５６７８９");
        assert_eq!(to_full_width_digits("令和12年"), "令和１２年");
    }
}
