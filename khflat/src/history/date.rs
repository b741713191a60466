//! Packed-date decoding for historical imagery timelines.

/// Decodes a packed date integer to `YYYY-MM-DD`.
///
/// The integer's *minimal* binary representation is partitioned as leading
/// 11 bits of year, next 4 of month, final 5 of day. For values whose
/// natural bit-length is under 20 this is not the same as a fixed-width
/// 20-bit read: the slicing shifts with the representation, and missing
/// month/day slices decode as zero. That behavior is kept deliberately for
/// wire compatibility; do not widen the field without verifying against
/// the live protocol.
pub fn decode_packed_date(value: u32) -> String {
    let binary = format!("{value:b}");
    let len = binary.len();

    let year = bits(&binary[..len.min(11)]);
    let month = bits(&binary[len.min(11)..len.min(15)]);
    let day = bits(&binary[len.min(15)..]);

    format!("{year}-{month:02}-{day:02}")
}

fn bits(slice: &str) -> u32 {
    if slice.is_empty() {
        0
    } else {
        u32::from_str_radix(slice, 2).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_timeline_dates() {
        // Timeline of tile 18/214697/40742, cross-checked against the
        // upstream client's rendering of the same point.
        assert_eq!(decode_packed_date(1030756), "2013-03-04");
        assert_eq!(decode_packed_date(1032027), "2015-10-27");
        assert_eq!(decode_packed_date(1032779), "2017-02-11");
        assert_eq!(decode_packed_date(1033259), "2018-01-11");
        assert_eq!(decode_packed_date(1033532), "2018-09-28");
        assert_eq!(decode_packed_date(1033830), "2019-03-06");
        assert_eq!(decode_packed_date(1034612), "2020-11-20");
        assert_eq!(decode_packed_date(1035062), "2021-09-22");
        assert_eq!(decode_packed_date(1036471), "2024-05-23");
        assert_eq!(decode_packed_date(1036697), "2024-12-25");
    }

    #[test]
    fn test_hex_literal_form() {
        assert_eq!(decode_packed_date(0xFD199), "2024-12-25");
    }

    #[test]
    fn test_zero_padding() {
        // 2013-03-04 exercises both single-digit month and day.
        let date = decode_packed_date(1030756);
        assert_eq!(&date[5..7], "03");
        assert_eq!(&date[8..10], "04");
    }

    #[test]
    fn test_short_value_slices_short_representation() {
        // 545 is 10 bits; the whole representation lands in the year slice
        // and month/day decode as zero. Nonsensical as a date, but exactly
        // what the variable-width slicing produces.
        assert_eq!(decode_packed_date(545), "545-00-00");
    }

    #[test]
    fn test_zero() {
        assert_eq!(decode_packed_date(0), "0-00-00");
    }
}
