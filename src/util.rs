use std::mem::MaybeUninit;


/// The generator polynomial of CRC-64/ECMA-182.
const CRC64_POLY: u64 = 0x42f0_e1eb_a9ea_3693;

const fn crc64_table() -> [u64; 256] {
    let mut table = [0; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u64) << 56;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & (1 << 63) != 0 {
                (crc << 1) ^ CRC64_POLY
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

static CRC64_TABLE: [u64; 256] = crc64_table();


/// Update the CRC-64/ECMA-182 checksum `crc` with `data`.
///
/// The checksum is neither reflected nor inverted, i.e., a value of
/// zero is passed in for the first chunk of data.
pub(crate) fn crc64(crc: u64, data: &[u8]) -> u64 {
    data.iter().fold(crc, |crc, byte| {
        let idx = ((crc >> 56) as u8 ^ byte) as usize;
        CRC64_TABLE[idx] ^ (crc << 8)
    })
}


/// Break down the provided number of seconds since the epoch into
/// calendar time in the local time zone.
pub(crate) fn local_time(secs: u64) -> Option<libc::tm> {
    let time = libc::time_t::try_from(secs).ok()?;
    let mut dst = MaybeUninit::uninit();
    let result = unsafe { libc::localtime_r(&time, dst.as_mut_ptr()) };
    if result.is_null() {
        return None
    }

    // SAFETY: The object is initialized on success of `localtime_r`.
    Some(unsafe { dst.assume_init() })
}


#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;
    use test_tag::tag;


    /// Check that our CRC-64 implementation produces the well-known
    /// check value of the ECMA-182 variant.
    #[tag(miri)]
    #[test]
    fn crc64_check_value() {
        assert_eq!(crc64(0, b""), 0);
        assert_eq!(crc64(0, b"123456789"), 0x6c40_df5f_0b49_7347);
    }

    /// Make sure that checksumming in chunks is the same as
    /// checksumming everything at once.
    #[tag(miri)]
    #[test]
    fn crc64_chunked() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let (first, second) = data.split_at(17);
        assert_eq!(crc64(crc64(0, first), second), crc64(0, data));
    }

    /// Check that we can break down a point in time into calendar
    /// components.
    #[test]
    fn local_time_breakdown() {
        // 2001-09-09 01:46:40 UTC; no time zone moves this by more
        // than a day.
        let tm = local_time(1_000_000_000).unwrap();
        assert_eq!(tm.tm_year + 1900, 2001);
        assert_eq!(tm.tm_mon + 1, 9);
        assert!((8..=9).contains(&tm.tm_mday), "{}", tm.tm_mday);
    }
}
