/// Bit-run helpers for the 16-pixel segment-test circle.
///
/// Bit `i` of a mask corresponds to `CornerDetector::FAST_OFFSETS[i]`, so a
/// run of set bits is a contiguous arc on the circle (wrapping from 15 to 0).

/// Check for at least `min_count` consecutive set bits in the circular mask
/// using a branch-free rotate-and-and approach
pub fn has_consecutive_bits(mask: u16, min_count: usize) -> bool {
    if min_count == 0 || min_count > 16 {
        return false;
    }

    // Bit b survives iteration i when bits b, b-1, .., b-i are all set
    let mut run = mask;
    for i in 1..min_count {
        run &= mask.rotate_left(i as u32);
        if run == 0 {
            return false;
        }
    }

    run != 0
}

/// Linear scan over the doubled circle (kept as the oracle for the bitmask path)
pub fn has_consecutive_bits_scan(mask: u16, min_count: usize) -> bool {
    if min_count == 0 || min_count > 16 {
        return false;
    }

    let mut current = 0;
    for i in 0..32 {
        if mask & (1 << (i % 16)) != 0 {
            current += 1;
            if current >= min_count {
                return true;
            }
        } else {
            current = 0;
        }
    }

    false
}
