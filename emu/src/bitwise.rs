use std::fmt::Debug;
use std::mem::size_of;
use std::ops::RangeInclusive;

/// Reads bit fields out of an instruction word. Bit indexes go from lsb to msb
/// (right to left).
pub trait Bits
where
    Self: Clone + Sized + Into<u128> + TryFrom<u128>,
    <Self as TryFrom<u128>>::Error: Debug,
{
    /// Returns the bits in `bits_range` (both ends included) moved down to position 0.
    fn get_bits(&self, bits_range: RangeInclusive<u8>) -> Self {
        let start = *bits_range.start();
        let length = bits_range.len() as u32;
        debug_assert!(u32::from(start) + length <= (size_of::<Self>() * 8) as u32);

        // `length` ones, moved up to the first bit of the range.
        let mask = ((1_u128 << length) - 1) << start;

        let value: u128 = <Self as Into<u128>>::into(self.clone());

        // The masked value always fits in `Self` since the range was inside it.
        <Self as TryFrom<u128>>::try_from((value & mask) >> start).unwrap()
    }
}

impl Bits for u64 {}
impl Bits for u32 {}
impl Bits for u16 {}
impl Bits for u8 {}

/// Interprets the low `width` bits of `value` as a two's-complement number
/// and returns it sign-extended to an `i64`. Bit `width - 1` is the sign bit,
/// anything above `width` is ignored.
#[must_use]
pub fn sign_extend(value: u64, width: u8) -> i64 {
    debug_assert!((1..=64).contains(&width));

    // Move the sign bit to bit 63 and let the arithmetic shift drag it back down.
    let unused = 64 - u32::from(width);
    ((value << unused) as i64) >> unused
}
