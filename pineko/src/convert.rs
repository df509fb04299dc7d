pub(crate) fn i32_from_u32(x: u32) -> i32 {
    // UNWRAP: perturbative powers are small
    i32::try_from(x).unwrap_or_else(|_| unreachable!())
}
