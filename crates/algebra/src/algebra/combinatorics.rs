//! Degrees of the generators of the dual Steenrod algebra.

use fp::prime::ValidPrime;

/// The degree of $ξ_{i + 1}$ divided by q, where q = 2p - 2 if p != 2 and 1 if p = 2. This is
/// $(p^{i + 1} - 1)/(p - 1)$, or `None` if it does not fit in an `i32`.
pub fn xi_degree(p: ValidPrime, i: usize) -> Option<i32> {
    let p = p.as_u32() as u64;
    let mut total: u64 = 0;
    let mut p_to_the_j: u64 = 1;
    for _ in 0..=i {
        total = total.checked_add(p_to_the_j)?;
        p_to_the_j = p_to_the_j.checked_mul(p)?;
    }
    i32::try_from(total).ok()
}

/// The degree of $τ_k$, which is $2p^k - 1$, or `None` if it does not fit in an `i32`. This is
/// meaningless at the prime 2.
pub fn tau_degree(p: ValidPrime, k: usize) -> Option<i32> {
    let p_to_the_k = (p.as_u32() as u64).checked_pow(k as u32)?;
    i32::try_from(2 * p_to_the_k - 1).ok()
}

/// The indices `i` such that `xi_degree(p, i) <= max`, in increasing order.
pub fn xi_degrees_up_to(p: ValidPrime, max: i32) -> impl Iterator<Item = (usize, i32)> {
    (0..).map_while(move |i| {
        let d = xi_degree(p, i)?;
        (d <= max).then_some((i, d))
    })
}
