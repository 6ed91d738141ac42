//! Standard curve configurations used by the tests and the key-exchange
//! consumers.

use crate::error::Result;
use crate::mpz::{Mpz, Reduction};

use super::EccConfig;

fn hex(s: &str) -> Mpz {
    match Mpz::from_str_radix(s, 16) {
        Ok(v) => v,
        Err(_) => unreachable!(),
    }
}

/// secp192r1 (NIST P-192) with its SEC 2 base point.
///
/// Returns the configuration and the base point (Gx, Gy).
pub fn secp192r1(reduction: Reduction) -> Result<(EccConfig, Mpz, Mpz)> {
    let p = hex("fffffffffffffffffffffffffffffffeffffffffffffffff");
    let a = hex("fffffffffffffffffffffffffffffffefffffffffffffffc");
    let b = hex("64210519e59c80e70fa7e9ab72243049feb8deecc146b9b1");
    let order = hex("ffffffffffffffffffffffff99def836146bc9b1b4d22831");
    let gx = hex("188da80eb03090f67cbf20eb43a18800f4ff0afd82ff1012");
    let gy = hex("07192b95ffc8da78631011ed6b24cdd573f977a11e794811");
    Ok((EccConfig::new(p, a, b, order, reduction)?, gx, gy))
}

/// secp256r1 (NIST P-256) with its SEC 2 base point.
///
/// Returns the configuration and the base point (Gx, Gy).
pub fn secp256r1(reduction: Reduction) -> Result<(EccConfig, Mpz, Mpz)> {
    let p = hex("ffffffff00000001000000000000000000000000ffffffffffffffffffffffff");
    let a = hex("ffffffff00000001000000000000000000000000fffffffffffffffffffffffc");
    let b = hex("5ac635d8aa3a93e7b3ebbd55769886bc651d06b0cc53b0f63bce3c3e27d2604b");
    let order = hex("ffffffff00000000ffffffffffffffffbce6faada7179e84f3b9cac2fc632551");
    let gx = hex("6b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c296");
    let gy = hex("4fe342e2fe1a7f9b8ee7eb4a7c0f9e162bce33576b315ececbb6406837bf51f5");
    Ok((EccConfig::new(p, a, b, order, reduction)?, gx, gy))
}
