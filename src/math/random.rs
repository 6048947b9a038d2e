use rand::RngCore;

/// Antithetic companion of a random stream: every bit drawn from the inner
/// generator is complemented.
///
/// A uniform `f64` built from the stream becomes `1 - 2^-53 - u`, so a path
/// driven by a mirrored copy of a seeded generator is the antithetic partner
/// of the path driven by the unmirrored one.
#[derive(Debug, Clone)]
pub struct MirroredRng<R> {
    inner: R,
}

impl<R: RngCore> MirroredRng<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: RngCore> RngCore for MirroredRng<R> {
    fn next_u32(&mut self) -> u32 {
        !self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        !self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest);
        for byte in dest.iter_mut() {
            *byte = !*byte;
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)?;
        for byte in dest.iter_mut() {
            *byte = !*byte;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_uniforms_are_mirrored() {
        let mut base = ChaCha20Rng::seed_from_u64(42);
        let mut mirror = MirroredRng::new(ChaCha20Rng::seed_from_u64(42));
        for _ in 0..1000 {
            let u: f64 = base.gen();
            let v: f64 = mirror.gen();
            assert!((u + v - 1.0).abs() < 1e-15);
        }
    }

    #[test]
    fn test_bytes_are_complemented() {
        let mut base = ChaCha20Rng::seed_from_u64(3);
        let mut mirror = MirroredRng::new(ChaCha20Rng::seed_from_u64(3));
        let mut a = [0u8; 16];
        let mut b = [0u8; 16];
        base.fill_bytes(&mut a);
        mirror.fill_bytes(&mut b);
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x ^ y, 0xff);
        }
    }
}
