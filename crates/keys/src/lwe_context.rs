// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{lwe, Ciphertext, KeyContext, KeyError};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;
use zeroize::Zeroizing;

pub type SharedRng = Arc<Mutex<ChaCha20Rng>>;

/// Bits kept free between the noise and the encoded message so that a handful of
/// additions and small cleartext multiplications still decrypt exactly.
const NOISE_MARGIN_BITS: u32 = 8;

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct LweParameters {
    /// Length of the secret key and of the ciphertext mask
    pub dimension: usize,
    /// Standard deviation of the encryption noise, as a power of two
    pub noise_log2: u32,
}

impl Default for LweParameters {
    fn default() -> Self {
        Self {
            dimension: 630,
            noise_log2: 40,
        }
    }
}

impl LweParameters {
    pub fn validate(&self) -> Result<(), KeyError> {
        if self.dimension == 0 {
            return Err(KeyError::InvalidParameters(
                "dimension must be at least 1".to_string(),
            ));
        }
        if self.noise_log2 + NOISE_MARGIN_BITS >= lwe::MAX_ENCODABLE_WIDTH {
            return Err(KeyError::InvalidParameters(format!(
                "noise of 2^{} leaves no room for a message",
                self.noise_log2
            )));
        }
        Ok(())
    }

    pub fn max_width(&self) -> u32 {
        lwe::MAX_ENCODABLE_WIDTH
            .saturating_sub(self.noise_log2 + NOISE_MARGIN_BITS)
            .max(1)
    }
}

/// Secret-key LWE context.
pub struct LweKeyContext {
    params: LweParameters,
    secret: Zeroizing<Vec<u64>>,
    noise: Normal<f64>,
    rng: SharedRng,
}

impl LweKeyContext {
    /// Samples a fresh binary secret from `rng`, which is then kept for encryption randomness.
    pub fn generate(params: LweParameters, rng: SharedRng) -> Result<Self, KeyError> {
        params.validate()?;
        let noise = Normal::new(0.0, 2f64.powi(params.noise_log2 as i32))
            .map_err(|e| KeyError::InvalidParameters(e.to_string()))?;
        let secret = {
            let mut rng = lock(&rng);
            Zeroizing::new(
                (0..params.dimension)
                    .map(|_| rng.gen_range(0..=1u64))
                    .collect::<Vec<_>>(),
            )
        };
        debug!(dimension = params.dimension, "Generated LWE secret key");
        Ok(Self {
            params,
            secret,
            noise,
            rng,
        })
    }

    pub fn from_seed(params: LweParameters, seed: [u8; 32]) -> Result<Self, KeyError> {
        Self::generate(params, Arc::new(Mutex::new(ChaCha20Rng::from_seed(seed))))
    }

    pub fn from_entropy(params: LweParameters) -> Result<Self, KeyError> {
        Self::generate(params, Arc::new(Mutex::new(ChaCha20Rng::from_entropy())))
    }

    pub fn params(&self) -> &LweParameters {
        &self.params
    }

    fn check_width(&self, width: u32) -> Result<(), KeyError> {
        let max = self.max_width();
        if width == 0 || width > max {
            return Err(KeyError::UnsupportedWidth { width, max });
        }
        Ok(())
    }

    fn mask_dot_secret(&self, mask: &[u64]) -> u64 {
        mask.iter()
            .zip(self.secret.iter())
            .fold(0u64, |acc, (a, s)| acc.wrapping_add(a.wrapping_mul(*s)))
    }
}

fn lock(rng: &SharedRng) -> MutexGuard<'_, ChaCha20Rng> {
    // A panic while holding the lock cannot leave the generator in an unusable state.
    rng.lock().unwrap_or_else(PoisonError::into_inner)
}

impl KeyContext for LweKeyContext {
    fn ciphertext_size(&self) -> usize {
        lwe::ciphertext_words(self.params.dimension)
    }

    fn max_width(&self) -> u32 {
        self.params.max_width()
    }

    fn alloc_ciphertext(&self) -> Ciphertext {
        lwe::blank(self.params.dimension)
    }

    fn encrypt(&self, value: u64, width: u32) -> Result<Ciphertext, KeyError> {
        self.check_width(width)?;
        if value >> width != 0 {
            return Err(KeyError::ValueOutOfRange { value, width });
        }

        let mut ct = self.alloc_ciphertext();
        let (mask, body) = lwe::split_mut(ct.words_mut())?;
        let error = {
            let mut rng = lock(&self.rng);
            mask.iter_mut().for_each(|a| *a = rng.gen());
            self.noise.sample(&mut *rng).round() as i64
        };
        *body = lwe::encode(value, width)
            .wrapping_add(self.mask_dot_secret(mask))
            .wrapping_add(error as u64);
        Ok(ct)
    }

    fn decrypt(&self, ciphertext: &[u64], width: u32) -> Result<u64, KeyError> {
        self.check_width(width)?;
        let dimension = lwe::dimension_of(ciphertext)?;
        if dimension != self.params.dimension {
            return Err(KeyError::DimensionMismatch {
                expected: self.params.dimension,
                actual: dimension,
            });
        }
        let (mask, body) = lwe::split(ciphertext)?;
        let phase = body.wrapping_sub(self.mask_dot_secret(mask));
        Ok(lwe::decode(phase, width))
    }
}
