use crate::{NoiseFieldBuilder, NoiseParams, VolumeError, VolumeTexture};
use compute::ComputeError;

/// Keeps the one noise volume matching the most recent parameters.
///
/// Asking for the same parameters again returns the same texture. Asking for
/// different ones releases the old texture and builds a replacement, so at
/// most one volume per cache is ever live.
pub struct NoiseFieldCache {
    builder: NoiseFieldBuilder,
    current: Option<(NoiseParams, VolumeTexture)>,
    stale: bool,
    builds: u64,
}

impl NoiseFieldCache {
    #[must_use]
    pub fn new(builder: NoiseFieldBuilder) -> Self {
        Self {
            builder,
            current: None,
            stale: false,
            builds: 0,
        }
    }

    /// Returns a texture built from `params`, rebuilding only when they
    /// differ from the cached ones or the cache was invalidated.
    ///
    /// # Errors
    ///
    /// Returns the build error. The previous texture has already been
    /// released by then and the cache is left empty.
    pub fn ensure_current(&mut self, params: &NoiseParams) -> Result<&VolumeTexture, VolumeError> {
        let entry = match self.current.take() {
            Some((cached, texture)) if cached == *params && !self.stale => (cached, texture),
            previous => {
                if let Some((_, old)) = previous {
                    let handle = old.handle();
                    if let Err(e) = old.release() {
                        tracing::error!(?handle, "failed to release superseded noise volume: {e}");
                    }
                }
                self.stale = false;
                let texture = self.builder.build(params)?;
                self.builds += 1;
                (*params, texture)
            }
        };
        let (_, texture) = self.current.insert(entry);
        Ok(&*texture)
    }

    /// Forces the next [`ensure_current`](Self::ensure_current) to rebuild.
    /// The current texture stays bound until then.
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    /// Frees the cached texture, if any.
    ///
    /// # Errors
    ///
    /// Returns the device error from the release. The cache is empty
    /// afterwards regardless.
    pub fn release(&mut self) -> Result<(), ComputeError> {
        match self.current.take() {
            Some((_, texture)) => texture.release(),
            None => Ok(()),
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<&VolumeTexture> {
        self.current.as_ref().map(|(_, texture)| texture)
    }

    #[must_use]
    pub fn params(&self) -> Option<&NoiseParams> {
        self.current.as_ref().map(|(params, _)| params)
    }

    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Number of volumes this cache has built.
    #[must_use]
    pub fn builds(&self) -> u64 {
        self.builds
    }

    #[must_use]
    pub fn builder(&self) -> &NoiseFieldBuilder {
        &self.builder
    }
}

impl Drop for NoiseFieldCache {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::error!("failed to release cached noise volume: {e}");
        }
    }
}
