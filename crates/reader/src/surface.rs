//! Display surface guard
//!
//! At most one overlay may be shown per surface. Claiming is a single
//! compare-and-swap, so racing activations cannot both win.

use std::sync::atomic::{AtomicBool, Ordering};

/// Where an assembled overlay is shown
pub trait Surface: Send + Sync {
    /// Claim the surface; `false` when an overlay is already shown
    fn try_claim(&self) -> bool;

    /// Give the surface back after the overlay is dismissed
    fn release(&self);

    fn is_claimed(&self) -> bool;
}

/// In-process surface backed by an atomic flag
#[derive(Debug, Default)]
pub struct LocalSurface {
    claimed: AtomicBool,
}

impl LocalSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Surface for LocalSurface {
    fn try_claim(&self) -> bool {
        self.claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn release(&self) {
        self.claimed.store(false, Ordering::Release);
    }

    fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_claim_release_cycle() {
        let surface = LocalSurface::new();
        assert!(surface.try_claim());
        assert!(!surface.try_claim());
        assert!(surface.is_claimed());

        surface.release();
        assert!(!surface.is_claimed());
        assert!(surface.try_claim());
    }

    #[test]
    fn test_racing_claims_have_one_winner() {
        let surface = Arc::new(LocalSurface::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let surface = Arc::clone(&surface);
                std::thread::spawn(move || surface.try_claim())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&won| won)
            .count();
        assert_eq!(winners, 1);
    }
}
