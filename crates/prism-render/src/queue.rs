// SPDX-License-Identifier: CEPL-1.0
use prism_core::{Error, Result};
use tracing::debug;

/// Capabilities of a single queue family that matter for drawing to a surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueFamilySupport {
    pub graphics: bool,
    pub present: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueIndices {
    pub graphics: Option<u32>,
    pub present: Option<u32>,
}

/// Both roles filled in. The two indices may be equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedQueues {
    pub graphics: u32,
    pub present: u32,
}

impl ResolvedQueues {
    pub fn is_shared(&self) -> bool {
        self.graphics == self.present
    }

    /// Distinct family indices, one device queue is created per entry.
    pub fn unique_families(&self) -> Vec<u32> {
        if self.is_shared() {
            vec![self.graphics]
        } else {
            vec![self.graphics, self.present]
        }
    }
}

impl QueueIndices {
    pub fn resolved(&self) -> Result<ResolvedQueues> {
        match (self.graphics, self.present) {
            (Some(graphics), Some(present)) => Ok(ResolvedQueues { graphics, present }),
            (None, _) => Err(Error::IncompleteQueueSupport {
                missing: "graphics",
            }),
            (_, None) => Err(Error::IncompleteQueueSupport {
                missing: "presentation",
            }),
        }
    }
}

/// Scans families in index order. A family that does both graphics and
/// presentation is taken for both roles and ends the scan; otherwise the
/// first family of each kind is kept. The iterator is consumed lazily so
/// callers can defer the per-family surface query.
pub fn resolve_queue_indices<I>(families: I) -> Result<ResolvedQueues>
where
    I: IntoIterator<Item = QueueFamilySupport>,
{
    let mut indices = QueueIndices::default();
    let mut seen = 0u32;

    for (i, family) in families.into_iter().enumerate() {
        let i = i as u32;
        seen += 1;
        if family.graphics && family.present {
            indices.graphics = Some(i);
            indices.present = Some(i);
            break;
        }
        if family.graphics && indices.graphics.is_none() {
            indices.graphics = Some(i);
        }
        if family.present && indices.present.is_none() {
            indices.present = Some(i);
        }
    }

    if seen == 0 {
        return Err(Error::NoQueueFamilies);
    }
    let resolved = indices.resolved()?;
    debug!(
        "queue families: graphics={} present={}",
        resolved.graphics, resolved.present
    );
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const G: QueueFamilySupport = QueueFamilySupport {
        graphics: true,
        present: false,
    };
    const P: QueueFamilySupport = QueueFamilySupport {
        graphics: false,
        present: true,
    };
    const GP: QueueFamilySupport = QueueFamilySupport {
        graphics: true,
        present: true,
    };
    const NONE: QueueFamilySupport = QueueFamilySupport {
        graphics: false,
        present: false,
    };

    #[test]
    fn no_families_is_an_error() {
        assert!(matches!(
            resolve_queue_indices(Vec::new()),
            Err(Error::NoQueueFamilies)
        ));
    }

    #[test]
    fn combined_family_wins_and_stops_the_scan() {
        let probed = Cell::new(0);
        let families = [NONE, GP, G, GP];
        let q = resolve_queue_indices(families.iter().map(|f| {
            probed.set(probed.get() + 1);
            *f
        }))
        .unwrap();
        assert_eq!(q, ResolvedQueues { graphics: 1, present: 1 });
        assert!(q.is_shared());
        assert_eq!(probed.get(), 2);
    }

    #[test]
    fn combined_family_overrides_earlier_split() {
        let q = resolve_queue_indices([G, P, GP]).unwrap();
        assert_eq!(q, ResolvedQueues { graphics: 2, present: 2 });
    }

    #[test]
    fn disjoint_families_give_two_indices() {
        let q = resolve_queue_indices([P, NONE, G]).unwrap();
        assert_eq!(q, ResolvedQueues { graphics: 2, present: 0 });
        assert_eq!(q.unique_families(), vec![2, 0]);
    }

    #[test]
    fn first_of_each_kind_is_kept() {
        let q = resolve_queue_indices([G, G, P, P]).unwrap();
        assert_eq!(q, ResolvedQueues { graphics: 0, present: 2 });
    }

    #[test]
    fn missing_presentation_is_incomplete() {
        let res = resolve_queue_indices([G, NONE]);
        assert!(matches!(
            res,
            Err(Error::IncompleteQueueSupport {
                missing: "presentation"
            })
        ));
    }

    #[test]
    fn missing_graphics_is_incomplete() {
        let res = resolve_queue_indices([P]);
        assert!(matches!(
            res,
            Err(Error::IncompleteQueueSupport { missing: "graphics" })
        ));
    }
}
