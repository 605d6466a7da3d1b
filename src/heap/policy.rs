use super::{AllocType, CachePolicy, HeapMask, UsageFlags};
use crate::platform::{CompositionMode, PlatformConfig, PropertySource, use_tz_protection};

/// Heaps, allocation-type flags and cache policy chosen for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapSelection {
    pub heap_mask: HeapMask,
    pub alloc_type: AllocType,
    pub cache_policy: CachePolicy,
    /// The allocation may be served by a physically scattered heap.
    pub non_contiguous: bool,
}

/// Maps usage hints onto ION heaps.
#[derive(Debug, Clone, Copy)]
pub struct HeapPolicy {
    platform: PlatformConfig,
    use_tz_protection: bool,
}

impl HeapPolicy {
    #[must_use]
    pub const fn new(platform: PlatformConfig, use_tz_protection: bool) -> Self {
        Self {
            platform,
            use_tz_protection,
        }
    }

    /// Reads the content-protection level from `props` once.
    #[must_use]
    pub fn from_properties(platform: PlatformConfig, props: &dyn PropertySource) -> Self {
        Self::new(platform, use_tz_protection(props))
    }

    #[must_use]
    pub const fn platform(&self) -> PlatformConfig {
        self.platform
    }

    #[must_use]
    pub const fn uses_tz_protection(&self) -> bool {
        self.use_tz_protection
    }

    /// Heap mask used when the request names no heap: SF plus IOMMU, so the
    /// buffer stays reachable by the display controller for bypass.
    #[must_use]
    pub const fn default_heaps(&self) -> HeapMask {
        if self.platform.iommu {
            HeapMask::SF.union(HeapMask::IOMMU)
        } else {
            HeapMask::SF
        }
    }

    #[must_use]
    pub fn select_heap(&self, usage: &UsageFlags) -> HeapSelection {
        let mut heaps = HeapMask::empty();
        let mut alloc_type = AllocType::empty();
        let mut non_contiguous = false;

        if usage.ui_contig_heap {
            heaps |= HeapMask::SF;
        }

        if usage.system_heap {
            heaps |= HeapMask::SYSTEM;
            non_contiguous = true;
        }

        if self.platform.iommu && usage.iommu_heap {
            heaps |= HeapMask::IOMMU;
            non_contiguous = true;
        }

        if self.platform.secure_mm_heap {
            if usage.protected {
                if self.use_tz_protection && usage.mm_heap {
                    heaps |= HeapMask::CP_MM | HeapMask::SECURE;
                } else {
                    // Targets without hardware-level protection get the
                    // IOMMU heap and no secure flag.
                    heaps |= HeapMask::IOMMU;
                    alloc_type |= AllocType::PROTECTED_BUFFER;
                }
            } else if usage.mm_heap {
                log::warn!("MM heap cannot be used as an insecure heap, trying IOMMU instead");
                heaps |= HeapMask::IOMMU;
            }
        } else if usage.mm_heap {
            heaps |= HeapMask::CP_MM;
        }

        if usage.camera_heap {
            heaps |= HeapMask::CAMERA;
        }

        if usage.adsp_heap {
            heaps |= HeapMask::ADSP;
        }

        if self.platform.secure_mm_heap {
            if heaps.contains(HeapMask::SECURE) {
                alloc_type |= AllocType::SECURE_BUFFER;
            }
        } else if usage.protected && !non_contiguous {
            alloc_type |= AllocType::SECURE_BUFFER;
        }

        if heaps.is_empty() {
            heaps = self.default_heaps();
        }

        HeapSelection {
            heap_mask: heaps,
            alloc_type,
            cache_policy: usage.cache_policy(),
            non_contiguous,
        }
    }

    /// Whether a failed allocation may be retried once on the system heap.
    ///
    /// Never when composition goes entirely through the display controller,
    /// when the system heap was what just failed, when the caller pinned a
    /// heap or asked for protection, or for external-display-only buffers.
    #[must_use]
    pub const fn can_fallback(
        usage: &UsageFlags,
        tried_system: bool,
        composition: CompositionMode,
    ) -> bool {
        if composition.routes_through_mdp() {
            return false;
        }
        if tried_system {
            return false;
        }
        if usage.pins_heap() || usage.protected {
            return false;
        }
        if usage.external_only {
            return false;
        }
        true
    }
}

impl Default for HeapPolicy {
    fn default() -> Self {
        Self::new(PlatformConfig::default(), true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::SwAccess;
    use crate::platform::{MapProperties, PROP_CP_LEVEL3};

    fn no_secure_mm() -> PlatformConfig {
        PlatformConfig {
            secure_mm_heap: false,
            iommu: true,
        }
    }

    #[test]
    fn empty_usage_defaults_to_sf_and_iommu() {
        let sel = HeapPolicy::default().select_heap(&UsageFlags::new());
        assert_eq!(sel.heap_mask, HeapMask::SF | HeapMask::IOMMU);
        assert!(sel.alloc_type.is_empty());
        assert!(!sel.non_contiguous);
        assert_eq!(sel.cache_policy, CachePolicy::Cached);
    }

    #[test]
    fn default_without_iommu_is_sf_only() {
        let policy = HeapPolicy::new(
            PlatformConfig {
                secure_mm_heap: true,
                iommu: false,
            },
            true,
        );
        assert_eq!(policy.select_heap(&UsageFlags::new()).heap_mask, HeapMask::SF);

        // An IOMMU hint is dropped and the default takes over.
        let sel = policy.select_heap(&UsageFlags::new().iommu_heap());
        assert_eq!(sel.heap_mask, HeapMask::SF);
        assert!(!sel.non_contiguous);
    }

    #[test]
    fn heap_hints_are_additive() {
        let usage = UsageFlags::new().ui_contig_heap().system_heap().camera_heap().adsp_heap();
        let sel = HeapPolicy::default().select_heap(&usage);
        assert_eq!(
            sel.heap_mask,
            HeapMask::SF | HeapMask::SYSTEM | HeapMask::CAMERA | HeapMask::ADSP
        );
        assert!(sel.non_contiguous);
    }

    #[test]
    fn iommu_hint_is_non_contiguous() {
        let sel = HeapPolicy::default().select_heap(&UsageFlags::new().iommu_heap());
        assert_eq!(sel.heap_mask, HeapMask::IOMMU);
        assert!(sel.non_contiguous);
    }

    #[test]
    fn protected_mm_with_tz_is_secure() {
        let sel = HeapPolicy::default().select_heap(&UsageFlags::new().protected().mm_heap());
        assert_eq!(sel.heap_mask, HeapMask::CP_MM | HeapMask::SECURE);
        assert_eq!(sel.alloc_type, AllocType::SECURE_BUFFER);
    }

    #[test]
    fn protected_without_tz_falls_back_to_iommu() {
        let props = MapProperties::new().with(PROP_CP_LEVEL3, "1");
        let policy = HeapPolicy::from_properties(PlatformConfig::default(), &props);
        assert!(!policy.uses_tz_protection());

        let sel = policy.select_heap(&UsageFlags::new().protected().mm_heap());
        assert_eq!(sel.heap_mask, HeapMask::IOMMU);
        assert_eq!(sel.alloc_type, AllocType::PROTECTED_BUFFER);
    }

    #[test]
    fn protected_without_mm_hint_is_not_hw_secure() {
        let sel = HeapPolicy::default().select_heap(&UsageFlags::new().protected());
        assert_eq!(sel.heap_mask, HeapMask::IOMMU);
        assert_eq!(sel.alloc_type, AllocType::PROTECTED_BUFFER);
    }

    #[test]
    fn insecure_mm_request_is_redirected() {
        let sel = HeapPolicy::default().select_heap(&UsageFlags::new().mm_heap());
        assert_eq!(sel.heap_mask, HeapMask::IOMMU);
        assert!(sel.alloc_type.is_empty());
    }

    #[test]
    fn shared_mm_heap_platform() {
        let policy = HeapPolicy::new(no_secure_mm(), true);
        let sel = policy.select_heap(&UsageFlags::new().mm_heap());
        assert_eq!(sel.heap_mask, HeapMask::CP_MM);

        let sel = policy.select_heap(&UsageFlags::new().mm_heap().protected());
        assert_eq!(sel.heap_mask, HeapMask::CP_MM);
        assert_eq!(sel.alloc_type, AllocType::SECURE_BUFFER);

        let sel = policy.select_heap(&UsageFlags::new().system_heap().protected());
        assert!(sel.alloc_type.is_empty());
    }

    #[test]
    fn cache_policy_is_carried_through() {
        let usage = UsageFlags::new()
            .sw_read(SwAccess::Rarely)
            .sw_write(SwAccess::Rarely);
        let sel = HeapPolicy::default().select_heap(&usage);
        assert_eq!(sel.cache_policy, CachePolicy::Uncached);
    }

    #[test]
    fn fallback_rules() {
        let plain = UsageFlags::new();
        assert!(HeapPolicy::can_fallback(&plain, false, CompositionMode::Gpu));
        assert!(!HeapPolicy::can_fallback(&plain, false, CompositionMode::Mdp));
        assert!(!HeapPolicy::can_fallback(&plain, true, CompositionMode::Gpu));
        assert!(!HeapPolicy::can_fallback(&plain.camera_heap(), false, CompositionMode::Gpu));
        assert!(!HeapPolicy::can_fallback(&plain.protected(), false, CompositionMode::Gpu));
        assert!(!HeapPolicy::can_fallback(&plain.external_only(), false, CompositionMode::Gpu));
        assert!(HeapPolicy::can_fallback(&plain.uncached(), false, CompositionMode::C2d));
    }
}
