use compute::WORKGROUP_SIZE;

/// Workgroups needed to cover `extent` texels along one axis.
#[must_use]
pub const fn groups_for_axis(extent: u32) -> u32 {
    extent.div_ceil(WORKGROUP_SIZE)
}

/// Workgroup grid covering a volume of `resolution`. Edge groups may run past
/// the volume; the kernels skip those invocations.
#[must_use]
pub fn dispatch_grid(resolution: [u32; 3]) -> [u32; 3] {
    resolution.map(groups_for_axis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_rounds_up() {
        assert_eq!(groups_for_axis(512), 64);
        assert_eq!(groups_for_axis(10), 2);
        assert_eq!(groups_for_axis(8), 1);
        assert_eq!(groups_for_axis(1), 1);
        assert_eq!(dispatch_grid([512, 10, 1]), [64, 2, 1]);
    }

    #[test]
    fn grid_covers_every_texel() {
        for extent in 1..100 {
            let groups = groups_for_axis(extent);
            assert!(groups * WORKGROUP_SIZE >= extent);
            assert!((groups - 1) * WORKGROUP_SIZE < extent);
        }
    }
}
