use wgpu::{BindGroup, BindGroupLayout};

/// A bind group layout and the bind groups built from it, one per ring slot
/// when the bindings rotate with the tick.
pub struct BindResources {
    pub bind_group_layout: BindGroupLayout,
    bind_groups: Vec<BindGroup>,
}

impl BindResources {
    pub fn new(bind_group_layout: BindGroupLayout, bind_groups: Vec<BindGroup>) -> Self {
        assert!(!bind_groups.is_empty(), "at least one bind group is required");
        Self {
            bind_group_layout,
            bind_groups,
        }
    }

    /// The bind group for `slot`, wrapping around the number of groups.
    pub fn bind_group(&self, slot: usize) -> &BindGroup {
        &self.bind_groups[slot % self.bind_groups.len()]
    }
}
