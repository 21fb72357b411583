use bytemuck::{Pod, Zeroable};
use scene::SceneInputs;

/// Names of every uniform the scene program reads, in block order.
pub const UNIFORM_NAMES: [&str; 7] = [
    "iResolution",
    "iTime",
    "iMouse",
    "iProjectIndex",
    "iProjectTime",
    "iTransitionProgress",
    "iPreviousProject",
];

/// CPU mirror of the `SceneParams` std140 block in `shaders/prelude.glsl`.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct SceneUniforms {
    pub i_resolution: [f32; 2],
    pub i_padding0: [f32; 2],
    pub i_mouse: [f32; 4],
    pub i_time: f32,
    pub i_project_index: f32,
    pub i_project_time: f32,
    pub i_transition_progress: f32,
    pub i_previous_project: f32,
    pub i_padding1: [f32; 3],
}

unsafe impl Zeroable for SceneUniforms {}
unsafe impl Pod for SceneUniforms {}

impl SceneUniforms {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            i_resolution: [width as f32, height as f32],
            i_transition_progress: 1.0,
            ..Self::zeroed()
        }
    }
}

/// Value written into a uniform slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec4([f32; 4]),
}

impl UniformValue {
    fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Vec2(_) => UniformKind::Vec2,
            UniformValue::Vec4(_) => UniformKind::Vec4,
        }
    }

    fn as_floats(&self) -> &[f32] {
        match self {
            UniformValue::Float(value) => std::slice::from_ref(value),
            UniformValue::Vec2(value) => value,
            UniformValue::Vec4(value) => value,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniformKind {
    Float,
    Vec2,
    Vec4,
}

/// Location of one named uniform inside the block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UniformSlot {
    pub name: &'static str,
    pub offset: usize,
    pub kind: UniformKind,
}

const BLOCK_LAYOUT: [UniformSlot; 7] = [
    UniformSlot { name: "iResolution", offset: 0, kind: UniformKind::Vec2 },
    UniformSlot { name: "iMouse", offset: 16, kind: UniformKind::Vec4 },
    UniformSlot { name: "iTime", offset: 32, kind: UniformKind::Float },
    UniformSlot { name: "iProjectIndex", offset: 36, kind: UniformKind::Float },
    UniformSlot { name: "iProjectTime", offset: 40, kind: UniformKind::Float },
    UniformSlot { name: "iTransitionProgress", offset: 44, kind: UniformKind::Float },
    UniformSlot { name: "iPreviousProject", offset: 48, kind: UniformKind::Float },
];

/// Name to offset table resolved for one program.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UniformSlots {
    slots: Vec<UniformSlot>,
}

impl UniformSlots {
    /// Resolves `names` against the block; unknown names are logged and
    /// skipped.
    pub fn resolve<S: AsRef<str>>(names: &[S]) -> Self {
        let mut slots = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            match BLOCK_LAYOUT.iter().find(|slot| slot.name == name) {
                Some(slot) => slots.push(*slot),
                None => tracing::warn!(name, "unknown uniform name; skipping"),
            }
        }
        Self { slots }
    }

    pub fn get(&self, name: &str) -> Option<&UniformSlot> {
        self.slots.iter().find(|slot| slot.name == name)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Writes `value` into `uniforms` at the slot named `name`. Returns
    /// `false` when the slot is unbound or the value has the wrong shape.
    pub(crate) fn write(&self, uniforms: &mut SceneUniforms, name: &str, value: UniformValue) -> bool {
        let Some(slot) = self.get(name) else {
            tracing::trace!(name, "uniform not bound; skipping write");
            return false;
        };
        if slot.kind != value.kind() {
            tracing::warn!(name, expected = ?slot.kind, got = ?value.kind(), "uniform type mismatch");
            return false;
        }
        let source: &[u8] = bytemuck::cast_slice(value.as_floats());
        let bytes = bytemuck::bytes_of_mut(uniforms);
        bytes[slot.offset..slot.offset + source.len()].copy_from_slice(source);
        true
    }

    /// Writes every bound uniform from one frame's inputs.
    pub(crate) fn write_inputs(&self, uniforms: &mut SceneUniforms, inputs: &SceneInputs) {
        let selection = &inputs.selection;
        let values = [
            ("iResolution", UniformValue::Vec2(inputs.resolution.to_array())),
            ("iTime", UniformValue::Float(inputs.time)),
            ("iMouse", UniformValue::Vec4(inputs.pointer.to_array())),
            ("iProjectIndex", UniformValue::Float(selection.index as f32)),
            ("iProjectTime", UniformValue::Float(selection.project_time)),
            (
                "iTransitionProgress",
                UniformValue::Float(selection.transition_progress),
            ),
            (
                "iPreviousProject",
                UniformValue::Float(selection.previous_index as f32),
            ),
        ];
        for (name, value) in values {
            if self.get(name).is_some() {
                self.write(uniforms, name, value);
            }
        }
    }
}
