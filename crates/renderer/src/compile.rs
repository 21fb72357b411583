use std::borrow::Cow;
use std::fmt;
use std::time::Instant;

use wgpu::naga;

use crate::surface::SurfaceError;
use crate::types::ShaderVariant;

/// Full-screen quad vertex stage.
pub const VERTEX_SHADER_GLSL: &str = include_str!("shaders/quad.vert");

/// Uniform block, noise, floor, grid and paper shared by both variants.
const PRELUDE_GLSL: &str = include_str!("shaders/prelude.glsl");
const FULL_BODY_GLSL: &str = include_str!("shaders/scene_full.frag");
const LITE_BODY_GLSL: &str = include_str!("shaders/scene_lite.frag");

/// Pipeline stage a diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn to_naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Complete fragment source for `variant`: the shared prelude followed by
/// the variant's density function and `main`.
pub fn fragment_source(variant: ShaderVariant) -> String {
    let body = match variant {
        ShaderVariant::Full => FULL_BODY_GLSL,
        ShaderVariant::Lite => LITE_BODY_GLSL,
    };
    format!("{PRELUDE_GLSL}\n#line 1\n{body}")
}

/// Runs GLSL through naga's frontend and validator so failures carry the
/// compiler's own diagnostic text.
pub fn validate_glsl(stage: ShaderStage, source: &str) -> Result<naga::Module, SurfaceError> {
    let mut frontend = naga::front::glsl::Frontend::default();
    let options = naga::front::glsl::Options::from(stage.to_naga());
    let module = frontend
        .parse(&options, source)
        .map_err(|errors| SurfaceError::Compile {
            stage,
            diagnostic: errors.emit_to_string(source),
        })?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|error| SurfaceError::Compile {
            stage,
            diagnostic: error.emit_to_string(source),
        })?;
    Ok(module)
}

/// Validates and uploads one stage. The upload runs inside a validation
/// error scope so a driver-side rejection is reported as a compile error too.
pub(crate) fn compile_stage(
    device: &wgpu::Device,
    stage: ShaderStage,
    label: &str,
    source: &str,
) -> Result<wgpu::ShaderModule, SurfaceError> {
    validate_glsl(stage, source)?;

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(source.to_owned()),
            stage: stage.to_naga(),
            defines: &[],
        },
    });
    if let Some(error) = pollster::block_on(device.pop_error_scope()) {
        return Err(SurfaceError::Compile {
            stage,
            diagnostic: error.to_string(),
        });
    }
    Ok(module)
}

/// Both stages of the scene program.
pub(crate) struct CompiledProgram {
    pub vertex: wgpu::ShaderModule,
    pub fragment: wgpu::ShaderModule,
}

/// Compiles the vertex stage and `fragment` for `variant`, logging how long
/// it took.
pub(crate) fn compile_program(
    device: &wgpu::Device,
    variant: ShaderVariant,
    vertex: &str,
    fragment: &str,
) -> Result<CompiledProgram, SurfaceError> {
    tracing::info!(%variant, "compiling {variant} shader");
    let started = Instant::now();

    let vertex = compile_stage(device, ShaderStage::Vertex, "scene quad vertex", vertex)?;
    let fragment = compile_stage(device, ShaderStage::Fragment, "scene fragment", fragment)?;

    let elapsed_ms = started.elapsed().as_millis();
    tracing::info!(%variant, elapsed_ms, "{variant} shader ready in {elapsed_ms} ms");
    Ok(CompiledProgram { vertex, fragment })
}
