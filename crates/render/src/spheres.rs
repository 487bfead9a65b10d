pub struct SphereRender {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub instance_buffer: wgpu::Buffer,
    pub uniform_buffer: wgpu::Buffer,
    pub uniform_bind_group: wgpu::BindGroup,
    pub pipeline: wgpu::RenderPipeline,
    index_count: u32,
    instance_count: u32,
    instance_capacity: usize,
    instance_generation: u64,
    disposed: bool,
}

impl SphereRender {
    pub fn new(gpu: &crate::gpu::Gpu, spheres: &scene::InstancedSpheres) -> Self {
        let (vertices, indices) = create_sphere_geometry(32, 16);

        let vertex_buffer = wgpu::util::DeviceExt::create_buffer_init(
            &gpu.device,
            &wgpu::util::BufferInitDescriptor {
                label: Some("Sphere Vertex Buffer"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            },
        );

        let index_buffer = wgpu::util::DeviceExt::create_buffer_init(
            &gpu.device,
            &wgpu::util::BufferInitDescriptor {
                label: Some("Sphere Index Buffer"),
                contents: bytemuck::cast_slice(&indices),
                usage: wgpu::BufferUsages::INDEX,
            },
        );

        let instance_capacity = spheres.len();
        let instance_buffer = create_instance_buffer(gpu, instance_capacity);

        let uniform_buffer = wgpu::util::DeviceExt::create_buffer_init(
            &gpu.device,
            &wgpu::util::BufferInitDescriptor {
                label: Some("Sphere Uniform Buffer"),
                contents: bytemuck::cast_slice(&[Uniform::default()]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            },
        );

        let uniform_bind_group_layout =
            gpu.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    }],
                    label: Some("Sphere Uniform Bind Group Layout"),
                });

        let uniform_bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("Sphere Uniform Bind Group"),
        });

        let pipeline = create_pipeline(gpu, &uniform_bind_group_layout);

        Self {
            vertex_buffer,
            index_buffer,
            instance_buffer,
            uniform_buffer,
            uniform_bind_group,
            pipeline,
            index_count: indices.len() as u32,
            instance_count: 0,
            instance_capacity,
            instance_generation: spheres.generation(),
            disposed: false,
        }
    }

    pub fn sync(
        &mut self,
        gpu: &crate::gpu::Gpu,
        scene: &mut scene::Scene,
        camera: &crate::render::FrameCamera,
    ) {
        if self.disposed {
            return;
        }

        let spheres = &mut scene.spheres;
        if spheres.generation() != self.instance_generation
            || spheres.len() > self.instance_capacity
        {
            self.instance_buffer.destroy();
            self.instance_capacity = spheres.len();
            self.instance_buffer = create_instance_buffer(gpu, self.instance_capacity);
            self.instance_generation = spheres.generation();
            log::debug!(
                "Reallocated sphere instance buffer for {} instances",
                self.instance_capacity
            );
        }

        // One upload per frame at most
        if spheres.take_dirty() {
            gpu.queue.write_buffer(
                &self.instance_buffer,
                0,
                bytemuck::cast_slice(spheres.instances()),
            );
        }
        self.instance_count = spheres.len() as u32;

        let uniform = Uniform {
            view: camera.view,
            projection: camera.projection,
            camera_position: nalgebra_glm::vec3_to_vec4(&camera.position),
            ambient: nalgebra_glm::vec4(
                scene.ambient.color.x,
                scene.ambient.color.y,
                scene.ambient.color.z,
                scene.ambient.intensity,
            ),
            light_position: nalgebra_glm::vec3_to_vec4(&scene.accent.position),
            light_color: nalgebra_glm::vec4(
                scene.accent.color.x,
                scene.accent.color.y,
                scene.accent.color.z,
                scene.accent.intensity,
            ),
            material: nalgebra_glm::vec4(
                scene.material.metalness,
                scene.material.roughness,
                scene.material.clearcoat,
                scene.material.clearcoat_roughness,
            ),
            flags: nalgebra_glm::vec4(
                if scene.material.subsurface_glow { 1.0 } else { 0.0 },
                0.0,
                0.0,
                0.0,
            ),
        };
        gpu.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    pub fn render<'rp>(&'rp self, render_pass: &mut wgpu::RenderPass<'rp>) {
        if self.disposed || self.instance_count == 0 {
            return;
        }
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.index_count, 0, 0..self.instance_count);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
        self.instance_buffer.destroy();
        self.uniform_buffer.destroy();
        self.instance_count = 0;
        self.disposed = true;
    }
}

fn create_instance_buffer(gpu: &crate::gpu::Gpu, capacity: usize) -> wgpu::Buffer {
    let size = (capacity.max(1) * std::mem::size_of::<scene::InstanceBinding>())
        as wgpu::BufferAddress;
    gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Sphere Instance Buffer"),
        size,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_pipeline(
    gpu: &crate::gpu::Gpu,
    uniform_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let shader_module = gpu
        .device
        .create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Sphere Shader"),
            source: wgpu::ShaderSource::Wgsl(std::borrow::Cow::Borrowed(SHADER_SOURCE)),
        });
    let pipeline_layout = gpu
        .device
        .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: None,
            bind_group_layouts: &[uniform_bind_group_layout],
            push_constant_ranges: &[],
        });
    gpu.device
        .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Sphere Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader_module,
                entry_point: "vertex_main",
                buffers: &[
                    Vertex::description(&Vertex::vertex_attributes()),
                    instance_description(&instance_attributes()),
                ],
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: crate::gpu::Gpu::DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader_module,
                entry_point: "fragment_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            multiview: None,
        })
}

#[repr(C)]
#[derive(Default, Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Uniform {
    pub view: nalgebra_glm::Mat4,
    pub projection: nalgebra_glm::Mat4,
    pub camera_position: nalgebra_glm::Vec4,
    /// rgb color, w intensity
    pub ambient: nalgebra_glm::Vec4,
    pub light_position: nalgebra_glm::Vec4,
    /// rgb color, w intensity
    pub light_color: nalgebra_glm::Vec4,
    /// metalness, roughness, clearcoat, clearcoat roughness
    pub material: nalgebra_glm::Vec4,
    pub flags: nalgebra_glm::Vec4,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: nalgebra_glm::Vec3,
    pub normal: nalgebra_glm::Vec3,
}

impl Vertex {
    pub fn vertex_attributes() -> Vec<wgpu::VertexAttribute> {
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3].to_vec()
    }

    pub fn description(attributes: &[wgpu::VertexAttribute]) -> wgpu::VertexBufferLayout {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes,
        }
    }
}

fn instance_attributes() -> Vec<wgpu::VertexAttribute> {
    wgpu::vertex_attr_array![2 => Float32x4, 3 => Float32x4, 4 => Float32x4, 5 => Float32x4, 6 => Float32x4]
        .to_vec()
}

fn instance_description(attributes: &[wgpu::VertexAttribute]) -> wgpu::VertexBufferLayout {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<scene::InstanceBinding>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes,
    }
}

/// Unit UV sphere, counter-clockwise when viewed from outside.
pub fn create_sphere_geometry(width_segments: u32, height_segments: u32) -> (Vec<Vertex>, Vec<u32>) {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);

    let mut vertices = Vec::new();
    for y in 0..=height_segments {
        let v = y as f32 / height_segments as f32;
        let theta = v * std::f32::consts::PI;
        for x in 0..=width_segments {
            let u = x as f32 / width_segments as f32;
            let phi = u * std::f32::consts::TAU;
            let normal = nalgebra_glm::vec3(
                -phi.cos() * theta.sin(),
                theta.cos(),
                phi.sin() * theta.sin(),
            );
            vertices.push(Vertex {
                position: normal,
                normal,
            });
        }
    }

    let stride = width_segments + 1;
    let mut indices = Vec::new();
    for y in 0..height_segments {
        for x in 0..width_segments {
            let a = y * stride + x + 1;
            let b = y * stride + x;
            let c = (y + 1) * stride + x;
            let d = (y + 1) * stride + x + 1;
            if y != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if y != height_segments - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    (vertices, indices)
}

const SHADER_SOURCE: &str = "
struct Uniform {
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    camera_position: vec4<f32>,
    ambient: vec4<f32>,
    light_position: vec4<f32>,
    light_color: vec4<f32>,
    material: vec4<f32>,
    flags: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> ubo: Uniform;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_matrix_0: vec4<f32>,
    @location(3) model_matrix_1: vec4<f32>,
    @location(4) model_matrix_2: vec4<f32>,
    @location(5) model_matrix_3: vec4<f32>,
    @location(6) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec4<f32>,
};

@vertex
fn vertex_main(vert: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model_matrix = mat4x4<f32>(
        instance.model_matrix_0,
        instance.model_matrix_1,
        instance.model_matrix_2,
        instance.model_matrix_3,
    );

    let world_position = model_matrix * vec4(vert.position, 1.0);

    var out: VertexOutput;
    out.position = ubo.projection * ubo.view * world_position;
    out.world_position = world_position.xyz;
    // Uniform scale only, so the model matrix keeps normals perpendicular
    out.normal = (model_matrix * vec4(vert.normal, 0.0)).xyz;
    out.color = instance.color;
    return out;
};

fn specular(n_dot_h: f32, roughness: f32) -> f32 {
    let shininess = max(2.0 / max(roughness * roughness, 0.001) - 2.0, 1.0);
    return pow(n_dot_h, shininess) * (shininess + 8.0) / 25.1327;
}

@fragment
fn fragment_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let normal = normalize(in.normal);
    let view_direction = normalize(ubo.camera_position.xyz - in.world_position);
    let to_light = ubo.light_position.xyz - in.world_position;
    let light_distance = max(length(to_light), 0.001);
    let light_direction = to_light / light_distance;
    let halfway = normalize(light_direction + view_direction);

    let metalness = ubo.material.x;
    let roughness = ubo.material.y;
    let clearcoat = ubo.material.z;
    let clearcoat_roughness = ubo.material.w;

    let radiance = ubo.light_color.rgb * ubo.light_color.w / (light_distance * light_distance);
    let n_dot_l = max(dot(normal, light_direction), 0.0);
    let n_dot_h = max(dot(normal, halfway), 0.0);

    let albedo = in.color.rgb;
    let diffuse = albedo * (1.0 - metalness) * n_dot_l;
    let specular_color = mix(vec3(0.04), albedo, metalness);
    let base_specular = specular_color * specular(n_dot_h, roughness) * n_dot_l;
    let coat = vec3(0.04) * clearcoat * specular(n_dot_h, clearcoat_roughness) * n_dot_l;

    var color = ubo.ambient.rgb * ubo.ambient.w * albedo * 0.3;
    color += (diffuse + base_specular + coat) * radiance;

    if (ubo.flags.x > 0.5) {
        // wrapped back-lighting reads as light scattered through the surface
        let wrap = max((dot(-normal, light_direction) + 0.5) / 1.5, 0.0);
        let rim = pow(1.0 - max(dot(normal, view_direction), 0.0), 3.0);
        color += albedo * radiance * wrap * 0.25 + ubo.light_color.rgb * rim * 0.1;
    }

    return vec4(color, in.color.a);
}
";
