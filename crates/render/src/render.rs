/// Camera matrices for one frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameCamera {
    pub view: nalgebra_glm::Mat4,
    pub projection: nalgebra_glm::Mat4,
    pub position: nalgebra_glm::Vec3,
}

pub struct Renderer<'window> {
    pub gpu: crate::gpu::Gpu<'window>,
    pub spheres: Option<crate::spheres::SphereRender>,
    pub depth_texture_view: wgpu::TextureView,
    pub clear_color: wgpu::Color,
    disposed: bool,
}

impl<'window> Renderer<'window> {
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'window>>,
        width: u32,
        height: u32,
    ) -> crate::gpu::Result<Self> {
        let gpu = crate::gpu::Gpu::new_async(window, width, height).await?;
        let depth_texture_view = gpu.create_depth_texture(width, height);
        Ok(Self {
            gpu,
            spheres: None,
            depth_texture_view,
            clear_color: wgpu::Color::TRANSPARENT,
            disposed: false,
        })
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if self.disposed || width == 0 || height == 0 {
            return;
        }
        self.gpu.resize(width, height);
        self.depth_texture_view = self.gpu.create_depth_texture(width, height);
    }

    pub fn render_frame(&mut self, camera: &FrameCamera, scene: &mut scene::Scene) {
        if self.disposed || scene.spheres.is_disposed() {
            return;
        }

        let spheres = self
            .spheres
            .get_or_insert_with(|| crate::spheres::SphereRender::new(&self.gpu, &scene.spheres));
        spheres.sync(&self.gpu, scene, camera);

        let surface_texture = match self.gpu.surface.get_current_texture() {
            Ok(surface_texture) => surface_texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated, reconfiguring and skipping frame");
                self.gpu.reconfigure();
                return;
            }
            Err(error) => {
                log::warn!("Skipping frame: {error}");
                return;
            }
        };

        let surface_texture_view =
            surface_texture
                .texture
                .create_view(&wgpu::TextureViewDescriptor {
                    label: wgpu::Label::default(),
                    aspect: wgpu::TextureAspect::default(),
                    format: Some(self.gpu.surface_format),
                    dimension: None,
                    base_mip_level: 0,
                    mip_level_count: None,
                    base_array_layer: 0,
                    array_layer_count: None,
                });

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        encoder.insert_debug_marker("Render ballpit");

        // This scope around the render_pass prevents the
        // render_pass from holding a borrow to the encoder,
        // which would prevent calling `.finish()` in
        // preparation for queue submission.
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(spheres) = self.spheres.as_ref() {
                spheres.render(&mut render_pass);
            }
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));

        surface_texture.present();
    }

    /// Releases GPU buffers. Safe to call more than once.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        if let Some(mut spheres) = self.spheres.take() {
            spheres.dispose();
        }
        self.disposed = true;
        log::info!("Renderer disposed");
    }
}
