use wgpu::{
    Device, Extent3d, ImageCopyTexture, ImageDataLayout, Origin3d, Queue, Texture, TextureAspect,
    TextureDescriptor, TextureDimension, TextureFormat, TextureUsages, TextureView,
    TextureViewDescriptor,
};
use winit::dpi::PhysicalSize;

use crate::tracer::framebuffer::Framebuffer;

/// 프레임버퍼를 올려서 egui에 보여줄 GPU 텍스쳐
pub struct Image {
    pub gpu_texture: Texture,
    pub view: TextureView,
    pub name: String,
}

impl Image {
    pub fn new(device: &Device, width: u32, height: u32, label: &str) -> Image {
        let gpu_texture = device.create_texture(&TextureDescriptor {
            label: Some(label),
            size: Extent3d {
                width,
                height,
                depth_or_array_layers: 1, // 이미지의 레이어 갯수. 단순한 2차원 이미지니 1개로
            },
            mip_level_count: 1, // 거리에 따라 다른 텍스쳐 쓰기. 우린 그런거 없음.
            sample_count: 1,    // 안티 에일리징을 위한 멀티 샘플링. 우린 그런거 안씀
            dimension: TextureDimension::D2, // 2차원 텍스쳐
            format: TextureFormat::Rgba8UnormSrgb, // 이미지 포맷. 일단 rgba srgb 사용

            // Texture Binding: 쉐이더에서 쓸 예정
            // Copy destination: CPU에서 GPU로 데이터가 복사될 예정
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let view = gpu_texture.create_view(&TextureViewDescriptor {
            label: Some(&format!("{} view", label)),
            ..Default::default() // label 뺴고 나머진 기본값 그대로
        });

        Self {
            gpu_texture,
            view,
            name: label.to_string(),
        }
    }

    /// 프레임버퍼 크기에 맞춘 텍스쳐
    pub fn for_framebuffer(device: &Device, framebuffer: &Framebuffer, label: &str) -> Image {
        Self::new(device, framebuffer.width(), framebuffer.height(), label)
    }

    /// 프레임버퍼를 그대로 GPU에 올림. 크기가 다르면 먼저 `resize` 해야 함
    pub fn upload(&mut self, queue: &Queue, framebuffer: &Framebuffer) {
        assert_eq!(
            self.size(),
            PhysicalSize::new(framebuffer.width(), framebuffer.height()),
            "텍스쳐와 프레임버퍼 크기가 다름"
        );

        let rgba = framebuffer.to_rgba8();
        self.load_image(queue, bytemuck::cast_slice(&rgba));
    }

    pub fn load_image(&mut self, queue: &Queue, rgba: &[u8]) {
        let pixel_count = {
            let size = self.gpu_texture.size();
            size.width * size.height
        } as usize;
        assert_eq!(pixel_count, rgba.len() / 4, "RGBA 바이트 수가 텍스쳐 크기와 다름");

        queue.write_texture(
            ImageCopyTexture {
                texture: &self.gpu_texture,
                mip_level: 0,
                origin: Origin3d::ZERO,
                aspect: TextureAspect::All,
            },
            rgba,
            ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * self.gpu_texture.width()),
                rows_per_image: Some(self.gpu_texture.height()),
            },
            self.gpu_texture.size(),
        )
    }

    /// 크기가 바뀌었으면 텍스쳐를 새로 만들고 true를 돌려줌
    pub fn resize(&mut self, device: &Device, new_size: PhysicalSize<u32>) -> bool {
        if self.size() == new_size {
            return false;
        }

        let new = Self::new(device, new_size.width, new_size.height, &self.name);
        self.view = new.view;
        self.gpu_texture = new.gpu_texture;
        true
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.gpu_texture.width(), self.gpu_texture.height())
    }
}
