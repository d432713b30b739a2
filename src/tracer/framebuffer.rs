use std::collections::TryReserveError;
use std::path::Path;

use image::{ColorType, ImageFormat};
use rayon::prelude::*;
use thiserror::Error;

use crate::util::Vec3;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("{width}x{height} 프레임버퍼를 할당하지 못함")]
    Allocation {
        width: u32,
        height: u32,
        #[source]
        source: TryReserveError,
    },
    #[error("{width}x{height} 프레임버퍼는 주소 공간에 안 들어감")]
    Overflow { width: u32, height: u32 },
    #[error("이미지 저장 실패")]
    Image(#[from] image::ImageError),
}

/// 행 우선으로 저장한 RGB 색상. 값은 0~1로 자르지 않음
#[derive(Debug, Clone, PartialEq)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<Vec3>,
}

impl Framebuffer {
    /// 검은색으로 채운 프레임버퍼. 메모리가 모자라면 중단하지 않고 에러를 돌려줌
    pub fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .ok_or(RenderError::Overflow { width, height })?;

        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|source| RenderError::Allocation {
                width,
                height,
                source,
            })?;
        pixels.resize(len, Vec3::zeros());

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Vec3] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Vec3 {
        self.pixels[(y * self.width + x) as usize]
    }

    // 한 줄씩 나눠서 병렬로 채우기 위함
    pub(crate) fn par_rows_mut(&mut self) -> rayon::slice::ChunksMut<'_, Vec3> {
        self.pixels.par_chunks_mut(self.width.max(1) as usize)
    }

    #[cfg(test)]
    pub(crate) fn pixels_mut(&mut self) -> &mut [Vec3] {
        &mut self.pixels
    }

    /// 화면에 올릴 RGBA8 픽셀. 각 채널은 여기서 0~1로 잘림
    pub fn to_rgba8(&self) -> Vec<[u8; 4]> {
        self.pixels
            .iter()
            .map(|color| {
                let channel = |value: f32| (value.clamp(0.0, 1.0) * 255.0).round() as u8;
                [channel(color.x), channel(color.y), channel(color.z), 0xFF]
            })
            .collect()
    }

    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<(), RenderError> {
        let rgba = self.to_rgba8();
        image::save_buffer_with_format(
            path,
            bytemuck::cast_slice(&rgba),
            self.width,
            self.height,
            ColorType::Rgba8,
            ImageFormat::Png,
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_black() {
        let framebuffer = Framebuffer::new(4, 3).unwrap();
        assert_eq!(framebuffer.pixels().len(), 12);
        assert!(framebuffer.pixels().iter().all(|pixel| *pixel == Vec3::zeros()));
    }

    #[test]
    fn test_huge_allocation_is_an_error() {
        let result = Framebuffer::new(u32::MAX, u32::MAX);
        assert!(matches!(
            result,
            Err(RenderError::Allocation { .. }) | Err(RenderError::Overflow { .. })
        ));
    }

    #[test]
    fn test_rows_are_row_major() {
        let mut framebuffer = Framebuffer::new(3, 2).unwrap();
        framebuffer.par_rows_mut().enumerate().for_each(|(y, row)| {
            for (x, pixel) in row.iter_mut().enumerate() {
                *pixel = Vec3::new(x as f32, y as f32, 0.0);
            }
        });

        assert_eq!(framebuffer.pixel(2, 1), Vec3::new(2.0, 1.0, 0.0));
        assert_eq!(framebuffer.pixels()[4], Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_rgba8_clamps_out_of_range() {
        let mut framebuffer = Framebuffer::new(2, 1).unwrap();
        framebuffer.pixels_mut()[0] = Vec3::new(2.5, -1.0, 0.5);
        framebuffer.pixels_mut()[1] = Vec3::new(1.0, 0.0, 0.2);

        let rgba = framebuffer.to_rgba8();
        assert_eq!(rgba[0], [255, 0, 128, 255]);
        assert_eq!(rgba[1], [255, 0, 51, 255]);
    }
}
