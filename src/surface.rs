use minifb::{Key, Window, WindowOptions};

use crate::error::Result;
use crate::framebuffer::FrameBuffer;

/// 渲染输出目标：报告当前显示尺寸，并展示渲染好的帧
pub trait Surface {
    /// 实际显示尺寸，可能与帧缓冲尺寸不同
    fn display_size(&self) -> (usize, usize);

    fn is_open(&self) -> bool;

    fn present(&mut self, framebuffer: &FrameBuffer) -> Result<()>;

    /// 用户是否要求退出
    fn cancel_requested(&self) -> bool {
        false
    }
}

/// 可调整大小的 minifb 窗口，帧率由窗口的目标 FPS 限制
pub struct WindowSurface {
    window: Window,
}

impl WindowSurface {
    pub fn new(title: &str, width: usize, height: usize, target_fps: usize) -> Result<Self> {
        let mut window = Window::new(
            title,
            width,
            height,
            WindowOptions {
                resize: true,
                ..WindowOptions::default()
            },
        )?;
        window.set_target_fps(target_fps);
        Ok(Self { window })
    }
}

impl Surface for WindowSurface {
    fn display_size(&self) -> (usize, usize) {
        self.window.get_size()
    }

    fn is_open(&self) -> bool {
        self.window.is_open()
    }

    fn present(&mut self, framebuffer: &FrameBuffer) -> Result<()> {
        if framebuffer.width == 0 || framebuffer.height == 0 {
            // 仍需处理窗口事件
            self.window.update();
            return Ok(());
        }
        self.window
            .update_with_buffer(&framebuffer.data, framebuffer.width, framebuffer.height)?;
        Ok(())
    }

    fn cancel_requested(&self) -> bool {
        self.window.is_key_down(Key::Escape)
    }
}

/// 无窗口输出，用于离屏渲染和测试
pub struct HeadlessSurface {
    pub width: usize,
    pub height: usize,
    pub presented: usize,
    last_frame: Option<FrameBuffer>,
    keep_last_frame: bool,
}

impl HeadlessSurface {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            presented: 0,
            last_frame: None,
            keep_last_frame: false,
        }
    }

    /// 保留最后一帧，供运行结束后保存
    pub fn keeping_last_frame(mut self) -> Self {
        self.keep_last_frame = true;
        self
    }

    #[cfg(test)]
    pub fn set_display_size(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
    }

    pub fn last_frame(&self) -> Option<&FrameBuffer> {
        self.last_frame.as_ref()
    }
}

impl Surface for HeadlessSurface {
    fn display_size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn is_open(&self) -> bool {
        true
    }

    fn present(&mut self, framebuffer: &FrameBuffer) -> Result<()> {
        self.presented += 1;
        if self.keep_last_frame {
            match &mut self.last_frame {
                Some(last) => last.clone_from(framebuffer),
                None => self.last_frame = Some(framebuffer.clone()),
            }
        }
        Ok(())
    }
}
