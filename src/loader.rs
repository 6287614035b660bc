//! 一次性的后台加载任务。
//!
//! 工作线程只负责解码和转换，结果放进共享槽位；场景只在渲染线程上
//! 通过 [`BackgroundLoad::poll`] 取出结果后修改。

use parking_lot::{Condvar, Mutex};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::cube_map::CubeMap;
use crate::error::{Error, Result};
use crate::texture::Texture;

struct Slot<T> {
    result: Mutex<Option<Result<T>>>,
    ready: Condvar,
}

enum State {
    Pending,
    Taken,
}

pub struct BackgroundLoad<T = CubeMap> {
    slot: Arc<Slot<T>>,
    state: State,
    handle: Option<thread::JoinHandle<()>>,
}

impl BackgroundLoad<CubeMap> {
    /// 读取全景图并转换为立方体贴图
    pub fn spawn(path: impl Into<PathBuf>, face_size: Option<usize>) -> Self {
        let path = path.into();
        Self::from_fn(move || load_cube_map(&path, face_size))
    }
}

impl<T: Send + 'static> BackgroundLoad<T> {
    pub fn from_fn<F>(produce: F) -> Self
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let slot = Arc::new(Slot {
            result: Mutex::new(None),
            ready: Condvar::new(),
        });
        let worker_slot = Arc::clone(&slot);

        let handle = thread::Builder::new()
            .name("background-load".into())
            .spawn(move || {
                // panic 也要填充槽位并唤醒等待方
                let result = panic::catch_unwind(AssertUnwindSafe(produce))
                    .unwrap_or_else(|_| Err(Error::LoaderPanicked));
                *worker_slot.result.lock() = Some(result);
                worker_slot.ready.notify_all();
            });

        match handle {
            Ok(handle) => Self {
                slot,
                state: State::Pending,
                handle: Some(handle),
            },
            // 线程起不来时直接把错误放进槽位，由 poll 交给调用方
            Err(err) => {
                *slot.result.lock() = Some(Err(Error::Io(err)));
                Self {
                    slot,
                    state: State::Pending,
                    handle: None,
                }
            }
        }
    }

    /// 非阻塞。完成后第一次调用返回结果，之后永远返回 None
    pub fn poll(&mut self) -> Option<Result<T>> {
        if let State::Taken = self.state {
            return None;
        }

        let taken = self.slot.result.lock().take();
        match taken {
            Some(result) => Some(self.finish(result)),
            None => {
                // 线程已退出却没有留下结果
                if self.handle.as_ref().is_some_and(|h| h.is_finished()) {
                    let late = self.slot.result.lock().take();
                    Some(self.finish(late.unwrap_or(Err(Error::LoaderPanicked))))
                } else {
                    None
                }
            }
        }
    }

    /// 阻塞直到结果就绪或超时
    pub fn wait(&mut self, timeout: Duration) -> Option<Result<T>> {
        if let State::Taken = self.state {
            return None;
        }

        let deadline = Instant::now() + timeout;
        {
            let mut guard = self.slot.result.lock();
            while guard.is_none() {
                if self.slot.ready.wait_until(&mut guard, deadline).timed_out() {
                    break;
                }
            }
        }
        self.poll()
    }

    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        matches!(self.state, State::Pending)
    }

    fn finish(&mut self, result: Result<T>) -> Result<T> {
        self.state = State::Taken;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                return Err(Error::LoaderPanicked);
            }
        }
        result
    }
}

pub fn load_cube_map(path: &Path, face_size: Option<usize>) -> Result<CubeMap> {
    let texture = Texture::from_file(path)?;
    tracing::debug!(
        path = %path.display(),
        width = texture.width,
        height = texture.height,
        ?face_size,
        "全景图解码完成，开始转换立方体贴图"
    );
    Ok(match face_size {
        Some(size) => CubeMap::from_equirectangular_sized(&texture, size),
        None => CubeMap::from_equirectangular(&texture),
    })
}
