use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("图片解码失败 {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
    #[error("配置解析失败: {0}")]
    Config(#[from] serde_json::Error),
    #[error("无效的颜色值 {0:?}，应为 #rrggbb")]
    InvalidColor(String),
    #[error("窗口错误: {0}")]
    Window(String),
    #[error("保存图片失败: {0}")]
    Save(#[from] image::ImageError),
    #[error("纹理尺寸为零")]
    EmptyTexture,
    #[error("后台加载线程异常退出")]
    LoaderPanicked,
}

impl From<minifb::Error> for Error {
    fn from(err: minifb::Error) -> Self {
        Error::Window(err.to_string())
    }
}
