//! 对象存储
//!
//! 按桶存放头像、封面、展示图片与数字文件，并生成公开访问地址。

mod local;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub use local::LocalObjectStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Avatars,
    Covers,
    ShowcaseImages,
    DigitalFiles,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Avatars => "avatars",
            Bucket::Covers => "covers",
            Bucket::ShowcaseImages => "showcase-images",
            Bucket::DigitalFiles => "digital-files",
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid object path: {0}")]
    InvalidPath(String),

    #[error("the resource already exists: {0}")]
    AlreadyExists(String),

    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// 写入对象，返回桶内路径
    async fn upload(
        &self,
        bucket: Bucket,
        path: &str,
        bytes: Vec<u8>,
        upsert: bool,
    ) -> Result<String, StorageError>;

    async fn remove(&self, bucket: Bucket, path: &str) -> Result<(), StorageError>;

    fn public_url(&self, bucket: Bucket, path: &str) -> String;
}

fn file_name_of(file_name: &str) -> Result<&str, StorageError> {
    let name = file_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .trim();
    if name.is_empty() || name == "." || name == ".." {
        return Err(StorageError::InvalidPath(file_name.to_string()));
    }
    Ok(name)
}

/// 上传文件的对象路径：`{owner}/{file_name}`
pub fn object_path(owner: &str, file_name: &str) -> Result<String, StorageError> {
    Ok(format!("{}/{}", owner, file_name_of(file_name)?))
}

/// 每次上传一个新对象：`{owner}/{uuid}-{file_name}`，同名文件互不覆盖
pub fn unique_object_path(owner: &str, file_name: &str) -> Result<String, StorageError> {
    Ok(format!(
        "{}/{}-{}",
        owner,
        Uuid::new_v4().simple(),
        file_name_of(file_name)?
    ))
}

/// 拒绝绝对路径与 `..`
pub(crate) fn validate_path(path: &str) -> Result<(), StorageError> {
    let bad = path.is_empty()
        || path.starts_with('/')
        || path.contains('\\')
        || path
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if bad {
        Err(StorageError::InvalidPath(path.to_string()))
    } else {
        Ok(())
    }
}
