//! 文件系统工具函数：存在性检查、创建、删除、重命名、路径拼接和大小统计。

use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{file_size::FileSizeUnit, types::FileError};

/// 路径在文件系统中是否存在。
pub fn exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().exists()
}

/// 创建一个空文件，缺失的父目录会一并创建。
///
/// 该函数不能用来创建目录，请使用 [`create_directory`]。
///
/// # Errors
///
/// 文件已存在时返回 `FileError::AlreadyExists`，其他失败返回 `FileError::Io`。
pub fn create_file(path: impl AsRef<Path>) -> Result<(), FileError> {
    let path = path.as_ref();
    if path.exists() {
        return Err(FileError::AlreadyExists(path.to_path_buf()));
    }

    if let Some(directory) = parent_directory(path)
        && !directory.exists()
    {
        fs::create_dir_all(directory)?;
    }

    File::create_new(path)?;
    Ok(())
}

/// 创建目录，缺失的父目录会一并创建。
///
/// # Errors
///
/// 目录已存在时返回 `FileError::AlreadyExists`。
pub fn create_directory(path: impl AsRef<Path>) -> Result<(), FileError> {
    let path = path.as_ref();
    if path.exists() {
        return Err(FileError::AlreadyExists(path.to_path_buf()));
    }
    fs::create_dir_all(path)?;
    Ok(())
}

/// 删除文件。
///
/// # Errors
///
/// 路径不存在或不是普通文件时返回 `FileError::NotAFile`。
pub fn delete_file(path: impl AsRef<Path>) -> Result<(), FileError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(FileError::NotAFile(path.to_path_buf()));
    }
    fs::remove_file(path)?;
    Ok(())
}

/// 递归删除目录及其中的所有文件和子目录。
///
/// 目录中的符号链接只删除链接本身。
///
/// # Errors
///
/// 路径不存在或不是目录时返回 `FileError::NotADirectory`。
pub fn delete_directory(path: impl AsRef<Path>) -> Result<(), FileError> {
    let path = path.as_ref();
    if !path.is_dir() {
        return Err(FileError::NotADirectory(path.to_path_buf()));
    }

    for entry in fs::read_dir(path)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            delete_directory(entry.path())?;
        } else {
            fs::remove_file(entry.path())?;
        }
    }

    fs::remove_dir(path)?;
    debug!(path = %path.display(), "已删除目录");
    Ok(())
}

/// 在同一目录下重命名文件，返回新路径。
///
/// # Errors
///
/// * `FileError::NotAFile` - 源路径不是文件。
/// * `FileError::AlreadyExists` - 目标文件已存在。
pub fn rename_file(path: impl AsRef<Path>, new_name: &str) -> Result<PathBuf, FileError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(FileError::NotAFile(path.to_path_buf()));
    }

    let target = path.with_file_name(new_name);
    if target.exists() {
        return Err(FileError::AlreadyExists(target));
    }

    fs::rename(path, &target)?;
    Ok(target)
}

/// 将各个路径片段拼接成一个路径，不会访问文件系统。
pub fn build_path<I, S>(parts: I) -> PathBuf
where
    I: IntoIterator<Item = S>,
    S: AsRef<Path>,
{
    parts.into_iter().collect()
}

/// 在 `parent` 之下拼接各个路径片段。
pub fn build_path_in<I, S>(parent: impl AsRef<Path>, parts: I) -> PathBuf
where
    I: IntoIterator<Item = S>,
    S: AsRef<Path>,
{
    let mut path = parent.as_ref().to_path_buf();
    path.extend(parts);
    path
}

/// 文件或目录的父目录，路径本身不必存在。
///
/// 空路径、根路径以及只有一级的相对路径返回 `None`。
#[must_use]
pub fn parent_directory(path: &Path) -> Option<&Path> {
    path.parent().filter(|parent| !parent.as_os_str().is_empty())
}

/// 文件的大小，或目录中所有文件大小之和，以 `unit` 为单位。
///
/// # Errors
///
/// 无法读取元数据或目录内容时返回 `FileError::Io`。
#[allow(clippy::cast_precision_loss)]
pub fn file_size(path: impl AsRef<Path>, unit: FileSizeUnit) -> Result<f64, FileError> {
    let bytes = total_bytes(path.as_ref())?;
    Ok(FileSizeUnit::convert(bytes as f64, FileSizeUnit::Byte, unit))
}

fn total_bytes(path: &Path) -> Result<u64, FileError> {
    let metadata = fs::symlink_metadata(path)?;
    if !metadata.is_dir() {
        return Ok(metadata.len());
    }

    let mut total = 0;
    for entry in fs::read_dir(path)? {
        total += total_bytes(&entry?.path())?;
    }
    Ok(total)
}
