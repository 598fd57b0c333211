//! 源文件输出（Filer）
//!
//! 生成的编译单元通过 Filer 写出。同一轮中重复创建同一个文件是错误，
//! 与宿主编译器的行为一致。

use crate::error::{ProcessorError, Result};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// 生成文件的接收方
pub trait Filer {
    /// 写出一个源文件，`qualified_name` 形如 `test.Interceptor_Service`
    fn create_source_file(&mut self, qualified_name: &str, text: &str) -> Result<()>;

    /// 写出一个资源文件，`relative_path` 相对于输出根目录
    fn create_resource(&mut self, relative_path: &str, text: &str) -> Result<()>;
}

/// 源文件的相对路径：`test.Interceptor_Service` -> `test/Interceptor_Service.java`
pub fn source_path(qualified_name: &str) -> String {
    format!("{}.java", qualified_name.replace('.', "/"))
}

/// 内存中的 Filer
#[derive(Debug, Default)]
pub struct MemoryFiler {
    sources: BTreeMap<String, String>,
    resources: BTreeMap<String, String>,
}

impl MemoryFiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按限定名获取源文件内容
    pub fn source(&self, qualified_name: &str) -> Option<&str> {
        self.sources.get(qualified_name).map(String::as_str)
    }

    pub fn resource(&self, relative_path: &str) -> Option<&str> {
        self.resources.get(relative_path).map(String::as_str)
    }

    /// 所有源文件，按限定名排序
    pub fn sources(&self) -> &BTreeMap<String, String> {
        &self.sources
    }
}

impl Filer for MemoryFiler {
    fn create_source_file(&mut self, qualified_name: &str, text: &str) -> Result<()> {
        if self.sources.contains_key(qualified_name) {
            return Err(ProcessorError::FileExists(qualified_name.to_string()));
        }
        self.sources
            .insert(qualified_name.to_string(), text.to_string());
        Ok(())
    }

    fn create_resource(&mut self, relative_path: &str, text: &str) -> Result<()> {
        if self.resources.contains_key(relative_path) {
            return Err(ProcessorError::FileExists(relative_path.to_string()));
        }
        self.resources
            .insert(relative_path.to_string(), text.to_string());
        Ok(())
    }
}

/// 写入目录的 Filer
#[derive(Debug)]
pub struct DirectoryFiler {
    root: PathBuf,
    created: HashSet<PathBuf>,
}

impl DirectoryFiler {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            created: HashSet::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn write(&mut self, relative: &str, text: &str) -> Result<()> {
        let path = self.root.join(relative);
        if !self.created.insert(path.clone()) {
            return Err(ProcessorError::FileExists(relative.to_string()));
        }

        let to_filer_error = |source| ProcessorError::Filer {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(to_filer_error)?;
        }
        fs::write(&path, text).map_err(to_filer_error)?;

        tracing::debug!("Wrote {}", path.display());
        Ok(())
    }
}

impl Filer for DirectoryFiler {
    fn create_source_file(&mut self, qualified_name: &str, text: &str) -> Result<()> {
        self.write(&source_path(qualified_name), text)
    }

    fn create_resource(&mut self, relative_path: &str, text: &str) -> Result<()> {
        self.write(relative_path, text)
    }
}
