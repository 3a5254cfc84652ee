//! Read resource configuration files and merge them into one [`ResourceMap`].

use crate::error::ExtractError;
use crate::metadata::parameters::{ParameterResolver, PlaceholderResolution};
use crate::metadata::types::ResourceMap;
use crate::metadata::{xml, yaml};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceFormat {
    Xml,
    Yaml,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "xml" => Some(SourceFormat::Xml),
            "yaml" | "yml" => Some(SourceFormat::Yaml),
            _ => None,
        }
    }
}

/// Extract every resource declared in `paths`, in order. A class declared
/// again by a later file is merged on top of the earlier declaration.
pub fn extract<P: AsRef<Path>>(paths: &[P], parameters: &ParameterResolver) -> Result<ResourceMap, ExtractError> {
    let mut pass = PlaceholderResolution::new(parameters);
    let mut resources = ResourceMap::new();
    for path in paths {
        let path = path.as_ref();
        let extracted = extract_file(path, &mut pass)?;
        tracing::debug!(path = %path.display(), resources = extracted.len(), "extracted resource configuration");
        for (class, metadata) in extracted {
            match resources.get_mut(&class) {
                Some(existing) => {
                    let previous = std::mem::take(existing);
                    *existing = previous.merge(metadata);
                }
                None => {
                    resources.insert(class, metadata);
                }
            }
        }
    }
    Ok(resources)
}

fn extract_file(
    path: &Path,
    pass: &mut PlaceholderResolution<'_>,
) -> Result<Vec<(String, crate::metadata::ResourceMetadata)>, ExtractError> {
    let format = SourceFormat::from_path(path)
        .ok_or_else(|| ExtractError::malformed(path, "unsupported file extension, expected .xml, .yaml or .yml"))?;
    let content = std::fs::read_to_string(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    match format {
        SourceFormat::Xml => xml::parse(path, &content, pass),
        SourceFormat::Yaml => yaml::parse(path, &content, pass),
    }
}

/// Extractor bound to a fixed list of files. The map is built on first access
/// and shared read-only afterwards.
#[derive(Debug)]
pub struct ResourceExtractor {
    paths: Vec<PathBuf>,
    parameters: ParameterResolver,
    resources: OnceLock<Arc<ResourceMap>>,
}

impl ResourceExtractor {
    pub fn new(paths: Vec<PathBuf>, parameters: ParameterResolver) -> Self {
        ResourceExtractor {
            paths,
            parameters,
            resources: OnceLock::new(),
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn resources(&self) -> Result<Arc<ResourceMap>, ExtractError> {
        if let Some(resources) = self.resources.get() {
            return Ok(resources.clone());
        }
        let built = Arc::new(extract(&self.paths, &self.parameters)?);
        Ok(self.resources.get_or_init(|| built).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(SourceFormat::from_path(Path::new("a/b.XML")), Some(SourceFormat::Xml));
        assert_eq!(SourceFormat::from_path(Path::new("b.yml")), Some(SourceFormat::Yaml));
        assert_eq!(SourceFormat::from_path(Path::new("b.json")), None);
    }

    #[test]
    fn later_file_overrides_earlier_one() {
        let tmp = tempfile::tempdir().unwrap();
        let first = write(
            tmp.path(),
            "first.xml",
            r#"<resources><resource class="Foo" shortName="foo" description="first"/></resources>"#,
        );
        let second = write(tmp.path(), "second.yaml", "resources:\n  Foo:\n    shortName: bar\n");
        let resources = extract(&[first, second], &ParameterResolver::None).unwrap();
        assert_eq!(resources["Foo"].short_name.as_deref(), Some("bar"));
        assert_eq!(resources["Foo"].description.as_deref(), Some("first"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = extract(&[Path::new("/nonexistent/resources.yaml")], &ParameterResolver::None).unwrap_err();
        assert!(matches!(err, ExtractError::Io { .. }));
    }

    #[test]
    fn unsupported_extension_is_malformed() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write(tmp.path(), "resources.json", "{}");
        let err = extract(&[path], &ParameterResolver::None).unwrap_err();
        assert!(matches!(err, ExtractError::MalformedConfiguration { .. }));
    }

    #[test]
    fn resources_are_built_once() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write(tmp.path(), "resources.yaml", "resources:\n  Foo: ~\n");
        let extractor = ResourceExtractor::new(vec![path.clone()], ParameterResolver::None);
        let first = extractor.resources().unwrap();
        std::fs::remove_file(&path).unwrap();
        let second = extractor.resources().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
