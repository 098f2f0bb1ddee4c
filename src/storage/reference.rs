//! Storage path references

/// Path-like handle to an object in a storage bucket
///
/// References are plain values: they are computed per call and never
/// touch the network themselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct StorageReference {
    path: String,
}

impl StorageReference {
    /// The bucket root
    pub fn root() -> Self {
        Self::default()
    }

    /// Reference at `path`, normalized
    pub fn new(path: impl AsRef<str>) -> Self {
        Self::root().child(path)
    }

    /// Reference to `path` below this one
    ///
    /// Leading, trailing and repeated slashes are dropped.
    pub fn child(&self, path: impl AsRef<str>) -> Self {
        let segments = self
            .path
            .split('/')
            .chain(path.as_ref().split('/'))
            .filter(|segment| !segment.is_empty());

        let mut joined = String::new();
        for segment in segments {
            if !joined.is_empty() {
                joined.push('/');
            }
            joined.push_str(segment);
        }

        Self { path: joined }
    }

    /// `folder/file_name` when a folder is given, else `file_name`
    pub fn resolve(&self, file_name: &str, folder: Option<&str>) -> Self {
        match folder {
            Some(folder) => self.child(folder).child(file_name),
            None => self.child(file_name),
        }
    }

    /// Full path from the bucket root (empty for the root)
    pub fn full_path(&self) -> &str {
        &self.path
    }

    /// Last path segment (empty for the root)
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or("")
    }

    /// Parent reference, `None` for the root
    pub fn parent(&self) -> Option<Self> {
        if self.path.is_empty() {
            return None;
        }
        match self.path.rsplit_once('/') {
            None => Some(Self::root()),
            Some((parent, _)) => Some(Self {
                path: parent.to_string(),
            }),
        }
    }

    /// Whether this is the bucket root
    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }
}

impl std::fmt::Display for StorageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)
    }
}
