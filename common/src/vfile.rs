use std::{
    collections::HashMap,
    fs::File,
    io::{self, BufReader, Cursor, Read},
    path::PathBuf,
    sync::Arc,
};

/// Read-only view over game content, keyed by forward-slash paths.
///
/// Readers returned by [`VFileSystem::open`] own or borrow the underlying
/// handle, so the file is closed as soon as the reader is dropped.
pub trait VFileSystem {
    fn open(&self, path: &str) -> io::Result<Box<dyn Read + '_>>;

    fn contains(&self, path: &str) -> bool;

    /// Read the whole file into memory.
    fn read_all(&self, path: &str) -> io::Result<Vec<u8>> {
        let mut reader = self.open(path)?;
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(data)
    }
}

fn not_found(path: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("File path {} not present", path),
    )
}

#[derive(Default, Clone, Debug)]
pub struct VFile {
    pub data: Vec<u8>,
}

/// Files held entirely in memory.
#[derive(Default, Clone)]
pub struct MemFileSystem {
    pub files: Arc<HashMap<String, VFile>>,
}

impl MemFileSystem {
    pub fn new<I, P>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, Vec<u8>)>,
        P: Into<String>,
    {
        Self {
            files: Arc::new(
                files
                    .into_iter()
                    .map(|(path, data)| (path.into(), VFile { data }))
                    .collect(),
            ),
        }
    }

    pub fn get_str(&self, path: &str) -> Option<BufReader<Cursor<&[u8]>>> {
        match self.files.get(path) {
            Some(file) => {
                let c = Cursor::new(&file.data[..]);

                Some(BufReader::new(c))
            }
            None => {
                log::debug!("{:?} file not found", path);
                None
            }
        }
    }
}

impl VFileSystem for MemFileSystem {
    fn open(&self, path: &str) -> io::Result<Box<dyn Read + '_>> {
        match self.get_str(path) {
            Some(reader) => Ok(Box::new(reader)),
            None => Err(not_found(path)),
        }
    }

    fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }
}

/// Loose files on disk, searched through an ordered list of roots.
#[derive(Default, Clone, Debug)]
pub struct DirFileSystem {
    roots: Vec<PathBuf>,
}

impl DirFileSystem {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn push_root(&mut self, root: PathBuf) {
        self.roots.push(root);
    }

    fn locate(&self, path: &str) -> Option<PathBuf> {
        self.roots
            .iter()
            .map(|root| root.join(path))
            .find(|full| full.is_file())
    }
}

impl VFileSystem for DirFileSystem {
    fn open(&self, path: &str) -> io::Result<Box<dyn Read + '_>> {
        let Some(full) = self.locate(path) else {
            log::debug!("{:?} file not found", path);
            return Err(not_found(path));
        };
        Ok(Box::new(BufReader::new(File::open(full)?)))
    }

    fn contains(&self, path: &str) -> bool {
        self.locate(path).is_some()
    }
}
