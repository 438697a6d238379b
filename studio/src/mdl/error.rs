use std::io;

use thiserror::Error;

use crate::keyvalues::KeyValuesError;

#[derive(Debug, Error)]
pub enum MdlError {
    #[error("not a model, found magic {0:?} instead of \"IDST\"")]
    NotAModel([u8; 4]),

    #[error("unsupported model version {0}, expected 44 to 49")]
    UnsupportedVersion(i32),

    #[error("surface property header found at offset {0}, expected 308")]
    HeaderMisaligned(u64),

    #[error("error reading {table}")]
    Table {
        table: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("sequence {sequence:?} uses unknown event {name:?}")]
    UnknownEvent { sequence: String, name: String },

    #[error("bone {bone} has parent {parent}, outside the bone table")]
    BoneParent { bone: usize, parent: usize },

    #[error("bone {0} is its own ancestor")]
    BoneCycle(usize),

    #[error("error parsing physics keyvalues")]
    KeyValues(#[from] KeyValuesError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Name the table or field group a primitive read belonged to.
pub(crate) trait TableContext<T> {
    fn table(self, table: &'static str) -> Result<T, MdlError>;
}

impl<T> TableContext<T> for io::Result<T> {
    fn table(self, table: &'static str) -> Result<T, MdlError> {
        self.map_err(|source| MdlError::Table { table, source })
    }
}
