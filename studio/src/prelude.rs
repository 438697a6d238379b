pub use crate::keyvalues::{KeyValuesError, ParseOptions, PropValue, Property};
pub use crate::mdl::{
    companion_files,
    events::{AnimEvent, AnimEventType},
    segments::{Attachment, Bone, IncludedModel, PoseParameter},
    sequence::{EventKind, SeqEvent, Sequence},
    MdlError, Model, StudioFlags, TableCounts, Texture,
};
