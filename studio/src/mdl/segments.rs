//! The tables whose header pair is read in place inside the main header.

use std::io;

use glam::{Mat3, Quat, Vec3};

use super::headers::{mstudioattachment_t, mstudiobone_t, mstudiomodelgroup_t, mstudioposeparamdesc_t};
use crate::binaries::{decompose_3x4, invalid_data, BinOffset, HeaderOrder, Segment, TrackedCursor};

#[derive(Clone, Debug, PartialEq)]
pub struct Bone {
    pub name: String,
    /// Index into the model's bones; `None` for roots.
    pub parent: Option<usize>,
    pub bone_controllers: [i32; 6],
    pub pos: Vec3,
    pub quat: Quat,
    pub rot: Vec3,
    pub pos_scale: Vec3,
    pub rot_scale: Vec3,
    pub pose_to_bone: Mat3,
    pub pose_offset: Vec3,
    pub q_alignment: Quat,
    pub flags: i32,
    pub proc_type: i32,
    pub proc_index: i32,
    pub physics_bone: i32,
    pub surface_prop: String,
    pub contents: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Attachment {
    pub name: String,
    pub flags: u32,
    pub local_bone: usize,
    pub rotation: Mat3,
    pub offset: Vec3,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PoseParameter {
    pub name: String,
    pub flags: i32,
    pub start: f32,
    pub end: f32,
    pub loop_range: f32,
}

/// A `$includemodel`, sharing its sequences with this model.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IncludedModel {
    pub label: String,
    pub filename: String,
}

fn finish_bone(buffer: &mut TrackedCursor, start: u64, raw: &mstudiobone_t) -> io::Result<Bone> {
    let parent = match { raw.parent } {
        -1 => None,
        p => Some(usize::try_from(p).map_err(|_| invalid_data(format!("bone parent {p}")))?),
    };
    let (pose_to_bone, pose_offset) = decompose_3x4(raw.pose_to_bone);

    Ok(Bone {
        name: raw.name_index.read_str(buffer, start)?,
        parent,
        bone_controllers: raw.bone_controller,
        pos: raw.pos,
        quat: Quat::from_array(raw.quat),
        rot: raw.rot,
        pos_scale: raw.pos_scale,
        rot_scale: raw.rot_scale,
        pose_to_bone,
        pose_offset,
        q_alignment: Quat::from_array(raw.q_alignment),
        flags: raw.flags,
        proc_type: raw.proc_type,
        proc_index: raw.proc_index.index,
        physics_bone: raw.physics_bone,
        surface_prop: raw.surface_prop_index.read_str(buffer, start)?,
        contents: raw.contents,
    })
}

fn finish_attachment(
    buffer: &mut TrackedCursor,
    start: u64,
    raw: &mstudioattachment_t,
) -> io::Result<Attachment> {
    let local_bone = raw.local_bone;
    let (rotation, offset) = decompose_3x4(raw.local);

    Ok(Attachment {
        name: raw.name_index.read_str(buffer, start)?,
        flags: raw.flags,
        local_bone: usize::try_from(local_bone)
            .map_err(|_| invalid_data(format!("attachment bone {local_bone}")))?,
        rotation,
        offset,
    })
}

fn finish_pose_param(
    buffer: &mut TrackedCursor,
    start: u64,
    raw: &mstudioposeparamdesc_t,
) -> io::Result<PoseParameter> {
    Ok(PoseParameter {
        name: raw.name_index.read_str(buffer, start)?,
        flags: raw.flags,
        start: raw.start,
        end: raw.end,
        loop_range: raw.loop_range,
    })
}

fn finish_included(
    buffer: &mut TrackedCursor,
    start: u64,
    raw: &mstudiomodelgroup_t,
) -> io::Result<IncludedModel> {
    let read = |buffer: &mut TrackedCursor, offset: &BinOffset| {
        if offset.is_null() {
            Ok(String::new())
        } else {
            offset.read_str(buffer, start)
        }
    };
    Ok(IncludedModel {
        label: read(buffer, &raw.label_index)?,
        filename: read(buffer, &raw.name_index)?,
    })
}

pub const BONES: Segment<mstudiobone_t, Bone> = Segment {
    name: "bones",
    order: HeaderOrder::CountOffset,
    padding: 0,
    tolerate_truncation: false,
    finish: finish_bone,
};

pub const ATTACHMENTS: Segment<mstudioattachment_t, Attachment> = Segment {
    name: "attachments",
    order: HeaderOrder::CountOffset,
    padding: 0,
    tolerate_truncation: false,
    finish: finish_attachment,
};

pub const POSE_PARAMS: Segment<mstudioposeparamdesc_t, PoseParameter> = Segment {
    name: "pose parameters",
    order: HeaderOrder::CountOffset,
    padding: 0,
    tolerate_truncation: false,
    finish: finish_pose_param,
};

/// Optional trailing data, so a short table keeps the complete records.
pub const INCLUDED_MODELS: Segment<mstudiomodelgroup_t, IncludedModel> = Segment {
    name: "included models",
    order: HeaderOrder::CountOffset,
    padding: 0,
    tolerate_truncation: true,
    finish: finish_included,
};
