// On-disk layout of studiohdr_t and the tables it points to, versions 44 to 49.
//
// https://developer.valvesoftware.com/wiki/MDL_(Source)
// https://github.com/ValveSoftware/source-sdk-2013/blob/master/mp/src/public/studio.h
//
// The main header is not read as one struct: the bone, attachment, pose parameter
// and included model tables are segments whose headers are read in place, so the
// header is split into the fixed groups that sit between them.
#![allow(non_camel_case_types)]

use glam::Vec3;

use crate::binaries::{BinArray, BinOffset};

pub const MDL_MAGIC: [u8; 4] = *b"IDST";
pub const MIN_VERSION: i32 = 44;
pub const MAX_VERSION: i32 = 49;

/// For anyone trying to follow along, the "surfaceprop_index" value is at
/// position 0x0134 (308) from the start of the file in every supported version.
pub const SURFACE_PROP_OFFSET: u64 = 308;

/// Size of everything up to and including the flex controller UI table.
pub const HEADER_SIZE: u64 = 392;

/// Event type bit marking the string-named event system.
pub const NEW_EVENT_STYLE: i32 = 1 << 10;

/// Right after the magic.
#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct HeaderInfo {
    pub version: i32,       // Format version number, such as 48 (0x30,0x00,0x00,0x00)
    pub checksum: [u8; 4],  // This has to be the same in the phy and vtx files to load!
    pub name: [u8; 64],     // The internal name of the model, padding with null bytes.
    pub data_length: i32,   // Data size of MDL file in bytes.
}

/// Between the bone table and the attachment table.
#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TableHeader {
    pub bone_controller: BinArray, // mstudiobonecontroller_t
    pub hitbox: BinArray,          // mstudiohitboxset_t
    pub local_anim: BinArray,      // mstudioanimdesc_t
    pub local_seq: BinArray,       // mstudioseqdesc_t

    pub activity_list_version: i32,
    pub events_indexed: i32,

    pub texture: BinArray, // mstudiotexture_t

    // This offset points to a series of i32s, each an absolute offset to a
    // null-terminated folder name.
    pub texture_dir: BinArray,

    // Each skin-family assigns a texture-id to a skin location
    pub skin_reference_count: i32,
    pub skin_family_count: i32,
    pub skin_family_index: BinOffset,

    pub bodypart: BinArray, // mstudiobodyparts_t
}

/// Between the attachment table and the pose parameter table. None of these
/// are expanded.
#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct NodeHeader {
    // Node values appear to be single bytes, while their names are null-terminated strings.
    pub local_node: BinArray,
    pub local_node_name_index: BinOffset,

    pub flex_desc: BinArray,       // mstudioflexdesc_t
    pub flex_controller: BinArray, // mstudioflexcontroller_t
    pub flex_rules: BinArray,      // mstudioflexrule_t
    pub ik_chain: BinArray,        // mstudioikchain_t
    pub mouths: BinArray,          // mstudiomouth_t
}

/// Starts at [`SURFACE_PROP_OFFSET`].
#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SurfaceHeader {
    // Surface property value (single null-terminated string)
    pub surface_prop_index: BinOffset,

    // Unusual: In this one index comes first, then count.
    pub keyvalue_index: BinOffset,
    pub keyvalue_count: i32,

    pub ik_lock: BinArray, // mstudioiklock_t

    pub mass: f32,
    pub contents: i32,
}

/// After the included model table and the virtual model placeholder.
#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct AnimBlockHeader {
    pub anim_blocks_name_index: BinOffset,
    pub anim_blocks: BinArray, // mstudioanimblock_t
    pub anim_block_model: i32, // Placeholder for mutable-void*

    pub bone_table_name_index: BinOffset,

    pub vertex_base: i32, // Placeholder for void*
    pub offset_base: i32, // Placeholder for void*
}

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LodHeader {
    // Used with $constantdirectionallight from the QC
    // Model should have flag #13 set if enabled
    pub directional_dot_product: u8,
    pub root_lod: u8, // Preferred rather than clamped
    // 0 means any allowed, N means Lod 0 -> (N-1)
    pub num_allowed_root_lods: u8,
    unused0: u8,
    unused1: i32,

    pub flex_controller_ui: BinArray, // mstudioflexcontrollerui_t
}

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct mstudiobone_t {
    pub name_index: BinOffset,
    pub parent: i32, // -1 for root bones
    pub bone_controller: [i32; 6],

    pub pos: Vec3,
    pub quat: [f32; 4],
    pub rot: Vec3, // Euler, radians
    pub pos_scale: Vec3,
    pub rot_scale: Vec3,

    pub pose_to_bone: [f32; 12], // matrix3x4_t, row major
    pub q_alignment: [f32; 4],
    pub flags: i32,

    pub proc_type: i32,
    pub proc_index: BinOffset,
    pub physics_bone: i32,
    pub surface_prop_index: BinOffset,
    pub contents: i32,

    unused: [i32; 8],
}

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct mstudioattachment_t {
    pub name_index: BinOffset,
    pub flags: u32,
    pub local_bone: i32,
    pub local: [f32; 12], // attachment point, matrix3x4_t
    unused: [i32; 8],
}

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct mstudioposeparamdesc_t {
    pub name_index: BinOffset,
    pub flags: i32,
    pub start: f32,
    pub end: f32,
    pub loop_range: f32, // looping range, 0 for no looping, 360 for rotations, etc.
}

/// Both names are relative to the start of the record; zero means absent.
#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct mstudiomodelgroup_t {
    pub label_index: BinOffset,
    pub name_index: BinOffset,
}

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct mstudiotexture_t {
    // Number of bytes past the beginning of this structure
    // where the first character of the texture name can be found.
    pub name_index: BinOffset,
    pub flags: i32, // appears to solely indicate 'teeth' materials
    pub used: i32,
    unused: i32,

    material: i32,        // Placeholder for IMaterial
    client_material: i32, // Placeholder for void*

    unused2: [i32; 10],
    // Struct is 64 bytes long
}

// body part index

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct mstudiobodyparts_t {
    pub name_index: BinOffset,
    pub num_models: i32,
    pub base: i32,
    pub model_index: i32, // relative to the start of this body part
}

impl mstudiobodyparts_t {
    pub fn models(&self) -> BinArray {
        BinArray::new(self.num_models, self.model_index)
    }
}

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct mstudiomodel_t {
    pub name: [u8; 64],
    pub model_type: i32,
    pub bounding_radius: f32,
    pub meshes: BinArray, // relative to the start of this model
    pub num_vertices: i32,   // number of unique vertices/normals/texcoords
    pub vertex_index: i32,   // vertex Vector
    pub tangents_index: i32, // tangents Vector
    pub attachments: BinArray,
    pub eyeballs: BinArray,
    vertex_data: [i32; 2], // base of external vertex data stores
    unused: [i32; 8],
}

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct mstudiomesh_t {
    pub material: i32, // skin slot, a column of the skin family table
    pub model_index: i32,
    pub num_vertices: i32,
    pub vertex_offset: i32,
    pub flexes: BinArray,
    pub material_type: i32,
    pub material_param: i32,
    pub mesh_id: i32,
    pub center: Vec3,
    vertex_data: i32,           // Placeholder for void*
    lod_vertices: [i32; 8],
    unused: [i32; 8],
}

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct mstudioseqdesc_t {
    pub base: i32,
    pub label_index: BinOffset,
    pub activity_name_index: BinOffset,
    pub flags: i32,
    pub activity: i32, // Filled in at runtime
    pub activity_weight: i32,
    pub events: BinArray, // relative to the start of this sequence
    pub bbmin: Vec3,
    pub bbmax: Vec3,

    // Blends, animation indices, IK rules and autolayers: 20 ints then 9 floats.
    reserved: [i32; 29],

    pub keyvalue_index: BinOffset,
    pub keyvalue_size: i32,
    unused: [i32; 8],
}

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct mstudioevent_t {
    pub cycle: f32,
    pub event: i32,      // legacy numeric event
    pub event_type: i32, // NEW_EVENT_STYLE when the name is used instead
    pub options: [u8; 64],
    pub name_index: BinOffset, // relative to the start of this event
}

#[cfg(test)]
mod headers_tests {
    use std::mem::{offset_of, size_of};

    use super::*;

    #[test]
    fn record_sizes() {
        assert_eq!(size_of::<mstudiobone_t>(), 216);
        assert_eq!(size_of::<mstudioattachment_t>(), 92);
        assert_eq!(size_of::<mstudioposeparamdesc_t>(), 20);
        assert_eq!(size_of::<mstudiomodelgroup_t>(), 8);
        assert_eq!(size_of::<mstudiotexture_t>(), 64);
        assert_eq!(size_of::<mstudiobodyparts_t>(), 16);
        assert_eq!(size_of::<mstudiomodel_t>(), 148);
        assert_eq!(size_of::<mstudiomesh_t>(), 116);
        assert_eq!(size_of::<mstudioseqdesc_t>(), 212);
        assert_eq!(size_of::<mstudioevent_t>(), 80);
    }

    #[test]
    fn header_groups_land_on_308() {
        // magic, info, six vectors, flags, bone header
        let before_tables = 4 + size_of::<HeaderInfo>() + 6 * 12 + 4 + 8;
        assert_eq!(before_tables, 164);
        let surface = before_tables
            + size_of::<TableHeader>()
            + 8 // attachments
            + size_of::<NodeHeader>()
            + 8; // pose parameters
        assert_eq!(surface as u64, SURFACE_PROP_OFFSET);

        let end = surface
            + size_of::<SurfaceHeader>()
            + 8 // included models
            + 4 // virtual model
            + size_of::<AnimBlockHeader>()
            + size_of::<LodHeader>();
        assert_eq!(end as u64, HEADER_SIZE);
    }

    #[test]
    fn keyvalue_offset_in_sequence() {
        assert_eq!(offset_of!(mstudioseqdesc_t, keyvalue_index), 172);
    }
}
