//! Studio model (`.mdl`) metadata, versions 44 to 49.
//!
//! Only the tables describing the model are decoded: bones, attachments, pose
//! parameters, included models, textures and skins, sequences and their events.
//! Geometry and animation data are left alone.

use std::{
    collections::BTreeSet,
    io::{self, Read},
};

use common::{vfile::VFileSystem, vpath};
use flagset::{flags, FlagSet};
use glam::Vec3;

use crate::{
    binaries::{
        fixed_str, invalid_data, read_offset_array, read_vec3, BinArray, BinaryData,
        TrackedCursor, UnreadRun,
    },
    keyvalues::Property,
};

pub mod error;
pub mod events;
pub mod headers;
pub mod phy;
pub mod segments;
pub mod sequence;
mod skins;

#[cfg(test)]
pub(crate) mod fixture;

pub use error::MdlError;
pub use events::{AnimEvent, AnimEventType};
pub use segments::{Attachment, Bone, IncludedModel, PoseParameter};
pub use sequence::{EventKind, SeqEvent, Sequence};

use error::TableContext;
use headers::*;
use segments::{ATTACHMENTS, BONES, INCLUDED_MODELS, POSE_PARAMS};

/// Extensions of the files that make up one model, in packing order.
pub const MDL_EXTS: &[&str] = &[
    ".mdl", ".phy", ".vvd", ".ani", ".vtx", ".dx80.vtx", ".dx90.vtx", ".sw.vtx", ".xbox.vtx",
];

/// NPC soundscript prefix for footstep events without options.
pub const DEFAULT_FOOTSTEP_NPC: &str = "NPC_CombineS";

flags! {
    pub enum StudioFlags: i32 {
        AutogeneratedHitbox = 1 << 0,
        UsesEnvCubemap = 1 << 1,
        ForceOpaque = 1 << 2,
        TranslucentTwoPass = 1 << 3,
        StaticProp = 1 << 4,
        UsesFbTexture = 1 << 5,
        HasShadowLod = 1 << 6,
        UsesBumpmapping = 1 << 7,
        UseShadowLodMaterials = 1 << 8,
        Obsolete = 1 << 9,
        Unused = 1 << 10,
        NoForcedFade = 1 << 11,
        ForcePhonemeCrossfade = 1 << 12,
        ConstantDirectionalLightDot = 1 << 13,
        FlexesConverted = 1 << 14,
        BuiltInPreviewMode = 1 << 15,
        AmbientBoost = 1 << 16,
        DoNotCastShadows = 1 << 17,
        CastTextureShadows = 1 << 18,
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Texture {
    /// Forward slashes, no leading slash, no extension.
    pub name: String,
    pub flags: i32,
    pub used: i32,
}

/// Sizes of the tables that are located but not expanded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub bone_controllers: usize,
    pub hitbox_sets: usize,
    pub local_animations: usize,
    pub local_nodes: usize,
    pub flex_descs: usize,
    pub flex_controllers: usize,
    pub flex_rules: usize,
    pub ik_chains: usize,
    pub ik_locks: usize,
    pub mouths: usize,
    pub anim_blocks: usize,
    pub flex_controller_uis: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    pub version: i32,
    pub checksum: [u8; 4],
    pub name: String,
    /// File length the header claims.
    pub data_length: i32,

    pub eye_pos: Vec3,
    pub illum_pos: Vec3,
    pub hull_min: Vec3,
    pub hull_max: Vec3,
    pub view_min: Vec3,
    pub view_max: Vec3,

    pub raw_flags: i32,
    pub flags: FlagSet<StudioFlags>,

    pub bones: Vec<Bone>,
    pub attachments: Vec<Attachment>,
    pub pose_params: Vec<PoseParameter>,
    pub included_models: Vec<IncludedModel>,
    pub sequences: Vec<Sequence>,

    pub textures: Vec<Texture>,
    /// Material paths per skin, culled to the ones meshes use.
    pub skins: Vec<Vec<String>>,
    /// Folders to search for materials, each empty or ending in `/`.
    pub cdmaterials: Vec<String>,

    pub surface_prop: String,
    pub keyvalues: String,
    pub mass: f32,
    pub contents: i32,

    pub directional_dot_product: u8,
    pub root_lod: u8,
    pub num_allowed_root_lods: u8,

    pub table_counts: TableCounts,

    /// From the `.phy` file next to the model, empty if there isn't one.
    pub phys_keyvalues: Property,

    /// Byte ranges of the `.mdl` the decoder never read.
    pub unparsed: Vec<UnreadRun>,
}

fn count(table: &BinArray, name: &'static str) -> Result<usize, MdlError> {
    table.len().table(name)
}

/// The surface property header sits at the same offset in every supported version.
fn check_surface_offset(pos: u64) -> Result<(), MdlError> {
    if pos == SURFACE_PROP_OFFSET {
        Ok(())
    } else {
        Err(MdlError::HeaderMisaligned(pos))
    }
}

/// Parents must be in the table and parent chains must end at a root.
fn check_bone_forest(bones: &[Bone]) -> Result<(), MdlError> {
    for (i, bone) in bones.iter().enumerate() {
        if let Some(parent) = bone.parent.filter(|&p| p >= bones.len()) {
            return Err(MdlError::BoneParent { bone: i, parent });
        }
    }

    for start in 0..bones.len() {
        let mut current = bones[start].parent;
        let mut depth = 0;
        while let Some(parent) = current {
            depth += 1;
            if parent == start || depth > bones.len() {
                return Err(MdlError::BoneCycle(start));
            }
            current = bones[parent].parent;
        }
    }
    Ok(())
}

impl Model {
    /// Decode a model, and its `.phy` file if the filesystem has one.
    pub fn load(fs: &dyn VFileSystem, path: &str) -> Result<Self, MdlError> {
        log::debug!("loading model {}", path);
        let mut model = Self::from_bytes(fs.read_all(path)?)?;

        let phy_path = vpath::with_extension(path, ".phy");
        if fs.contains(&phy_path) {
            model.phys_keyvalues = phy::parse_phy(fs.read_all(&phy_path)?, &phy_path)?;
        } else {
            log::debug!("{} has no physics file", path);
        }
        Ok(model)
    }

    /// Decode the `.mdl` file alone.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, MdlError> {
        let mut buffer = TrackedCursor::new(data);

        let mut magic = [0u8; 4];
        let read = buffer.read(&mut magic)?;
        if read < magic.len() || magic != MDL_MAGIC {
            return Err(MdlError::NotAModel(magic));
        }

        let info = HeaderInfo::read(&mut buffer).table("header")?;
        if !(MIN_VERSION..=MAX_VERSION).contains(&{ info.version }) {
            return Err(MdlError::UnsupportedVersion(info.version));
        }
        let name = fixed_str(&info.name);
        log::debug!("model {:?}, version {}", name, { info.version });

        let mut vectors = [Vec3::ZERO; 6];
        for v in &mut vectors {
            *v = read_vec3(&mut buffer).table("header vectors")?;
        }
        let [eye_pos, illum_pos, hull_min, hull_max, view_min, view_max] = vectors;

        let raw_flags = i32::read(&mut buffer).table("flags")?;

        let bones = BONES.read(&mut buffer).table("bones")?;
        check_bone_forest(&bones)?;

        let tables = TableHeader::read(&mut buffer).table("header tables")?;
        let attachments = ATTACHMENTS.read(&mut buffer).table("attachments")?;
        let nodes = NodeHeader::read(&mut buffer).table("header nodes")?;
        let pose_params = POSE_PARAMS.read(&mut buffer).table("pose parameters")?;

        check_surface_offset(buffer.position())?;

        let surface = SurfaceHeader::read(&mut buffer).table("surface header")?;
        let included_models = INCLUDED_MODELS.read(&mut buffer).table("included models")?;
        // In-engine pointer to the merged virtual model.
        buffer.skip(4);
        let anim_blocks = AnimBlockHeader::read(&mut buffer).table("animation blocks")?;
        let lod = LodHeader::read(&mut buffer).table("lod header")?;

        let mut cdmaterials = Self::read_cdmaterials(&mut buffer, &tables.texture_dir)?;
        let textures = Self::read_textures(&mut buffer, &tables.texture)?;
        let mut skins = Self::read_skins(&mut buffer, &tables, &textures)?;

        // Textures with folders in their names are searched for there too.
        for texture in &textures {
            if let Some(folder) = vpath::parent(&texture.name) {
                let folder = format!("{folder}/");
                if !cdmaterials.contains(&folder) {
                    cdmaterials.push(folder);
                }
            }
        }
        // Every model falls back to the root material folder.
        if !cdmaterials.iter().any(String::is_empty) {
            cdmaterials.push(String::new());
        }

        let surface_prop = surface
            .surface_prop_index
            .read_str(&mut buffer, 0)
            .table("surface property")?;
        let keyvalues = if surface.keyvalue_count != 0 {
            surface
                .keyvalue_index
                .read_str(&mut buffer, 0)
                .table("keyvalues")?
        } else {
            String::new()
        };

        let sequences = sequence::read_sequences(&mut buffer, &tables.local_seq)?;

        let used = skins::used_materials(&mut buffer, &tables.bodypart)?;
        skins::cull_skins(&mut skins, &used);

        let table_counts = TableCounts {
            bone_controllers: count(&tables.bone_controller, "bone controllers")?,
            hitbox_sets: count(&tables.hitbox, "hitbox sets")?,
            local_animations: count(&tables.local_anim, "local animations")?,
            local_nodes: count(&nodes.local_node, "local nodes")?,
            flex_descs: count(&nodes.flex_desc, "flex descs")?,
            flex_controllers: count(&nodes.flex_controller, "flex controllers")?,
            flex_rules: count(&nodes.flex_rules, "flex rules")?,
            ik_chains: count(&nodes.ik_chain, "ik chains")?,
            ik_locks: count(&surface.ik_lock, "ik locks")?,
            mouths: count(&nodes.mouths, "mouths")?,
            anim_blocks: count(&anim_blocks.anim_blocks, "anim blocks")?,
            flex_controller_uis: count(&lod.flex_controller_ui, "flex controller uis")?,
        };

        let unparsed = buffer.unread_runs();
        log::debug!(
            "{}: {} bytes in {} runs left unread",
            name,
            unparsed.iter().map(|run| run.data.len()).sum::<usize>(),
            unparsed.len()
        );

        Ok(Self {
            version: info.version,
            checksum: info.checksum,
            name,
            data_length: info.data_length,
            eye_pos,
            illum_pos,
            hull_min,
            hull_max,
            view_min,
            view_max,
            raw_flags,
            flags: FlagSet::new_truncated(raw_flags),
            bones,
            attachments,
            pose_params,
            included_models,
            sequences,
            textures,
            skins,
            cdmaterials,
            surface_prop,
            keyvalues,
            mass: surface.mass,
            contents: surface.contents,
            directional_dot_product: lod.directional_dot_product,
            root_lod: lod.root_lod,
            num_allowed_root_lods: lod.num_allowed_root_lods,
            table_counts,
            phys_keyvalues: Property::default(),
            unparsed,
        })
    }

    fn read_cdmaterials(
        buffer: &mut TrackedCursor,
        table: &BinArray,
    ) -> Result<Vec<String>, MdlError> {
        let count = table.len().table("cdmaterials")?;
        let offset = table.offset;
        let folders = buffer
            .restore_after(|buffer| {
                buffer.seek_to(offset.absolute(0)?);
                read_offset_array(buffer, count)
            })
            .table("cdmaterials")?;

        Ok(folders
            .iter()
            .map(|folder| {
                let mut folder = vpath::normalize(folder);
                if !folder.is_empty() && !folder.ends_with('/') {
                    folder.push('/');
                }
                folder
            })
            .collect())
    }

    fn read_textures(buffer: &mut TrackedCursor, table: &BinArray) -> Result<Vec<Texture>, MdlError> {
        let raw: Vec<(u64, mstudiotexture_t)> = table.read_table(buffer, 0).table("textures")?;

        raw.iter()
            .map(|(start, tex)| {
                Ok(Texture {
                    name: vpath::normalize(&tex.name_index.read_str(buffer, *start)?),
                    flags: tex.flags,
                    used: tex.used,
                })
            })
            .collect::<io::Result<Vec<_>>>()
            .table("texture names")
    }

    fn read_skins(
        buffer: &mut TrackedCursor,
        tables: &TableHeader,
        textures: &[Texture],
    ) -> Result<Vec<Vec<String>>, MdlError> {
        let families = BinArray::new(tables.skin_family_count, 0)
            .len()
            .table("skin families")?;
        let references = BinArray::new(tables.skin_reference_count, 0)
            .len()
            .table("skin references")?;
        let start = tables.skin_family_index.absolute(0).table("skin families")?;

        let grid = buffer.restore_after(|buffer| {
            buffer.seek_to(start);
            skins::read_skin_families(buffer, families, references)
        })?;

        grid.iter()
            .map(|row| {
                row.iter()
                    .map(|&index| {
                        textures
                            .get(usize::from(index))
                            .map(|tex| tex.name.clone())
                            .ok_or_else(|| invalid_data(format!("skin uses missing texture {index}")))
                    })
                    .collect::<io::Result<Vec<_>>>()
            })
            .collect::<io::Result<Vec<_>>>()
            .table("skin families")
    }

    /// Material files this model uses that exist in `fs`, sorted.
    ///
    /// With `skins`, only those skins are considered; indexes past the end
    /// mean skin 0. Each texture is looked for in the `cdmaterials` folders in
    /// order and the first hit wins.
    pub fn iter_textures(&self, fs: &dyn VFileSystem, skins: Option<&[usize]>) -> Vec<String> {
        let mut names = BTreeSet::new();
        match skins {
            Some(skins) if !skins.is_empty() => {
                for &index in skins {
                    if let Some(skin) = self.skins.get(index).or_else(|| self.skins.first()) {
                        names.extend(skin.iter().map(String::as_str));
                    }
                }
            }
            _ => names.extend(self.skins.iter().flatten().map(String::as_str)),
        }

        names
            .into_iter()
            .filter_map(|texture| {
                self.cdmaterials
                    .iter()
                    .map(|folder| {
                        vpath::with_extension(&vpath::join(&["materials", folder, texture]), ".vmt")
                    })
                    .find(|path| fs.contains(path))
            })
            .collect()
    }

    fn events(&self) -> impl Iterator<Item = (&Sequence, AnimEvent, &SeqEvent)> {
        self.sequences.iter().flat_map(|seq| {
            seq.events
                .iter()
                .filter_map(move |event| event.kind.known().map(|kind| (seq, kind, event)))
        })
    }

    /// Soundscripts played by animation events.
    ///
    /// Each NPC footstep event stands for four soundscripts, named after the
    /// NPC in its options.
    pub fn find_sounds(&self) -> Vec<String> {
        let mut sounds = Vec::new();
        for (_, kind, event) in self.events() {
            if kind.is_sound() {
                sounds.push(event.options.clone());
            }
            if kind.is_footstep() {
                let npc = if event.options.is_empty() {
                    DEFAULT_FOOTSTEP_NPC
                } else {
                    event.options.as_str()
                };
                for suffix in [
                    ".RunFootstepLeft",
                    ".RunFootstepRight",
                    ".FootstepLeft",
                    ".FootstepRight",
                ] {
                    sounds.push(format!("{npc}{suffix}"));
                }
            }
        }
        sounds
    }

    /// Particle systems started by client particle events.
    pub fn find_particles(&self) -> Vec<String> {
        let mut particles = Vec::new();
        for (seq, kind, event) in self.events() {
            if kind != AnimEvent::AE_CL_CREATE_PARTICLE_EFFECT {
                continue;
            }
            // particle, attach type, attachment
            match event.options.split_whitespace().collect::<Vec<_>>()[..] {
                [particle, _, _] => particles.push(particle.to_owned()),
                _ => log::warn!(
                    "invalid particle event options {:?} in sequence {:?} of {:?}",
                    event.options,
                    seq.label,
                    self.name
                ),
            }
        }
        particles
    }

    /// Gib models listed in the physics keyvalues.
    pub fn find_break_models(&self) -> Vec<String> {
        self.phys_keyvalues
            .find_all(&["break", "model"])
            .into_iter()
            .filter_map(Property::as_str)
            .map(str::to_owned)
            .collect()
    }
}

/// The files belonging to the model at `path` that exist in `fs`.
pub fn companion_files(fs: &dyn VFileSystem, path: &str) -> Vec<String> {
    MDL_EXTS
        .iter()
        .map(|ext| vpath::with_extension(path, ext))
        .filter(|candidate| fs.contains(candidate))
        .collect()
}
