//! Synthesised model files for tests.

use std::mem::{offset_of, size_of};

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use super::headers::*;
use crate::binaries::{BinArray, BinOffset};

pub struct FixtureEvent {
    pub cycle: f32,
    /// Legacy event code, used when `name` is `None`.
    pub code: i32,
    /// New-style event name.
    pub name: Option<&'static str>,
    pub options: &'static str,
}

impl FixtureEvent {
    pub fn named(name: &'static str, options: &'static str) -> Self {
        Self {
            cycle: 0.5,
            code: 0,
            name: Some(name),
            options,
        }
    }

    pub fn legacy(code: i32, options: &'static str) -> Self {
        Self {
            cycle: 0.25,
            code,
            name: None,
            options,
        }
    }
}

#[derive(Default)]
pub struct FixtureSequence {
    pub label: &'static str,
    pub activity: &'static str,
    pub events: Vec<FixtureEvent>,
    pub keyvalues: Option<&'static str>,
}

pub struct ModelFixture {
    pub version: i32,
    pub name: &'static str,
    pub flags: i32,
    /// Name and raw parent index.
    pub bones: Vec<(&'static str, i32)>,
    /// Name and local bone.
    pub attachments: Vec<(&'static str, i32)>,
    pub pose_params: Vec<&'static str>,
    /// Label and file name; empty strings are stored as null offsets.
    pub included: Vec<(&'static str, &'static str)>,
    pub textures: Vec<&'static str>,
    pub cdmaterials: Vec<&'static str>,
    /// Rows of texture indices, all the same width.
    pub skins: Vec<Vec<u16>>,
    /// Body parts, each a list of models, each a list of mesh materials.
    pub bodyparts: Vec<Vec<Vec<i32>>>,
    pub sequences: Vec<FixtureSequence>,
    pub surface_prop: &'static str,
    pub keyvalues: Option<&'static str>,
}

impl Default for ModelFixture {
    fn default() -> Self {
        Self {
            version: 49,
            name: "weapon_pistol",
            flags: 0,
            bones: vec![("valvebiped.bip01", -1)],
            attachments: Vec::new(),
            pose_params: Vec::new(),
            included: Vec::new(),
            textures: Vec::new(),
            cdmaterials: Vec::new(),
            skins: Vec::new(),
            bodyparts: Vec::new(),
            sequences: Vec::new(),
            surface_prop: "metal",
            keyvalues: None,
        }
    }
}

struct Writer {
    data: Vec<u8>,
}

impl Writer {
    fn pos(&self) -> u64 {
        self.data.len() as u64
    }

    fn put<T: Pod>(&mut self, value: &T) -> u64 {
        let pos = self.pos();
        self.data.extend_from_slice(bytemuck::bytes_of(value));
        pos
    }

    fn reserve<T: Pod>(&mut self, count: usize) -> u64 {
        let pos = self.pos();
        self.data.resize(self.data.len() + count * size_of::<T>(), 0);
        pos
    }

    fn string(&mut self, s: &str) -> u64 {
        let pos = self.pos();
        self.data.extend_from_slice(s.as_bytes());
        self.data.push(0);
        pos
    }

    fn patch<T: Pod>(&mut self, at: u64, value: &T) {
        let at = at as usize;
        self.data[at..at + size_of::<T>()].copy_from_slice(bytemuck::bytes_of(value));
    }

    /// Point the offset `field` of the record at `record` to `target`.
    fn link(&mut self, record: u64, field: usize, target: u64) {
        self.patch(record + field as u64, &((target as i64 - record as i64) as i32));
    }

    /// Write `s` and link it from the record, or leave a null offset if empty.
    fn link_str(&mut self, record: u64, field: usize, s: &str) {
        if !s.is_empty() {
            let target = self.string(s);
            self.link(record, field, target);
        }
    }
}

fn table(count: usize, offset: u64) -> BinArray {
    BinArray::new(count as i32, offset as i32)
}

fn fixed<const N: usize>(s: &str) -> [u8; N] {
    let mut out = [0u8; N];
    out[..s.len()].copy_from_slice(s.as_bytes());
    out
}

impl ModelFixture {
    pub fn build(&self) -> Vec<u8> {
        let mut w = Writer {
            data: vec![0; HEADER_SIZE as usize],
        };

        let bones = w.pos();
        let bone_records: Vec<u64> = self
            .bones
            .iter()
            .map(|&(_, parent)| {
                let mut raw = mstudiobone_t::zeroed();
                raw.parent = parent;
                raw.quat = [0.0, 0.0, 0.0, 1.0];
                raw.pos = Vec3::new(1.0, 2.0, 3.0);
                w.put(&raw)
            })
            .collect();
        for (&(name, _), &record) in self.bones.iter().zip(&bone_records) {
            let target = w.string(name);
            w.link(record, offset_of!(mstudiobone_t, name_index), target);
            let target = w.string(self.surface_prop);
            w.link(record, offset_of!(mstudiobone_t, surface_prop_index), target);
        }

        let attachments = w.pos();
        let attachment_records: Vec<u64> = self
            .attachments
            .iter()
            .map(|&(_, bone)| {
                let mut raw = mstudioattachment_t::zeroed();
                raw.local_bone = bone;
                raw.local = [1.0, 0.0, 0.0, 4.0, 0.0, 1.0, 0.0, 5.0, 0.0, 0.0, 1.0, 6.0];
                w.put(&raw)
            })
            .collect();
        for (&(name, _), &record) in self.attachments.iter().zip(&attachment_records) {
            w.link_str(record, offset_of!(mstudioattachment_t, name_index), name);
        }

        let pose_params = w.pos();
        let pose_records: Vec<u64> = self
            .pose_params
            .iter()
            .map(|_| {
                let mut raw = mstudioposeparamdesc_t::zeroed();
                raw.start = -1.0;
                raw.end = 1.0;
                w.put(&raw)
            })
            .collect();
        for (&name, &record) in self.pose_params.iter().zip(&pose_records) {
            w.link_str(record, offset_of!(mstudioposeparamdesc_t, name_index), name);
        }

        let included = w.reserve::<mstudiomodelgroup_t>(self.included.len());
        for (i, &(label, filename)) in self.included.iter().enumerate() {
            let record = included + (i * size_of::<mstudiomodelgroup_t>()) as u64;
            w.link_str(record, offset_of!(mstudiomodelgroup_t, label_index), label);
            w.link_str(record, offset_of!(mstudiomodelgroup_t, name_index), filename);
        }

        let textures = w.reserve::<mstudiotexture_t>(self.textures.len());
        for (i, &name) in self.textures.iter().enumerate() {
            let record = textures + (i * size_of::<mstudiotexture_t>()) as u64;
            w.link_str(record, offset_of!(mstudiotexture_t, name_index), name);
            w.patch(record + offset_of!(mstudiotexture_t, used) as u64, &1i32);
        }

        let cd_strings: Vec<u64> = self.cdmaterials.iter().map(|s| w.string(s)).collect();
        let cdmaterials = w.pos();
        for pos in cd_strings {
            w.put(&(pos as i32));
        }

        let skins = w.pos();
        let skin_refs = self.skins.first().map_or(0, Vec::len);
        for row in &self.skins {
            for index in row {
                w.put(index);
            }
        }

        let bodyparts = self.write_bodyparts(&mut w);
        let sequences = self.write_sequences(&mut w);

        let surface_prop = w.string(self.surface_prop);
        let keyvalues = self.keyvalues.map_or(0, |kv| w.string(kv));

        // Header, written over the reserved space at the start.
        let mut header = Writer { data: Vec::new() };
        header.put(&MDL_MAGIC);

        let mut info = HeaderInfo::zeroed();
        info.version = self.version;
        info.checksum = [1, 2, 3, 4];
        info.name = fixed(self.name);
        info.data_length = w.pos() as i32;
        header.put(&info);

        for v in [
            Vec3::new(0.0, 0.0, 64.0), // eye
            Vec3::ZERO,                // illumination
            Vec3::splat(-16.0),
            Vec3::splat(16.0),
            Vec3::ZERO,
            Vec3::ZERO,
        ] {
            header.put(&v);
        }
        header.put(&self.flags);
        header.put(&table(self.bones.len(), bones));

        let mut tables = TableHeader::zeroed();
        tables.bone_controller = BinArray::new(2, 0);
        tables.local_seq = table(self.sequences.len(), sequences);
        tables.texture = table(self.textures.len(), textures);
        tables.texture_dir = table(self.cdmaterials.len(), cdmaterials);
        tables.skin_reference_count = skin_refs as i32;
        tables.skin_family_count = self.skins.len() as i32;
        tables.skin_family_index = BinOffset::new(skins as i32);
        tables.bodypart = table(self.bodyparts.len(), bodyparts);
        header.put(&tables);

        header.put(&table(self.attachments.len(), attachments));
        let mut nodes = NodeHeader::zeroed();
        nodes.flex_desc = BinArray::new(3, 0);
        header.put(&nodes);
        header.put(&table(self.pose_params.len(), pose_params));
        assert_eq!(header.pos(), SURFACE_PROP_OFFSET);

        let mut surface = SurfaceHeader::zeroed();
        surface.surface_prop_index = BinOffset::new(surface_prop as i32);
        surface.keyvalue_index = BinOffset::new(keyvalues as i32);
        surface.keyvalue_count = i32::from(self.keyvalues.is_some());
        surface.mass = 12.5;
        surface.contents = 1;
        header.put(&surface);
        header.put(&table(self.included.len(), included));
        header.put(&0i32); // virtual model
        header.put(&AnimBlockHeader::zeroed());

        let mut lod = LodHeader::zeroed();
        lod.root_lod = 1;
        lod.num_allowed_root_lods = 2;
        header.put(&lod);
        assert_eq!(header.pos(), HEADER_SIZE);

        w.data[..HEADER_SIZE as usize].copy_from_slice(&header.data);
        w.data
    }

    fn write_bodyparts(&self, w: &mut Writer) -> u64 {
        let parts = w.reserve::<mstudiobodyparts_t>(self.bodyparts.len());

        for (i, models) in self.bodyparts.iter().enumerate() {
            let part_pos = parts + (i * size_of::<mstudiobodyparts_t>()) as u64;
            let model_table = w.reserve::<mstudiomodel_t>(models.len());

            for (j, meshes) in models.iter().enumerate() {
                let model_pos = model_table + (j * size_of::<mstudiomodel_t>()) as u64;
                let mesh_table = w.pos();
                for &material in meshes {
                    let mut mesh = mstudiomesh_t::zeroed();
                    mesh.material = material;
                    w.put(&mesh);
                }

                let mut model = mstudiomodel_t::zeroed();
                model.name = fixed("body");
                model.meshes = table(meshes.len(), mesh_table - model_pos);
                w.patch(model_pos, &model);
            }

            let mut part = mstudiobodyparts_t::zeroed();
            part.num_models = models.len() as i32;
            part.model_index = (model_table - part_pos) as i32;
            w.patch(part_pos, &part);
            w.link_str(part_pos, offset_of!(mstudiobodyparts_t, name_index), "studio");
        }
        parts
    }

    fn write_sequences(&self, w: &mut Writer) -> u64 {
        let seqs = w.reserve::<mstudioseqdesc_t>(self.sequences.len());

        for (i, seq) in self.sequences.iter().enumerate() {
            let seq_pos = seqs + (i * size_of::<mstudioseqdesc_t>()) as u64;
            let event_table = w.reserve::<mstudioevent_t>(seq.events.len());

            for (j, event) in seq.events.iter().enumerate() {
                let event_pos = event_table + (j * size_of::<mstudioevent_t>()) as u64;
                let mut raw = mstudioevent_t::zeroed();
                raw.cycle = event.cycle;
                raw.event = event.code;
                raw.event_type = if event.name.is_some() { NEW_EVENT_STYLE } else { 0 };
                raw.options = fixed(event.options);
                w.patch(event_pos, &raw);
                if let Some(name) = event.name {
                    w.link_str(event_pos, offset_of!(mstudioevent_t, name_index), name);
                }
            }

            let mut raw = mstudioseqdesc_t::zeroed();
            raw.flags = 1;
            raw.activity_weight = 1;
            raw.events = table(seq.events.len(), event_table - seq_pos);
            raw.bbmin = Vec3::splat(-8.0);
            raw.bbmax = Vec3::splat(8.0);
            raw.keyvalue_size = seq.keyvalues.map_or(0, |kv| kv.len() as i32 + 1);
            w.patch(seq_pos, &raw);

            w.link_str(seq_pos, offset_of!(mstudioseqdesc_t, label_index), seq.label);
            w.link_str(seq_pos, offset_of!(mstudioseqdesc_t, activity_name_index), seq.activity);
            if let Some(kv) = seq.keyvalues {
                w.link_str(seq_pos, offset_of!(mstudioseqdesc_t, keyvalue_index), kv);
            }
        }
        seqs
    }
}

/// A `.phy` file with one opaque solid and the given keyvalue text.
pub fn phy_file(text: &str) -> Vec<u8> {
    let solid = b"VPHY\x01\x00\x00\x00ivps";
    let mut data = Vec::new();
    for v in [16, 0, 1, 0x04030201] {
        data.extend_from_slice(&i32::to_le_bytes(v));
    }
    data.extend_from_slice(&(solid.len() as i32).to_le_bytes());
    data.extend_from_slice(solid);
    data.extend_from_slice(text.as_bytes());
    data.push(0);
    data
}
